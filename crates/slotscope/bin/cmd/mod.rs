pub mod inspect;
pub mod watch;

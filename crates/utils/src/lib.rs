#[macro_use]
extern crate tracing;

pub mod artifact;
pub mod rpc;

use crate::cmd::{inspect::InspectArgs, watch::WatchArgs};
use clap::{Parser, Subcommand};

/// slotscope: inspect a deployed contract's storage as a nested tree.
#[derive(Parser, Debug)]
#[command(
    name = "slotscope",
    version = env!("CARGO_PKG_VERSION"),
    next_display_order = None,
)]
pub struct SlotscopeArgs {
    #[command(subcommand)]
    pub cmd: SlotscopeSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum SlotscopeSubcommand {
    /// Decode and print the storage tree once.
    #[command(visible_alias = "i")]
    Inspect(InspectArgs),

    /// Re-decode and print the storage tree on an interval.
    #[command(visible_alias = "w")]
    Watch(WatchArgs),
}

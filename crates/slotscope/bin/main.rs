#[macro_use]
extern crate tracing;

mod args;
mod cmd;
mod utils;

use args::{SlotscopeArgs, SlotscopeSubcommand};
use clap::Parser;
use eyre::Result;

fn main() -> Result<()> {
    utils::install_error_handler();
    utils::subscriber();
    utils::enable_paint();

    let opts = SlotscopeArgs::parse();

    match opts.cmd {
        SlotscopeSubcommand::Inspect(cmd) => utils::block_on(cmd.run()),
        SlotscopeSubcommand::Watch(cmd) => utils::block_on(cmd.run()),
    }
}

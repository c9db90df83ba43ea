//! # Checkout Synchronization CLI
//!
//! Binary entry point for the `checkout-sync` command-line tool: parse
//! arguments with `clap`, dispatch to the matching command, and translate
//! top-level errors into user-friendly output. All core logic lives in the
//! library crate; the binary is a thin wrapper standing in for a host
//! orchestrator.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}

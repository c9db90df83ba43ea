//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Checkout Sync - Keep local git checkouts at the desired revision
#[derive(Parser, Debug)]
#[command(name = "checkout-sync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL", default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Synchronize every configured repository
    Sync(commands::sync::SyncArgs),

    /// Show the persisted checkout ledger
    Ledger(commands::ledger::LedgerArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        env_logger::Builder::from_env(
            env_logger::Env::default().default_filter_or(&self.log_level),
        )
        .init();

        match self.command {
            Commands::Sync(args) => commands::sync::execute(args),
            Commands::Ledger(args) => commands::ledger::execute(args),
        }
    }
}

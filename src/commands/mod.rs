//! Subcommand implementations

pub mod ledger;
pub mod sync;

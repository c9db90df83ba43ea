//! # Ledger Command Implementation
//!
//! Prints the persisted checkout ledger for a checkouts root: one line per
//! repository with the recorded ref, branch, and last-update timestamp.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use checkout_sync::ledger::{Ledger, LEDGER_FILE_NAME};

/// Show the persisted checkout ledger
#[derive(Args, Debug)]
pub struct LedgerArgs {
    /// The checkouts root directory holding the ledger file.
    #[arg(long, value_name = "DIR", env = "CHECKOUT_SYNC_DIR", default_value = ".checkouts")]
    pub checkouts_dir: PathBuf,
}

pub fn execute(args: LedgerArgs) -> Result<()> {
    let path = args.checkouts_dir.join(LEDGER_FILE_NAME);
    let ledger = Ledger::load(&path)?;

    if ledger.is_empty() {
        println!("No checkouts recorded in {}", path.display());
        return Ok(());
    }

    println!("Checkout ledger ({}):", path.display());
    for record in ledger.iter() {
        let ref_display = if record.ref_name.is_empty() {
            "(default branch)"
        } else {
            &record.ref_name
        };
        println!(
            "  {} ref={} branch={} last-update-millis={}",
            record.uri, ref_display, record.branch, record.last_update_millis
        );
    }
    Ok(())
}

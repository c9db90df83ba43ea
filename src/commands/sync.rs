//! # Sync Command Implementation
//!
//! Loads the configuration and the persisted ledger, synchronizes every
//! configured repository sequentially, and saves the ledger exactly once at
//! the end of the run, even when some repositories failed, so that the
//! attempt timestamps of the failures survive into the next run.
//!
//! Repositories with a local override (explicit path or a unique match in
//! the auto-override directories) are not synchronized at all.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Args;

use checkout_sync::config::{BackendKind, SyncConfig};
use checkout_sync::ledger::Ledger;
use checkout_sync::sync::{create_backend, find_local_override, Synchronizer};

/// Synchronize every configured repository
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Path to the configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "checkout-sync.yaml")]
    pub config: PathBuf,

    /// Override the checkouts root directory.
    #[arg(long, value_name = "DIR", env = "CHECKOUT_SYNC_DIR")]
    pub checkouts_dir: Option<PathBuf>,

    /// Force the git CLI backend regardless of configuration.
    #[arg(long)]
    pub use_cli_backend: bool,
}

pub fn execute(args: SyncArgs) -> Result<()> {
    let mut config = SyncConfig::load(&args.config)
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    if let Some(dir) = args.checkouts_dir {
        config.checkouts_directory = dir;
    }
    if args.use_cli_backend {
        config.backend = BackendKind::Cli;
    }

    let ledger_path = config.ledger_path();
    let mut ledger = Ledger::load(&ledger_path)?;
    let backend = create_backend(config.backend);
    let mut synchronizer = Synchronizer::new(&mut ledger, backend, config.refresh_interval());

    let mut failures = Vec::new();
    for entry in &config.repositories {
        let override_dir = match find_local_override(
            &entry.name,
            entry.local_override.as_deref(),
            &config.auto_override_dirs,
        ) {
            Ok(dir) => dir,
            Err(e) => {
                failures.push(format!("{}: {}", entry.name, e));
                continue;
            }
        };
        if let Some(dir) = override_dir {
            log::info!(
                "Using local repository {} for {} instead of cloning",
                dir.display(),
                entry.name
            );
            continue;
        }
        if let Err(e) = synchronizer.synchronize(&entry.to_descriptor(&config)) {
            failures.push(format!("{}: {}", entry.name, e));
        }
    }

    // Flush once at process end regardless of per-repository outcomes.
    ledger.save(&ledger_path)?;

    if !failures.is_empty() {
        bail!(
            "{} of {} repositories failed to synchronize:\n  {}",
            failures.len(),
            config.repositories.len(),
            failures.join("\n  ")
        );
    }
    println!("Synchronized {} repositories", config.repositories.len());
    Ok(())
}

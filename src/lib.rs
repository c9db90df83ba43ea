//! # Checkout Synchronization Library
//!
//! Keeps local working copies of remote git repositories synchronized with a
//! desired revision (branch, tag, or exact commit) while minimizing
//! redundant network operations through a persisted staleness ledger. It is
//! meant to be driven by a host build orchestrator that needs those working
//! copies to exist, at the right revision, before it proceeds; the
//! `checkout-sync` binary is a thin stand-in for such an orchestrator.
//!
//! ## Core Concepts
//!
//! - **Ledger (`ledger`)**: persisted mapping from repository URI to the
//!   last-known synchronization metadata, with an explicit load/save
//!   lifecycle at process boundaries. The staleness check lives here.
//! - **Authentication (`auth`)**: a closed set of mutually exclusive
//!   credential strategies attached to a repository.
//! - **Backends (`backend`)**: two interchangeable clone/update strategies
//!   behind one trait, the external `git` executable and in-process
//!   libgit2, with shared suffix-based ref resolution.
//! - **Engine (`sync`)**: per-repository orchestration (consult the
//!   ledger, clone or update through the selected backend, record the
//!   outcome) plus local-override resolution.
//! - **Configuration (`config`)**: the YAML surface supplying checkouts
//!   root, refresh interval, backend selection, and repository descriptors.
//!
//! ## Quick Example
//!
//! ```no_run
//! use std::time::Duration;
//! use checkout_sync::config::{BackendKind, SyncConfig};
//! use checkout_sync::ledger::Ledger;
//! use checkout_sync::sync::{create_backend, Synchronizer};
//!
//! # fn main() -> checkout_sync::error::Result<()> {
//! let config = SyncConfig::parse(
//!     "checkouts-directory: .checkouts\n\
//!      repositories:\n\
//!       - name: utils\n\
//!         uri: https://example.com/utils.git\n\
//!         branch: main\n",
//! )?;
//!
//! let mut ledger = Ledger::load(&config.ledger_path())?;
//! let backend = create_backend(BackendKind::Library);
//! let mut sync = Synchronizer::new(&mut ledger, backend, config.refresh_interval());
//! for entry in &config.repositories {
//!     sync.synchronize(&entry.to_descriptor(&config))?;
//! }
//! ledger.save(&config.ledger_path())?;
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod backend;
pub mod config;
pub mod error;
pub mod ledger;
pub mod sync;

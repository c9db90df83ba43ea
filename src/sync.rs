//! # Synchronization Engine
//!
//! Orchestrates one synchronization per repository descriptor: consult the
//! ledger, decide clone vs. update, delegate to the configured backend, and
//! record the outcome.
//!
//! The engine processes descriptors one at a time, synchronously; every
//! backend call blocks until the subprocess exits or the library call
//! returns. The ledger is owned by the caller and passed in by reference:
//! explicit `load`/`save` at process boundaries, never a hidden global.
//!
//! A failed clone or update still writes the attempted record before the
//! error propagates, so a hard failure does not retry on every invocation
//! within the refresh window. Changing the desired ref always forces a
//! retry.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::backend::cli::CliBackend;
use crate::backend::libgit::LibGitBackend;
use crate::backend::{SyncTarget, UpdateState, VcsBackend};
use crate::config::{BackendKind, RepositoryDescriptor};
use crate::error::{Error, Result};
use crate::ledger::{CheckoutRecord, Ledger};

/// Instantiates the backend variant selected by configuration.
pub fn create_backend(kind: BackendKind) -> Box<dyn VcsBackend> {
    match kind {
        BackendKind::Library => Box::new(LibGitBackend::new()),
        BackendKind::Cli => Box::new(CliBackend::new()),
    }
}

/// The repository synchronization engine.
pub struct Synchronizer<'a> {
    ledger: &'a mut Ledger,
    backend: Box<dyn VcsBackend>,
    refresh_interval: Duration,
}

impl<'a> Synchronizer<'a> {
    pub fn new(
        ledger: &'a mut Ledger,
        backend: Box<dyn VcsBackend>,
        refresh_interval: Duration,
    ) -> Self {
        Self {
            ledger,
            backend,
            refresh_interval,
        }
    }

    /// Synchronizes one repository: clones when the checkout directory has
    /// no git metadata yet, updates otherwise (the backend may no-op via the
    /// staleness check). The attempted record is written to the ledger
    /// whether or not the backend succeeded.
    ///
    /// After this returns without error, the checkout directory exists and
    /// contains a working copy at the resolved reference.
    pub fn synchronize(&mut self, descriptor: &RepositoryDescriptor) -> Result<()> {
        let current = CheckoutRecord::new(
            &descriptor.uri,
            descriptor.desired_ref(),
            descriptor.branch_or_tag(),
            now_millis(),
        );
        let target = SyncTarget {
            uri: &descriptor.uri,
            commit: descriptor.commit(),
            branch_or_tag: descriptor.branch_or_tag(),
        };
        let dir = &descriptor.checkout_directory;

        let result = if dir.join(".git").exists() {
            let prior = self.ledger.get(&descriptor.uri).cloned();
            let state = UpdateState {
                prior: prior.as_ref(),
                current: &current,
                refresh_interval: self.refresh_interval,
            };
            self.backend
                .update_repository(dir, &target, &state, &descriptor.authentication)
        } else {
            self.backend
                .clone_repository(dir, &target, &descriptor.authentication)
        };

        // Even a failed attempt records "we tried at time T".
        self.ledger.record(current);
        result
    }
}

/// Resolves a local directory satisfying a repository instead of a checkout.
///
/// An explicit override always wins. Otherwise each auto-override directory
/// is checked for a subdirectory named like the repository; exactly one
/// match is an override, several are an error.
pub fn find_local_override(
    name: &str,
    explicit: Option<&Path>,
    auto_dirs: &[PathBuf],
) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        return Ok(Some(path.to_path_buf()));
    }
    let mut candidates: Vec<PathBuf> = auto_dirs
        .iter()
        .map(|dir| dir.join(name))
        .filter(|candidate| candidate.is_dir())
        .collect();
    match candidates.len() {
        0 => Ok(None),
        1 => Ok(Some(candidates.remove(0))),
        _ => Err(Error::AmbiguousLocalOverride {
            name: name.to_string(),
            candidates,
        }),
    }
}

fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}

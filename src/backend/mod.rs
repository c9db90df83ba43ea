//! # Version-Control Backends
//!
//! Two interchangeable strategies perform the actual clone/fetch/checkout
//! work behind one contract: [`cli::CliBackend`] drives the external `git`
//! executable, [`libgit::LibGitBackend`] uses the in-process libgit2
//! library. The active variant is selected once per process from
//! configuration and never mixed within a synchronization call.
//!
//! Backends are side-effecting on the filesystem and network only. They
//! never write the checkout ledger (that is the engine's job), but
//! `update` receives the prior and current records and applies the
//! staleness check itself, because only the backend knows whether a network
//! operation needs to be emitted at all.
//!
//! Both variants must produce the same resulting checked-out commit for
//! equivalent inputs, even though their internal mechanics differ.

pub mod cli;
pub mod libgit;

use std::path::Path;
use std::time::Duration;

use crate::auth::Authentication;
use crate::error::Result;
use crate::ledger::CheckoutRecord;

/// Prefix of fully-qualified local branch references.
pub const LOCAL_BRANCH_PREFIX: &str = "refs/heads/";

/// What to synchronize: a repository URI plus the desired revision.
///
/// `commit` and `branch_or_tag` are empty strings when unset; a non-empty
/// `commit` always wins at checkout time.
#[derive(Debug, Clone, Copy)]
pub struct SyncTarget<'a> {
    pub uri: &'a str,
    pub commit: &'a str,
    pub branch_or_tag: &'a str,
}

impl SyncTarget<'_> {
    /// The reference to check out: the pinned commit when present,
    /// otherwise the branch-or-tag name (possibly empty).
    pub fn checkout_ref(&self) -> &str {
        if self.commit.is_empty() {
            self.branch_or_tag
        } else {
            self.commit
        }
    }
}

/// Ledger context for an update: the prior record for the same URI (absent
/// when never synchronized), the record being attempted now, and the
/// configured refresh interval.
#[derive(Debug, Clone, Copy)]
pub struct UpdateState<'a> {
    pub prior: Option<&'a CheckoutRecord>,
    pub current: &'a CheckoutRecord,
    pub refresh_interval: Duration,
}

impl UpdateState<'_> {
    /// The shared staleness check: skip network operations entirely when
    /// the prior record matches the current desired ref and is recent
    /// enough.
    pub fn is_up_to_date(&self) -> bool {
        self.current.is_fresh(self.prior, self.refresh_interval)
    }
}

/// Contract implemented by both backend variants.
pub trait VcsBackend {
    /// Creates a fresh working copy of `target.uri` in `dir`, checked out
    /// at the desired revision. Must tolerate a pre-existing, non-empty
    /// target directory.
    fn clone_repository(
        &self,
        dir: &Path,
        target: &SyncTarget<'_>,
        auth: &Authentication,
    ) -> Result<()>;

    /// Brings an existing working copy in `dir` up to date with the desired
    /// revision. Applies the staleness check first and may no-op.
    fn update_repository(
        &self,
        dir: &Path,
        target: &SyncTarget<'_>,
        state: &UpdateState<'_>,
        auth: &Authentication,
    ) -> Result<()>;
}

/// Fallback resolution for ref names that are not directly resolvable:
/// returns the first fully-qualified ref whose name ends with
/// `branch_or_tag`. The caller fails with "ref not found" when this returns
/// `None`.
pub fn find_ref_by_suffix<I, S>(ref_names: I, branch_or_tag: &str) -> Option<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ref_names
        .into_iter()
        .map(Into::into)
        .find(|name| name.ends_with(branch_or_tag))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_checkout_ref_prefers_commit() {
        let target = SyncTarget {
            uri: "https://example.com/r.git",
            commit: "abc123",
            branch_or_tag: "main",
        };
        assert_eq!(target.checkout_ref(), "abc123");

        let target = SyncTarget {
            uri: "https://example.com/r.git",
            commit: "",
            branch_or_tag: "main",
        };
        assert_eq!(target.checkout_ref(), "main");
    }

    #[test]
    fn test_find_ref_by_suffix_matches_remote_tracking_ref() {
        let refs = [
            "refs/heads/develop".to_string(),
            "refs/remotes/origin/main".to_string(),
            "refs/tags/v1.0.0".to_string(),
        ];
        assert_eq!(
            find_ref_by_suffix(refs.clone(), "main"),
            Some("refs/remotes/origin/main".to_string())
        );
        assert_eq!(
            find_ref_by_suffix(refs.clone(), "v1.0.0"),
            Some("refs/tags/v1.0.0".to_string())
        );
        assert_eq!(find_ref_by_suffix(refs, "release"), None);
    }

    #[test]
    fn test_find_ref_by_suffix_takes_first_match() {
        let refs = [
            "refs/heads/main".to_string(),
            "refs/remotes/origin/main".to_string(),
        ];
        assert_eq!(
            find_ref_by_suffix(refs, "main"),
            Some("refs/heads/main".to_string())
        );
    }

    #[test]
    fn test_update_state_delegates_to_freshness() {
        let prior = CheckoutRecord::new("u", "main", "main", 0);
        let current = CheckoutRecord::new("u", "main", "main", 1_000);
        let state = UpdateState {
            prior: Some(&prior),
            current: &current,
            refresh_interval: Duration::from_millis(2_000),
        };
        assert!(state.is_up_to_date());

        let state = UpdateState {
            prior: None,
            current: &current,
            refresh_interval: Duration::from_millis(2_000),
        };
        assert!(!state.is_up_to_date());
    }
}

//! Integration tests for the external-process backend. These shell out to
//! the system `git` binary, so they only run with the `integration-tests`
//! feature enabled:
//!
//! ```text
//! cargo test --features integration-tests
//! ```
//!
//! Fixture repositories are still authored through libgit2 for convenience.
#![cfg(feature = "integration-tests")]

use std::path::Path;
use std::time::Duration;

use git2::{Oid, Repository, RepositoryInitOptions, Signature};
use tempfile::TempDir;

use checkout_sync::auth::Authentication;
use checkout_sync::backend::cli::CliBackend;
use checkout_sync::backend::libgit::LibGitBackend;
use checkout_sync::backend::{SyncTarget, UpdateState, VcsBackend};
use checkout_sync::error::Error;
use checkout_sync::ledger::CheckoutRecord;

const DAY: Duration = Duration::from_millis(24 * 60 * 60 * 1000);

fn init_fixture(dir: &Path) -> Repository {
    let mut opts = RepositoryInitOptions::new();
    opts.initial_head("refs/heads/main");
    Repository::init_opts(dir, &opts).unwrap()
}

fn commit_file(repo: &Repository, name: &str, content: &str, message: &str) -> Oid {
    let workdir = repo.workdir().unwrap();
    std::fs::write(workdir.join(name), content).unwrap();
    let mut index = repo.index().unwrap();
    index.add_path(Path::new(name)).unwrap();
    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();
    let sig = Signature::now("Tester", "tester@example.com").unwrap();
    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
    let parents: Vec<&git2::Commit> = parent.iter().collect();
    repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
        .unwrap()
}

fn head_commit(dir: &Path) -> Oid {
    let repo = Repository::open(dir).unwrap();
    let oid = repo.head().unwrap().peel_to_commit().unwrap().id();
    oid
}

fn target<'a>(uri: &'a str, commit: &'a str, branch_or_tag: &'a str) -> SyncTarget<'a> {
    SyncTarget {
        uri,
        commit,
        branch_or_tag,
    }
}

#[test]
fn clone_into_non_empty_directory() {
    let temp = TempDir::new().unwrap();
    let origin_dir = temp.path().join("origin");
    let origin = init_fixture(&origin_dir);
    let tip = commit_file(&origin, "README.md", "hello", "initial");

    // The target directory already exists and contains unrelated files,
    // which is exactly why clone goes through init/remote add/fetch.
    let checkout = temp.path().join("checkout");
    std::fs::create_dir_all(&checkout).unwrap();
    std::fs::write(checkout.join("probe.txt"), "tooling").unwrap();

    let uri = origin_dir.to_str().unwrap();
    CliBackend::new()
        .clone_repository(&checkout, &target(uri, "", "main"), &Authentication::None)
        .unwrap();

    assert_eq!(head_commit(&checkout), tip);
    assert!(checkout.join("probe.txt").exists());
}

#[test]
fn clone_with_empty_ref_fails() {
    let temp = TempDir::new().unwrap();
    let origin_dir = temp.path().join("origin");
    let origin = init_fixture(&origin_dir);
    commit_file(&origin, "README.md", "hello", "initial");

    let checkout = temp.path().join("checkout");
    let uri = origin_dir.to_str().unwrap();
    let err = CliBackend::new()
        .clone_repository(&checkout, &target(uri, "", ""), &Authentication::None)
        .unwrap_err();
    assert!(matches!(err, Error::CloneFailed { .. }));
}

#[test]
fn update_falls_back_to_remote_tracking_ref() {
    let temp = TempDir::new().unwrap();
    let origin_dir = temp.path().join("origin");
    let origin = init_fixture(&origin_dir);
    let feature_tip = commit_file(&origin, "README.md", "v1", "first");
    let feature_commit = origin.find_commit(feature_tip).unwrap();
    origin.branch("feature", &feature_commit, false).unwrap();
    commit_file(&origin, "README.md", "v2", "second");

    let checkout = temp.path().join("checkout");
    let uri = origin_dir.to_str().unwrap();
    let backend = CliBackend::new();
    backend
        .clone_repository(&checkout, &target(uri, "", "main"), &Authentication::None)
        .unwrap();

    let current = CheckoutRecord::new(uri, "feature", "feature", 2_000);
    let state = UpdateState {
        prior: None,
        current: &current,
        refresh_interval: DAY,
    };
    backend
        .update_repository(&checkout, &target(uri, "", "feature"), &state, &Authentication::None)
        .unwrap();

    assert_eq!(head_commit(&checkout), feature_tip);
}

#[test]
fn update_with_unknown_ref_fails_with_ref_not_found() {
    let temp = TempDir::new().unwrap();
    let origin_dir = temp.path().join("origin");
    let origin = init_fixture(&origin_dir);
    commit_file(&origin, "README.md", "v1", "first");

    let checkout = temp.path().join("checkout");
    let uri = origin_dir.to_str().unwrap();
    let backend = CliBackend::new();
    backend
        .clone_repository(&checkout, &target(uri, "", "main"), &Authentication::None)
        .unwrap();

    let current = CheckoutRecord::new(uri, "missing", "missing", 2_000);
    let state = UpdateState {
        prior: None,
        current: &current,
        refresh_interval: DAY,
    };
    let err = backend
        .update_repository(&checkout, &target(uri, "", "missing"), &state, &Authentication::None)
        .unwrap_err();
    assert!(matches!(err, Error::RefNotFound { .. }));
}

/// Both backend variants must end at the same checked-out commit for
/// equivalent inputs.
#[test]
fn backends_produce_equivalent_end_states() {
    let temp = TempDir::new().unwrap();
    let origin_dir = temp.path().join("origin");
    let origin = init_fixture(&origin_dir);
    let tagged = commit_file(&origin, "README.md", "v1", "first");
    let object = origin.find_object(tagged, None).unwrap();
    origin.tag_lightweight("v1.0.0", &object, false).unwrap();
    commit_file(&origin, "README.md", "v2", "second");

    let uri = origin_dir.to_str().unwrap();
    let via_cli = temp.path().join("via-cli");
    let via_lib = temp.path().join("via-lib");

    CliBackend::new()
        .clone_repository(&via_cli, &target(uri, "", "v1.0.0"), &Authentication::None)
        .unwrap();
    LibGitBackend::new()
        .clone_repository(&via_lib, &target(uri, "", "v1.0.0"), &Authentication::None)
        .unwrap();

    assert_eq!(head_commit(&via_cli), head_commit(&via_lib));
    assert_eq!(head_commit(&via_cli), tagged);
}

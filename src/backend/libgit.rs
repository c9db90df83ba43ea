//! # Library Backend
//!
//! Drives synchronization through libgit2 (the `git2` crate), entirely
//! in-process. Unlike the CLI backend, this variant applies the configured
//! [`Authentication`] programmatically: a credentials callback injected into
//! every network operation maps the descriptor to the matching transport
//! credentials, with exactly one strategy active at a time.
//!
//! Pulls are fast-forward only. The working copy is expected to be clean and
//! never diverged; anything that would require a real merge fails, which is
//! the accepted outcome here.

use std::path::Path;

use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{Cred, FetchOptions, ObjectType, RemoteCallbacks, Repository};

use crate::auth::Authentication;
use crate::backend::{find_ref_by_suffix, SyncTarget, UpdateState, VcsBackend};
use crate::error::{Error, Result};

#[derive(Debug, Default)]
pub struct LibGitBackend;

impl LibGitBackend {
    pub fn new() -> Self {
        Self
    }
}

impl VcsBackend for LibGitBackend {
    fn clone_repository(
        &self,
        dir: &Path,
        target: &SyncTarget<'_>,
        auth: &Authentication,
    ) -> Result<()> {
        log::info!(
            "Checking out {} ref {} in {}",
            target.uri,
            target.checkout_ref(),
            dir.display()
        );

        let result = (|| -> Result<()> {
            let mut builder = RepoBuilder::new();
            builder.fetch_options(fetch_options(auth));
            // The desired name may be a tag or a short branch name, which
            // RepoBuilder's branch option rejects; clone the default branch
            // and resolve the desired ref with the shared lookup instead.
            let repo = builder.clone(target.uri, dir)?;
            if !target.commit.is_empty() {
                checkout_refish(&repo, target.commit)?;
            } else if !target.branch_or_tag.is_empty() {
                resolve_and_checkout(&repo, target.branch_or_tag)?;
            }
            Ok(())
        })();

        result.map_err(|e| match e {
            Error::RefNotFound { .. } => e,
            other => Error::CloneFailed {
                uri: target.uri.to_string(),
                dir: dir.to_path_buf(),
                message: other.to_string(),
            },
        })
    }

    fn update_repository(
        &self,
        dir: &Path,
        target: &SyncTarget<'_>,
        state: &UpdateState<'_>,
        auth: &Authentication,
    ) -> Result<()> {
        if state.is_up_to_date() {
            log::debug!("{} is up to date, skipping", target.uri);
            return Ok(());
        }

        let result = (|| -> Result<()> {
            let repo = Repository::open(dir)?;
            let on_local_branch = repo.head().map(|h| h.is_branch()).unwrap_or(false);
            if on_local_branch {
                log::info!("Pulling from {}", target.uri);
                pull(&repo, auth)?;
            }

            log::info!("Checking out ref {} of {}", target.checkout_ref(), target.uri);
            if !target.commit.is_empty() {
                checkout_refish(&repo, target.commit)?;
            } else if !target.branch_or_tag.is_empty() {
                resolve_and_checkout(&repo, target.branch_or_tag)?;
            }
            Ok(())
        })();

        result.map_err(|e| match e {
            Error::RefNotFound { .. } => e,
            other => Error::UpdateFailed {
                uri: target.uri.to_string(),
                dir: dir.to_path_buf(),
                message: other.to_string(),
            },
        })
    }
}

/// Builds fetch options carrying the authentication adapter.
///
/// The credentials callback is the single place the mutually-exclusive
/// [`Authentication`] variants branch into transport configuration.
fn fetch_options(auth: &Authentication) -> FetchOptions<'static> {
    let auth = auth.clone();
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(move |_url, username_from_url, _allowed| {
        let user = username_from_url.unwrap_or("git");
        match &auth {
            Authentication::Basic { username, password } => {
                Cred::userpass_plaintext(username, password)
            }
            Authentication::SshWithPassword { password } => {
                Cred::userpass_plaintext(user, password)
            }
            Authentication::SshWithPublicKey {
                private_key,
                passphrase,
            } => match private_key {
                Some(key) => Cred::ssh_key(user, None, key, passphrase.as_deref()),
                None => Cred::ssh_key_from_agent(user),
            },
            Authentication::None => Cred::default(),
        }
    });
    let mut options = FetchOptions::new();
    options.remote_callbacks(callbacks);
    options
}

/// Checks out an arbitrary refish: ref name, short name, or commit hash.
/// HEAD ends up on the branch when the refish denotes one, detached
/// otherwise.
fn checkout_refish(repo: &Repository, refish: &str) -> Result<()> {
    let (object, reference) = repo.revparse_ext(refish)?;
    let commit = object.peel(ObjectType::Commit)?;
    let mut checkout = CheckoutBuilder::new();
    repo.checkout_tree(&commit, Some(&mut checkout))?;
    match reference.as_ref().and_then(|r| r.name()) {
        Some(name) => repo.set_head(name)?,
        None => repo.set_head_detached(commit.id())?,
    }
    Ok(())
}

/// Exact reference lookup for `branch_or_tag`, falling back to a suffix scan
/// over all known refs. No match is a [`Error::RefNotFound`].
fn resolve_and_checkout(repo: &Repository, branch_or_tag: &str) -> Result<()> {
    if let Ok(reference) = repo.resolve_reference_from_short_name(branch_or_tag) {
        if let Some(name) = reference.name() {
            let name = name.to_string();
            return checkout_refish(repo, &name);
        }
    }
    let mut names = Vec::new();
    for entry in repo.references()? {
        let reference = entry?;
        if let Some(name) = reference.name() {
            names.push(name.to_string());
        }
    }
    match find_ref_by_suffix(names, branch_or_tag) {
        Some(name) => checkout_refish(repo, &name),
        None => Err(Error::RefNotFound {
            name: branch_or_tag.to_string(),
        }),
    }
}

/// Fetches the current branch from `origin` and fast-forwards to it. A pull
/// that would require a real merge fails.
fn pull(repo: &Repository, auth: &Authentication) -> Result<()> {
    let branch_name = repo.head()?.shorthand().unwrap_or("HEAD").to_string();
    let mut remote = repo.find_remote("origin")?;
    let mut options = fetch_options(auth);
    remote.fetch(&[branch_name.as_str()], Some(&mut options), None)?;

    let fetch_head = repo.find_reference("FETCH_HEAD")?;
    let fetch_commit = fetch_head.peel_to_commit()?;
    let annotated = repo.find_annotated_commit(fetch_commit.id())?;
    let (analysis, _) = repo.merge_analysis(&[&annotated])?;

    if analysis.is_up_to_date() {
        return Ok(());
    }
    if analysis.is_fast_forward() {
        let refname = format!("refs/heads/{}", branch_name);
        let mut reference = repo.find_reference(&refname)?;
        reference.set_target(
            fetch_commit.id(),
            &format!("pull: fast-forward to {}", fetch_commit.id()),
        )?;
        repo.set_head(&refname)?;
        repo.checkout_head(Some(CheckoutBuilder::default().force()))?;
        return Ok(());
    }
    Err(Error::Git(git2::Error::from_str(
        "cannot fast-forward; a manual merge would be required",
    )))
}

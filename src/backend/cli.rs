//! # External-Process Backend
//!
//! Drives synchronization purely by invoking the `git` executable as
//! subprocesses, capturing stdout/stderr and treating any non-zero exit as
//! failure. The working directory of every invocation is the target
//! checkout directory.
//!
//! Cloning deliberately avoids the single `git clone` subcommand: the target
//! directory may already contain unrelated tooling-generated files, and
//! `git clone` refuses to run in a non-empty directory. The
//! `init`/`remote add`/`fetch`/`checkout` sequence does not.
//!
//! Authentication is never applied programmatically here; the subprocesses
//! inherit the ambient environment (credential helpers, ssh-agent). A
//! configured [`Authentication`] other than `None` is therefore ignored with
//! a warning.

use std::fs;
use std::path::Path;
use std::process::Command;

use crate::auth::Authentication;
use crate::backend::{find_ref_by_suffix, SyncTarget, UpdateState, VcsBackend, LOCAL_BRANCH_PREFIX};
use crate::error::{Error, Result};

pub struct CliBackend {
    program: String,
}

impl CliBackend {
    pub fn new() -> Self {
        Self {
            program: "git".to_string(),
        }
    }

    /// Overrides the executable name, for tests.
    #[cfg(test)]
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Runs `git <args>` in `dir`, failing on non-zero exit.
    fn run(&self, dir: &Path, args: &[&str]) -> Result<String> {
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .output()?;
        if !output.status.success() {
            return Err(Error::GitCommand {
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    /// Runs `git <args>` in `dir`; a non-zero exit yields `Ok(None)` instead
    /// of an error. Used where failure is an expected answer, such as
    /// `rev-parse --verify` and `symbolic-ref HEAD` on a detached checkout.
    fn try_run(&self, dir: &Path, args: &[&str]) -> Result<Option<String>> {
        let output = Command::new(&self.program)
            .args(args)
            .current_dir(dir)
            .output()?;
        if output.status.success() {
            Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
        } else {
            Ok(None)
        }
    }

    /// Custom authentication cannot be forwarded to git subprocesses; warn
    /// rather than fail so ambient credentials still get a chance.
    fn check_auth(auth: &Authentication) {
        if auth.is_configured() {
            log::warn!(
                "Configured authentication is incompatible with the git CLI backend and is ignored; \
                 relying on the ambient environment (credential helpers, ssh-agent)"
            );
        }
    }

    /// Resolves `branch_or_tag` to something `git checkout` accepts: the
    /// literal name when `rev-parse --verify` succeeds, otherwise the first
    /// known ref whose fully-qualified name ends with it.
    fn resolve_ref(&self, dir: &Path, branch_or_tag: &str) -> Result<String> {
        if self
            .try_run(dir, &["rev-parse", "--verify", branch_or_tag])?
            .is_some()
        {
            return Ok(branch_or_tag.to_string());
        }
        let out = self.run(dir, &["show-ref"])?;
        find_ref_by_suffix(parse_show_ref(&out), branch_or_tag).ok_or_else(|| Error::RefNotFound {
            name: branch_or_tag.to_string(),
        })
    }
}

impl Default for CliBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl VcsBackend for CliBackend {
    fn clone_repository(
        &self,
        dir: &Path,
        target: &SyncTarget<'_>,
        auth: &Authentication,
    ) -> Result<()> {
        Self::check_auth(auth);
        log::info!(
            "Checking out {} ref {} in {}",
            target.uri,
            target.checkout_ref(),
            dir.display()
        );

        let result = (|| -> Result<()> {
            fs::create_dir_all(dir)?;
            self.run(dir, &["init"])?;
            self.run(dir, &["remote", "add", "origin", target.uri])?;
            self.run(dir, &["fetch"])?;
            let checkout = target.checkout_ref();
            if checkout.is_empty() {
                return Err(Error::Config {
                    message: "no branch, tag, or commit requested; the git CLI backend cannot \
                              determine the remote default branch"
                        .to_string(),
                });
            }
            self.run(dir, &["checkout", checkout])?;
            Ok(())
        })();

        result.map_err(|e| Error::CloneFailed {
            uri: target.uri.to_string(),
            dir: dir.to_path_buf(),
            message: e.to_string(),
        })
    }

    fn update_repository(
        &self,
        dir: &Path,
        target: &SyncTarget<'_>,
        state: &UpdateState<'_>,
        auth: &Authentication,
    ) -> Result<()> {
        Self::check_auth(auth);
        if state.is_up_to_date() {
            log::debug!("{} is up to date, skipping", target.uri);
            return Ok(());
        }

        let result = (|| -> Result<()> {
            // Non-zero exit means detached HEAD, not an error.
            let head = self.try_run(dir, &["symbolic-ref", "HEAD"])?;
            let on_local_branch = head
                .as_deref()
                .is_some_and(|h| h.trim().starts_with(LOCAL_BRANCH_PREFIX));
            if on_local_branch {
                log::info!("Pulling from {}", target.uri);
                self.run(dir, &["pull", "--ff-only"])?;
            }

            log::info!("Checking out ref {} of {}", target.checkout_ref(), target.uri);
            if !target.commit.is_empty() {
                self.run(dir, &["checkout", target.commit])?;
            } else if !target.branch_or_tag.is_empty() {
                let resolved = self.resolve_ref(dir, target.branch_or_tag)?;
                self.run(dir, &["checkout", &resolved])?;
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

/// Extracts the ref-name field from `git show-ref` output lines
/// (`<hash> <refname>`).
fn parse_show_ref(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.split_whitespace().nth(1))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_show_ref() {
        let out = "\
2ef7bde608ce5404e97d5f042f95f89f1c232871 refs/heads/develop
4a0a19218e082a343a1b17e5333409af9d98f0f5 refs/remotes/origin/main
8843d7f92416211de9ebb963ff4ce28125932878 refs/tags/v1.0.0
";
        assert_eq!(
            parse_show_ref(out),
            vec![
                "refs/heads/develop".to_string(),
                "refs/remotes/origin/main".to_string(),
                "refs/tags/v1.0.0".to_string(),
            ]
        );
    }

    #[test]
    fn test_parse_show_ref_ignores_malformed_lines() {
        assert!(parse_show_ref("garbage\n\n").is_empty());
    }

    #[test]
    fn test_show_ref_suffix_resolution() {
        let out = "4a0a19218e082a343a1b17e5333409af9d98f0f5 refs/remotes/origin/main\n";
        let resolved = find_ref_by_suffix(parse_show_ref(out), "main");
        assert_eq!(resolved, Some("refs/remotes/origin/main".to_string()));
    }

    #[test]
    fn test_check_auth_warns_when_configured() {
        testing_logger::setup();
        let mut auth = Authentication::default();
        CliBackend::check_auth(&auth);
        auth.basic("alice", "s3cret");
        CliBackend::check_auth(&auth);
        testing_logger::validate(|captured| {
            let warnings: Vec<_> = captured
                .iter()
                .filter(|entry| entry.level == log::Level::Warn)
                .collect();
            assert_eq!(warnings.len(), 1);
            assert!(warnings[0].body.contains("ignored"));
        });
    }

    #[test]
    fn test_run_reports_stderr_on_failure() {
        // `false` ignores its arguments and always exits non-zero.
        let backend = CliBackend::with_program("false");
        let err = backend
            .run(Path::new("."), &["checkout", "main"])
            .unwrap_err();
        match err {
            Error::GitCommand { command, .. } => assert_eq!(command, "checkout main"),
            other => panic!("unexpected error: {other}"),
        }
    }
}

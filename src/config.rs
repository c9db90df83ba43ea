//! # Configuration Schema and Parsing
//!
//! Data structures for the `checkout-sync.yaml` configuration file: the
//! process-wide synchronization settings and the per-repository entries the
//! engine consumes. This is the collaborator-supplied surface described by
//! the synchronization design; the engine itself only ever sees fully
//! resolved [`RepositoryDescriptor`] values.
//!
//! A minimal configuration looks like:
//!
//! ```yaml
//! checkouts-directory: .checkouts
//! repositories:
//!   - name: utils
//!     uri: https://example.com/utils.git
//!     branch: main
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::auth::Authentication;
use crate::error::{Error, Result};

/// Default refresh interval: 24 hours.
pub const DEFAULT_REFRESH_INTERVAL_MILLIS: u64 = 24 * 60 * 60 * 1000;

fn default_refresh_interval_millis() -> u64 {
    DEFAULT_REFRESH_INTERVAL_MILLIS
}

/// Which version-control backend performs clone/update operations.
///
/// Selected once per process; never mixed within a synchronization call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// In-process library client (libgit2).
    #[default]
    Library,
    /// External `git` executable driven through subprocesses.
    Cli,
}

/// One repository to synchronize.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct RepoEntry {
    /// Logical name; doubles as the default checkout directory name.
    pub name: String,
    /// Repository URI, in any scheme the active backend understands.
    pub uri: String,
    /// Branch to track. Mutually exclusive with `tag`.
    #[serde(default)]
    pub branch: Option<String>,
    /// Tag to check out. Mutually exclusive with `branch`.
    #[serde(default)]
    pub tag: Option<String>,
    /// Exact commit pin. Takes precedence over `branch`/`tag` at checkout.
    #[serde(default)]
    pub commit: Option<String>,
    /// Explicit checkout directory, overriding `<checkouts>/<name>`.
    #[serde(default)]
    pub directory: Option<PathBuf>,
    /// Per-repository credentials, overriding the default authentication.
    #[serde(default)]
    pub authentication: Option<Authentication>,
    /// Local directory satisfying this repository instead of a checkout.
    #[serde(default)]
    pub local_override: Option<PathBuf>,
}

/// Process-wide synchronization configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct SyncConfig {
    /// Root directory for checkouts; also holds the ledger file.
    pub checkouts_directory: PathBuf,
    /// How long a prior synchronization stays fresh.
    #[serde(default = "default_refresh_interval_millis")]
    pub refresh_interval_millis: u64,
    /// Backend variant to use for every repository this process.
    #[serde(default)]
    pub backend: BackendKind,
    /// Credentials applied when an entry configures none.
    #[serde(default)]
    pub default_authentication: Option<Authentication>,
    /// Directories scanned for local overrides matching repository names.
    #[serde(default)]
    pub auto_override_dirs: Vec<PathBuf>,
    #[serde(default)]
    pub repositories: Vec<RepoEntry>,
}

impl SyncConfig {
    /// Parses and validates a YAML configuration string.
    pub fn parse(yaml: &str) -> Result<Self> {
        let config: SyncConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_millis)
    }

    /// Path of the persisted ledger inside the checkouts root.
    pub fn ledger_path(&self) -> PathBuf {
        self.checkouts_directory.join(crate::ledger::LEDGER_FILE_NAME)
    }

    fn validate(&self) -> Result<()> {
        for entry in &self.repositories {
            if entry.name.is_empty() {
                return Err(Error::Config {
                    message: "repository entry is missing a name".to_string(),
                });
            }
            if entry.uri.is_empty() {
                return Err(Error::Config {
                    message: format!("repository {} is missing a uri", entry.name),
                });
            }
            // scp-like and plain-path URIs are legal for git but not for the
            // url crate, so only strict schemes are parsed.
            if entry.uri.starts_with("http://")
                || entry.uri.starts_with("https://")
                || entry.uri.starts_with("ssh://")
            {
                url::Url::parse(&entry.uri)?;
            }
            if entry.branch.is_some() && entry.tag.is_some() {
                return Err(Error::Config {
                    message: format!(
                        "repository {} sets both branch and tag; use at most one",
                        entry.name
                    ),
                });
            }
        }
        Ok(())
    }
}

impl RepoEntry {
    /// Resolves this entry into a full descriptor: checkout directory under
    /// the checkouts root unless overridden, entry credentials falling back
    /// to the configured default.
    pub fn to_descriptor(&self, config: &SyncConfig) -> RepositoryDescriptor {
        let checkout_directory = self
            .directory
            .clone()
            .unwrap_or_else(|| config.checkouts_directory.join(&self.name));
        let authentication = self
            .authentication
            .clone()
            .or_else(|| config.default_authentication.clone())
            .unwrap_or_default();
        RepositoryDescriptor {
            uri: self.uri.clone(),
            branch: self.branch.clone(),
            tag: self.tag.clone(),
            commit: self.commit.clone(),
            checkout_directory,
            authentication,
        }
    }
}

/// A fully resolved synchronization target, handed to the engine per call.
#[derive(Debug, Clone)]
pub struct RepositoryDescriptor {
    pub uri: String,
    pub branch: Option<String>,
    pub tag: Option<String>,
    pub commit: Option<String>,
    pub checkout_directory: PathBuf,
    pub authentication: Authentication,
}

impl RepositoryDescriptor {
    /// The textual desired ref: commit if pinned, else tag, else branch,
    /// else empty meaning "default branch".
    pub fn desired_ref(&self) -> &str {
        if let Some(commit) = self.commit.as_deref() {
            if !commit.is_empty() {
                return commit;
            }
        }
        self.branch_or_tag()
    }

    /// The branch-or-tag name, independent of any commit pin.
    pub fn branch_or_tag(&self) -> &str {
        self.tag
            .as_deref()
            .or(self.branch.as_deref())
            .unwrap_or("")
    }

    /// The pinned commit, or empty when none is pinned.
    pub fn commit(&self) -> &str {
        self.commit.as_deref().unwrap_or("")
    }
}

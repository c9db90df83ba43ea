//! # Error Handling
//!
//! Centralized error handling for `checkout-sync`, built on `thiserror`.
//!
//! Synchronization failures are always wrapped with the originating URI and
//! checkout directory so that a host orchestrator can report which repository
//! broke. Ref-resolution failures (`RefNotFound`) are kept distinct from
//! transport failures so callers can surface a clear "does this branch or tag
//! exist?" message instead of a generic network error.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for checkout-sync operations
#[derive(Error, Debug)]
pub enum Error {
    /// A fresh clone of a repository failed.
    #[error("Unable to clone {uri} into {}: {message}", dir.display())]
    CloneFailed {
        uri: String,
        dir: PathBuf,
        message: String,
    },

    /// An incremental update of an existing checkout failed.
    #[error("Unable to update {uri} in {}: {message}", dir.display())]
    UpdateFailed {
        uri: String,
        dir: PathBuf,
        message: String,
    },

    /// The desired branch or tag does not exist in the repository, even after
    /// the suffix-matching fallback over all known refs.
    #[error("Branch or tag {name} not found")]
    RefNotFound { name: String },

    /// A `git` subprocess exited with a non-zero status.
    #[error("git {command} failed: {stderr}")]
    GitCommand { command: String, stderr: String },

    /// Reading or writing the checkout ledger file failed.
    #[error("Unable to {operation} checkout ledger at {}: {source}", path.display())]
    LedgerIo {
        operation: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    /// More than one local override directory matches a repository name.
    #[error("More than one directory named {name} exists in auto override directories: {candidates:?}")]
    AmbiguousLocalOverride {
        name: String,
        candidates: Vec<PathBuf>,
    },

    /// The synchronization configuration is invalid.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// An in-process git operation failed, wrapped from `git2::Error`.
    #[error("Git error: {0}")]
    Git(#[from] git2::Error),

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML parsing error, wrapped from `serde_yaml::Error`.
    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A URL parsing error, wrapped from `url::ParseError`.
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_clone_failed() {
        let error = Error::CloneFailed {
            uri: "https://example.com/repo.git".to_string(),
            dir: PathBuf::from("/tmp/checkouts/repo"),
            message: "fetch failed".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Unable to clone"));
        assert!(display.contains("https://example.com/repo.git"));
        assert!(display.contains("/tmp/checkouts/repo"));
        assert!(display.contains("fetch failed"));
    }

    #[test]
    fn test_error_display_update_failed() {
        let error = Error::UpdateFailed {
            uri: "https://example.com/repo.git".to_string(),
            dir: PathBuf::from("/tmp/checkouts/repo"),
            message: "pull failed".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Unable to update"));
        assert!(display.contains("pull failed"));
    }

    #[test]
    fn test_error_display_ref_not_found() {
        let error = Error::RefNotFound {
            name: "release/1.x".to_string(),
        };
        assert_eq!(format!("{}", error), "Branch or tag release/1.x not found");
    }

    #[test]
    fn test_error_display_git_command() {
        let error = Error::GitCommand {
            command: "rev-parse --verify main".to_string(),
            stderr: "fatal: Needed a single revision".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("git rev-parse --verify main failed"));
        assert!(display.contains("Needed a single revision"));
    }

    #[test]
    fn test_error_display_ambiguous_local_override() {
        let error = Error::AmbiguousLocalOverride {
            name: "utils".to_string(),
            candidates: vec![PathBuf::from("/a/utils"), PathBuf::from("/b/utils")],
        };
        let display = format!("{}", error);
        assert!(display.contains("More than one directory named utils"));
        assert!(display.contains("/a/utils"));
    }

    #[test]
    fn test_error_from_io_error() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let error: Error = io_error.into();
        let display = format!("{}", error);
        assert!(display.contains("I/O error"));
        assert!(display.contains("File not found"));
    }

    #[test]
    fn test_error_from_yaml_error() {
        let yaml_str = "invalid: [unclosed";
        let yaml_error = serde_yaml::from_str::<serde_yaml::Value>(yaml_str).unwrap_err();
        let error: Error = yaml_error.into();
        assert!(format!("{}", error).contains("YAML parsing error"));
    }
}

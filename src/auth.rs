//! # Authentication Descriptors
//!
//! A closed set of mutually exclusive credential strategies attached to a
//! repository. The descriptor only shuttles already-obtained secrets to the
//! backend; credential storage and management are out of scope.
//!
//! The variants mirror a single mutable slot: setting any strategy replaces
//! whatever was configured before (last write wins, never additive).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Credential strategy for a repository.
///
/// Only the library backend applies these programmatically; the CLI backend
/// relies on the ambient environment (credential helpers, ssh-agent) and
/// warns when a non-`None` descriptor is configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Authentication {
    /// No explicit credentials; the transport's defaults apply.
    #[default]
    None,

    /// Username/password credentials, typically for HTTPS remotes.
    Basic { username: String, password: String },

    /// SSH public-key authentication. When `private_key` is unset, the
    /// ssh-agent supplies the identity.
    SshWithPublicKey {
        #[serde(default)]
        private_key: Option<PathBuf>,
        #[serde(default)]
        passphrase: Option<String>,
    },

    /// SSH with an interactive-style password.
    SshWithPassword { password: String },
}

impl Authentication {
    /// Clears any configured strategy.
    pub fn none(&mut self) {
        *self = Authentication::None;
    }

    /// Configures username/password credentials, clearing any other strategy.
    pub fn basic(&mut self, username: impl Into<String>, password: impl Into<String>) {
        *self = Authentication::Basic {
            username: username.into(),
            password: password.into(),
        };
    }

    /// Configures SSH public-key authentication, clearing any other strategy.
    pub fn ssh_with_public_key(&mut self, private_key: Option<PathBuf>, passphrase: Option<String>) {
        *self = Authentication::SshWithPublicKey {
            private_key,
            passphrase,
        };
    }

    /// Configures SSH password authentication, clearing any other strategy.
    pub fn ssh_with_password(&mut self, password: impl Into<String>) {
        *self = Authentication::SshWithPassword {
            password: password.into(),
        };
    }

    /// Whether the user configured anything beyond the default.
    pub fn is_configured(&self) -> bool {
        !matches!(self, Authentication::None)
    }
}

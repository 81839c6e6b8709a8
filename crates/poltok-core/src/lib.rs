//! Shared configuration and account-registry types for the poltok
//! collection pipeline.
//!
//! This crate owns everything the other crates agree on: the application
//! configuration loaded from the environment, the account registry loaded
//! from YAML, and the retrieval kinds the collector knows how to run.

pub mod app_config;
pub mod config;
pub mod registry;

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use app_config::AppConfig;
pub use config::{build_app_config, load_app_config, load_app_config_from_env};
pub use registry::{load_accounts, AccountConfig, AccountsFile, Category};

/// Errors produced while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable was not set.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// An environment variable was set but could not be parsed.
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    /// The accounts file could not be read from disk.
    #[error("failed to read accounts file {path}: {source}")]
    AccountsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The accounts file was not valid YAML for the expected shape.
    #[error("failed to parse accounts file: {0}")]
    AccountsFileParse(#[from] serde_yaml::Error),

    /// The configuration parsed but failed a consistency check.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

/// The kinds of data the collector can retrieve for an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Retrieval {
    /// Public profile fields for the account itself.
    Profile,
    /// The list of accounts this account follows.
    Following,
    /// Videos the account has reposted.
    Reposted,
    /// Videos posted by the account, queried over a date window.
    Videos,
}

impl Retrieval {
    /// Stable slug used in output paths and log fields.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Retrieval::Profile => "profile",
            Retrieval::Following => "following",
            Retrieval::Reposted => "reposted",
            Retrieval::Videos => "videos",
        }
    }
}

impl fmt::Display for Retrieval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retrieval_slugs_are_stable() {
        assert_eq!(Retrieval::Profile.as_str(), "profile");
        assert_eq!(Retrieval::Following.as_str(), "following");
        assert_eq!(Retrieval::Reposted.as_str(), "reposted");
        assert_eq!(Retrieval::Videos.as_str(), "videos");
    }

    #[test]
    fn retrieval_serializes_lowercase() {
        let json = serde_json::to_string(&Retrieval::Reposted).unwrap();
        assert_eq!(json, "\"reposted\"");
    }

    #[test]
    fn config_error_messages_name_the_variable() {
        let err = ConfigError::MissingEnvVar("TIKTOK_ACCESS_TOKEN".to_string());
        assert!(err.to_string().contains("TIKTOK_ACCESS_TOKEN"));

        let err = ConfigError::InvalidEnvVar {
            var: "POLTOK_MAX_RETRIES".to_string(),
            reason: "must be an unsigned integer".to_string(),
        };
        assert!(err.to_string().contains("POLTOK_MAX_RETRIES"));
        assert!(err.to_string().contains("unsigned integer"));
    }
}

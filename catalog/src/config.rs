//! Configuration for the catalog binary.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default location of the durable store document
pub const DEFAULT_STORAGE_PATH: &str = ".catalog-storage.json";
/// Default users endpoint for the fetch scenario
pub const DEFAULT_USERS_URL: &str = "https://jsonplaceholder.typicode.com/users";
/// Default posts endpoint for the fetch scenario
pub const DEFAULT_POSTS_URL: &str = "https://jsonplaceholder.typicode.com/posts?_limit=5";

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable is set but cannot be parsed
    #[error("invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        /// Variable name
        name: &'static str,
        /// Raw value found
        value: String,
        /// Why it was rejected
        reason: String,
    },
}

/// Catalog configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON document backing persisted state (`CATALOG_STORAGE_PATH`)
    pub storage_path: PathBuf,
    /// Users endpoint (`CATALOG_USERS_URL`)
    pub users_url: String,
    /// Posts endpoint (`CATALOG_POSTS_URL`)
    pub posts_url: String,
    /// Per-request transport timeout in seconds (`CATALOG_REQUEST_TIMEOUT_SECS`)
    pub request_timeout_secs: u64,
    /// How long to wait for a fetch cycle to settle (`CATALOG_SETTLE_TIMEOUT_SECS`)
    pub settle_timeout_secs: u64,
    /// Graceful shutdown timeout in seconds (`CATALOG_SHUTDOWN_TIMEOUT_SECS`)
    pub shutdown_timeout_secs: u64,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from(DEFAULT_STORAGE_PATH),
            users_url: DEFAULT_USERS_URL.to_string(),
            posts_url: DEFAULT_POSTS_URL.to_string(),
            request_timeout_secs: 10,
            settle_timeout_secs: 15,
            shutdown_timeout_secs: 5,
        }
    }
}

impl CatalogConfig {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through `lookup`, falling back to defaults for
    /// anything it does not provide.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if a numeric variable does not parse.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            storage_path: lookup("CATALOG_STORAGE_PATH")
                .map_or(defaults.storage_path, PathBuf::from),
            users_url: lookup("CATALOG_USERS_URL").unwrap_or(defaults.users_url),
            posts_url: lookup("CATALOG_POSTS_URL").unwrap_or(defaults.posts_url),
            request_timeout_secs: seconds(
                &lookup,
                "CATALOG_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout_secs,
            )?,
            settle_timeout_secs: seconds(
                &lookup,
                "CATALOG_SETTLE_TIMEOUT_SECS",
                defaults.settle_timeout_secs,
            )?,
            shutdown_timeout_secs: seconds(
                &lookup,
                "CATALOG_SHUTDOWN_TIMEOUT_SECS",
                defaults.shutdown_timeout_secs,
            )?,
        })
    }

    /// Override the storage document location
    #[must_use]
    pub fn with_storage_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.storage_path = path.into();
        self
    }

    /// Per-request transport timeout
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Time allowed for a fetch cycle to settle
    #[must_use]
    pub const fn settle_timeout(&self) -> Duration {
        Duration::from_secs(self.settle_timeout_secs)
    }

    /// Graceful shutdown timeout
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

fn seconds(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
    default: u64,
) -> Result<u64, ConfigError> {
    let Some(raw) = lookup(name) else {
        return Ok(default);
    };

    match raw.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            name,
            value: raw,
            reason: "must be at least 1 second".to_string(),
        }),
        Ok(secs) => Ok(secs),
        Err(e) => Err(ConfigError::Invalid {
            name,
            value: raw,
            reason: e.to_string(),
        }),
    }
}

//! Configuration
//!
//! Layered with the `config` crate: serde defaults, then a TOML file, then `UUIDFS__*`
//! environment variables.

pub mod facade;
pub mod merge;
pub mod paths;
pub mod sources;

pub use facade::ConfigLoader;
pub use paths::xdg_root as xdg;

use crate::error::ApiError;
use crate::logging::LoggingConfig;
use serde::{Deserialize, Serialize};

pub const DEFAULT_BASE_URL: &str = "https://api.rotur.dev";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ROOT_PREFIX: &str = "origin";

/// Top-level client configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub paths: PathConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ClientConfig {
    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ApiError> {
        let url = self.remote.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ApiError::ConfigError(format!(
                "remote.base_url must be an http(s) URL, got {:?}",
                self.remote.base_url
            )));
        }
        if self.remote.timeout_secs == 0 {
            return Err(ApiError::ConfigError(
                "remote.timeout_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Remote store connection settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Credential sent as the `auth` query parameter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Per-request timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Acting principal, used when the index payload does not name one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub principal: Option<String>,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_secs: default_timeout_secs(),
            principal: None,
        }
    }
}

/// Path key space settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathConfig {
    /// Remote root segments stripped from every index key
    #[serde(default = "default_root_prefix")]
    pub root_prefix: String,
}

fn default_root_prefix() -> String {
    DEFAULT_ROOT_PREFIX.to_string()
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            root_prefix: default_root_prefix(),
        }
    }
}

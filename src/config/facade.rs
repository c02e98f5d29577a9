//! ConfigLoader facade delegating to merge service.

use super::merge::service::MergeService;
use super::ClientConfig;
use crate::error::ApiError;
use std::path::Path;

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load from the XDG config file (when present) and environment.
    pub fn load() -> Result<ClientConfig, ApiError> {
        let config = MergeService::load(None)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a specific file with environment overlay.
    pub fn load_from_file(path: &Path) -> Result<ClientConfig, ApiError> {
        let config = MergeService::load(Some(path))?;
        config.validate()?;
        Ok(config)
    }

    /// Create default configuration.
    pub fn default() -> ClientConfig {
        ClientConfig::default()
    }
}

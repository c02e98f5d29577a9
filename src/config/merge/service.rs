//! MergeService: orchestrates sources and deserializes to ClientConfig.

use crate::config::sources::{environment, file};
use crate::config::ClientConfig;
use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError};
use std::path::Path;

/// Merge service for config composition.
pub struct MergeService;

impl MergeService {
    /// Precedence: serde defaults (lowest) -> file -> environment (highest).
    ///
    /// An explicit file must exist; the XDG file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<ClientConfig, ConfigError> {
        let builder = Self::builder();
        let builder = match explicit {
            Some(path) => file::add_explicit(builder, path)?,
            None => file::add_global(builder)?,
        };
        let builder = environment::add_to_builder(builder)?;

        let config = builder.build()?;
        config.try_deserialize()
    }

    fn builder() -> ConfigBuilder<DefaultState> {
        Config::builder()
    }
}

//! Environment variable source: UUIDFS__ prefix with __ separator

use config::builder::DefaultState;
use config::ConfigBuilder;
use config::ConfigError;
use config::Environment;

/// Shorthand variable for the remote credential
pub const TOKEN_VAR: &str = "UUIDFS_TOKEN";

/// Add environment variable overlay to builder.
/// Uses UUIDFS prefix and __ as separator for nested keys (UUIDFS__REMOTE__TOKEN).
pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = builder.add_source(
        Environment::with_prefix("UUIDFS")
            .separator("__")
            .try_parsing(true),
    );
    let token = std::env::var(TOKEN_VAR).ok().filter(|t| !t.is_empty());
    builder.set_override_option("remote.token", token)
}

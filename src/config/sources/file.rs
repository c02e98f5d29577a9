//! TOML file sources: explicit path, or the XDG global config file.

use crate::config::xdg;
use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use std::path::Path;

/// Add a required config file.
pub fn add_explicit(
    builder: ConfigBuilder<DefaultState>,
    path: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    Ok(builder.add_source(File::from(path).format(FileFormat::Toml).required(true)))
}

/// Add `$XDG_CONFIG_HOME/uuidfs/config.toml` when it exists.
pub fn add_global(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    match xdg::config_file_path() {
        Some(path) => Ok(builder.add_source(
            File::from(path.as_path())
                .format(FileFormat::Toml)
                .required(false),
        )),
        None => Ok(builder),
    }
}

//! XDG Base Directory utilities for client configuration.

use std::path::PathBuf;

/// Get XDG config home directory
///
/// Returns `$XDG_CONFIG_HOME` if set, otherwise defaults to `$HOME/.config`
pub fn config_home() -> Option<PathBuf> {
    if let Ok(xdg_config_home) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg_config_home.is_empty() {
            return Some(PathBuf::from(xdg_config_home));
        }
    }

    std::env::var("HOME")
        .ok()
        .map(|home| PathBuf::from(home).join(".config"))
}

/// Global config file path: `$XDG_CONFIG_HOME/uuidfs/config.toml`
pub fn config_file_path() -> Option<PathBuf> {
    config_home().map(|home| home.join("uuidfs").join("config.toml"))
}

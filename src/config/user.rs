//! User configuration location for irodori.
//!
//! User config location: $XDG_CONFIG_HOME/irodori/irodori.toml
//! Fallback: the platform config directory reported by `dirs`.

use std::path::PathBuf;

const CONFIG_DIR: &str = "irodori";
const CONFIG_FILE: &str = "irodori.toml";

/// Returns the path to the user configuration file.
///
/// The path is determined by:
/// 1. If $XDG_CONFIG_HOME is set: $XDG_CONFIG_HOME/irodori/irodori.toml
/// 2. Otherwise: `dirs::config_dir()`/irodori/irodori.toml
///
/// Returns None if no config directory can be determined.
pub fn user_config_path() -> Option<PathBuf> {
    if let Ok(xdg_config) = std::env::var("XDG_CONFIG_HOME")
        && !xdg_config.is_empty()
    {
        return Some(PathBuf::from(xdg_config).join(CONFIG_DIR).join(CONFIG_FILE));
    }

    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILE))
}

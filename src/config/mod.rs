pub mod settings;
pub mod user;

pub use settings::{AnalysisEngine, ColorizationSettings, SettingsFile, SettingsStyleResolver};
pub use user::user_config_path;

use std::path::Path;

use crate::error::{ColorizeError, ColorizeResult};

const LOG_TARGET: &str = "irodori::config";

/// Parse one settings file from TOML text, keeping absent keys unset.
pub fn parse_settings_file(content: &str) -> ColorizeResult<SettingsFile> {
    toml::from_str(content).map_err(|e| ColorizeError::config(e.to_string()))
}

/// Parse settings from TOML text, filling absent keys with defaults.
pub fn parse_settings(content: &str) -> ColorizeResult<ColorizationSettings> {
    parse_settings_file(content).map(ColorizationSettings::from)
}

/// Load settings from `path`, returning the error on failure.
pub async fn load_settings_strict(path: &Path) -> ColorizeResult<ColorizationSettings> {
    let content = tokio::fs::read_to_string(path).await?;
    parse_settings(&content)
}

/// Load one settings file. `None` when the file is missing or malformed.
pub async fn load_settings_file(path: &Path) -> Option<SettingsFile> {
    let loaded = match tokio::fs::read_to_string(path).await {
        Ok(content) => parse_settings_file(&content),
        Err(e) => Err(ColorizeError::from(e)),
    };
    match loaded {
        Ok(file) => Some(file),
        Err(ColorizeError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!(
                target: LOG_TARGET,
                "No settings at {}, using defaults",
                path.display()
            );
            None
        }
        Err(e) => {
            log::warn!(
                target: LOG_TARGET,
                "Failed to load settings from {}: {}; using defaults",
                path.display(),
                e
            );
            None
        }
    }
}

/// Load settings from `path`, falling back to defaults when the file is
/// missing or malformed.
pub async fn load_settings(path: &Path) -> ColorizationSettings {
    load_settings_file(path)
        .await
        .unwrap_or_default()
        .into()
}

/// Layer two settings files, preferring values set in `primary`.
///
/// Keys unset in `primary` keep the value from `fallback`; style tables are
/// merged per category.
pub fn merge_settings(
    fallback: Option<SettingsFile>,
    primary: Option<SettingsFile>,
) -> Option<SettingsFile> {
    match (fallback, primary) {
        (None, None) => None,
        (Some(settings), None) => Some(settings),
        (None, Some(settings)) => Some(settings),
        (Some(fallback), Some(primary)) => {
            let mut styles = fallback.styles;
            for (name, style) in primary.styles {
                styles.insert(name, style);
            }
            Some(SettingsFile {
                enhanced_colorization: primary
                    .enhanced_colorization
                    .or(fallback.enhanced_colorization),
                analysis_engine: primary.analysis_engine.or(fallback.analysis_engine),
                dim_inactive_regions: primary
                    .dim_inactive_regions
                    .or(fallback.dim_inactive_regions),
                inactive_region_opacity: primary
                    .inactive_region_opacity
                    .or(fallback.inactive_region_opacity),
                inactive_region_foreground: primary
                    .inactive_region_foreground
                    .or(fallback.inactive_region_foreground),
                inactive_region_background: primary
                    .inactive_region_background
                    .or(fallback.inactive_region_background),
                styles,
            })
        }
    }
}

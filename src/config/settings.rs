use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::domain::{Category, StyleResolver, TokenStyle};

/// Lower bound for the inactive region opacity.
pub const MIN_INACTIVE_OPACITY: f32 = 0.1;
/// Upper bound for the inactive region opacity.
pub const MAX_INACTIVE_OPACITY: f32 = 1.0;

/// Which analysis engine produces classification results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AnalysisEngine {
    #[default]
    Default,
    TagParser,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ColorizationSettings {
    pub enhanced_colorization: bool,
    pub analysis_engine: AnalysisEngine,
    pub dim_inactive_regions: bool,
    pub inactive_region_opacity: f32,
    pub inactive_region_foreground: Option<String>,
    pub inactive_region_background: Option<String>,
    /// Styles keyed by category name (`"keyword"`, `"memberField"`, ...)
    #[serde(deserialize_with = "deserialize_styles")]
    pub styles: HashMap<String, TokenStyle>,
}

impl Default for ColorizationSettings {
    fn default() -> Self {
        Self {
            enhanced_colorization: true,
            analysis_engine: AnalysisEngine::Default,
            dim_inactive_regions: true,
            inactive_region_opacity: 0.55,
            inactive_region_foreground: None,
            inactive_region_background: None,
            styles: HashMap::new(),
        }
    }
}

impl ColorizationSettings {
    /// Category handles are only created when both flags allow it.
    pub fn token_colorization_enabled(&self) -> bool {
        self.enhanced_colorization && self.analysis_engine == AnalysisEngine::Default
    }

    pub fn inactive_dimming_enabled(&self) -> bool {
        self.dim_inactive_regions
    }

    /// Opacity clamped into the supported range. NaN falls back to opaque.
    pub fn inactive_opacity(&self) -> f32 {
        if self.inactive_region_opacity.is_nan() {
            return MAX_INACTIVE_OPACITY;
        }
        self.inactive_region_opacity
            .clamp(MIN_INACTIVE_OPACITY, MAX_INACTIVE_OPACITY)
    }
}

/// One settings file as written. Keys left out stay `None` so a layered
/// configuration can tell them apart from explicit values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsFile {
    pub enhanced_colorization: Option<bool>,
    pub analysis_engine: Option<AnalysisEngine>,
    pub dim_inactive_regions: Option<bool>,
    pub inactive_region_opacity: Option<f32>,
    pub inactive_region_foreground: Option<String>,
    pub inactive_region_background: Option<String>,
    #[serde(deserialize_with = "deserialize_styles")]
    pub styles: HashMap<String, TokenStyle>,
}

impl From<SettingsFile> for ColorizationSettings {
    fn from(file: SettingsFile) -> Self {
        let defaults = ColorizationSettings::default();
        Self {
            enhanced_colorization: file
                .enhanced_colorization
                .unwrap_or(defaults.enhanced_colorization),
            analysis_engine: file.analysis_engine.unwrap_or(defaults.analysis_engine),
            dim_inactive_regions: file
                .dim_inactive_regions
                .unwrap_or(defaults.dim_inactive_regions),
            inactive_region_opacity: file
                .inactive_region_opacity
                .unwrap_or(defaults.inactive_region_opacity),
            inactive_region_foreground: file.inactive_region_foreground,
            inactive_region_background: file.inactive_region_background,
            styles: file.styles,
        }
    }
}

/// Style table that drops malformed entries instead of failing the whole
/// settings file.
fn deserialize_styles<'de, D>(deserializer: D) -> Result<HashMap<String, TokenStyle>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = HashMap::<String, toml::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(name, value)| match value.try_into::<TokenStyle>() {
            Ok(style) => Some((name, style)),
            Err(e) => {
                log::warn!(target: "irodori::config", "Ignoring style for {}: {}", name, e);
                None
            }
        })
        .collect())
}

/// Resolves styles from the `styles` table of [`ColorizationSettings`].
#[derive(Debug, Clone, Default)]
pub struct SettingsStyleResolver {
    styles: HashMap<Category, TokenStyle>,
}

impl SettingsStyleResolver {
    pub fn new(settings: &ColorizationSettings) -> Self {
        let mut styles = HashMap::new();
        for (name, style) in &settings.styles {
            match name.parse::<Category>() {
                Ok(category) => {
                    styles.insert(category, style.clone());
                }
                Err(e) => {
                    log::warn!(target: "irodori::config", "Ignoring style entry: {}", e);
                }
            }
        }
        Self { styles }
    }
}

impl StyleResolver for SettingsStyleResolver {
    fn resolve(&self, category: Category) -> Option<TokenStyle> {
        self.styles.get(&category).cloned()
    }
}

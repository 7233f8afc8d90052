//! Global settings loaded from TOML.
//!
//! - `init_custom(toml_content)` sets a custom TOML before first `settings()` call
//! - `settings()` returns `&'static Settings` (lazy-init singleton)
//! - Default values are embedded via `include_str!("default_settings.toml")`

use std::sync::OnceLock;

use serde::Deserialize;

pub const DEFAULT_SETTINGS_TOML: &str = include_str!("default_settings.toml");

static CUSTOM_TOML: OnceLock<String> = OnceLock::new();

/// Set custom TOML before first `settings()` call.
pub fn init_custom(toml_content: String) -> Result<(), SettingsError> {
    parse_settings_toml(&toml_content)?;
    CUSTOM_TOML
        .set(toml_content)
        .map_err(|_| SettingsError::AlreadyInitialized)
}

/// Get or initialize the global settings singleton.
pub fn settings() -> &'static Settings {
    static INSTANCE: OnceLock<Settings> = OnceLock::new();
    INSTANCE.get_or_init(|| {
        let toml_str = CUSTOM_TOML
            .get()
            .map(|s| s.as_str())
            .unwrap_or(DEFAULT_SETTINGS_TOML);
        parse_settings_toml(toml_str).expect("settings TOML must be valid")
    })
}

/// Returns the embedded default settings TOML content.
pub fn default_toml() -> &'static str {
    DEFAULT_SETTINGS_TOML
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("TOML parse error: {0}")]
    Parse(String),
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("settings already initialized")]
    AlreadyInitialized,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub builder: BuilderSettings,
    pub nbest: NBestSettings,
    pub marginal: MarginalSettings,
    pub unknown: UnknownSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BuilderSettings {
    pub greedy_threshold: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NBestSettings {
    pub default_n: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MarginalSettings {
    pub theta: f64,
}

/// Unknown-word definition for one character category.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryDef {
    pub invoke: bool,
    pub group: bool,
    pub length: usize,
    pub left_id: u16,
    pub right_id: u16,
    pub cost: i16,
    pub feature: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct UnknownSettings {
    pub default: CategoryDef,
    pub space: CategoryDef,
    pub hiragana: CategoryDef,
    pub katakana: CategoryDef,
    pub kanji: CategoryDef,
    pub alpha: CategoryDef,
    pub numeric: CategoryDef,
    pub symbol: CategoryDef,
}

impl UnknownSettings {
    fn iter(&self) -> impl Iterator<Item = (&'static str, &CategoryDef)> {
        [
            ("DEFAULT", &self.default),
            ("SPACE", &self.space),
            ("HIRAGANA", &self.hiragana),
            ("KATAKANA", &self.katakana),
            ("KANJI", &self.kanji),
            ("ALPHA", &self.alpha),
            ("NUMERIC", &self.numeric),
            ("SYMBOL", &self.symbol),
        ]
        .into_iter()
    }
}

pub fn parse_settings_toml(toml_str: &str) -> Result<Settings, SettingsError> {
    let s: Settings = toml::from_str(toml_str).map_err(|e| SettingsError::Parse(e.to_string()))?;
    validate(&s)?;
    Ok(s)
}

fn validate(s: &Settings) -> Result<(), SettingsError> {
    if s.nbest.default_n == 0 {
        return Err(SettingsError::InvalidValue {
            field: "nbest.default_n".to_string(),
            reason: "must be positive".to_string(),
        });
    }
    if !(s.marginal.theta > 0.0 && s.marginal.theta.is_finite()) {
        return Err(SettingsError::InvalidValue {
            field: "marginal.theta".to_string(),
            reason: "must be a positive finite number".to_string(),
        });
    }
    for (name, def) in s.unknown.iter() {
        if def.cost < 0 {
            return Err(SettingsError::InvalidValue {
                field: format!("unknown.{name}.cost"),
                reason: "must be non-negative".to_string(),
            });
        }
    }
    Ok(())
}

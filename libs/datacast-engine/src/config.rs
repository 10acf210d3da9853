use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;

use datacast_api::config::CoercionOptions;

use crate::error::EngineError;

/// Root configuration, parsed from TOML.
///
/// ```toml
/// [coercion]
/// strict = false
///
/// [datetime]
/// formats = ["%d.%m.%Y", "%Y/%m/%d %H:%M"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    #[serde(default)]
    pub coercion: CoercionConfig,

    #[serde(default)]
    pub datetime: DatetimeConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoercionConfig {
    /// Raise on every unconvertible primitive (default), or let
    /// identifier/float/decimal failures become `Null`.
    #[serde(default = "default_strict")]
    pub strict: bool,
}

impl Default for CoercionConfig {
    fn default() -> Self {
        Self {
            strict: default_strict(),
        }
    }
}

fn default_strict() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatetimeConfig {
    /// Extra `chrono` format strings for the flexible parse stage.
    #[serde(default)]
    pub formats: Vec<String>,
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, EngineError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EngineError::Config(format!("{path}: {e}")))?;
        Self::parse(&content).map_err(|e| e.with_context(path))
    }

    /// Parse configuration from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, EngineError> {
        let config: Self =
            toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject format strings `chrono` cannot interpret.
    pub fn validate(&self) -> Result<(), EngineError> {
        for format in &self.datetime.formats {
            if format.trim().is_empty() {
                return Err(EngineError::Config("empty datetime format".into()));
            }
            if StrftimeItems::new(format).any(|item| matches!(item, Item::Error)) {
                return Err(EngineError::Config(format!(
                    "invalid datetime format '{format}'"
                )));
            }
        }
        Ok(())
    }

    /// Per-call options derived from this configuration.
    pub fn options(&self) -> CoercionOptions {
        CoercionOptions {
            strict: self.coercion.strict,
            date_formats: self.datetime.formats.clone(),
        }
    }
}

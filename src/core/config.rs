//! Declarative logger configuration
//!
//! ```
//! use pattern_sink_logger::{LogLevel, LoggerConfig};
//!
//! let config = LoggerConfig::from_json(
//!     r#"{ "level": "debug", "pattern": "[{level:<5}] {message}", "level_names": { "warning": "WRN" } }"#,
//! ).unwrap();
//!
//! assert_eq!(config.level, LogLevel::Debug);
//! assert_eq!(config.level_names[&LogLevel::Warning], "WRN");
//! ```

use super::error::Result;
use super::log_level::LogLevel;
use crate::pattern::{CompiledPattern, LevelNames};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Level, pattern and level names for one logger.
///
/// Fields left out of a config file keep their defaults: level `info`, the
/// logger's current pattern, built-in level names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub level: LogLevel,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub level_names: BTreeMap<LogLevel, String>,
}

impl LoggerConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Compile the configured pattern, if any.
    pub(crate) fn compile_pattern(&self) -> Result<Option<CompiledPattern>> {
        match &self.pattern {
            Some(template) => Ok(Some(CompiledPattern::compile(template)?)),
            None => Ok(None),
        }
    }

    /// Built-in names with this config's overrides applied.
    pub(crate) fn level_names(&self) -> LevelNames {
        let mut names = LevelNames::new();
        for (level, name) in &self.level_names {
            names.set(*level, name.as_str());
        }
        names
    }
}

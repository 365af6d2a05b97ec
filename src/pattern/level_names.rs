//! Per-level display names for the `{level}` placeholder

use crate::core::log_level::LogLevel;
use crate::text::CachedString;

/// The text `{level}` renders for each severity.
///
/// Names are [`CachedString`]s so their width is counted once, not on
/// every padded render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelNames {
    names: [CachedString; 6],
}

impl LevelNames {
    pub fn new() -> Self {
        Self {
            names: LogLevel::ALL.map(|level| CachedString::new(level.to_str())),
        }
    }

    #[inline]
    pub fn get(&self, level: LogLevel) -> &CachedString {
        &self.names[level.index()]
    }

    pub fn set(&mut self, level: LogLevel, name: impl Into<String>) {
        self.names[level.index()] = CachedString::new(name);
    }

    /// Restore the built-in name for `level`.
    pub fn reset(&mut self, level: LogLevel) {
        self.set(level, level.to_str());
    }
}

impl Default for LevelNames {
    fn default() -> Self {
        Self::new()
    }
}

//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

/// A template that could not be compiled.
///
/// Positions are byte offsets into the template.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatternError {
    /// `{` without a closing `}`
    #[error("unmatched '{{' at position {position}")]
    UnmatchedOpenBrace { position: usize },

    /// `}` outside a placeholder that is not escaped as `}}`
    #[error("unmatched '}}' at position {position}")]
    UnmatchedCloseBrace { position: usize },

    /// Placeholder name not in the field table
    #[error("unknown placeholder '{name}' at position {position}")]
    UnknownPlaceholder { name: String, position: usize },

    /// Malformed alignment, fill, width or type suffix
    #[error("invalid format spec '{spec}' for '{field}': {reason}")]
    InvalidSpec {
        field: String,
        spec: String,
        reason: String,
    },

    /// Width larger than the supported maximum
    #[error("width {width} for '{field}' exceeds the maximum of {max}")]
    WidthOverflow {
        field: String,
        width: String,
        max: usize,
    },

    /// strftime format chrono cannot render
    #[error("invalid time format '{format}'")]
    InvalidTimeFormat { format: String },
}

impl PatternError {
    /// Create an invalid spec error
    pub fn invalid_spec(
        field: impl Into<String>,
        spec: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        PatternError::InvalidSpec {
            field: field.into(),
            spec: spec.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Pattern compilation failed
    #[error("Pattern error: {0}")]
    Pattern(#[from] PatternError),

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON configuration could not be parsed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },
}

impl LoggerError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }
}

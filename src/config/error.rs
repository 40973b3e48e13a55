//! Configuration error types.

use std::fmt;

/// Error type for settings loading and callout property validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Failed to parse a setting.
    Parse {
        key: String,
        value: String,
        error: String,
    },
    /// Missing required property.
    Missing { key: String },
    /// Property present but empty.
    Empty { key: String },
    /// Property resolved (after placeholder expansion) to an empty string.
    ResolvesEmpty { key: String },
    /// Invalid value for a setting or property.
    Invalid { key: String, message: String },
    /// Engine name is neither a known alias nor a qualified identifier.
    UnknownEngine(String),
    /// No engine implementation registered under this identifier.
    EngineNotRegistered(String),
    /// Stylesheet text does not look like a stylesheet document.
    InvalidXslt,
    /// Input variable missing or not a document.
    Input(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse { key, value, error } => {
                write!(f, "failed to parse {}='{}': {}", key, value, error)
            }
            ConfigError::Missing { key } => write!(f, "no {} property", key),
            ConfigError::Empty { key } => write!(f, "{} property is empty", key),
            ConfigError::ResolvesEmpty { key } => {
                write!(f, "{} resolves to null or empty", key)
            }
            ConfigError::Invalid { key, message } => {
                write!(f, "invalid value for {}: {}", key, message)
            }
            ConfigError::UnknownEngine(name) => write!(f, "unknown XSLT engine: {}", name),
            ConfigError::EngineNotRegistered(id) => {
                write!(f, "no engine registered for {}", id)
            }
            ConfigError::InvalidXslt => write!(f, "invalid xslt"),
            ConfigError::Input(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ConfigError {}

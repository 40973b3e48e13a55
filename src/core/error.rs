//! Invocation error taxonomy.

use std::fmt;

use crate::cache::FetchError;
use crate::config::ConfigError;

/// Everything that can make an invocation abort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Missing or invalid property, unknown engine, bad input.
    Config(ConfigError),

    /// File or URL reference could not be loaded.
    Fetch(FetchError),

    /// Stylesheet did not compile.
    Construction {
        message: String,
        /// Compiler diagnostic, when the engine reported one.
        additional_information: Option<String>,
    },

    /// The run completed but the engine reported errors.
    Diagnostics { error_count: usize },

    /// The engine abandoned the run.
    Execution(String),

    /// Anything unclassified (engine panic and the like).
    Defect(String),
}

impl Error {
    /// Outcome label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config",
            Error::Fetch(_) => "fetch",
            Error::Construction { .. } => "construction",
            Error::Diagnostics { .. } => "diagnostics",
            Error::Execution(_) => "execution",
            Error::Defect(_) => "defect",
        }
    }

    /// Short message without the category prefix.
    pub fn short_message(&self) -> String {
        match self {
            Error::Config(e) => e.to_string(),
            Error::Fetch(e) => e.to_string(),
            Error::Construction { message, .. } => message.clone(),
            Error::Diagnostics { .. } => self.to_string(),
            Error::Execution(msg) => msg.clone(),
            Error::Defect(msg) => msg.clone(),
        }
    }

    /// Compiler diagnostic attached to a construction failure.
    pub fn additional_information(&self) -> Option<&str> {
        match self {
            Error::Construction {
                additional_information,
                ..
            } => additional_information.as_deref(),
            _ => None,
        }
    }

    /// Whether a processor involved in this failure may be pooled again.
    pub fn leaves_processor_reusable(&self) -> bool {
        !matches!(self, Error::Execution(_) | Error::Defect(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "configuration error: {}", e),
            Error::Fetch(e) => write!(f, "fetch error: {}", e),
            Error::Construction { message, .. } => {
                write!(f, "stylesheet compilation failed: {}", message)
            }
            Error::Diagnostics { error_count } => {
                write!(f, "Encountered {} errors while transforming", error_count)
            }
            Error::Execution(msg) => write!(f, "transform failed: {}", msg),
            Error::Defect(msg) => write!(f, "unexpected failure: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Config(e) => Some(e),
            Error::Fetch(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<FetchError> for Error {
    fn from(e: FetchError) -> Self {
        Error::Fetch(e)
    }
}

/// Result type alias for invocation steps.
pub type Result<T> = std::result::Result<T, Error>;

//! Log filter and service name for the JSON log lines.

use std::env;

use tracing::Level;

use super::parse::env_or;
use super::ConfigError;

const CRATE_TARGET: &str = "xslt_callout";

/// Where callout log lines go and how verbose they are.
#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// `tracing_subscriber::EnvFilter` directives.
    pub filter: String,
    /// Value of the `service` field on every line.
    pub service_name: String,
}

impl LoggingConfig {
    /// Read `LOG_LEVEL`, `RUST_LOG` and `SERVICE_NAME`.
    ///
    /// `LOG_LEVEL` takes a bare level and applies it to the `xslt_callout`
    /// targets only, so engine and HTTP client noise stays out. `RUST_LOG`
    /// is used verbatim when `LOG_LEVEL` is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            filter: log_filter(env::var("LOG_LEVEL").ok(), env::var("RUST_LOG").ok())?,
            service_name: env_or("SERVICE_NAME", CRATE_TARGET),
        })
    }
}

fn log_filter(level: Option<String>, rust_log: Option<String>) -> Result<String, ConfigError> {
    match level {
        Some(level) if !level.trim().is_empty() => {
            let level: Level = level.trim().parse().map_err(|_| ConfigError::Invalid {
                key: "LOG_LEVEL".into(),
                message: format!("'{}' is not one of trace, debug, info, warn, error", level),
            })?;
            Ok(crate_filter(level))
        }
        _ => Ok(rust_log.unwrap_or_else(|| crate_filter(Level::INFO))),
    }
}

fn crate_filter(level: Level) -> String {
    format!("{}={}", CRATE_TARGET, level.as_str().to_lowercase())
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: crate_filter(Level::INFO),
            service_name: CRATE_TARGET.to_string(),
        }
    }
}

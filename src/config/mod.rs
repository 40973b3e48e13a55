//! Configuration module for xslt_callout.
//!
//! Runtime settings (pool, caches, loaders, logging) are loaded once from
//! environment variables. Per-callout properties live in
//! [`crate::callout::CalloutConfig`].
//!
//! # Example
//!
//! ```rust,ignore
//! use xslt_callout::config::Settings;
//!
//! let settings = Settings::from_env()?;
//! println!("Idle ceiling: {}", settings.pool.max_idle());
//! ```

mod cache;
mod error;
mod logging;
pub(crate) mod parse;
mod pool;

pub use cache::{CacheConfig, LoaderConfig};
pub use error::ConfigError;
pub use logging::LoggingConfig;
pub use pool::PoolConfig;

/// Complete runtime configuration.
#[derive(Clone, Debug, Default)]
pub struct Settings {
    /// Processor pool configuration.
    pub pool: PoolConfig,
    /// Resource cache configuration.
    pub cache: CacheConfig,
    /// Resource loader configuration.
    pub loader: LoaderConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

impl Settings {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            pool: PoolConfig::from_env()?,
            cache: CacheConfig::from_env()?,
            loader: LoaderConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
        })
    }
}

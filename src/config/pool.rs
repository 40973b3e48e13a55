//! Processor pool configuration.

use std::num::NonZeroUsize;

use super::parse::env_parse;
use super::ConfigError;

/// Default cap on the number of idle processors kept per pool key.
pub const DEFAULT_MAX_IDLE: usize = 20;

/// Pool configuration loaded from environment.
#[derive(Clone, Debug)]
pub struct PoolConfig {
    /// Maximum idle processors per key (never zero).
    max_idle: NonZeroUsize,
}

impl PoolConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw: usize = env_parse("XSLT_MAX_IDLE_PROCESSORS", DEFAULT_MAX_IDLE)?;
        let max_idle = NonZeroUsize::new(raw).ok_or_else(|| ConfigError::Invalid {
            key: "XSLT_MAX_IDLE_PROCESSORS".into(),
            message: "idle ceiling cannot be zero".into(),
        })?;
        Ok(Self { max_idle })
    }

    /// Create with an explicit idle ceiling.
    pub fn with_max_idle(max_idle: NonZeroUsize) -> Self {
        Self { max_idle }
    }

    #[inline]
    pub fn max_idle(&self) -> usize {
        self.max_idle.get()
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_idle: NonZeroUsize::new(DEFAULT_MAX_IDLE).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

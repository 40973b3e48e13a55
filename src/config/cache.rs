//! Resource cache and loader configuration.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use super::parse::{env_duration, env_or, env_parse};
use super::ConfigError;

/// Default maximum number of cached resources per cache.
pub const DEFAULT_MAX_ENTRIES: usize = 1_048_000;

/// Default sliding TTL for cached resources.
pub const DEFAULT_TTL: Duration = Duration::from_secs(600);

/// Cache configuration loaded from environment.
///
/// Both the file cache and the URL cache are built from the same values.
#[derive(Clone, Debug)]
pub struct CacheConfig {
    /// Maximum number of entries (never zero).
    max_entries: NonZeroUsize,
    /// Time since last access after which an entry is treated as absent.
    pub ttl: Duration,
}

impl CacheConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let raw: usize = env_parse("RESOURCE_CACHE_MAX_ENTRIES", DEFAULT_MAX_ENTRIES)?;
        let max_entries = NonZeroUsize::new(raw).ok_or_else(|| ConfigError::Invalid {
            key: "RESOURCE_CACHE_MAX_ENTRIES".into(),
            message: "cache capacity cannot be zero".into(),
        })?;
        let ttl = env_duration("RESOURCE_CACHE_TTL", "10m")?;

        Ok(Self { max_entries, ttl })
    }

    /// Create with explicit capacity and TTL.
    pub fn new(max_entries: NonZeroUsize, ttl: Duration) -> Self {
        Self { max_entries, ttl }
    }

    #[inline]
    pub fn max_entries(&self) -> usize {
        self.max_entries.get()
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: NonZeroUsize::new(DEFAULT_MAX_ENTRIES).unwrap_or(NonZeroUsize::MIN),
            ttl: DEFAULT_TTL,
        }
    }
}

/// Resource loader configuration.
#[derive(Clone, Debug)]
pub struct LoaderConfig {
    /// Directory that `file://` references are resolved against.
    pub resource_dir: PathBuf,
    /// Transport timeout for URL fetches.
    pub url_timeout: Duration,
}

impl LoaderConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            resource_dir: PathBuf::from(env_or("RESOURCE_DIR", "resources")),
            url_timeout: env_duration("URL_FETCH_TIMEOUT", "30s")?,
        })
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            resource_dir: PathBuf::from("resources"),
            url_timeout: Duration::from_secs(30),
        }
    }
}

//! Process-lifetime state shared by every callout.
//!
//! A [`CalloutRuntime`] owns the processor pool, the two resource caches,
//! the loaders feeding them, the engine registry and the metrics. Hosts
//! build one explicitly, wrap it in an `Arc`, and hand it to each
//! [`crate::callout::Callout`].

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::cache::{CacheStats, FetchError, FileLoader, ResourceCache, UrlLoader};
use crate::callout::PooledProcessor;
use crate::config::Settings;
use crate::engine::EngineRegistry;
use crate::metrics::Metrics;
use crate::pool::{KeyedPool, PoolStats};
use crate::resolver::{self, SourceRef};

/// Cache names used in logs and metric labels.
pub const FILE_CACHE: &str = "file";
pub const URL_CACHE: &str = "url";

/// Failure to build a runtime.
#[derive(Debug)]
pub enum RuntimeError {
    /// Metric registration failed.
    Metrics(prometheus::Error),
    /// The URL loader could not be initialised.
    Loader(FetchError),
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Metrics(e) => write!(f, "metrics setup failed: {}", e),
            RuntimeError::Loader(e) => write!(f, "url loader setup failed: {}", e),
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuntimeError::Metrics(e) => Some(e),
            RuntimeError::Loader(e) => Some(e),
        }
    }
}

impl From<prometheus::Error> for RuntimeError {
    fn from(e: prometheus::Error) -> Self {
        RuntimeError::Metrics(e)
    }
}

impl From<FetchError> for RuntimeError {
    fn from(e: FetchError) -> Self {
        RuntimeError::Loader(e)
    }
}

/// Point-in-time view of the shared state.
#[derive(Debug, Clone, Serialize)]
pub struct RuntimeStats {
    pub pool: PoolStats,
    pub file_cache: CacheStats,
    pub url_cache: CacheStats,
}

/// Shared pool, caches, loaders, engines and metrics.
pub struct CalloutRuntime {
    pool: KeyedPool<PooledProcessor>,
    file_cache: ResourceCache,
    url_cache: ResourceCache,
    file_loader: FileLoader,
    url_loader: UrlLoader,
    engines: EngineRegistry,
    metrics: Metrics,
}

impl CalloutRuntime {
    /// Build a runtime from settings and the engines the host provides.
    pub fn new(settings: &Settings, engines: EngineRegistry) -> Result<Self, RuntimeError> {
        let runtime = Self {
            pool: KeyedPool::new(&settings.pool),
            file_cache: ResourceCache::new(FILE_CACHE, &settings.cache),
            url_cache: ResourceCache::new(URL_CACHE, &settings.cache),
            file_loader: FileLoader::new(settings.loader.resource_dir.clone()),
            url_loader: UrlLoader::new(settings.loader.url_timeout)?,
            engines,
            metrics: Metrics::new()?,
        };

        tracing::info!(
            engines = runtime.engines.len(),
            max_idle = runtime.pool.max_idle(),
            resource_dir = %runtime.file_loader.root().display(),
            "callout runtime ready"
        );
        Ok(runtime)
    }

    /// Runtime with default settings and only the built-in engines.
    pub fn with_defaults() -> Result<Self, RuntimeError> {
        Self::new(&Settings::default(), EngineRegistry::with_builtins())
    }

    /// Replace a placeholder-free reference with the content it points at.
    ///
    /// `file://` names go through the file cache, `http(s)://` URLs through
    /// the URL cache; anything else is returned unchanged.
    pub fn dereference(&self, resolved: &str) -> Result<Arc<str>, FetchError> {
        match resolver::classify(resolved) {
            SourceRef::FileRef(name) => self
                .file_cache
                .get(name, || self.file_loader.load(name)),
            SourceRef::UrlRef(url) => self.url_cache.get(url, || self.url_loader.load(url)),
            SourceRef::Literal(text) => Ok(Arc::from(text)),
        }
    }

    pub fn pool(&self) -> &KeyedPool<PooledProcessor> {
        &self.pool
    }

    pub fn file_cache(&self) -> &ResourceCache {
        &self.file_cache
    }

    pub fn url_cache(&self) -> &ResourceCache {
        &self.url_cache
    }

    pub fn engines(&self) -> &EngineRegistry {
        &self.engines
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    pub fn stats(&self) -> RuntimeStats {
        RuntimeStats {
            pool: self.pool.stats(),
            file_cache: self.file_cache.stats(),
            url_cache: self.url_cache.stats(),
        }
    }

    /// Refresh pool and cache gauges, then encode every metric.
    pub fn encode_metrics(&self) -> Result<String, prometheus::Error> {
        let stats = self.stats();
        self.metrics.observe_pool(&stats.pool);
        self.metrics.observe_cache(FILE_CACHE, &stats.file_cache);
        self.metrics.observe_cache(URL_CACHE, &stats.url_cache);
        self.metrics.encode()
    }

    /// Destroy idle processors and refuse to keep any returned later.
    pub fn shutdown(&self) {
        self.pool.close();
        self.file_cache.clear();
        self.url_cache.clear();
        tracing::info!("callout runtime shut down");
    }
}

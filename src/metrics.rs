//! Prometheus metrics.
//!
//! Provides metrics in Prometheus text exposition format:
//! - Invocation counts by outcome and invocation latency
//! - Processor construction and discard counts
//! - Pool and resource cache gauges, refreshed from their stats snapshots

use prometheus::{
    Counter, CounterVec, Encoder, Gauge, GaugeVec, Histogram, HistogramOpts, Opts, Registry,
    TextEncoder,
};

use crate::cache::CacheStats;
use crate::pool::PoolStats;

/// Latency buckets in seconds (100µs .. 10s).
const DURATION_BUCKETS: &[f64] = &[
    0.0001, 0.0005, 0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Metrics owned by one callout runtime.
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,

    invocations_total: CounterVec,
    invocation_duration_seconds: Histogram,

    processors_constructed_total: Counter,
    processors_discarded_total: Counter,
    pool_idle_processors: Gauge,

    cache_entries: GaugeVec,
    cache_hits: GaugeVec,
    cache_misses: GaugeVec,
}

impl Metrics {
    /// Create and register all metrics in a fresh registry.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let invocations_total = CounterVec::new(
            Opts::new(
                "xslt_callout_invocations_total",
                "Callout invocations by outcome",
            ),
            &["outcome"],
        )?;
        registry.register(Box::new(invocations_total.clone()))?;

        let invocation_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "xslt_callout_invocation_duration_seconds",
                "Callout invocation duration in seconds",
            )
            .buckets(DURATION_BUCKETS.to_vec()),
        )?;
        registry.register(Box::new(invocation_duration_seconds.clone()))?;

        let processors_constructed_total = Counter::new(
            "xslt_callout_processors_constructed_total",
            "Processors compiled from stylesheet text",
        )?;
        registry.register(Box::new(processors_constructed_total.clone()))?;

        let processors_discarded_total = Counter::new(
            "xslt_callout_processors_discarded_total",
            "Processors destroyed after a failed run",
        )?;
        registry.register(Box::new(processors_discarded_total.clone()))?;

        let pool_idle_processors = Gauge::new(
            "xslt_callout_pool_idle_processors",
            "Idle processors across all pool keys",
        )?;
        registry.register(Box::new(pool_idle_processors.clone()))?;

        let cache_entries = GaugeVec::new(
            Opts::new("xslt_callout_cache_entries", "Entries held by a resource cache"),
            &["cache"],
        )?;
        registry.register(Box::new(cache_entries.clone()))?;

        let cache_hits = GaugeVec::new(
            Opts::new("xslt_callout_cache_hits", "Resource cache lookups served from memory"),
            &["cache"],
        )?;
        registry.register(Box::new(cache_hits.clone()))?;

        let cache_misses = GaugeVec::new(
            Opts::new("xslt_callout_cache_misses", "Resource cache lookups that loaded"),
            &["cache"],
        )?;
        registry.register(Box::new(cache_misses.clone()))?;

        Ok(Self {
            registry,
            invocations_total,
            invocation_duration_seconds,
            processors_constructed_total,
            processors_discarded_total,
            pool_idle_processors,
            cache_entries,
            cache_hits,
            cache_misses,
        })
    }

    /// Record one finished invocation.
    pub fn record_invocation(&self, outcome: &str, duration_secs: f64) {
        self.invocations_total.with_label_values(&[outcome]).inc();
        self.invocation_duration_seconds.observe(duration_secs);
    }

    pub fn inc_constructed(&self) {
        self.processors_constructed_total.inc();
    }

    pub fn inc_discarded(&self) {
        self.processors_discarded_total.inc();
    }

    /// Copy a pool snapshot into the pool gauge.
    pub fn observe_pool(&self, stats: &PoolStats) {
        self.pool_idle_processors.set(stats.idle as f64);
    }

    /// Copy a cache snapshot into the per-cache gauges.
    pub fn observe_cache(&self, cache: &str, stats: &CacheStats) {
        self.cache_entries
            .with_label_values(&[cache])
            .set(stats.entries as f64);
        self.cache_hits
            .with_label_values(&[cache])
            .set(stats.hits as f64);
        self.cache_misses
            .with_label_values(&[cache])
            .set(stats.misses as f64);
    }

    /// Invocations recorded for `outcome` so far.
    pub fn invocation_count(&self, outcome: &str) -> u64 {
        self.invocations_total.with_label_values(&[outcome]).get() as u64
    }

    pub fn constructed_count(&self) -> u64 {
        self.processors_constructed_total.get() as u64
    }

    pub fn discarded_count(&self) -> u64 {
        self.processors_discarded_total.get() as u64
    }

    /// Encode all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// Get the Prometheus registry (for custom metrics).
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

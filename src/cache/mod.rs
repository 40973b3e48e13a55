//! Bounded resource cache with single-flight loading.
//!
//! Holds immutable text content keyed by resource name or URL. Entries
//! expire a fixed time after their last access (sliding TTL) and the least
//! recently accessed entry is evicted once the entry count passes the cap.
//!
//! # Single-flight
//!
//! ```text
//!   caller A ──get(k)──▶ miss ──▶ registers flight(k) ──▶ loader() ──┐
//!   caller B ──get(k)──▶ miss ──▶ finds flight(k) ──▶ wait ◀─────────┤
//!   caller C ──get(k)──▶ miss ──▶ finds flight(k) ──▶ wait ◀─────────┘
//!                                                     (same result)
//! ```
//!
//! Failed loads are handed to every waiter but never stored, so the next
//! `get` retries.

mod error;
mod loader;

pub use error::FetchError;
pub use loader::{FileLoader, UrlLoader};

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::CacheConfig;

/// A cached resource.
#[derive(Debug)]
struct CacheEntry {
    content: Arc<str>,
    last_access: Instant,
    /// Position in the LRU order.
    tick: u64,
}

impl CacheEntry {
    #[inline]
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.last_access) > ttl
    }
}

/// An outstanding load shared by every caller that missed on the same key.
struct Flight {
    result: Mutex<Option<Result<Arc<str>, FetchError>>>,
    ready: Condvar,
}

impl Flight {
    fn new() -> Self {
        Self {
            result: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    fn finish(&self, result: Result<Arc<str>, FetchError>) {
        let mut slot = self.result.lock().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(result);
        self.ready.notify_all();
    }

    fn wait(&self) -> Result<Arc<str>, FetchError> {
        let mut slot = self.result.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(result) = slot.as_ref() {
                return result.clone();
            }
            slot = self
                .ready
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<Box<str>, CacheEntry>,
    /// LRU order: access tick -> key, least recently used first.
    order: BTreeMap<u64, Box<str>>,
    /// Loads currently in progress.
    flights: HashMap<Box<str>, Arc<Flight>>,
    next_tick: u64,
}

impl CacheState {
    fn tick(&mut self) -> u64 {
        self.next_tick += 1;
        self.next_tick
    }

    fn remove(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.order.remove(&entry.tick);
        Some(entry)
    }

    /// Mark an entry as used now and move it to the back of the LRU order.
    fn touch(&mut self, key: &str, now: Instant) -> Option<Arc<str>> {
        let tick = self.tick();
        let entry = self.entries.get_mut(key)?;
        let old_tick = std::mem::replace(&mut entry.tick, tick);
        entry.last_access = now;
        let content = Arc::clone(&entry.content);
        if let Some(owned_key) = self.order.remove(&old_tick) {
            self.order.insert(tick, owned_key);
        }
        Some(content)
    }
}

/// Counters describing cache behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Entries currently stored.
    pub entries: usize,
    /// Lookups answered from the cache.
    pub hits: u64,
    /// Lookups that had to wait for a load.
    pub misses: u64,
    /// Loader invocations.
    pub loads: u64,
    /// Loader invocations that failed.
    pub load_failures: u64,
    /// Entries removed to respect the capacity.
    pub evictions: u64,
    /// Entries dropped because their TTL elapsed.
    pub expirations: u64,
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    loads: AtomicU64,
    load_failures: AtomicU64,
    evictions: AtomicU64,
    expirations: AtomicU64,
}

/// Thread-safe resource cache.
pub struct ResourceCache {
    /// Cache name for logging and metrics.
    name: &'static str,
    state: Mutex<CacheState>,
    max_entries: usize,
    ttl: Duration,
    counters: Counters,
}

impl ResourceCache {
    /// Create an empty cache.
    pub fn new(name: &'static str, config: &CacheConfig) -> Self {
        Self {
            name,
            state: Mutex::new(CacheState::default()),
            max_entries: config.max_entries(),
            ttl: config.ttl,
            counters: Counters::default(),
        }
    }

    /// Cache name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Sliding TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Get content for `key`, running `loader` on a miss.
    ///
    /// Concurrent callers missing on the same key share a single loader
    /// run and all receive its result. Loaded content is trimmed before it
    /// is stored. Errors are returned but not cached.
    pub fn get<F>(&self, key: &str, loader: F) -> Result<Arc<str>, FetchError>
    where
        F: FnOnce() -> Result<String, FetchError>,
    {
        let flight = {
            let mut state = self.lock();
            let now = Instant::now();

            if let Some(content) = self.lookup(&mut state, key, now) {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(content);
            }
            self.counters.misses.fetch_add(1, Ordering::Relaxed);

            if let Some(flight) = state.flights.get(key) {
                let flight = Arc::clone(flight);
                drop(state);
                tracing::trace!(cache = self.name, key = %key, "waiting on in-flight load");
                return flight.wait();
            }

            let flight = Arc::new(Flight::new());
            state.flights.insert(key.into(), Arc::clone(&flight));
            flight
        };

        let mut guard = FlightGuard {
            cache: self,
            key,
            flight: &flight,
            finished: false,
        };

        self.counters.loads.fetch_add(1, Ordering::Relaxed);
        let result = loader().map(|content| Arc::<str>::from(content.trim()));
        guard.finish(result.clone());
        result
    }

    /// Check whether a live entry exists, without refreshing its access time.
    pub fn contains(&self, key: &str) -> bool {
        let state = self.lock();
        state
            .entries
            .get(key)
            .is_some_and(|entry| !entry.is_expired(self.ttl, Instant::now()))
    }

    /// Number of stored entries (expired entries not yet purged included).
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove one entry.
    pub fn invalidate(&self, key: &str) -> bool {
        self.lock().remove(key).is_some()
    }

    /// Remove every entry. In-flight loads are unaffected.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.order.clear();
    }

    /// Drop every entry whose TTL has elapsed. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let mut state = self.lock();
        let now = Instant::now();
        let expired: Vec<Box<str>> = state
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired(self.ttl, now))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &expired {
            state.remove(key);
        }
        self.counters
            .expirations
            .fetch_add(expired.len() as u64, Ordering::Relaxed);
        expired.len()
    }

    /// Snapshot of the cache counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.len(),
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            loads: self.counters.loads.load(Ordering::Relaxed),
            load_failures: self.counters.load_failures.load(Ordering::Relaxed),
            evictions: self.counters.evictions.load(Ordering::Relaxed),
            expirations: self.counters.expirations.load(Ordering::Relaxed),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return live content, dropping the entry if its TTL has elapsed.
    fn lookup(&self, state: &mut CacheState, key: &str, now: Instant) -> Option<Arc<str>> {
        let expired = state.entries.get(key)?.is_expired(self.ttl, now);
        if expired {
            state.remove(key);
            self.counters.expirations.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(cache = self.name, key = %key, "entry expired");
            return None;
        }
        state.touch(key, now)
    }

    /// Store a loaded value and evict down to capacity.
    fn insert(&self, state: &mut CacheState, key: &str, content: Arc<str>) {
        state.remove(key);

        let now = Instant::now();
        let tick = state.tick();
        let key: Box<str> = key.into();
        state.entries.insert(
            key.clone(),
            CacheEntry {
                content,
                last_access: now,
                tick,
            },
        );
        state.order.insert(tick, key);

        while state.entries.len() > self.max_entries {
            let Some((_, oldest)) = state.order.pop_first() else {
                break;
            };
            state.entries.remove(&oldest);
            self.counters.evictions.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(cache = self.name, key = %oldest, "entry evicted");
        }
    }
}

/// Completes a flight exactly once, even if the loader panics.
struct FlightGuard<'a> {
    cache: &'a ResourceCache,
    key: &'a str,
    flight: &'a Flight,
    finished: bool,
}

impl FlightGuard<'_> {
    fn finish(&mut self, result: Result<Arc<str>, FetchError>) {
        self.finished = true;
        {
            let mut state = self.cache.lock();
            state.flights.remove(self.key);
            match &result {
                Ok(content) => self.cache.insert(&mut state, self.key, Arc::clone(content)),
                Err(error) => {
                    self.cache
                        .counters
                        .load_failures
                        .fetch_add(1, Ordering::Relaxed);
                    tracing::debug!(
                        cache = self.cache.name,
                        key = %self.key,
                        error = %error,
                        "load failed"
                    );
                }
            }
        }
        self.flight.finish(result);
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.finish(Err(FetchError::Aborted {
                key: self.key.to_string(),
            }));
        }
    }
}

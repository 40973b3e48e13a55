//! Keyed object pool.
//!
//! Keeps idle instances of expensive objects grouped by an opaque string
//! key. Growth is unbounded: a borrow with no idle instance constructs a new
//! one. Only the number of idle instances per key is capped.
//!
//! # Lifecycle
//!
//! ```text
//!   borrow(key) ──▶ idle stack empty? ──yes──▶ construct() ──┐
//!        │                                                   │
//!        └──────── no: pop most recently returned ───────────┤
//!                                                            ▼
//!                                                        [active]
//!                                                            │
//!            give_back(key, reset) ◀─────────────────────────┤
//!                 │                                          │
//!       reset ok && idle < max ──▶ [idle]        discard() ──┴──▶ dropped
//!       otherwise ──────────────▶ dropped
//! ```

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::Serialize;

use crate::config::PoolConfig;

/// Statistics about pool behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Instances constructed.
    pub created: u64,
    /// Borrows served (constructed or reused).
    pub borrowed: u64,
    /// Borrows served from the idle set.
    pub reused: u64,
    /// Instances that re-entered the idle set.
    pub returned: u64,
    /// Instances destroyed (explicit discard, reset failure, idle overflow, clear).
    pub discarded: u64,
    /// Resets that failed.
    pub reset_failures: u64,
    /// Idle instances across all keys.
    pub idle: usize,
    /// Keys currently holding at least one idle instance.
    pub keys: usize,
}

#[derive(Default)]
struct Counters {
    created: AtomicU64,
    borrowed: AtomicU64,
    reused: AtomicU64,
    returned: AtomicU64,
    discarded: AtomicU64,
    reset_failures: AtomicU64,
}

/// Pool of reusable instances keyed by string.
///
/// Each key has its own LIFO idle stack, so exhausting or misconfiguring one
/// key never touches another.
pub struct KeyedPool<T> {
    idle: Mutex<HashMap<String, Vec<T>>>,
    max_idle: usize,
    closed: AtomicBool,
    counters: Counters,
}

impl<T> KeyedPool<T> {
    /// Create an empty pool.
    pub fn new(config: &PoolConfig) -> Self {
        tracing::debug!(max_idle = config.max_idle(), "keyed pool created");
        Self {
            idle: Mutex::new(HashMap::new()),
            max_idle: config.max_idle(),
            closed: AtomicBool::new(false),
            counters: Counters::default(),
        }
    }

    /// Idle ceiling per key.
    pub fn max_idle(&self) -> usize {
        self.max_idle
    }

    /// Take an idle instance for `key`, or construct a new one.
    ///
    /// Construction errors are returned unchanged and never retried.
    pub fn borrow<F, E>(&self, key: &str, construct: F) -> Result<T, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        let reused = {
            let mut idle = self.lock();
            let reused = idle.get_mut(key).and_then(Vec::pop);
            if idle.get(key).is_some_and(Vec::is_empty) {
                idle.remove(key);
            }
            reused
        };

        let instance = match reused {
            Some(instance) => {
                self.counters.reused.fetch_add(1, Ordering::Relaxed);
                tracing::trace!(key_len = key.len(), "reusing idle instance");
                instance
            }
            None => {
                let instance = construct()?;
                self.counters.created.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(key_len = key.len(), "constructed new instance");
                instance
            }
        };

        self.counters.borrowed.fetch_add(1, Ordering::Relaxed);
        Ok(instance)
    }

    /// Reset an instance and put it back in the idle set.
    ///
    /// The instance is dropped instead when `reset` fails, when the key's
    /// idle set is full, or when the pool is closed. Never fails.
    pub fn give_back<F, E>(&self, key: &str, mut instance: T, reset: F)
    where
        F: FnOnce(&mut T) -> Result<(), E>,
        E: Display,
    {
        if let Err(e) = reset(&mut instance) {
            self.counters.reset_failures.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(error = %e, "reset failed, discarding instance");
            self.destroy(instance);
            return;
        }

        if self.closed.load(Ordering::Acquire) {
            self.destroy(instance);
            return;
        }

        let overflow = {
            let mut idle = self.lock();
            match idle.get_mut(key) {
                Some(stack) if stack.len() >= self.max_idle => Some(instance),
                Some(stack) => {
                    stack.push(instance);
                    None
                }
                None => {
                    idle.insert(key.to_string(), vec![instance]);
                    None
                }
            }
        };

        match overflow {
            Some(instance) => {
                tracing::trace!(key_len = key.len(), "idle set full, dropping instance");
                self.destroy(instance);
            }
            None => {
                self.counters.returned.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Destroy an instance that must not be reused.
    pub fn discard(&self, key: &str, instance: T) {
        tracing::debug!(key_len = key.len(), "instance discarded");
        self.destroy(instance);
    }

    /// Idle instances held for `key`.
    pub fn idle_count(&self, key: &str) -> usize {
        self.lock().get(key).map_or(0, Vec::len)
    }

    /// Idle instances held across all keys.
    pub fn total_idle(&self) -> usize {
        self.lock().values().map(Vec::len).sum()
    }

    /// Destroy every idle instance.
    pub fn clear(&self) {
        let drained: Vec<T> = {
            let mut idle = self.lock();
            idle.drain().flat_map(|(_, stack)| stack).collect()
        };
        let count = drained.len();
        for instance in drained {
            self.destroy(instance);
        }
        if count > 0 {
            tracing::debug!(count, "idle instances cleared");
        }
    }

    /// Clear the pool and destroy every instance returned from now on.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.clear();
    }

    /// Check if the pool has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Snapshot of pool statistics.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            created: self.counters.created.load(Ordering::Relaxed),
            borrowed: self.counters.borrowed.load(Ordering::Relaxed),
            reused: self.counters.reused.load(Ordering::Relaxed),
            returned: self.counters.returned.load(Ordering::Relaxed),
            discarded: self.counters.discarded.load(Ordering::Relaxed),
            reset_failures: self.counters.reset_failures.load(Ordering::Relaxed),
            idle: self.total_idle(),
            keys: self.lock().len(),
        }
    }

    fn destroy(&self, instance: T) {
        self.counters.discarded.fetch_add(1, Ordering::Relaxed);
        drop(instance);
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<T>>> {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

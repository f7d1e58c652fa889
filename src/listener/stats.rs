//! Cache Statistics Module
//!
//! Counts hits, misses and updates reported by a cache.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::listener::CacheListener;

// == Cache Stats ==
/// Point-in-time copy of the counters of a [`StatsListener`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Number of successful cache retrievals
    pub hits: u64,
    /// Number of failed cache retrievals
    pub misses: u64,
    /// Number of put operations
    pub updates: u64,
}

impl CacheStats {
    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

// == Stats Listener ==
/// Listener collecting aggregate hit / miss / update counts for a cache.
///
/// Counters are atomics so a shared `Arc<StatsListener>` can be read while
/// it stays attached to a cache.
#[derive(Debug, Default)]
pub struct StatsListener {
    hits: AtomicU64,
    misses: AtomicU64,
    updates: AtomicU64,
}

impl StatsListener {
    // == Constructor ==
    /// Creates a listener with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Number of put operations seen.
    pub fn updates(&self) -> u64 {
        self.updates.load(Ordering::Relaxed)
    }

    pub fn hit_rate(&self) -> f64 {
        self.snapshot().hit_rate()
    }

    // == Snapshot ==
    /// Copies the current counters.
    pub fn snapshot(&self) -> CacheStats {
        CacheStats {
            hits: self.hits(),
            misses: self.misses(),
            updates: self.updates(),
        }
    }
}

impl<K, V> CacheListener<K, V> for StatsListener {
    fn on_hit(&self, _key: &K) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    fn on_miss(&self, _key: &K) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    fn on_put(&self, _key: &K, _value: &V) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }
}

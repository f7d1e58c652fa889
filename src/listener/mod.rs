//! Listener Module
//!
//! Cache event callbacks and the listeners shipped with the crate.
//!
//! # Listeners
//! - [`BroadcastListener`]: fans every event out to registered subscribers
//! - [`StatsListener`]: aggregate hit/miss/update counters
//! - [`KeyStatsListener`]: per-key counters with top-N queries

mod broadcast;
mod key_stats;
mod stats;

use std::sync::Arc;

pub use broadcast::{BroadcastListener, CacheEvent};
pub use key_stats::KeyStatsListener;
pub use stats::{CacheStats, StatsListener};

// == Cache Listener ==
/// Receives the events an observable cache reports.
///
/// Callbacks run synchronously inside the cache operation that triggered
/// them. Listeners must not call back into the cache that notified them.
pub trait CacheListener<K, V>: Send + Sync {
    /// A lookup found `key`.
    fn on_hit(&self, key: &K);

    /// A lookup did not find `key`.
    fn on_miss(&self, key: &K);

    /// `key` was inserted or overwritten with `value`.
    fn on_put(&self, key: &K, value: &V);
}

impl<K, V, L> CacheListener<K, V> for Arc<L>
where
    L: CacheListener<K, V> + ?Sized,
{
    fn on_hit(&self, key: &K) {
        (**self).on_hit(key)
    }

    fn on_miss(&self, key: &K) {
        (**self).on_miss(key)
    }

    fn on_put(&self, key: &K, value: &V) {
        (**self).on_put(key, value)
    }
}

impl<K, V, L> CacheListener<K, V> for Box<L>
where
    L: CacheListener<K, V> + ?Sized,
{
    fn on_hit(&self, key: &K) {
        (**self).on_hit(key)
    }

    fn on_miss(&self, key: &K) {
        (**self).on_miss(key)
    }

    fn on_put(&self, key: &K, value: &V) {
        (**self).on_put(key, value)
    }
}

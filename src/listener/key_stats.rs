//! Key Statistics Module
//!
//! Per-key hit, miss and update counts with "top N" queries.

use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;
use parking_lot::Mutex;

use crate::listener::CacheListener;

type Counts<K> = HashMap<K, u64, RandomState>;

#[derive(Debug)]
struct KeyCounters<K> {
    hits: Counts<K>,
    misses: Counts<K>,
    updates: Counts<K>,
}

// == Key Stats Listener ==
/// Listener collecting key-level statistics for cache operations.
#[derive(Debug)]
pub struct KeyStatsListener<K> {
    counters: Mutex<KeyCounters<K>>,
}

impl<K> KeyStatsListener<K>
where
    K: Hash + Eq + Clone,
{
    pub fn new() -> Self {
        Self {
            counters: Mutex::new(KeyCounters {
                hits: HashMap::with_hasher(RandomState::new()),
                misses: HashMap::with_hasher(RandomState::new()),
                updates: HashMap::with_hasher(RandomState::new()),
            }),
        }
    }

    /// Number of hits recorded for `key`.
    pub fn key_hits(&self, key: &K) -> u64 {
        count_of(&self.counters.lock().hits, key)
    }

    /// Number of misses recorded for `key`.
    pub fn key_misses(&self, key: &K) -> u64 {
        count_of(&self.counters.lock().misses, key)
    }

    /// Number of puts recorded for `key`.
    pub fn key_updates(&self, key: &K) -> u64 {
        count_of(&self.counters.lock().updates, key)
    }
}

impl<K> KeyStatsListener<K>
where
    K: Hash + Eq + Clone + Ord,
{
    /// The `top` most hit keys, most hit first.
    pub fn top_hit_keys(&self, top: usize) -> Vec<K> {
        top_keys(&self.counters.lock().hits, top)
    }

    /// The `top` most missed keys, most missed first.
    pub fn top_missed_keys(&self, top: usize) -> Vec<K> {
        top_keys(&self.counters.lock().misses, top)
    }

    /// The `top` most updated keys, most updated first.
    pub fn top_updated_keys(&self, top: usize) -> Vec<K> {
        top_keys(&self.counters.lock().updates, top)
    }
}

impl<K> Default for KeyStatsListener<K>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> CacheListener<K, V> for KeyStatsListener<K>
where
    K: Hash + Eq + Clone + Send,
{
    fn on_hit(&self, key: &K) {
        bump(&mut self.counters.lock().hits, key);
    }

    fn on_miss(&self, key: &K) {
        bump(&mut self.counters.lock().misses, key);
    }

    fn on_put(&self, key: &K, _value: &V) {
        bump(&mut self.counters.lock().updates, key);
    }
}

fn count_of<K: Hash + Eq>(counts: &Counts<K>, key: &K) -> u64 {
    counts.get(key).copied().unwrap_or(0)
}

// Only clones the key the first time it is seen.
fn bump<K: Hash + Eq + Clone>(counts: &mut Counts<K>, key: &K) {
    match counts.get_mut(key) {
        Some(count) => *count += 1,
        None => {
            counts.insert(key.clone(), 1);
        }
    }
}

/// Highest counts first; equal counts are ordered by key so results are stable.
fn top_keys<K: Clone + Ord>(counts: &Counts<K>, top: usize) -> Vec<K> {
    let mut ranked: Vec<(&K, u64)> = counts.iter().map(|(key, count)| (key, *count)).collect();
    ranked.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.into_iter().take(top).map(|(key, _)| key.clone()).collect()
}

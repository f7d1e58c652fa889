//! Time-Aware Store Module
//!
//! An LRU store that also remembers when each key was last touched, so
//! stale policies can be expressed in elapsed time.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use ahash::RandomState;

use crate::cache::policy::ExpiryPolicy;
use crate::cache::{Cache, LruIter, LruStore};
use crate::clock::{Clock, SystemClock};

// == Time-Aware Store ==
/// LRU store with a per-key last-touch timestamp.
///
/// The timestamp map always holds exactly the keys of the inner LRU store.
#[derive(Debug)]
pub struct TimeAwareStore<K, V, C = SystemClock> {
    lru: LruStore<K, V>,
    touched: HashMap<K, Instant, RandomState>,
    clock: C,
}

impl<K, V> TimeAwareStore<K, V, SystemClock>
where
    K: Hash + Eq + Clone,
{
    /// Creates an empty store driven by the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl<K, V> Default for TimeAwareStore<K, V, SystemClock>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, C> TimeAwareStore<K, V, C>
where
    K: Hash + Eq + Clone,
    C: Clock,
{
    /// Creates an empty store driven by `clock`.
    pub fn with_clock(clock: C) -> Self {
        Self {
            lru: LruStore::new(),
            touched: HashMap::with_hasher(RandomState::new()),
            clock,
        }
    }

    /// Policy evicting entries untouched for longer than `ttl`.
    pub fn expiry_policy(ttl: Duration) -> ExpiryPolicy {
        ExpiryPolicy::new(ttl)
    }

    /// Instant `key` was last read or written, `None` if it is not stored.
    pub fn timestamp_of(&self, key: &K) -> Option<Instant> {
        self.touched.get(key).copied()
    }

    /// Current instant according to this store's clock.
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Iterates entries from least to most recently touched.
    pub fn iter(&self) -> LruIter<'_, K, V> {
        self.lru.iter()
    }
}

impl<K, V, C> Cache<K, V> for TimeAwareStore<K, V, C>
where
    K: Hash + Eq + Clone,
    C: Clock,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        let now = self.clock.now();
        if let Some(touched) = self.touched.get_mut(key) {
            *touched = now;
        }
        self.lru.get(key)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        self.lru.peek(key)
    }

    fn put(&mut self, key: K, value: V) {
        let now = self.clock.now();
        self.touched.insert(key.clone(), now);
        self.lru.put(key, value);
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        self.touched.remove(key);
        self.lru.remove(key)
    }

    fn len(&self) -> usize {
        self.lru.len()
    }

    fn clear_all(&mut self) {
        self.touched.clear();
        self.lru.clear_all();
    }

    fn eldest_entry(&self) -> Option<(&K, &V)> {
        self.lru.eldest_entry()
    }

    fn promotes_on_get(&self) -> bool {
        true
    }
}

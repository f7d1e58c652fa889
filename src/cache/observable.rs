//! Observable Cache Module
//!
//! Composes any store with a stale policy and a listener. After mutating
//! calls the wrapper evicts the eldest entry for as long as the policy
//! reports it stale, and every lookup or write is reported to the listener.

use std::marker::PhantomData;

use tracing::debug;

use crate::cache::policy::StalePolicy;
use crate::cache::Cache;
use crate::error::{CacheError, Result};
use crate::listener::CacheListener;

// == Observable Cache ==
/// A store wrapped with a stale policy and an event listener.
///
/// Obtained through [`ObservableCache::builder`], which refuses to build
/// until both the policy and the listener are set. Use
/// [`NeverStale`](crate::cache::policy::NeverStale) for a cache that never
/// evicts on its own.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use stale_cache::cache::{Cache, CapacityPolicy, LruStore, ObservableCache};
/// use stale_cache::listener::StatsListener;
///
/// let stats = Arc::new(StatsListener::new());
/// let mut cache = ObservableCache::builder(LruStore::new())
///     .stale_policy(CapacityPolicy::new(2))
///     .listener(Arc::clone(&stats))
///     .build()
///     .unwrap();
///
/// cache.put("a", 1);
/// cache.put("b", 2);
/// cache.put("c", 3);
///
/// assert_eq!(cache.len(), 2);
/// assert_eq!(cache.get(&"a"), None);
/// assert_eq!(stats.misses(), 1);
/// ```
pub struct ObservableCache<K, V, S> {
    store: S,
    stale_policy: Box<dyn StalePolicy<K, V, S>>,
    listener: Box<dyn CacheListener<K, V>>,
}

impl<K, V, S> ObservableCache<K, V, S>
where
    K: Clone,
    S: Cache<K, V>,
{
    /// Starts configuring an observable cache around `store`.
    pub fn builder(store: S) -> ObservableCacheBuilder<K, V, S> {
        ObservableCacheBuilder {
            store,
            stale_policy: None,
            listener: None,
            _entries: PhantomData,
        }
    }

    /// Replaces the stale policy. Takes effect on the next mutating call.
    pub fn set_stale_policy<P>(&mut self, policy: P)
    where
        P: StalePolicy<K, V, S> + 'static,
    {
        self.stale_policy = Box::new(policy);
    }

    /// Replaces the listener.
    pub fn set_listener<L>(&mut self, listener: L)
    where
        L: CacheListener<K, V> + 'static,
    {
        self.listener = Box::new(listener);
    }

    /// Read access to the wrapped store.
    pub fn store(&self) -> &S {
        &self.store
    }

    // == Evict Stale ==
    /// Removes the eldest entry while the store is non-empty and the stale
    /// policy reports it stale, re-reading the eldest after every removal.
    ///
    /// Returns the number of entries evicted. A policy that never answers
    /// `false` empties the store.
    pub fn evict_stale(&mut self) -> usize {
        let mut evicted = 0;

        loop {
            let stale_key = match self.store.eldest_entry() {
                Some((key, value)) if self.stale_policy.is_stale(&self.store, key, value) => {
                    key.clone()
                }
                _ => break,
            };
            self.store.remove(&stale_key);
            evicted += 1;
        }

        if evicted > 0 {
            debug!(evicted, remaining = self.store.len(), "evicted stale entries");
        }
        evicted
    }
}

impl<K, V, S> Cache<K, V> for ObservableCache<K, V, S>
where
    K: Clone,
    S: Cache<K, V>,
{
    /// Reports a hit or a miss. Stores whose lookups reorder entries get a
    /// stale pass first, so entries that already went stale never hit.
    fn get(&mut self, key: &K) -> Option<&V> {
        if self.store.promotes_on_get() {
            self.evict_stale();
        }

        if self.store.get(key).is_some() {
            self.listener.on_hit(key);
            self.store.peek(key)
        } else {
            self.listener.on_miss(key);
            None
        }
    }

    fn peek(&self, key: &K) -> Option<&V> {
        self.store.peek(key)
    }

    /// Writes through to the store, reports the put, then evicts stale entries.
    fn put(&mut self, key: K, value: V) {
        let written = key.clone();
        self.store.put(key, value);
        if let Some(value) = self.store.peek(&written) {
            self.listener.on_put(&written, value);
        }
        self.evict_stale();
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        self.store.remove(key)
    }

    fn len(&self) -> usize {
        self.store.len()
    }

    fn clear_all(&mut self) {
        self.store.clear_all();
    }

    fn eldest_entry(&self) -> Option<(&K, &V)> {
        self.store.eldest_entry()
    }

    fn promotes_on_get(&self) -> bool {
        self.store.promotes_on_get()
    }
}

// == Builder ==
/// Collects the parts of an [`ObservableCache`].
pub struct ObservableCacheBuilder<K, V, S> {
    store: S,
    stale_policy: Option<Box<dyn StalePolicy<K, V, S>>>,
    listener: Option<Box<dyn CacheListener<K, V>>>,
    _entries: PhantomData<fn(K, V)>,
}

impl<K, V, S> ObservableCacheBuilder<K, V, S>
where
    K: Clone,
    S: Cache<K, V>,
{
    pub fn stale_policy<P>(mut self, policy: P) -> Self
    where
        P: StalePolicy<K, V, S> + 'static,
    {
        self.stale_policy = Some(Box::new(policy));
        self
    }

    pub fn listener<L>(mut self, listener: L) -> Self
    where
        L: CacheListener<K, V> + 'static,
    {
        self.listener = Some(Box::new(listener));
        self
    }

    /// Builds the cache.
    ///
    /// # Errors
    /// - [`CacheError::MissingStalePolicy`] if no stale policy was set
    /// - [`CacheError::MissingListener`] if no listener was set
    pub fn build(self) -> Result<ObservableCache<K, V, S>> {
        let stale_policy = self.stale_policy.ok_or(CacheError::MissingStalePolicy)?;
        let listener = self.listener.ok_or(CacheError::MissingListener)?;

        Ok(ObservableCache {
            store: self.store,
            stale_policy,
            listener,
        })
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use parking_lot::Mutex;

    use crate::cache::policy::{CapacityPolicy, ExpiryPolicy, NeverStale};
    use crate::cache::{FifoStore, LruStore, TimeAwareStore};
    use crate::clock::MockClock;
    use crate::listener::{BroadcastListener, StatsListener};

    type Journal = Arc<Mutex<Vec<String>>>;

    /// Records events as `"hit:k"`, `"miss:k"`, `"put:k=v"`.
    struct Recorder(Journal);

    impl CacheListener<&'static str, i32> for Recorder {
        fn on_hit(&self, key: &&'static str) {
            self.0.lock().push(format!("hit:{}", key));
        }

        fn on_miss(&self, key: &&'static str) {
            self.0.lock().push(format!("miss:{}", key));
        }

        fn on_put(&self, key: &&'static str, value: &i32) {
            self.0.lock().push(format!("put:{}={}", key, value));
        }
    }

    fn lru_with_capacity(
        capacity: usize,
    ) -> (ObservableCache<&'static str, i32, LruStore<&'static str, i32>>, Journal) {
        let journal = Journal::default();
        let cache = ObservableCache::builder(LruStore::new())
            .stale_policy(CapacityPolicy::new(capacity))
            .listener(Recorder(Arc::clone(&journal)))
            .build()
            .unwrap();
        (cache, journal)
    }

    fn lru_keys(cache: &ObservableCache<&'static str, i32, LruStore<&'static str, i32>>) -> Vec<&'static str> {
        cache.store().iter().map(|(k, _)| *k).collect()
    }

    #[test]
    fn test_build_without_policy_fails() {
        let result = ObservableCache::builder(LruStore::<&str, i32>::new())
            .listener(StatsListener::new())
            .build();
        assert!(matches!(result, Err(CacheError::MissingStalePolicy)));
    }

    #[test]
    fn test_build_without_listener_fails() {
        let result = ObservableCache::builder(LruStore::<&str, i32>::new())
            .stale_policy(NeverStale)
            .build();
        assert!(matches!(result, Err(CacheError::MissingListener)));
    }

    #[test]
    fn test_put_then_get_hits() {
        let (mut cache, journal) = lru_with_capacity(10);

        cache.put("a", 1);
        assert_eq!(cache.get(&"a"), Some(&1));

        assert_eq!(*journal.lock(), vec!["put:a=1", "hit:a"]);
    }

    #[test]
    fn test_get_unknown_or_removed_misses() {
        let (mut cache, journal) = lru_with_capacity(10);

        assert_eq!(cache.get(&"never"), None);
        cache.put("gone", 5);
        assert_eq!(cache.remove(&"gone"), Some(5));
        assert_eq!(cache.get(&"gone"), None);

        assert_eq!(*journal.lock(), vec!["miss:never", "put:gone=5", "miss:gone"]);
    }

    #[test]
    fn test_capacity_two_evicts_least_recent() {
        let (mut cache, _journal) = lru_with_capacity(2);

        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);

        assert_eq!(lru_keys(&cache), vec!["b", "c"]);
        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.get(&"b"), Some(&2));
        assert_eq!(cache.get(&"c"), Some(&3));
    }

    #[test]
    fn test_capacity_one_keeps_only_newest() {
        let (mut cache, _journal) = lru_with_capacity(1);

        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("c", 3);

        assert_eq!(lru_keys(&cache), vec!["c"]);
    }

    #[test]
    fn test_capacity_respects_recency() {
        let (mut cache, _journal) = lru_with_capacity(2);

        cache.put("a", 1);
        cache.put("b", 2);
        cache.get(&"a");
        cache.put("c", 3);

        assert_eq!(lru_keys(&cache), vec!["a", "c"]);
    }

    #[test]
    fn test_put_reported_before_eviction() {
        let (mut cache, journal) = lru_with_capacity(0);

        cache.put("a", 1);

        assert!(cache.is_empty());
        assert_eq!(*journal.lock(), vec!["put:a=1"]);
    }

    #[test]
    fn test_lowered_capacity_drains_in_one_pass() {
        let (mut cache, _journal) = lru_with_capacity(5);
        for (i, key) in ["a", "b", "c", "d", "e"].into_iter().enumerate() {
            cache.put(key, i as i32);
        }

        cache.set_stale_policy(CapacityPolicy::new(2));
        assert_eq!(cache.evict_stale(), 3);
        assert_eq!(lru_keys(&cache), vec!["d", "e"]);
    }

    #[test]
    fn test_never_stale_never_evicts() {
        let mut cache = ObservableCache::builder(LruStore::new())
            .stale_policy(NeverStale)
            .listener(StatsListener::new())
            .build()
            .unwrap();
        for i in 0..100 {
            cache.put(i, i);
        }
        assert_eq!(cache.evict_stale(), 0);
        assert_eq!(cache.len(), 100);
    }

    #[test]
    fn test_always_stale_drains_store() {
        let mut cache = ObservableCache::builder(LruStore::new())
            .stale_policy(NeverStale)
            .listener(StatsListener::new())
            .build()
            .unwrap();
        cache.put("a", 1);
        cache.put("b", 2);

        cache.set_stale_policy(|_: &LruStore<&'static str, i32>, _: &&'static str, _: &i32| true);

        assert_eq!(cache.evict_stale(), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_fifo_capacity_evicts_first_inserted() {
        let stats = Arc::new(StatsListener::new());
        let mut cache = ObservableCache::builder(FifoStore::new())
            .stale_policy(CapacityPolicy::new(2))
            .listener(Arc::clone(&stats))
            .build()
            .unwrap();

        cache.put("a", 1);
        cache.put("b", 2);
        // FIFO lookups do not protect "a"
        assert_eq!(cache.get(&"a"), Some(&1));
        cache.put("c", 3);

        assert_eq!(cache.get(&"a"), None);
        assert_eq!(cache.eldest_entry(), Some((&"b", &2)));
        assert_eq!(stats.hits(), 1);
        assert_eq!(stats.misses(), 1);
        assert_eq!(stats.updates(), 3);
    }

    #[test]
    fn test_fifo_overwrite_keeps_eviction_order() {
        let mut cache = ObservableCache::builder(FifoStore::new())
            .stale_policy(CapacityPolicy::new(2))
            .listener(StatsListener::new())
            .build()
            .unwrap();

        cache.put("a", 1);
        cache.put("b", 2);
        cache.put("a", 10);
        cache.put("c", 3);

        assert_eq!(cache.peek(&"a"), None);
        assert_eq!(cache.peek(&"b"), Some(&2));
        assert_eq!(cache.peek(&"c"), Some(&3));
    }

    #[test]
    fn test_expiry_evicts_untouched_entries() {
        let clock = MockClock::new();
        let ttl = Duration::from_millis(100);
        let mut cache = ObservableCache::builder(TimeAwareStore::with_clock(clock.clone()))
            .stale_policy(ExpiryPolicy::new(ttl))
            .listener(StatsListener::new())
            .build()
            .unwrap();

        cache.put("old", 1);
        clock.advance(Duration::from_millis(60));
        cache.put("fresh", 2);
        clock.advance(Duration::from_millis(60));

        // "old" is 120ms untouched, "fresh" only 60ms
        assert_eq!(cache.get(&"fresh"), Some(&2));
        assert_eq!(cache.peek(&"old"), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expiry_touch_within_ttl_survives() {
        let clock = MockClock::new();
        let mut cache = ObservableCache::builder(TimeAwareStore::with_clock(clock.clone()))
            .stale_policy(TimeAwareStore::<&str, i32, MockClock>::expiry_policy(Duration::from_millis(100)))
            .listener(StatsListener::new())
            .build()
            .unwrap();

        cache.put("k", 1);
        for _ in 0..5 {
            clock.advance(Duration::from_millis(90));
            assert_eq!(cache.get(&"k"), Some(&1));
        }

        clock.advance(Duration::from_millis(101));
        assert_eq!(cache.get(&"k"), None);
        assert!(cache.is_empty());
        assert_eq!(cache.store().timestamp_of(&"k"), None);
    }

    #[test]
    fn test_expiry_exact_ttl_is_not_expired() {
        let clock = MockClock::new();
        let mut cache = ObservableCache::builder(TimeAwareStore::with_clock(clock.clone()))
            .stale_policy(ExpiryPolicy::new(Duration::from_millis(100)))
            .listener(StatsListener::new())
            .build()
            .unwrap();

        cache.put("k", 1);
        clock.advance(Duration::from_millis(100));
        assert_eq!(cache.get(&"k"), Some(&1));
    }

    #[test]
    fn test_broadcast_fan_out_through_cache() {
        let first = Arc::new(StatsListener::new());
        let second = Arc::new(StatsListener::new());
        let broadcast: BroadcastListener<&'static str, i32> = BroadcastListener::new();
        broadcast.add_listener(Arc::clone(&first));
        broadcast.add_listener(Arc::clone(&second));

        let mut cache = ObservableCache::builder(LruStore::<&str, i32>::new())
            .stale_policy(NeverStale)
            .listener(broadcast)
            .build()
            .unwrap();

        cache.put("a", 1);

        assert_eq!(first.updates(), 1);
        assert_eq!(second.updates(), 1);
    }

    #[test]
    fn test_clear_all_is_idempotent() {
        let (mut cache, _journal) = lru_with_capacity(3);
        cache.put("a", 1);
        cache.put("b", 2);

        cache.clear_all();
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.eldest_entry(), None);

        cache.clear_all();
        assert_eq!(cache.len(), 0);
        cache.store().assert_invariants();
    }

    #[test]
    fn test_boxed_as_dyn_cache() {
        let cache = ObservableCache::builder(LruStore::<String, String>::new())
            .stale_policy(CapacityPolicy::new(1))
            .listener(StatsListener::new())
            .build()
            .unwrap();
        let mut boxed: Box<dyn Cache<String, String> + Send + Sync> = Box::new(cache);

        boxed.put("x".to_string(), "1".to_string());
        boxed.put("y".to_string(), "2".to_string());

        assert_eq!(boxed.len(), 1);
        assert_eq!(boxed.get(&"y".to_string()), Some(&"2".to_string()));
    }
}

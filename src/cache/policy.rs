//! Stale Policies
//!
//! A stale policy decides whether the current eldest entry of a store must
//! be evicted. Policies receive the live store on every call, so a policy
//! that reads `len()` or the current time sees the effect of every eviction
//! made earlier in the same pass.

use std::hash::Hash;
use std::time::{Duration, Instant};

use crate::cache::{Cache, TimeAwareStore};
use crate::clock::Clock;

// == Stale Policy Trait ==
/// Predicate over the eldest `(key, value)` of a store of type `S`.
///
/// Closures of the shape `Fn(&S, &K, &V) -> bool` are policies too.
///
/// A policy that keeps returning `true` drains the whole store; the
/// eviction loop only stops on an empty store or a `false` answer.
pub trait StalePolicy<K, V, S: ?Sized>: Send + Sync {
    /// Returns `true` if the eldest entry `(key, value)` must be evicted.
    fn is_stale(&self, store: &S, key: &K, value: &V) -> bool;
}

impl<K, V, S, F> StalePolicy<K, V, S> for F
where
    S: ?Sized,
    F: Fn(&S, &K, &V) -> bool + Send + Sync,
{
    fn is_stale(&self, store: &S, key: &K, value: &V) -> bool {
        self(store, key, value)
    }
}

// == Never Stale ==
/// Policy that never evicts. Use it to build an unbounded observable cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverStale;

impl<K, V, S: ?Sized> StalePolicy<K, V, S> for NeverStale {
    fn is_stale(&self, _store: &S, _key: &K, _value: &V) -> bool {
        false
    }
}

// == Capacity Policy ==
/// Evicts the eldest entry while the store holds more than `capacity` entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityPolicy {
    capacity: usize,
}

impl CapacityPolicy {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether a store of `len` entries is over capacity.
    pub fn exceeded_by(&self, len: usize) -> bool {
        len > self.capacity
    }
}

impl<K, V, S> StalePolicy<K, V, S> for CapacityPolicy
where
    S: Cache<K, V> + ?Sized,
{
    fn is_stale(&self, store: &S, _key: &K, _value: &V) -> bool {
        self.exceeded_by(store.len())
    }
}

// == Expiry Policy ==
/// Evicts the eldest entry of a [`TimeAwareStore`] once it has gone
/// untouched for strictly longer than `ttl`.
///
/// Only the eldest entry is inspected. That is enough because every touch
/// refreshes the timestamp and promotes the entry together, so recency
/// order and timestamp order are the same order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    ttl: Duration,
}

impl ExpiryPolicy {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Whether an entry last touched at `touched` has expired at `now`.
    pub fn is_expired(&self, touched: Instant, now: Instant) -> bool {
        now.saturating_duration_since(touched) > self.ttl
    }
}

impl<K, V, C> StalePolicy<K, V, TimeAwareStore<K, V, C>> for ExpiryPolicy
where
    K: Hash + Eq + Clone,
    C: Clock,
{
    fn is_stale(&self, store: &TimeAwareStore<K, V, C>, key: &K, _value: &V) -> bool {
        store
            .timestamp_of(key)
            .is_some_and(|touched| self.is_expired(touched, store.now()))
    }
}

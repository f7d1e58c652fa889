//! FIFO Store Module
//!
//! Insertion-ordered store: the eldest entry is the earliest surviving insertion.

use std::collections::{HashMap, VecDeque};
use std::hash::Hash;

use ahash::RandomState;

use crate::cache::Cache;

/// Stored value plus the insertion sequence that owns its queue position.
#[derive(Debug)]
struct Slot<V> {
    value: V,
    seq: u64,
}

// == FIFO Store ==
/// Insertion-ordered key/value store.
///
/// The queue records `(key, seq)` in insertion order. Removing a key leaves
/// a tombstone behind in the queue; tombstones are dropped as soon as they
/// reach the front, so the front of the queue is always a live entry. When
/// tombstones outnumber live entries the queue is compacted, keeping every
/// operation O(1) amortized.
#[derive(Debug)]
pub struct FifoStore<K, V> {
    entries: HashMap<K, Slot<V>, RandomState>,
    order: VecDeque<(K, u64)>,
    next_seq: u64,
}

impl<K, V> FifoStore<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates an empty FIFO store.
    pub fn new() -> Self {
        Self {
            entries: HashMap::with_hasher(RandomState::new()),
            order: VecDeque::new(),
            next_seq: 0,
        }
    }

    // == Iteration ==
    /// Iterates live entries from eldest to newest insertion.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.order.iter().filter_map(move |(key, seq)| {
            self.entries
                .get_key_value(key)
                .filter(|(_, slot)| slot.seq == *seq)
                .map(|(key, slot)| (key, &slot.value))
        })
    }

    fn is_live(&self, key: &K, seq: u64) -> bool {
        self.entries.get(key).is_some_and(|slot| slot.seq == seq)
    }

    /// Pops tombstones off the front until the front is live or the queue is empty.
    fn discard_dead_front(&mut self) {
        while let Some((key, seq)) = self.order.front() {
            if self.is_live(key, *seq) {
                break;
            }
            self.order.pop_front();
        }
    }

    fn compact_if_sparse(&mut self) {
        if self.order.len() > 2 * self.entries.len() {
            let entries = &self.entries;
            self.order
                .retain(|(key, seq)| entries.get(key).is_some_and(|slot| slot.seq == *seq));
        }
    }
}

impl<K, V> Default for FifoStore<K, V>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Cache<K, V> for FifoStore<K, V>
where
    K: Hash + Eq + Clone,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        self.peek(key)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        self.entries.get(key).map(|slot| &slot.value)
    }

    // Overwrites keep their original queue position.
    fn put(&mut self, key: K, value: V) {
        if let Some(slot) = self.entries.get_mut(&key) {
            slot.value = value;
            return;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        self.order.push_back((key.clone(), seq));
        self.entries.insert(key, Slot { value, seq });
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let slot = self.entries.remove(key)?;
        self.discard_dead_front();
        self.compact_if_sparse();
        Some(slot.value)
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn clear_all(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn eldest_entry(&self) -> Option<(&K, &V)> {
        let (key, _) = self.order.front()?;
        self.entries
            .get_key_value(key)
            .map(|(key, slot)| (key, &slot.value))
    }

    fn promotes_on_get(&self) -> bool {
        false
    }
}

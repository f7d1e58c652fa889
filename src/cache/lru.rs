//! LRU Store Module
//!
//! Hash index plus an arena-backed doubly linked chain ordered from the
//! least recently used end to the most recently used end.
//!
//! ```text
//!   lru_end                                   mru_end
//!      │                                         │
//!      ▼                                         ▼
//!   [slot 2] ──next──► [slot 0] ──next──► [slot 3]
//!            ◄──prev──          ◄──prev──
//! ```
//!
//! Nodes are addressed by stable slot indices; freed slots are recycled
//! through a free list.

use std::collections::HashMap;
use std::hash::Hash;

use ahash::RandomState;

use crate::cache::Cache;

// == Node ==
/// A chain node. `prev` points towards the LRU end, `next` towards the MRU end.
#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

// == LRU Store ==
/// Least-recently-used store with O(1) get, put and remove.
#[derive(Debug)]
pub struct LruStore<K, V> {
    /// Key to arena slot
    index: HashMap<K, usize, RandomState>,
    /// Node arena, `None` marks a free slot
    nodes: Vec<Option<Node<K, V>>>,
    /// Recycled slots
    free: Vec<usize>,
    /// Eldest node
    lru_end: Option<usize>,
    /// Most recently touched node
    mru_end: Option<usize>,
}

impl<K, V> LruStore<K, V>
where
    K: Hash + Eq + Clone,
{
    // == Constructor ==
    /// Creates an empty LRU store.
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Creates an empty LRU store with room for `capacity` entries before
    /// reallocating. This is only a sizing hint, not an eviction bound.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            index: HashMap::with_capacity_and_hasher(capacity, RandomState::new()),
            nodes: Vec::with_capacity(capacity),
            free: Vec::new(),
            lru_end: None,
            mru_end: None,
        }
    }

    // == Iteration ==
    /// Iterates entries from the least recently used to the most recently used.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            store: self,
            cursor: self.lru_end,
            remaining: self.index.len(),
        }
    }

    /// The most recently used entry.
    #[cfg(test)]
    pub(crate) fn newest_entry(&self) -> Option<(&K, &V)> {
        self.mru_end
            .and_then(|idx| self.node(idx))
            .map(|node| (&node.key, &node.value))
    }

    fn node(&self, idx: usize) -> Option<&Node<K, V>> {
        self.nodes.get(idx)?.as_ref()
    }

    fn node_mut(&mut self, idx: usize) -> Option<&mut Node<K, V>> {
        self.nodes.get_mut(idx)?.as_mut()
    }

    // == Promote ==
    /// Moves a node to the MRU end.
    ///
    /// The MRU node stays where it is. The LRU-end node and interior nodes
    /// are spliced out (moving `lru_end` forward in the first case) and
    /// relinked after the current MRU node.
    fn promote(&mut self, idx: usize) {
        if self.mru_end == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.link_at_mru(idx);
    }

    /// Splices a node out of the chain, repairing both ends if needed.
    fn unlink(&mut self, idx: usize) {
        let Some((prev, next)) = self.node(idx).map(|node| (node.prev, node.next)) else {
            return;
        };

        match prev {
            Some(prev_idx) => {
                if let Some(prev_node) = self.node_mut(prev_idx) {
                    prev_node.next = next;
                }
            }
            None => self.lru_end = next,
        }

        match next {
            Some(next_idx) => {
                if let Some(next_node) = self.node_mut(next_idx) {
                    next_node.prev = prev;
                }
            }
            None => self.mru_end = prev,
        }

        if let Some(node) = self.node_mut(idx) {
            node.prev = None;
            node.next = None;
        }
    }

    /// Links a detached node after the current MRU node.
    fn link_at_mru(&mut self, idx: usize) {
        let old_mru = self.mru_end;

        if let Some(node) = self.node_mut(idx) {
            node.prev = old_mru;
            node.next = None;
        }

        match old_mru {
            Some(mru_idx) => {
                if let Some(mru_node) = self.node_mut(mru_idx) {
                    mru_node.next = Some(idx);
                }
            }
            // Empty chain: the new node is both ends
            None => self.lru_end = Some(idx),
        }

        self.mru_end = Some(idx);
    }

    fn alloc(&mut self, node: Node<K, V>) -> usize {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx] = Some(node);
                idx
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        }
    }
}

impl<K, V> Default for LruStore<K, V>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> Cache<K, V> for LruStore<K, V>
where
    K: Hash + Eq + Clone,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.promote(idx);
        self.node(idx).map(|node| &node.value)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.node(idx).map(|node| &node.value)
    }

    fn put(&mut self, key: K, value: V) {
        if let Some(&idx) = self.index.get(&key) {
            if let Some(node) = self.node_mut(idx) {
                node.value = value;
            }
            self.promote(idx);
            return;
        }

        let idx = self.alloc(Node {
            key: key.clone(),
            value,
            prev: None,
            next: None,
        });
        self.link_at_mru(idx);
        self.index.insert(key, idx);
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let idx = self.index.remove(key)?;
        self.unlink(idx);
        let node = self.nodes.get_mut(idx)?.take()?;
        self.free.push(idx);
        Some(node.value)
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn clear_all(&mut self) {
        self.index.clear();
        self.nodes.clear();
        self.free.clear();
        self.lru_end = None;
        self.mru_end = None;
    }

    fn eldest_entry(&self) -> Option<(&K, &V)> {
        self.lru_end
            .and_then(|idx| self.node(idx))
            .map(|node| (&node.key, &node.value))
    }

    fn promotes_on_get(&self) -> bool {
        true
    }
}

// == Iterator ==
/// Iterator over an [`LruStore`] from the LRU end to the MRU end.
pub struct Iter<'a, K, V> {
    store: &'a LruStore<K, V>,
    cursor: Option<usize>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V>
where
    K: Hash + Eq + Clone,
{
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        // `remaining` bounds the walk even if the chain were corrupted
        if self.remaining == 0 {
            return None;
        }
        let store = self.store;
        let node = store.node(self.cursor?)?;
        self.cursor = node.next;
        self.remaining -= 1;
        Some((&node.key, &node.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.remaining))
    }
}

#[cfg(test)]
impl<K, V> LruStore<K, V>
where
    K: Hash + Eq + Clone + std::fmt::Debug,
{
    /// Scans the arena and panics if the index and the chain disagree.
    pub(crate) fn assert_invariants(&self) {
        let mut seen = vec![false; self.nodes.len()];
        let mut previous = None;
        let mut cursor = self.lru_end;
        let mut walked = 0;

        while let Some(idx) = cursor {
            assert!(walked < self.index.len(), "chain longer than index (cycle?)");
            assert!(!seen[idx], "slot {} visited twice", idx);
            seen[idx] = true;

            let node = self.node(idx).expect("chain points at a free slot");
            assert_eq!(node.prev, previous, "broken prev link at slot {}", idx);
            assert_eq!(self.index.get(&node.key), Some(&idx), "index disagrees for {:?}", node.key);

            previous = Some(idx);
            cursor = node.next;
            walked += 1;
        }

        assert_eq!(walked, self.index.len(), "chain shorter than index");
        assert_eq!(self.mru_end, previous, "mru_end is not the chain tail");
        assert_eq!(self.nodes.len(), self.index.len() + self.free.len());
        for &idx in &self.free {
            assert!(self.nodes[idx].is_none(), "free slot {} still occupied", idx);
        }
        if self.index.is_empty() {
            assert_eq!(self.lru_end, None);
            assert_eq!(self.mru_end, None);
        }
    }
}

//! Cache Contract
//!
//! The key/value operations every eviction strategy implements.

// == Cache Trait ==
/// Minimal key/value store contract shared by every strategy.
///
/// Absence of a key is a normal outcome: `get` and `remove` return `None`,
/// they never fail. The trait is object safe so collaborators can hold a
/// `Box<dyn Cache<K, V>>` without caring which strategy backs it.
pub trait Cache<K, V> {
    /// Returns the value stored under `key`.
    ///
    /// For positional stores (LRU, time-aware) this also promotes the entry
    /// to most-recently-used, which is why it takes `&mut self`.
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Returns the value stored under `key` without touching eviction order.
    fn peek(&self, key: &K) -> Option<&V>;

    /// Inserts or overwrites the value stored under `key`.
    fn put(&mut self, key: K, value: V);

    /// Removes `key`, returning its value if it was present.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Number of stored entries.
    fn len(&self) -> usize;

    /// Drops every entry.
    fn clear_all(&mut self);

    /// The entry that would be evicted next, `None` iff the store is empty.
    fn eldest_entry(&self) -> Option<(&K, &V)>;

    /// Whether `get` changes the eviction order of this store.
    fn promotes_on_get(&self) -> bool;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains_key(&self, key: &K) -> bool {
        self.peek(key).is_some()
    }
}

impl<K, V, C> Cache<K, V> for Box<C>
where
    C: Cache<K, V> + ?Sized,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        (**self).get(key)
    }

    fn peek(&self, key: &K) -> Option<&V> {
        (**self).peek(key)
    }

    fn put(&mut self, key: K, value: V) {
        (**self).put(key, value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        (**self).remove(key)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn clear_all(&mut self) {
        (**self).clear_all()
    }

    fn eldest_entry(&self) -> Option<(&K, &V)> {
        (**self).eldest_entry()
    }

    fn promotes_on_get(&self) -> bool {
        (**self).promotes_on_get()
    }
}

//! Broadcast Listener
//!
//! Fans a single cache event out to any number of subscribers.

use std::panic::{self, AssertUnwindSafe};

use parking_lot::RwLock;
use tracing::{error, trace};

use crate::listener::CacheListener;

// == Cache Event ==
/// One cache event, delivered uniformly to every subscriber.
#[derive(Debug, Clone, Copy)]
pub enum CacheEvent<'a, K, V> {
    Hit(&'a K),
    Miss(&'a K),
    Put(&'a K, &'a V),
}

impl<K, V> CacheEvent<'_, K, V> {
    /// Invokes the matching callback on `listener`.
    pub fn deliver(&self, listener: &dyn CacheListener<K, V>) {
        match *self {
            CacheEvent::Hit(key) => listener.on_hit(key),
            CacheEvent::Miss(key) => listener.on_miss(key),
            CacheEvent::Put(key, value) => listener.on_put(key, value),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            CacheEvent::Hit(_) => "hit",
            CacheEvent::Miss(_) => "miss",
            CacheEvent::Put(..) => "put",
        }
    }
}

// == Broadcast Listener ==
/// Listener that relays every event to its subscribers in registration order.
///
/// Subscribers can be added while the broadcaster is already attached to a
/// cache (share it through an `Arc`). A subscriber that panics is isolated:
/// the panic is logged and the remaining subscribers still receive the
/// event. This relies on unwinding, so it does not apply to builds with
/// `panic = "abort"`.
///
/// A subscriber must not register new subscribers on the broadcaster that
/// is currently notifying it.
pub struct BroadcastListener<K, V> {
    listeners: RwLock<Vec<Box<dyn CacheListener<K, V>>>>,
}

impl<K, V> BroadcastListener<K, V> {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(Vec::new()),
        }
    }

    /// Appends a subscriber. Duplicates are allowed and notified twice.
    pub fn add_listener<L>(&self, listener: L)
    where
        L: CacheListener<K, V> + 'static,
    {
        self.listeners.write().push(Box::new(listener));
    }

    pub fn len(&self) -> usize {
        self.listeners.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.read().is_empty()
    }

    // == Dispatch ==
    /// Delivers `event` to every subscriber, in registration order.
    ///
    /// Returns the number of subscribers that panicked.
    pub fn dispatch(&self, event: CacheEvent<'_, K, V>) -> usize {
        let listeners = self.listeners.read();
        trace!(event = event.name(), subscribers = listeners.len(), "broadcasting cache event");

        let mut failures = 0;
        for (position, listener) in listeners.iter().enumerate() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| event.deliver(&**listener)));
            if outcome.is_err() {
                failures += 1;
                error!(
                    event = event.name(),
                    position, "cache listener panicked, continuing with remaining listeners"
                );
            }
        }
        failures
    }
}

impl<K, V> Default for BroadcastListener<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> CacheListener<K, V> for BroadcastListener<K, V> {
    fn on_hit(&self, key: &K) {
        self.dispatch(CacheEvent::Hit(key));
    }

    fn on_miss(&self, key: &K) {
        self.dispatch(CacheEvent::Miss(key));
    }

    fn on_put(&self, key: &K, value: &V) {
        self.dispatch(CacheEvent::Put(key, value));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use parking_lot::Mutex;

    /// Appends `"<tag>:<event>:<key>"` to a shared journal.
    struct Recorder {
        tag: &'static str,
        journal: Arc<Mutex<Vec<String>>>,
    }

    impl CacheListener<String, i32> for Recorder {
        fn on_hit(&self, key: &String) {
            self.journal.lock().push(format!("{}:hit:{}", self.tag, key));
        }

        fn on_miss(&self, key: &String) {
            self.journal.lock().push(format!("{}:miss:{}", self.tag, key));
        }

        fn on_put(&self, key: &String, value: &i32) {
            self.journal.lock().push(format!("{}:put:{}={}", self.tag, key, value));
        }
    }

    struct Panicker;

    impl CacheListener<String, i32> for Panicker {
        fn on_hit(&self, _key: &String) {
            panic!("hit handler failed");
        }

        fn on_miss(&self, _key: &String) {
            panic!("miss handler failed");
        }

        fn on_put(&self, _key: &String, _value: &i32) {
            panic!("put handler failed");
        }
    }

    fn recorder(tag: &'static str, journal: &Arc<Mutex<Vec<String>>>) -> Recorder {
        Recorder {
            tag,
            journal: Arc::clone(journal),
        }
    }

    #[test]
    fn test_broadcast_in_registration_order() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let broadcast: BroadcastListener<String, i32> = BroadcastListener::new();
        broadcast.add_listener(recorder("first", &journal));
        broadcast.add_listener(recorder("second", &journal));
        broadcast.add_listener(recorder("third", &journal));

        broadcast.on_put(&"k".to_string(), &7);

        assert_eq!(
            *journal.lock(),
            vec!["first:put:k=7", "second:put:k=7", "third:put:k=7"]
        );
    }

    #[test]
    fn test_broadcast_all_event_kinds() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let broadcast: BroadcastListener<String, i32> = BroadcastListener::new();
        broadcast.add_listener(recorder("r", &journal));

        let key = "x".to_string();
        broadcast.on_hit(&key);
        broadcast.on_miss(&key);
        broadcast.on_put(&key, &1);

        assert_eq!(*journal.lock(), vec!["r:hit:x", "r:miss:x", "r:put:x=1"]);
    }

    #[test]
    fn test_broadcast_duplicates_are_notified_twice() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let shared = Arc::new(recorder("dup", &journal));
        let broadcast: BroadcastListener<String, i32> = BroadcastListener::new();
        broadcast.add_listener(Arc::clone(&shared));
        broadcast.add_listener(shared);

        broadcast.on_miss(&"m".to_string());

        assert_eq!(journal.lock().len(), 2);
        assert_eq!(broadcast.len(), 2);
    }

    #[test]
    fn test_nested_broadcasters() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let inner: BroadcastListener<String, i32> = BroadcastListener::new();
        inner.add_listener(recorder("inner-a", &journal));
        inner.add_listener(recorder("inner-b", &journal));

        let outer: BroadcastListener<String, i32> = BroadcastListener::new();
        outer.add_listener(recorder("outer", &journal));
        outer.add_listener(inner);

        outer.on_hit(&"k".to_string());

        assert_eq!(
            *journal.lock(),
            vec!["outer:hit:k", "inner-a:hit:k", "inner-b:hit:k"]
        );
    }

    #[test]
    fn test_panicking_subscriber_is_isolated() {
        let journal = Arc::new(Mutex::new(Vec::new()));
        let broadcast: BroadcastListener<String, i32> = BroadcastListener::new();
        broadcast.add_listener(recorder("before", &journal));
        broadcast.add_listener(Panicker);
        broadcast.add_listener(recorder("after", &journal));

        let failures = broadcast.dispatch(CacheEvent::Put(&"k".to_string(), &1));

        assert_eq!(failures, 1);
        assert_eq!(*journal.lock(), vec!["before:put:k=1", "after:put:k=1"]);
    }

    #[test]
    fn test_empty_broadcaster() {
        let broadcast: BroadcastListener<String, i32> = BroadcastListener::new();
        assert!(broadcast.is_empty());
        assert_eq!(broadcast.dispatch(CacheEvent::Miss(&"k".to_string())), 0);
    }
}

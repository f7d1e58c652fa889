//! File Cache Module
//!
//! Caches file contents by path on top of an observable cache. A miss loads
//! the file from disk, stores it, and returns it in the same call.

use std::fmt;
use std::fs;
use std::io;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::cache::{
    Cache, CapacityPolicy, ExpiryPolicy, FifoStore, LruStore, ObservableCache, StalePolicy,
    TimeAwareStore,
};
use crate::clock::{Clock, SystemClock};
use crate::error::{CacheError, Result};
use crate::listener::{BroadcastListener, CacheListener};

type BoxedCache = Box<dyn Cache<String, String> + Send + Sync>;

// == Strategy ==
/// Eviction order used by a capacity-bounded file cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Fifo,
    Lru,
}

impl FromStr for Strategy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fifo" => Ok(Strategy::Fifo),
            "lru" => Ok(Strategy::Lru),
            other => Err(CacheError::InvalidConfig(format!(
                "unknown cache strategy '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Fifo => f.write_str("fifo"),
            Strategy::Lru => f.write_str("lru"),
        }
    }
}

// == Cache Mode ==
/// How a [`FileCache`] decides which files to forget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Keep at most `capacity` files, evicting in `Strategy` order.
    Capacity(Strategy, usize),
    /// Forget files untouched for longer than the given duration.
    Expiration(Duration),
}

// == File Cache ==
/// Path to contents cache with pluggable eviction.
///
/// Every cache event goes through an internal [`BroadcastListener`], so
/// listeners can be attached at any time with [`FileCache::add_listener`].
pub struct FileCache {
    cache: BoxedCache,
    broadcast: Arc<BroadcastListener<String, String>>,
}

impl FileCache {
    /// Creates a cache holding at most `capacity` files.
    pub fn with_capacity(strategy: Strategy, capacity: usize) -> Result<Self> {
        let policy = CapacityPolicy::new(capacity);
        debug!(%strategy, capacity = policy.capacity(), "creating capacity-bounded file cache");
        match strategy {
            Strategy::Fifo => Self::observe(FifoStore::new(), policy),
            Strategy::Lru => Self::observe(LruStore::new(), policy),
        }
    }

    /// Creates a cache that forgets files untouched for longer than `ttl`.
    pub fn with_expiration(ttl: Duration) -> Result<Self> {
        Self::with_expiration_and_clock(ttl, SystemClock)
    }

    /// Like [`FileCache::with_expiration`], with an explicit clock.
    pub fn with_expiration_and_clock<C>(ttl: Duration, clock: C) -> Result<Self>
    where
        C: Clock + 'static,
    {
        let policy = ExpiryPolicy::new(ttl);
        debug!(ttl_ms = policy.ttl().as_millis() as u64, "creating expiring file cache");
        Self::observe(TimeAwareStore::with_clock(clock), policy)
    }

    pub fn from_mode(mode: CacheMode) -> Result<Self> {
        match mode {
            CacheMode::Capacity(strategy, capacity) => Self::with_capacity(strategy, capacity),
            CacheMode::Expiration(ttl) => Self::with_expiration(ttl),
        }
    }

    fn observe<S, P>(store: S, policy: P) -> Result<Self>
    where
        S: Cache<String, String> + Send + Sync + 'static,
        P: StalePolicy<String, String, S> + 'static,
    {
        let broadcast: Arc<BroadcastListener<String, String>> = Arc::new(BroadcastListener::new());
        let cache = ObservableCache::<String, String, S>::builder(store)
            .stale_policy(policy)
            .listener(Arc::clone(&broadcast))
            .build()?;

        Ok(Self {
            cache: Box::new(cache),
            broadcast,
        })
    }

    // == Get File Contents ==
    /// Returns the contents of the file at `path`.
    ///
    /// A hit is served from memory. On a miss the file is read from disk and
    /// cached before it is returned, so the miss and the following put are
    /// both reported to listeners. Bytes that are not valid UTF-8 are
    /// replaced with U+FFFD.
    ///
    /// # Errors
    /// - [`CacheError::NotFound`] if the file does not exist
    /// - [`CacheError::Io`] for any other read failure
    ///
    /// Nothing is cached when loading fails.
    pub fn get_file_contents(&mut self, path: &str) -> Result<String> {
        let key = path.to_string();
        if let Some(contents) = self.cache.get(&key) {
            return Ok(contents.clone());
        }

        let contents = load(path)?;
        debug!(path, bytes = contents.len(), "loaded file into cache");
        self.cache.put(key, contents.clone());
        Ok(contents)
    }

    /// Stores `contents` under `path` without touching the file system.
    pub fn put_file_contents(&mut self, path: impl Into<String>, contents: impl Into<String>) {
        self.cache.put(path.into(), contents.into());
    }

    /// Forgets the cached contents of `path`.
    pub fn invalidate(&mut self, path: &str) -> Option<String> {
        self.cache.remove(&path.to_string())
    }

    pub fn is_cached(&self, path: &str) -> bool {
        self.cache.contains_key(&path.to_string())
    }

    /// Subscribes `listener` to every hit, miss and put of this cache.
    pub fn add_listener<L>(&self, listener: L)
    where
        L: CacheListener<String, String> + 'static,
    {
        self.broadcast.add_listener(listener);
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}

fn load(path: &str) -> Result<String> {
    match fs::read(path) {
        Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(CacheError::NotFound(path.to_string()))
        }
        Err(source) => {
            warn!(path, error = %source, "failed to read file");
            Err(CacheError::Io {
                path: path.to_string(),
                source,
            })
        }
    }
}

//! Cache Module
//!
//! Eviction strategies behind one [`Cache`] contract, plus the observable
//! wrapper that adds stale policies and event listeners.
//!
//! # Stores
//! - [`FifoStore`]: eldest = first inserted
//! - [`LruStore`]: eldest = least recently touched
//! - [`TimeAwareStore`]: LRU plus last-touch timestamps

mod fifo;
mod lru;
mod observable;
pub mod policy;
mod time_aware;
mod traits;


// Re-export public types
pub use fifo::FifoStore;
pub use lru::{Iter as LruIter, LruStore};
pub use observable::{ObservableCache, ObservableCacheBuilder};
pub use policy::{CapacityPolicy, ExpiryPolicy, NeverStale, StalePolicy};
pub use time_aware::TimeAwareStore;
pub use traits::Cache;

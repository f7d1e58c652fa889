//! Stale Cache - pluggable-eviction caches with observable events
//!
//! FIFO, LRU and time-aware stores behind one contract, an observable
//! wrapper that evicts through stale policies and reports hits, misses and
//! puts to listeners, and a file contents cache served over HTTP.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod file_cache;
pub mod listener;
pub mod models;

pub use api::AppState;
pub use config::Config;
pub use error::{CacheError, Result};
pub use file_cache::{CacheMode, FileCache, Strategy};

//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::Result;
use crate::file_cache::{CacheMode, Strategy};

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Eviction strategy: `fifo`, `lru` or `ttl`
    pub strategy: String,
    /// Maximum number of cached files for `fifo` and `lru`
    pub capacity: usize,
    /// Idle time in milliseconds after which `ttl` forgets a file
    pub ttl_ms: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Directory that requested file paths are resolved against
    pub file_root: PathBuf,
    /// Number of keys listed in each top-N section of `/stats`
    pub top_keys: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_STRATEGY` - `fifo`, `lru` or `ttl` (default: lru)
    /// - `CACHE_CAPACITY` - Maximum cached files (default: 1000)
    /// - `CACHE_TTL_MS` - Idle expiry in milliseconds (default: 60000)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `FILE_ROOT` - Root directory for served files (default: .)
    /// - `TOP_KEYS` - Keys per top-N list in stats (default: 5)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            strategy: env::var("CACHE_STRATEGY").unwrap_or(defaults.strategy),
            capacity: parse_var("CACHE_CAPACITY").unwrap_or(defaults.capacity),
            ttl_ms: parse_var("CACHE_TTL_MS").unwrap_or(defaults.ttl_ms),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            file_root: env::var("FILE_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.file_root),
            top_keys: parse_var("TOP_KEYS").unwrap_or(defaults.top_keys),
        }
    }

    /// Interprets `strategy` together with `capacity` and `ttl_ms`.
    ///
    /// # Errors
    /// [`CacheError::InvalidConfig`](crate::error::CacheError::InvalidConfig)
    /// for an unknown strategy name.
    pub fn cache_mode(&self) -> Result<CacheMode> {
        if self.strategy.trim().eq_ignore_ascii_case("ttl") {
            return Ok(CacheMode::Expiration(Duration::from_millis(self.ttl_ms)));
        }
        let strategy: Strategy = self.strategy.parse()?;
        Ok(CacheMode::Capacity(strategy, self.capacity))
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strategy: "lru".to_string(),
            capacity: 1000,
            ttl_ms: 60_000,
            server_port: 3000,
            file_root: PathBuf::from("."),
            top_keys: 5,
        }
    }
}

//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::listener::CacheStats;

/// Response body for reading a file (GET /files/*path)
#[derive(Debug, Clone, Serialize)]
pub struct FileResponse {
    /// The requested path, relative to the file root
    pub path: String,
    /// File contents, from the cache or freshly loaded
    pub contents: String,
}

impl FileResponse {
    pub fn new(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
        }
    }
}

/// Response body for storing contents (PUT /files/*path)
#[derive(Debug, Clone, Serialize)]
pub struct PutFileResponse {
    /// Success message
    pub message: String,
    /// The path that was stored
    pub path: String,
}

impl PutFileResponse {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            message: format!("Contents for '{}' cached successfully", path),
            path,
        }
    }
}

/// Response body for invalidation (DELETE /files/*path)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The path that was invalidated
    pub path: String,
}

impl DeleteResponse {
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self {
            message: format!("Path '{}' invalidated", path),
            path,
        }
    }
}

/// Most active keys per event kind.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TopKeys {
    pub hits: Vec<String>,
    pub misses: Vec<String>,
    pub updates: Vec<String>,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub hits: u64,
    pub misses: u64,
    /// Number of puts, including loads on miss
    pub updates: u64,
    /// Current number of cached files
    pub total_entries: usize,
    /// hits / (hits + misses), 0.0 before the first lookup
    pub hit_rate: f64,
    /// Most hit, missed and updated paths
    pub top_keys: TopKeys,
}

impl StatsResponse {
    /// Creates a new StatsResponse from a counter snapshot
    pub fn new(stats: CacheStats, total_entries: usize, top_keys: TopKeys) -> Self {
        Self {
            hits: stats.hits,
            misses: stats.misses,
            updates: stats.updates,
            total_entries,
            hit_rate: stats.hit_rate(),
            top_keys,
        }
    }
}

/// Liveness payload (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    /// RFC 3339 time the response was produced
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// JSON body of every failed request: `{ "error": "..." }`
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

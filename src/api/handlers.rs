//! API Handlers
//!
//! HTTP request handlers for each file cache endpoint.

use std::fs;
use std::io;
use std::path::{Component, Path as FsPath, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::{debug, error, warn};

use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::file_cache::FileCache;
use crate::listener::{KeyStatsListener, StatsListener};
use crate::models::{
    DeleteResponse, FileResponse, HealthResponse, PutFileRequest, PutFileResponse, StatsResponse,
    TopKeys,
};

/// Application state shared across all handlers.
///
/// The file cache sits behind one mutex: a hit can reorder entries and a
/// miss inserts one, so every access is exclusive.
#[derive(Clone)]
pub struct AppState {
    /// Thread-safe file cache
    pub cache: Arc<Mutex<FileCache>>,
    /// Aggregate counters attached to the cache
    pub stats: Arc<StatsListener>,
    /// Per-path counters attached to the cache
    pub key_stats: Arc<KeyStatsListener<String>>,
    /// Directory requested paths are resolved against
    pub root: PathBuf,
    /// Entries per top-N list in `/stats`
    pub top_keys: usize,
}

impl AppState {
    /// Wraps `cache` and attaches the statistics listeners to it.
    pub fn new(cache: FileCache, root: impl Into<PathBuf>, top_keys: usize) -> Self {
        let stats = Arc::new(StatsListener::new());
        let key_stats = Arc::new(KeyStatsListener::new());
        cache.add_listener(Arc::clone(&stats));
        cache.add_listener(Arc::clone(&key_stats));

        Self {
            cache: Arc::new(Mutex::new(cache)),
            stats,
            key_stats,
            root: root.into(),
            top_keys,
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// # Errors
    /// [`CacheError::InvalidConfig`] if the configured strategy is unknown.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = FileCache::from_mode(config.cache_mode()?)?;
        Ok(Self::new(cache, config.file_root.clone(), config.top_keys))
    }

    /// Maps a cache key back to the path clients asked for.
    fn display_path(&self, key: String) -> String {
        match FsPath::new(&key).strip_prefix(&self.root) {
            Ok(relative) => relative.to_string_lossy().into_owned(),
            Err(_) => key,
        }
    }
}

/// Resolves the relative path `requested` under `root`.
///
/// Only plain path segments are accepted. A parent (`..`) or absolute
/// component, or an empty path, is rejected with [`CacheError::InvalidPath`].
pub fn resolve_path(root: &FsPath, requested: &str) -> Result<PathBuf> {
    let mut resolved = root.to_path_buf();
    let mut segments = 0;

    for component in FsPath::new(requested).components() {
        match component {
            Component::Normal(segment) => {
                resolved.push(segment);
                segments += 1;
            }
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(CacheError::InvalidPath(requested.to_string()));
            }
        }
    }

    if segments == 0 {
        return Err(CacheError::InvalidPath(requested.to_string()));
    }
    Ok(resolved)
}

/// Rejects `resolved` when, after following symlinks, it lies outside `root`.
///
/// A path that does not exist is let through; loading it then reports
/// [`CacheError::NotFound`].
pub fn confine_to_root(root: &FsPath, resolved: &FsPath, requested: &str) -> Result<()> {
    let canonical = match fs::canonicalize(resolved) {
        Ok(path) => path,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(source) => {
            return Err(CacheError::Io {
                path: resolved.display().to_string(),
                source,
            })
        }
    };
    let canonical_root = fs::canonicalize(root).map_err(|source| CacheError::Io {
        path: root.display().to_string(),
        source,
    })?;

    if !canonical.starts_with(&canonical_root) {
        warn!(requested, target = %canonical.display(), "path escapes file root");
        return Err(CacheError::InvalidPath(requested.to_string()));
    }
    Ok(())
}

fn cache_key(root: &FsPath, requested: &str) -> Result<String> {
    let resolved = resolve_path(root, requested)?;
    Ok(resolved.to_string_lossy().into_owned())
}

/// Handler for GET /files/*path
///
/// Returns the file contents, loading the file on a cache miss.
pub async fn get_file_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<FileResponse>> {
    let resolved = resolve_path(&state.root, &path)?;
    let root = state.root.clone();
    let cache = Arc::clone(&state.cache);
    let requested = path.clone();

    // Symlink resolution and file reads block, so they stay off the async workers
    let contents = tokio::task::spawn_blocking(move || {
        confine_to_root(&root, &resolved, &requested)?;
        let key = resolved.to_string_lossy().into_owned();
        cache.blocking_lock().get_file_contents(&key)
    })
    .await
    .map_err(|e| {
        error!(error = %e, "file load task failed");
        CacheError::Internal(e.to_string())
    })??;

    Ok(Json(FileResponse::new(path, contents)))
}

/// Handler for PUT /files/*path
///
/// Stores the request contents under the path without touching the disk.
pub async fn put_file_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Json(req): Json<PutFileRequest>,
) -> Result<Json<PutFileResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }
    let key = cache_key(&state.root, &path)?;

    let mut cache = state.cache.lock().await;
    cache.put_file_contents(key, req.contents);

    Ok(Json(PutFileResponse::new(path)))
}

/// Handler for DELETE /files/*path
///
/// Drops the cached contents of a path.
pub async fn delete_file_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let key = cache_key(&state.root, &path)?;

    let mut cache = state.cache.lock().await;
    if cache.invalidate(&key).is_none() {
        return Err(CacheError::NotFound(path));
    }
    debug!(path = %path, "invalidated cached file");

    Ok(Json(DeleteResponse::new(path)))
}

/// Handler for GET /stats
///
/// Returns current counters, the entry count and the most active paths.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let total_entries = state.cache.lock().await.len();

    let top = state.top_keys;
    let relative = |keys: Vec<String>| -> Vec<String> {
        keys.into_iter().map(|key| state.display_path(key)).collect()
    };
    let top_keys = TopKeys {
        hits: relative(state.key_stats.top_hit_keys(top)),
        misses: relative(state.key_stats.top_missed_keys(top)),
        updates: relative(state.key_stats.top_updated_keys(top)),
    };

    Json(StatsResponse::new(
        state.stats.snapshot(),
        total_entries,
        top_keys,
    ))
}

/// Handler for GET /health
///
/// Returns health status of the server.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

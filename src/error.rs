//! Error types for the cache crate
//!
//! Provides unified error handling using thiserror. A missing key is never
//! an error; these variants cover misconfiguration and file loading.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Cache Error Enum ==
/// Unified error type for the cache crate.
#[derive(Error, Debug)]
pub enum CacheError {
    /// An observable cache was built without a stale policy
    #[error("Stale policy must be set before the cache is used")]
    MissingStalePolicy,

    /// An observable cache was built without a listener
    #[error("Cache listener must be set before the cache is used")]
    MissingListener,

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Requested path escapes the file root or is malformed
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// File or cached entry does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A background task ended without producing a result
    #[error("Internal error: {0}")]
    Internal(String),

    /// Reading a file failed
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

// == IntoResponse Implementation ==
impl IntoResponse for CacheError {
    fn into_response(self) -> Response {
        let status = match &self {
            CacheError::NotFound(_) => StatusCode::NOT_FOUND,
            CacheError::InvalidRequest(_) | CacheError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            CacheError::MissingStalePolicy
            | CacheError::MissingListener
            | CacheError::InvalidConfig(_)
            | CacheError::Internal(_)
            | CacheError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache crate.
pub type Result<T> = std::result::Result<T, CacheError>;

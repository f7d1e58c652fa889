//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

/// Largest accepted `contents` body, in bytes.
pub const MAX_CONTENTS_LEN: usize = 1024 * 1024;

/// Request body for storing file contents (PUT /files/*path)
#[derive(Debug, Clone, Deserialize)]
pub struct PutFileRequest {
    /// Contents to cache under the request path
    pub contents: String,
}

impl PutFileRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.contents.len() > MAX_CONTENTS_LEN {
            return Some(format!(
                "Contents exceed maximum length of {} bytes",
                MAX_CONTENTS_LEN
            ));
        }
        None
    }
}

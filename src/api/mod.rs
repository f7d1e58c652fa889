//! API Module
//!
//! HTTP handlers and routing for the file cache REST API.
//!
//! # Endpoints
//! - `GET /files/*path` - Read a file through the cache
//! - `PUT /files/*path` - Store contents for a path
//! - `DELETE /files/*path` - Invalidate a cached path
//! - `GET /stats` - Get cache statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;

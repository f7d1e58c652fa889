//! Request and Response models for the file cache API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::PutFileRequest;
pub use responses::{
    DeleteResponse, ErrorResponse, FileResponse, HealthResponse, PutFileResponse, StatsResponse,
    TopKeys,
};

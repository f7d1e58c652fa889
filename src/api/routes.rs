//! API Routes
//!
//! Configures the Axum router with all file cache endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    delete_file_handler, get_file_handler, health_handler, put_file_handler, stats_handler,
    AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /files/*path` - Read a file through the cache
/// - `PUT /files/*path` - Store contents for a path
/// - `DELETE /files/*path` - Invalidate a cached path
/// - `GET /stats` - Get cache statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin (configurable for production)
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    // Configure CORS middleware
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(
            "/files/*path",
            get(get_file_handler)
                .put(put_file_handler)
                .delete(delete_file_handler),
        )
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_cache::{FileCache, Strategy};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tempfile::TempDir;
    use tower::util::ServiceExt;

    fn create_test_app(dir: &TempDir) -> Router {
        let cache = FileCache::with_capacity(Strategy::Fifo, 100).unwrap();
        let state = AppState::new(cache, dir.path(), 5);
        create_router(state)
    }

    async fn status_of(app: Router, method: &str, uri: &str) -> StatusCode {
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
        .status()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let dir = TempDir::new().unwrap();
        let status = status_of(create_test_app(&dir), "GET", "/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_stats_endpoint() {
        let dir = TempDir::new().unwrap();
        let status = status_of(create_test_app(&dir), "GET", "/stats").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_existing_file() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();
        let status = status_of(create_test_app(&dir), "GET", "/files/a.txt").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_get_not_found() {
        let dir = TempDir::new().unwrap();
        let status = status_of(create_test_app(&dir), "GET", "/files/nonexistent").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_parent_segment_rejected() {
        let dir = TempDir::new().unwrap();
        let status = status_of(create_test_app(&dir), "GET", "/files/a/../../etc/passwd").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_uncached_path() {
        let dir = TempDir::new().unwrap();
        let status = status_of(create_test_app(&dir), "DELETE", "/files/a.txt").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

//! Request size limits.
//!
//! Oversized bodies are answered with 413 before any handler parses them.

use axum::extract::DefaultBodyLimit;
use tower_http::limit::RequestBodyLimitLayer;

/// Cap enforced on the raw body stream, including chunked uploads.
pub fn body_limit(max_body_size: usize) -> RequestBodyLimitLayer {
    RequestBodyLimitLayer::new(max_body_size)
}

/// Matching cap for axum's own extractors, which otherwise default to 2 MB.
pub fn extractor_limit(max_body_size: usize) -> DefaultBodyLimit {
    DefaultBodyLimit::max(max_body_size)
}

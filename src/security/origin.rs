//! Origin allow-list enforcement.

use std::collections::HashSet;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Origins permitted to call the gateway cross-origin.
#[derive(Debug, Clone, Default)]
pub struct AllowedOrigins {
    origins: Arc<HashSet<String>>,
}

impl AllowedOrigins {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            origins: Arc::new(origins.into_iter().map(Into::into).collect()),
        }
    }

    pub fn contains(&self, origin: &str) -> bool {
        self.origins.contains(origin)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.origins.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }
}

/// Reject any request whose `Origin` is declared and not allow-listed.
///
/// Requests without an `Origin` header (server-to-server, same-origin
/// navigation) always pass.
pub async fn origin_guard(
    State(allowed): State<AllowedOrigins>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let origin = match request.headers().get(header::ORIGIN) {
        None => return next.run(request).await,
        Some(value) => value.to_str().unwrap_or_default().to_string(),
    };

    if allowed.contains(&origin) {
        return next.run(request).await;
    }

    tracing::warn!(
        origin = %origin,
        method = %request.method(),
        path = %request.uri().path(),
        "Rejected request from disallowed origin"
    );
    StatusCode::FORBIDDEN.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{middleware, routing::get, Router};
    use tower::ServiceExt;

    fn app(allowed: AllowedOrigins) -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(middleware::from_fn_with_state(allowed, origin_guard))
    }

    async fn status_for(origin: Option<&str>) -> (StatusCode, usize) {
        let mut builder = Request::builder().uri("/");
        if let Some(origin) = origin {
            builder = builder.header(header::ORIGIN, origin);
        }
        let response = app(AllowedOrigins::new(["https://app.example"]))
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        (status, body.len())
    }

    #[tokio::test]
    async fn test_missing_origin_passes() {
        assert_eq!(status_for(None).await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_allowed_origin_passes() {
        assert_eq!(status_for(Some("https://app.example")).await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_disallowed_origin_is_rejected_without_body() {
        assert_eq!(
            status_for(Some("https://evil.example")).await,
            (StatusCode::FORBIDDEN, 0)
        );
    }

    #[tokio::test]
    async fn test_empty_list_rejects_every_declared_origin() {
        let response = app(AllowedOrigins::default())
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ORIGIN, "http://localhost:3000")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }
}

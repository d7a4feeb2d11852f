//! CORS headers for allow-listed origins.

use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::security::origin::AllowedOrigins;

/// Only query submission and preflight are permitted cross-origin, with
/// `content-type` as the sole request header.
pub fn cors_layer(allowed: &AllowedOrigins) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            // `AllowOrigin::list` refuses wildcards.
            Ok(value) if value != "*" => Some(value),
            _ => {
                tracing::warn!(origin = %origin, "Ignoring invalid allowed origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::post, Router};
    use tower::ServiceExt;

    #[test]
    fn test_wildcard_entry_is_skipped() {
        let allowed = AllowedOrigins::new(["*", "https://app.example"]);
        let _ = cors_layer(&allowed);
    }

    #[tokio::test]
    async fn test_preflight_for_allowed_origin() {
        let allowed = AllowedOrigins::new(["https://app.example"]);
        let app = Router::new()
            .route("/query", post(|| async { "ok" }))
            .layer(cors_layer(&allowed));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/query")
                    .header(header::ORIGIN, "https://app.example")
                    .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                    .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        let headers = response.headers();
        assert_eq!(
            headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://app.example"
        );
        let methods = headers
            .get(header::ACCESS_CONTROL_ALLOW_METHODS)
            .unwrap()
            .to_str()
            .unwrap();
        assert!(methods.contains("POST"));
        assert!(!methods.contains("DELETE"));
    }
}

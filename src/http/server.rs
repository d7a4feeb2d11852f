//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all handlers
//! - Wire up middleware (request ID, tracing, timeout, origin guard, CORS, limits)
//! - Bind server to listener
//! - Close the database client exactly once after the last request drains

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::bolt::{BoltError, Target};
use crate::config::GatewayConfig;
use crate::driver::GraphClient;
use crate::http::request::{request_id, MakeRequestUuid};
use crate::http::{debug, health, query};
use crate::observability::metrics;
use crate::security::{self, AllowedOrigins};

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<dyn GraphClient>,
    pub config: Arc<GatewayConfig>,
    /// Parsed database target; probes dial `dial_host()` and validate `host`.
    pub target: Arc<Target>,
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server. Fails only on an unparsable database URI.
    pub fn new(config: GatewayConfig, client: Arc<dyn GraphClient>) -> Result<Self, BoltError> {
        let target = Target::parse(&config.database.uri, config.database.connect_host.as_deref())?;
        let state = AppState {
            client,
            config: Arc::new(config),
            target: Arc::new(target),
        };
        let router = Self::build_router(state.clone());
        Ok(Self { router, state })
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers run outermost-last: request ID is assigned first, then the
    /// trace span opens, and the origin guard runs before CORS and limits.
    fn build_router(state: AppState) -> Router {
        let config = state.config.clone();
        let allowed = AllowedOrigins::new(config.cors.allowed_origins.iter().cloned());
        if allowed.is_empty() {
            tracing::info!("Origin allow-list is empty; requests declaring an Origin will be rejected");
        }

        Router::new()
            .route("/health", get(health::health))
            .route("/query", post(query::run_query))
            .route("/debug/bolt", get(debug::bolt))
            .route("/debug/tls", get(debug::tls))
            .route("/debug/driver", get(debug::driver))
            .route_layer(middleware::from_fn(metrics::track_requests))
            .with_state(state)
            .layer(security::limits::extractor_limit(config.cors.max_body_size))
            .layer(security::limits::body_limit(config.cors.max_body_size))
            .layer(security::cors_layer(&allowed))
            .layer(middleware::from_fn_with_state(allowed, security::origin_guard))
            .layer(TimeoutLayer::with_status_code(
                StatusCode::REQUEST_TIMEOUT,
                Duration::from_secs(config.timeouts.request_secs),
            ))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    request_id = %request_id(request),
                    method = %request.method(),
                    path = %request.uri().path(),
                )
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server until `shutdown` fires, then close the client.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Draining in-flight requests");
            })
            .await;

        self.state.client.close().await;
        tracing::info!("HTTP server stopped");
        served
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.state.config
    }
}

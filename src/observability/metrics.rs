//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, path, status
//! - `gateway_request_duration_seconds` (histogram): latency distribution
//! - `gateway_queries_total` (counter): queries by outcome
//! - `gateway_probes_total` (counter): diagnostic probes by kind and outcome

use std::net::SocketAddr;
use std::time::Instant;

use axum::{body::Body, extract::MatchedPath, http::Request, middleware::Next, response::Response};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics recorder"),
    }
}

pub fn record_request(method: &str, path: &str, status: u16, start_time: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("gateway_requests_total", &labels).increment(1);
    metrics::histogram!("gateway_request_duration_seconds", &labels)
        .record(start_time.elapsed().as_secs_f64());
}

pub fn record_query(outcome: &'static str) {
    metrics::counter!("gateway_queries_total", "outcome" => outcome).increment(1);
}

pub fn record_probe(kind: &'static str, outcome: &'static str) {
    metrics::counter!("gateway_probes_total", "kind" => kind, "outcome" => outcome).increment(1);
}

/// Record every request that reaches the router.
pub async fn track_requests(request: Request<Body>, next: Next) -> Response {
    let start_time = Instant::now();
    let method = request.method().to_string();
    // Unmatched paths share one label to keep cardinality bounded.
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());

    let response = next.run(request).await;
    record_request(&method, &path, response.status().as_u16(), start_time);
    response
}

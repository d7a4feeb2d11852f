//! `GET /health`: liveness including the database.

use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::http::server::AppState;
use crate::probes;

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let timeout = Duration::from_secs(state.config.database.connection_timeout_secs);
    match probes::probe_driver(state.client.as_ref(), timeout).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "ok": true }))),
        Err(failure) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "ok": false, "error": failure.message })),
        ),
    }
}

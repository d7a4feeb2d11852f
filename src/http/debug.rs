//! Diagnostic endpoints.
//!
//! | Path            | Success                      | Failure                          |
//! |-----------------|------------------------------|----------------------------------|
//! | `/debug/bolt`   | `{connect:true}`             | `{connect:false,error}` 502/504  |
//! | `/debug/tls`    | `{ok:true,info:{...}}`       | `{ok:false,error}` 502/504       |
//! | `/debug/driver` | `{ok:true}`                  | `{ok:false,error}` 502           |

use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::http::server::AppState;
use crate::observability::metrics;
use crate::probes::{self, ProbeFailure};

fn failure_status(failure: &ProbeFailure) -> StatusCode {
    if failure.is_timeout() {
        StatusCode::GATEWAY_TIMEOUT
    } else {
        StatusCode::BAD_GATEWAY
    }
}

pub async fn bolt(State(state): State<AppState>) -> impl IntoResponse {
    let timeout = Duration::from_millis(state.config.probes.tcp_timeout_ms);
    let outcome = probes::probe_tcp(
        state.target.dial_host(),
        state.config.probes.bolt_port,
        timeout,
    )
    .await;
    metrics::record_probe("bolt", probes::outcome_label(&outcome));

    match outcome {
        Ok(()) => (StatusCode::OK, Json(json!({ "connect": true }))),
        Err(failure) => (
            failure_status(&failure),
            Json(json!({ "connect": false, "error": failure.message })),
        ),
    }
}

pub async fn tls(State(state): State<AppState>) -> impl IntoResponse {
    let timeout = Duration::from_millis(state.config.probes.tls_timeout_ms);
    let outcome = probes::probe_tls(
        state.target.dial_host(),
        state.config.probes.bolt_port,
        &state.target.host,
        timeout,
    )
    .await;
    metrics::record_probe("tls", probes::outcome_label(&outcome));

    match outcome {
        Ok(info) => (StatusCode::OK, Json(json!({ "ok": true, "info": info }))),
        Err(failure) => (
            failure_status(&failure),
            Json(json!({ "ok": false, "error": failure.message })),
        ),
    }
}

pub async fn driver(State(state): State<AppState>) -> impl IntoResponse {
    let timeout = Duration::from_secs(state.config.database.connection_timeout_secs);
    let outcome = probes::probe_driver(state.client.as_ref(), timeout).await;
    metrics::record_probe("driver", probes::outcome_label(&outcome));

    match outcome {
        Ok(()) => (StatusCode::OK, Json(json!({ "ok": true }))),
        Err(failure) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "ok": false, "error": failure.message })),
        ),
    }
}

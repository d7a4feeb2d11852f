//! Response envelopes.
//!
//! Query responses use a two-shape envelope compatible with the Neo4j
//! transactional HTTP API:
//! ```text
//! success: { "results": [ { "columns": [...], "data": [ { "row": [...] } ] } ], "errors": [] }
//! failure: { "results": [], "errors": [ { "code": "...", "message": "..." } ] }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryEnvelope {
    pub results: Vec<StatementResult>,
    pub errors: Vec<QueryErrorBody>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementResult {
    pub columns: Vec<String>,
    pub data: Vec<Row>,
}

/// Values aligned positionally with `columns`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub row: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryErrorBody {
    pub code: String,
    pub message: String,
}

impl QueryEnvelope {
    pub fn success(result: StatementResult) -> Self {
        Self {
            results: vec![result],
            errors: Vec::new(),
        }
    }

    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            results: Vec::new(),
            errors: vec![QueryErrorBody {
                code: code.into(),
                message: message.into(),
            }],
        }
    }

    pub fn with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for QueryEnvelope {
    fn into_response(self) -> Response {
        let status = if self.errors.is_empty() {
            StatusCode::OK
        } else {
            StatusCode::BAD_REQUEST
        };
        self.with_status(status)
    }
}

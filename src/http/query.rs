//! `POST /query`: run one Cypher statement.
//!
//! # Steps
//! 1. Reject a missing or blank `cypher` before touching the database
//! 2. Open a session on the configured database
//! 3. Run with parameters, derive columns from the first record
//! 4. Serialize every row positionally
//! 5. Close the session on every path; a close error never masks the result

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use crate::bolt::{BoltMap, BoltValue};
use crate::driver::{ClientError, RecordSet};
use crate::http::response::{QueryEnvelope, Row, StatementResult};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::serializer;

pub const FALLBACK_CODE: &str = "QueryError";
pub const BAD_REQUEST_CODE: &str = "BadRequest";
pub const TIMEOUT_CODE: &str = "QueryTimeout";

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub cypher: Option<String>,
    #[serde(default)]
    pub params: Option<Value>,
}

pub async fn run_query(
    State(state): State<AppState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            let status = match rejection.status() {
                StatusCode::PAYLOAD_TOO_LARGE => StatusCode::PAYLOAD_TOO_LARGE,
                _ => StatusCode::BAD_REQUEST,
            };
            metrics::record_query("rejected");
            return QueryEnvelope::failure(BAD_REQUEST_CODE, rejection.body_text()).with_status(status);
        }
    };

    let cypher = match request.cypher.as_deref().map(str::trim) {
        Some(cypher) if !cypher.is_empty() => cypher.to_string(),
        _ => {
            metrics::record_query("rejected");
            return QueryEnvelope::failure(BAD_REQUEST_CODE, "Missing 'cypher' in request body").into_response();
        }
    };

    let params = match to_params(request.params) {
        Ok(params) => params,
        Err(message) => {
            metrics::record_query("rejected");
            return QueryEnvelope::failure(BAD_REQUEST_CODE, message).into_response();
        }
    };

    match execute(&state, &cypher, params).await {
        Ok(records) => {
            metrics::record_query("success");
            QueryEnvelope::success(shape(&records)).into_response()
        }
        Err(e) => {
            let code = error_code(&e);
            tracing::error!(code = %code, error = %e, "Query failed");
            metrics::record_query(if e.is_timeout() { "timeout" } else { "error" });
            QueryEnvelope::failure(code, e.to_string()).into_response()
        }
    }
}

async fn execute(state: &AppState, cypher: &str, params: BoltMap) -> Result<RecordSet, ClientError> {
    let mut session = state.client.session(&state.config.database.database).await?;
    let result = session.run(cypher, params).await;
    if let Err(e) = session.close().await {
        tracing::warn!(error = %e, "Failed to close session");
    }
    result
}

/// `params` must be absent, null, or an object.
fn to_params(params: Option<Value>) -> Result<BoltMap, String> {
    match params {
        None | Some(Value::Null) => Ok(BoltMap::new()),
        Some(Value::Object(map)) => Ok(map
            .iter()
            .map(|(key, value)| (key.clone(), BoltValue::from(value)))
            .collect()),
        Some(_) => Err("'params' must be an object".to_string()),
    }
}

/// Columns come from the first record; zero records means zero columns.
pub fn shape(records: &RecordSet) -> StatementResult {
    let columns: Vec<String> = records
        .records()
        .first()
        .map(|record| record.keys().to_vec())
        .unwrap_or_default();

    let data = records
        .records()
        .iter()
        .map(|record| Row {
            row: columns
                .iter()
                .map(|column| record.get(column).map(serializer::serialize).unwrap_or(Value::Null))
                .collect(),
        })
        .collect();

    StatementResult { columns, data }
}

fn error_code(error: &ClientError) -> String {
    match error.code() {
        Some(code) => code.to_string(),
        None if error.is_timeout() => TIMEOUT_CODE.to_string(),
        None => FALLBACK_CODE.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_columns_follow_first_record() {
        let records = RecordSet::from_rows(
            &["a", "b"],
            vec![
                vec![BoltValue::Integer(1), BoltValue::String("x".into())],
                vec![BoltValue::Integer(i64::MAX), BoltValue::Null],
            ],
        );
        let result = shape(&records);
        assert_eq!(result.columns, vec!["a", "b"]);
        assert_eq!(result.data.len(), 2);
        assert_eq!(result.data[0].row, vec![json!(1), json!("x")]);
        assert_eq!(result.data[1].row, vec![json!(i64::MAX.to_string()), Value::Null]);
    }

    #[test]
    fn test_no_records_means_no_columns() {
        let result = shape(&RecordSet::from_rows(&["a"], Vec::new()));
        assert!(result.columns.is_empty());
        assert!(result.data.is_empty());
    }

    #[test]
    fn test_params_must_be_an_object() {
        assert!(to_params(None).unwrap().is_empty());
        assert!(to_params(Some(Value::Null)).unwrap().is_empty());
        assert!(to_params(Some(json!([1, 2]))).is_err());

        let params = to_params(Some(json!({"n": 3, "name": "Ada"}))).unwrap();
        assert_eq!(params.get("n"), Some(&BoltValue::Integer(3)));
        assert_eq!(params.get("name"), Some(&BoltValue::String("Ada".into())));
    }

    #[test]
    fn test_error_codes() {
        let server = ClientError::Server {
            code: "Neo.ClientError.Statement.SyntaxError".into(),
            message: "bad".into(),
        };
        assert_eq!(error_code(&server), "Neo.ClientError.Statement.SyntaxError");
        assert_eq!(error_code(&ClientError::Timeout("30s".into())), TIMEOUT_CODE);
        assert_eq!(error_code(&ClientError::Connection("refused".into())), FALLBACK_CODE);
    }
}

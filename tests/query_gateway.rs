//! Query endpoint behavior against a scripted client.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use bolt_gateway::bolt::{BoltMap, BoltValue, Node};
use bolt_gateway::config::GatewayConfig;
use bolt_gateway::driver::{ClientError, RecordSet};
use bolt_gateway::http::HttpServer;

mod common;
use common::MockClient;

async fn post_query(client: &MockClient, body: &str) -> (StatusCode, Value) {
    let server = HttpServer::new(GatewayConfig::default(), Arc::new(client.clone())).unwrap();
    let response = server
        .router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/query")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

#[tokio::test]
async fn test_missing_cypher_never_reaches_client() {
    let client = MockClient::new();
    let (status, body) = post_query(&client, "{}").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["results"], json!([]));
    assert_eq!(body["errors"][0]["code"], "BadRequest");
    assert_eq!(client.sessions(), (0, 0));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let client = MockClient::new();
    let (status, body) = post_query(&client, "{\"cypher\": ").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["errors"][0]["code"], "BadRequest");
    assert_eq!(client.sessions(), (0, 0));
}

#[tokio::test]
async fn test_zero_records_yield_empty_columns() {
    let client = MockClient::returning(RecordSet::from_rows(&["n"], Vec::new()));
    let (status, body) = post_query(&client, r#"{"cypher": "MATCH (n:Nothing) RETURN n"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"results": [{"columns": [], "data": []}], "errors": []})
    );
    assert_eq!(client.sessions(), (1, 1));
}

#[tokio::test]
async fn test_rows_align_with_columns() {
    let mut props = BoltMap::new();
    props.insert("name".into(), BoltValue::String("Ada".into()));
    let node = BoltValue::Node(Node {
        id: 7,
        labels: vec!["Person".into()],
        properties: props,
        element_id: None,
    });

    let client = MockClient::returning(RecordSet::from_rows(
        &["a", "b"],
        vec![
            vec![node, BoltValue::Integer(1)],
            vec![BoltValue::Null, BoltValue::Integer(i64::MAX)],
            vec![BoltValue::List(vec![]), BoltValue::Float(2.5)],
        ],
    ));
    let (status, body) = post_query(&client, r#"{"cypher": "RETURN 1"}"#).await;

    assert_eq!(status, StatusCode::OK);
    let result = &body["results"][0];
    assert_eq!(result["columns"], json!(["a", "b"]));
    let data = result["data"].as_array().unwrap();
    assert_eq!(data.len(), 3);
    for entry in data {
        assert_eq!(entry["row"].as_array().unwrap().len(), 2);
    }
    assert_eq!(data[0]["row"], json!([{"name": "Ada"}, 1]));
    assert_eq!(data[1]["row"], json!([null, "9223372036854775807"]));
    assert_eq!(body["errors"], json!([]));
}

#[tokio::test]
async fn test_params_and_database_are_forwarded() {
    let client = MockClient::new();
    let (status, _) = post_query(
        &client,
        r#"{"cypher": "RETURN $x, $name", "params": {"x": 42, "name": "Ada"}}"#,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (database, query, params) = client.state.last_run.lock().unwrap().clone().unwrap();
    assert_eq!(database, "neo4j");
    assert_eq!(query, "RETURN $x, $name");
    assert_eq!(params.get("x"), Some(&BoltValue::Integer(42)));
    assert_eq!(params.get("name"), Some(&BoltValue::String("Ada".into())));
}

#[tokio::test]
async fn test_server_error_keeps_its_code() {
    let client = MockClient::failing(ClientError::Server {
        code: "Neo.ClientError.Statement.SyntaxError".into(),
        message: "Invalid input 'RETRN'".into(),
    });
    let (status, body) = post_query(&client, r#"{"cypher": "RETRN 1"}"#).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "results": [],
            "errors": [{"code": "Neo.ClientError.Statement.SyntaxError", "message": "Invalid input 'RETRN'"}]
        })
    );
    assert_eq!(client.sessions(), (1, 1));
}

#[tokio::test]
async fn test_uncoded_errors_fall_back() {
    let client = MockClient::failing(ClientError::Connection("connection refused".into()));
    let (_, body) = post_query(&client, r#"{"cypher": "RETURN 1"}"#).await;
    assert_eq!(body["errors"][0]["code"], "QueryError");

    let client = MockClient::failing(ClientError::Timeout("operation timed out after 30s".into()));
    let (_, body) = post_query(&client, r#"{"cypher": "RETURN 1"}"#).await;
    assert_eq!(body["errors"][0]["code"], "QueryTimeout");
}

#[tokio::test]
async fn test_session_close_error_does_not_mask_result() {
    let client = MockClient::returning(RecordSet::from_rows(&["x"], vec![vec![BoltValue::Integer(1)]]))
        .failing_session_close(ClientError::Connection("reset by peer".into()));
    let (status, body) = post_query(&client, r#"{"cypher": "RETURN 1 AS x"}"#).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["data"][0]["row"], json!([1]));
    assert_eq!(client.state.sessions_closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let mut config = GatewayConfig::default();
    config.cors.max_body_size = 64;
    let client = MockClient::new();
    let server = HttpServer::new(config, Arc::new(client.clone())).unwrap();

    let cypher = "x".repeat(256);
    let response = server
        .router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/query")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "cypher": cypher }).to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(client.sessions(), (0, 0));
}

#[tokio::test]
async fn test_responses_carry_request_id() {
    let server = HttpServer::new(GatewayConfig::default(), Arc::new(MockClient::new())).unwrap();

    let generated = server
        .router()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let id = generated.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert!(uuid::Uuid::parse_str(id).is_ok());

    let echoed = server
        .router()
        .oneshot(
            Request::builder()
                .uri("/health")
                .header("x-request-id", "caller-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(echoed.headers().get("x-request-id").unwrap(), "caller-123");
}

#[tokio::test]
async fn test_slow_query_hits_request_timeout() {
    let client = MockClient::new().slow(std::time::Duration::from_secs(10));
    let mut config = GatewayConfig::default();
    config.timeouts.request_secs = 1;
    let server = HttpServer::new(config, Arc::new(client.clone())).unwrap();

    let response = server
        .router()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/query")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"cypher": "CALL apoc.util.sleep(10000)"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    assert_eq!(client.state.runs.load(Ordering::SeqCst), 1);
}

//! Origin enforcement over a live socket.

use std::sync::Arc;

use bolt_gateway::bolt::BoltValue;
use bolt_gateway::config::GatewayConfig;
use bolt_gateway::driver::RecordSet;

mod common;
use common::{http_client, spawn_gateway, MockClient};

fn config_allowing(origins: &[&str]) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.cors.allowed_origins = origins.iter().map(|o| o.to_string()).collect();
    config
}

#[tokio::test]
async fn test_origin_allow_list() {
    let client = MockClient::returning(RecordSet::from_rows(&["x"], vec![vec![BoltValue::Integer(1)]]));
    let gateway = spawn_gateway(
        config_allowing(&["https://app.example"]),
        Arc::new(client.clone()),
    )
    .await;
    let http = http_client();
    let body = serde_json::json!({ "cypher": "RETURN 1 AS x" });

    // Disallowed origin: rejected with no body, client untouched.
    let res = http
        .post(gateway.url("/query"))
        .header("Origin", "https://evil.example")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
    assert!(res.text().await.unwrap().is_empty());
    assert_eq!(client.sessions(), (0, 0));

    // No Origin header: server-to-server traffic passes.
    let res = http.post(gateway.url("/query")).json(&body).send().await.unwrap();
    assert_eq!(res.status(), 200);

    // Allow-listed origin passes and gets CORS headers.
    let res = http
        .post(gateway.url("/query"))
        .header("Origin", "https://app.example")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(
        res.headers().get("access-control-allow-origin").unwrap(),
        "https://app.example"
    );
    assert_eq!(client.sessions(), (2, 2));

    gateway.shutdown.trigger();
    gateway.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_disallowed_preflight_is_rejected() {
    let gateway = spawn_gateway(
        config_allowing(&["https://app.example"]),
        Arc::new(MockClient::new()),
    )
    .await;

    let res = http_client()
        .request(reqwest::Method::OPTIONS, gateway.url("/query"))
        .header("Origin", "https://evil.example")
        .header("Access-Control-Request-Method", "POST")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);
    assert!(res.headers().get("access-control-allow-origin").is_none());

    gateway.shutdown.trigger();
    gateway.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_empty_allow_list_rejects_declared_origins() {
    let gateway = spawn_gateway(GatewayConfig::default(), Arc::new(MockClient::new())).await;
    let http = http_client();

    let res = http
        .get(gateway.url("/health"))
        .header("Origin", "http://localhost:3000")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);

    let res = http.get(gateway.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    let json: serde_json::Value = res.json().await.unwrap();
    assert_eq!(json, serde_json::json!({"ok": true}));

    gateway.shutdown.trigger();
    gateway.handle.await.unwrap().unwrap();
}

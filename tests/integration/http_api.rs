//! HTTP surface exercised through the router, without a socket.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use exercise_forge::config::ForgeConfig;
use exercise_forge::server::{app_router, AppState, NDJSON_CONTENT_TYPE};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::integration::{StubFactory, StubOracle};

fn router(factory: Arc<StubFactory>) -> Router {
    app_router(AppState::new(factory, &ForgeConfig::default()))
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn colors_over_http_streams_twelve_exercises() {
    let factory = StubFactory::new(StubOracle::cooperative());
    let resp = router(factory.clone())
        .oneshot(post(
            "/api/generate/",
            json!({"topic": "Colors", "api_key": "sk-colors"}),
        ))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("content-type").unwrap(),
        NDJSON_CONTENT_TYPE
    );

    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let lines: Vec<Value> = String::from_utf8(bytes.to_vec())
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let result = lines.last().unwrap();
    assert_eq!(result["type"], "result");
    let ids: Vec<i64> = result["exercises"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, (1..=12).collect::<Vec<_>>());
    assert!(!lines.iter().any(|l| l["type"] == "error"));
    assert_eq!(
        *factory.credentials.lock(),
        vec!["sk-colors".to_string()]
    );
}

#[tokio::test]
async fn missing_topic_is_rejected_before_any_oracle_call() {
    let oracle = StubOracle::cooperative();
    let factory = StubFactory::new(oracle.clone());
    let resp = router(factory.clone())
        .oneshot(post("/api/generate", json!({"api_key": "sk"})))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value =
        serde_json::from_slice(&to_bytes(resp.into_body(), usize::MAX).await.unwrap()).unwrap();
    assert_eq!(body, json!({"error": "Topic and API Key are required"}));
    assert!(factory.credentials.lock().is_empty());
    assert_eq!(oracle.request_count(), 0);
}

#[tokio::test]
async fn barren_oracle_over_http_ends_with_error_line() {
    let factory = StubFactory::new(StubOracle::barren());
    let resp = router(factory)
        .oneshot(post(
            "/api/generate/",
            json!({"topic": "Colors", "api_key": "sk"}),
        ))
        .await
        .unwrap();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let last: Value = serde_json::from_str(text.lines().last().unwrap()).unwrap();
    assert_eq!(
        last,
        json!({
            "type": "error",
            "message": "Failed to generate any valid exercises. Please try a different topic."
        })
    );
    assert!(!text.contains(r#""type":"result""#));
}

#[tokio::test]
async fn cors_preflight_is_allowed() {
    let factory = StubFactory::new(StubOracle::cooperative());
    let req = Request::builder()
        .method("OPTIONS")
        .uri("/api/check/")
        .header("origin", "http://localhost:3000")
        .header("access-control-request-method", "POST")
        .body(Body::empty())
        .unwrap();
    let resp = router(factory).oneshot(req).await.unwrap();
    assert!(resp.status().is_success());
    assert_eq!(
        resp.headers().get("access-control-allow-origin").unwrap(),
        "*"
    );
}

//! Liveness, readiness and connectivity endpoints.

mod common;

use common::TestApp;
use wellness_service::services::providers::mock::MockTextProvider;

#[tokio::test]
async fn health_check_returns_200() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/health"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    assert!(response.headers().contains_key("x-request-id"));
    assert_eq!(
        response.headers()["x-content-type-options"],
        "nosniff"
    );

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "wellness-service");
}

#[tokio::test]
async fn request_id_is_echoed() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .get(app.url("/health"))
        .header("x-request-id", "req-123")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.headers()["x-request-id"], "req-123");
}

#[tokio::test]
async fn ready_without_database_is_200() {
    let app = TestApp::builder().without_store().spawn().await;

    let response = app
        .client
        .get(app.url("/ready"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_connection_reports_each_dependency() {
    let app = TestApp::builder()
        .text(MockTextProvider::new(true))
        .spawn()
        .await;

    let response = app
        .client
        .get(app.url("/api/test-connection"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["ai"], "ok");
    assert_eq!(body["data"]["database"], "ok");
}

#[tokio::test]
async fn test_connection_is_503_when_ai_is_down() {
    let app = TestApp::builder().without_store().spawn().await;

    let response = app
        .client
        .get(app.url("/api/test-connection"))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 503);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["success"], false);
    assert_eq!(body["data"]["ai"], "error");
    assert_eq!(body["data"]["database"], "not_configured");
}

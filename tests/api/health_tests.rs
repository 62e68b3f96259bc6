//! Health and metrics endpoint tests

use axum::http::StatusCode;

use crate::common::TestApp;

#[tokio::test]
async fn test_health_check_returns_ok() {
    let app = TestApp::new();
    let (status, body) = app.get("/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
    assert!(body["uptimeSeconds"].is_u64());
}

#[tokio::test]
async fn test_liveness_probe() {
    let app = TestApp::new();
    let (status, _) = app.get("/health/live", None).await;

    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_readiness_with_in_memory_storage() {
    let app = TestApp::new();
    let (status, body) = app.get("/health/ready", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"]["backend"], "memory");
    assert_eq!(body["gateway"]["connections"], 0);
}

#[tokio::test]
async fn test_metrics_are_exposed() {
    let app = TestApp::new();
    app.get("/health", None).await;
    let (status, body) = app.get("/metrics", None).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.as_str().unwrap().contains("http_requests_total"));
}

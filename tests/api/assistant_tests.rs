//! Help assistant endpoint tests

use axum::http::StatusCode;
use serde_json::json;

use crate::common::TestApp;

#[tokio::test]
async fn test_greeting_gets_small_talk_reply() {
    let app = TestApp::new();
    let (status, body) = app
        .post("/api/v1/assistant/chat", json!({ "message": "hello" }), None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source"], "small_talk");
}

#[tokio::test]
async fn test_question_is_answered_from_knowledge() {
    let app = TestApp::new();
    let (_, body) = app
        .post(
            "/api/v1/assistant/chat",
            json!({
                "message": "how do I join the live class",
                "history": [{ "role": "user", "content": "hi" }],
                "pageContext": { "path": "/our-courses/intro-to-python", "title": "Intro to Python" }
            }),
            None,
        )
        .await;

    assert_eq!(body["source"], "knowledge");
    assert_eq!(body["contexts"][0]["id"], "live-join");
}

#[tokio::test]
async fn test_empty_message_is_rejected() {
    let app = TestApp::new();
    let (status, _) = app
        .post("/api/v1/assistant/chat", json!({ "message": "" }), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

//! Support ticket endpoint tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::TestApp;
use live_classroom::domain::Role;

#[tokio::test]
async fn test_ticket_thread_lifecycle() {
    let app = TestApp::new();
    let user = app.user(Role::Student);
    let token = Some(user.token.as_str());

    let (status, created) = app
        .post(
            "/api/v1/tickets",
            json!({
                "subject": "Join button",
                "description": "Nothing happens when I click join",
                "category": "technical"
            }),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    assert_eq!(created["ticket"]["status"], "not_opened");
    assert_eq!(created["ticket"]["priority"], "medium");
    assert_eq!(created["messages"][0]["body"], "Nothing happens when I click join");
    let id = created["ticket"]["id"].as_str().unwrap().to_string();

    let (status, posted) = app
        .post(
            &format!("/api/v1/tickets/{id}/messages"),
            json!({ "body": "Still broken" }),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(posted["ticket"]["status"], "in_progress");
    assert_eq!(posted["ticket"]["messageCount"], 2);

    let (_, detail) = app.get(&format!("/api/v1/tickets/{id}"), token).await;
    let bodies: Vec<&str> = detail["messages"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["body"].as_str().unwrap())
        .collect();
    assert_eq!(bodies, vec!["Nothing happens when I click join", "Still broken"]);

    let (status, closed) = app
        .post(&format!("/api/v1/tickets/{id}/close"), json!({}), token)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["status"], "closed");

    let (status, _) = app
        .post(
            &format!("/api/v1/tickets/{id}/messages"),
            json!({ "body": "hello?" }),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_tickets_are_private_and_filterable() {
    let app = TestApp::new();
    let owner = app.user(Role::Student);
    let stranger = app.user(Role::Student);

    let (_, created) = app
        .post(
            "/api/v1/tickets",
            json!({ "subject": "Billing", "description": "Charged twice" }),
            Some(&owner.token),
        )
        .await;
    let id = created["ticket"]["id"].as_str().unwrap();

    let (status, _) = app
        .get(&format!("/api/v1/tickets/{id}"), Some(&stranger.token))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = app.get("/api/v1/tickets", Some(&stranger.token)).await;
    assert!(list["tickets"].as_array().unwrap().is_empty());

    let (_, list) = app
        .get("/api/v1/tickets?status=closed", Some(&owner.token))
        .await;
    assert!(list["tickets"].as_array().unwrap().is_empty());
    let (_, list) = app
        .get("/api/v1/tickets?status=not_opened", Some(&owner.token))
        .await;
    assert_eq!(list["tickets"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_ticket_validation() {
    let app = TestApp::new();
    let user = app.user(Role::Student);

    let (status, body) = app
        .post(
            "/api/v1/tickets",
            json!({ "subject": "", "description": "text" }),
            Some(&user.token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], 10007);
    assert_eq!(body["message"], "subject: Subject is required");
    assert_eq!(body["errors"][0]["field"], "subject");

    let (status, _) = app
        .post(
            "/api/v1/tickets",
            json!({ "subject": "a", "description": "b" }),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

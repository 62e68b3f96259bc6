//! Course and enrollment endpoint tests

use axum::http::StatusCode;
use serde_json::json;

use crate::common::TestApp;
use live_classroom::domain::Role;

#[tokio::test]
async fn test_enrollment_state_follows_caller() {
    let app = TestApp::new();
    let classroom = app.classroom("intro-to-python").await;

    let (status, anonymous) = app.get("/api/v1/courses/intro-to-python", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(anonymous["course"]["slug"], "intro-to-python");
    assert_eq!(anonymous["course"]["isEnrolled"], false);

    let (_, enrolled) = app
        .get("/api/v1/courses/intro-to-python", Some(&classroom.student.token))
        .await;
    assert_eq!(enrolled["course"]["isEnrolled"], true);

    // A broken token degrades to anonymous
    let (status, body) = app
        .get("/api/v1/courses/intro-to-python", Some("garbage"))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["course"]["isEnrolled"], false);
}

#[tokio::test]
async fn test_unknown_course_is_not_found() {
    let app = TestApp::new();
    let (status, _) = app.get("/api/v1/courses/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_course_management_is_staff_only() {
    let app = TestApp::new();
    let student = app.user(Role::Student);

    let (status, body) = app
        .post(
            "/api/v1/admin/courses",
            json!({ "slug": "rust-101", "name": "Rust" }),
            Some(&student.token),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You do not have permission to manage courses.");
}

#[tokio::test]
async fn test_duplicate_slug_conflicts_and_roster_lists_enrollments() {
    let app = TestApp::new();
    let classroom = app.classroom("intro-to-python").await;
    let token = Some(classroom.teacher.token.as_str());

    let (status, _) = app
        .post(
            "/api/v1/admin/courses",
            json!({ "slug": "Intro-To-Python", "name": "Again" }),
            token,
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, roster) = app
        .get("/api/v1/admin/courses/intro-to-python/enrollments", token)
        .await;
    assert_eq!(status, StatusCode::OK);
    let enrollments = roster["enrollments"].as_array().unwrap();
    assert_eq!(enrollments.len(), 1);
    assert_eq!(enrollments[0]["userId"], classroom.student.id.to_string());
}

//! Learner and staff live session endpoint tests

use axum::http::StatusCode;
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::TestApp;
use live_classroom::domain::Role;

#[tokio::test]
async fn test_active_session_for_unknown_course_is_null() {
    let app = TestApp::new();
    let (status, body) = app
        .get("/api/v1/live-sessions/courses/does-not-exist/active", None)
        .await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["session"].is_null());
}

#[tokio::test]
async fn test_scheduled_session_is_not_active() {
    let app = TestApp::new();
    app.classroom("intro-to-python").await;

    let (_, body) = app
        .get("/api/v1/live-sessions/courses/intro-to-python/active", None)
        .await;
    assert!(body["session"].is_null());
}

#[tokio::test]
async fn test_join_ping_leave_flow() {
    let app = TestApp::new();
    let classroom = app.classroom("intro-to-python").await;
    let started = app.start(&classroom).await;
    assert_eq!(started["session"]["status"], "LIVE");

    let (status, active) = app
        .get("/api/v1/live-sessions/courses/intro-to-python/active", None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(active["session"]["id"], classroom.session_id.as_str());
    assert!(active["version"].as_i64().unwrap() > 0);

    let token = Some(classroom.student.token.as_str());
    let base = format!("/api/v1/live-sessions/{}", classroom.session_id);

    let (status, joined) = app.post(&format!("{base}/join"), json!({}), token).await;
    assert_eq!(status, StatusCode::OK, "{joined}");
    assert_eq!(joined["stats"]["accumulatedWatchTimeMs"], 0);
    assert_eq!(joined["session"]["joinedCount"], 1);

    let (status, pinged) = app
        .post(&format!("{base}/ping"), json!({ "elapsedMs": 30000 }), token)
        .await;
    assert_eq!(status, StatusCode::OK);
    // Credit is capped by the time actually spent plus tolerance
    let credited = pinged["stats"]["accumulatedWatchTimeMs"].as_i64().unwrap();
    assert!(credited > 0 && credited < 30000, "credited {credited}");

    let (status, left) = app.post(&format!("{base}/leave"), json!({}), token).await;
    assert_eq!(status, StatusCode::OK);
    assert!(left["stats"]["accumulatedWatchTimeMs"].as_i64().unwrap() >= credited);

    // Leaving again is harmless, pinging is not
    let (status, _) = app.post(&format!("{base}/leave"), json!({}), token).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = app
        .post(&format!("{base}/ping"), json!({ "elapsedMs": 30000 }), token)
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_host_link_and_password_only_reach_joined_learners() {
    let app = TestApp::new();
    let classroom = app.classroom("intro-to-python").await;
    app.start(&classroom).await;

    let (_, active) = app
        .get("/api/v1/live-sessions/courses/intro-to-python/active", None)
        .await;
    let meeting = &active["session"]["meeting"];
    assert_eq!(meeting["joinUrl"], "https://teams.microsoft.com/l/meetup-join/abc");
    assert!(meeting.get("startUrl").is_none(), "{meeting}");
    assert!(meeting.get("password").is_none(), "{meeting}");

    let (status, joined) = app
        .post(
            &format!("/api/v1/live-sessions/{}/join", classroom.session_id),
            json!({}),
            Some(&classroom.student.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{joined}");
    let meeting = &joined["session"]["meeting"];
    assert_eq!(meeting["startUrl"], "https://teams.microsoft.com/l/meetup-start/abc");
    assert_eq!(meeting["password"], "owl-42");
}

#[tokio::test]
async fn test_join_requires_live_session_and_enrollment() {
    let app = TestApp::new();
    let classroom = app.classroom("intro-to-python").await;
    let join = format!("/api/v1/live-sessions/{}/join", classroom.session_id);

    let (status, _) = app
        .post(&join, json!({}), Some(&classroom.student.token))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    app.start(&classroom).await;

    let outsider = app.user(Role::Student);
    let (status, _) = app.post(&join, json!({}), Some(&outsider.token)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app.post(&join, json!({}), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Missing authorization header");
}

#[tokio::test]
async fn test_invalid_session_id_is_bad_request() {
    let app = TestApp::new();
    let student = app.user(Role::Student);
    let (status, _) = app
        .post("/api/v1/live-sessions/not-a-uuid/join", json!({}), Some(&student.token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_start_and_end_transitions() {
    let app = TestApp::new();
    let classroom = app.classroom("intro-to-python").await;
    app.start(&classroom).await;

    let start = format!("/api/v1/admin/live-sessions/{}/start", classroom.session_id);
    let (status, _) = app
        .post(&start, json!({}), Some(&classroom.teacher.token))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let ended = app.end(&classroom).await;
    assert_eq!(ended["session"]["status"], "ENDED");
    assert!(ended["session"]["actualEnd"].is_string());

    let (_, active) = app
        .get("/api/v1/live-sessions/courses/intro-to-python/active", None)
        .await;
    assert!(active["session"].is_null());

    let (status, _) = app
        .post(&start, json!({}), Some(&classroom.teacher.token))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_students_cannot_manage_sessions() {
    let app = TestApp::new();
    let classroom = app.classroom("intro-to-python").await;

    let (status, _) = app
        .post(
            &format!("/api/v1/admin/live-sessions/{}/start", classroom.session_id),
            json!({}),
            Some(&classroom.student.token),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let other_teacher = app.user(Role::Teacher);
    let (status, _) = app
        .post(
            &format!("/api/v1/admin/live-sessions/{}/end", classroom.session_id),
            json!({}),
            Some(&other_teacher.token),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_requires_scheduled_start() {
    let app = TestApp::new();
    let classroom = app.classroom("intro-to-python").await;

    let (status, body) = app
        .post(
            "/api/v1/admin/live-sessions",
            json!({ "courseSlug": "intro-to-python" }),
            Some(&classroom.teacher.token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Scheduled start time is required.");
}

#[tokio::test]
async fn test_start_without_join_url_is_rejected() {
    let app = TestApp::new();
    let classroom = app.classroom("intro-to-python").await;

    let (_, created) = app
        .post(
            "/api/v1/admin/live-sessions",
            json!({
                "courseSlug": "intro-to-python",
                "scheduledStart": "2026-01-05T12:00:00Z"
            }),
            Some(&classroom.teacher.token),
        )
        .await;
    assert_eq!(created["session"]["title"], "Live Class - Intro to Python");
    let session_id = created["session"]["id"].as_str().unwrap();

    let (status, body) = app
        .post(
            &format!("/api/v1/admin/live-sessions/{session_id}/start"),
            json!({}),
            Some(&classroom.teacher.token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "A meeting join link could not be generated. Please provide a meeting URL."
    );

    let (status, body) = app
        .post(
            &format!("/api/v1/admin/live-sessions/{session_id}/start"),
            json!({ "joinUrl": "https://zoom.us/j/123" }),
            Some(&classroom.teacher.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["session"]["meeting"]["joinUrl"], "https://zoom.us/j/123");
}

#[tokio::test]
async fn test_admin_list_filters_by_status() {
    let app = TestApp::new();
    let classroom = app.classroom("intro-to-python").await;
    app.start(&classroom).await;

    let (status, body) = app
        .get(
            "/api/v1/admin/live-sessions?courseSlug=intro-to-python&status=live",
            Some(&classroom.teacher.token),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["sessions"].as_array().unwrap().len(), 1);

    let (_, body) = app
        .get(
            "/api/v1/admin/live-sessions?status=ended",
            Some(&classroom.teacher.token),
        )
        .await;
    assert!(body["sessions"].as_array().unwrap().is_empty());

    let (status, _) = app
        .get(
            "/api/v1/admin/live-sessions?status=paused",
            Some(&classroom.teacher.token),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

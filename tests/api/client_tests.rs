//! Learner client against a spawned server

use std::sync::Arc;

use pretty_assertions::assert_eq;

use crate::common::TestApp;
use live_classroom::client::{
    ApiClient, ClientSettings, JoinOutcome, LiveClassController, LivePanel, LogLauncher,
    NO_LIVE_CLASS,
};

fn settings(addr: std::net::SocketAddr, token: Option<String>) -> ClientSettings {
    ClientSettings {
        api_url: format!("http://{addr}/api/v1"),
        gateway_url: format!("ws://{addr}/gateway"),
        token,
        ..ClientSettings::default()
    }
}

#[tokio::test]
async fn test_controller_join_and_leave() {
    let app = TestApp::new();
    let classroom = app.classroom("intro-to-python").await;
    app.start(&classroom).await;
    let addr = app.spawn().await;

    let settings = settings(addr, Some(classroom.student.token.clone()));
    let api = Arc::new(ApiClient::new(&settings).unwrap());
    let controller = LiveClassController::new(api, Arc::new(LogLauncher), &settings);

    controller.open_course("intro-to-python").await;
    assert!(matches!(controller.panel(), LivePanel::Session { joined: false, .. }));

    match controller.join().await {
        JoinOutcome::Joined { launch_url, .. } => assert_eq!(
            launch_url.as_deref(),
            Some("https://teams.microsoft.com/l/meetup-join/abc?web=1")
        ),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(controller.is_pinging());

    let stats = controller.leave().await.unwrap();
    assert!(stats.accumulated_watch_time_ms >= 0);
    assert_eq!(controller.joined_session_id(), None);
}

#[tokio::test]
async fn test_anonymous_visitor_sees_enrollment_prompt() {
    let app = TestApp::new();
    let classroom = app.classroom("intro-to-python").await;
    app.start(&classroom).await;
    let addr = app.spawn().await;

    let settings = settings(addr, None);
    let api = Arc::new(ApiClient::new(&settings).unwrap());
    let controller = LiveClassController::new(api, Arc::new(LogLauncher), &settings);

    controller.open_course("intro-to-python").await;
    assert_eq!(controller.panel(), LivePanel::EnrollmentRequired);
    assert_eq!(controller.join().await, JoinOutcome::NotEnrolled);
}

#[tokio::test]
async fn test_no_live_class_panel() {
    let app = TestApp::new();
    let classroom = app.classroom("intro-to-python").await;
    let addr = app.spawn().await;

    let settings = settings(addr, Some(classroom.student.token.clone()));
    let api = Arc::new(ApiClient::new(&settings).unwrap());
    let controller = LiveClassController::new(api, Arc::new(LogLauncher), &settings);

    controller.open_course("intro-to-python").await;
    assert_eq!(controller.panel().headline(), NO_LIVE_CLASS);
}

//! Gateway end-to-end tests on a spawned server

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::time::timeout;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::common::TestApp;
use live_classroom::client::{LiveEvent, RealtimeListener};

type Socket = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

async fn next_json(socket: &mut Socket) -> Value {
    loop {
        let message = timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(text) = message {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn send_json(socket: &mut Socket, value: Value) {
    socket
        .send(Message::Text(value.to_string().into()))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_handshake_heartbeat_and_course_dispatch() {
    let app = TestApp::new();
    let classroom = app.classroom("intro-to-python").await;
    let other = app.classroom("rust-101").await;
    let addr = app.spawn().await;

    let (mut socket, _) = connect_async(format!("ws://{addr}/gateway")).await.unwrap();

    let hello = next_json(&mut socket).await;
    assert_eq!(hello["op"], 10);
    assert!(hello["d"]["heartbeatInterval"].as_u64().unwrap() > 0);

    send_json(&mut socket, json!({ "op": 2, "d": { "courses": ["Intro-To-Python"] } })).await;
    let ready = next_json(&mut socket).await;
    assert_eq!(ready["t"], "READY");
    assert_eq!(ready["d"]["courses"], json!(["intro-to-python"]));

    send_json(&mut socket, json!({ "op": 1 })).await;
    assert_eq!(next_json(&mut socket).await["op"], 11);

    // Only the followed course reaches this connection
    app.start(&other).await;
    app.start(&classroom).await;

    let dispatch = next_json(&mut socket).await;
    assert_eq!(dispatch["op"], 0);
    assert_eq!(dispatch["t"], "live-session-started");
    assert_eq!(dispatch["d"]["session"]["id"], classroom.session_id.as_str());
    assert_eq!(dispatch["d"]["session"]["courseSlug"], "intro-to-python");
    // Broadcasts go to anyone following the room
    assert!(dispatch["d"]["session"]["meeting"].get("startUrl").is_none());
    assert!(dispatch["d"]["session"]["meeting"].get("password").is_none());
}

#[tokio::test]
async fn test_start_right_after_ready_is_delivered() {
    let app = TestApp::new();
    let classroom = app.classroom("intro-to-python").await;
    let addr = app.spawn().await;

    let (mut socket, _) = connect_async(format!("ws://{addr}/gateway")).await.unwrap();
    next_json(&mut socket).await;
    send_json(&mut socket, json!({ "op": 2, "d": { "courses": ["intro-to-python"] } })).await;
    assert_eq!(next_json(&mut socket).await["t"], "READY");

    app.start(&classroom).await;

    let dispatch = next_json(&mut socket).await;
    assert_eq!(dispatch["t"], "live-session-started");
    assert_eq!(dispatch["d"]["session"]["id"], classroom.session_id.as_str());
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
    let app = TestApp::new();
    let addr = app.spawn().await;

    let (mut socket, _) = connect_async(format!("ws://{addr}/gateway")).await.unwrap();
    next_json(&mut socket).await;
    send_json(
        &mut socket,
        json!({ "op": 2, "d": { "token": "not-a-jwt", "courses": [] } }),
    )
    .await;

    assert_eq!(next_json(&mut socket).await["op"], 9);
}

#[tokio::test]
async fn test_listener_receives_start_and_end() {
    let app = TestApp::new();
    let classroom = app.classroom("intro-to-python").await;
    let addr = app.spawn().await;

    let listener = RealtimeListener::new(
        &format!("ws://{addr}/gateway"),
        Some(classroom.student.token.clone()),
    )
    .unwrap();
    let mut subscription = listener.connect("intro-to-python").await.unwrap();
    assert!(subscription.is_connected());

    app.start(&classroom).await;
    let started = timeout(Duration::from_secs(5), subscription.events.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(matches!(started, LiveEvent::Started(_)));

    app.end(&classroom).await;
    let ended = timeout(Duration::from_secs(5), subscription.events.recv())
        .await
        .unwrap()
        .unwrap();
    match ended {
        LiveEvent::Ended(session) => {
            assert_eq!(session.id.to_string(), classroom.session_id);
            assert!(session.version > started.session().version);
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

//! Common Test Utilities
//!
//! In-memory application, token minting and request helpers.

#![allow(dead_code)]

use std::net::SocketAddr;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower::ServiceExt;
use uuid::Uuid;

use live_classroom::config::Settings;
use live_classroom::domain::Role;
use live_classroom::presentation::middleware::Claims;
use live_classroom::startup::{build_router, AppState};

/// Test application on in-memory storage
pub struct TestApp {
    pub state: AppState,
    pub router: Router,
}

/// Caller identity with a signed token
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub token: String,
}

/// A course with an enrolled student, a teacher and a scheduled session
pub struct Classroom {
    pub slug: String,
    pub teacher: TestUser,
    pub student: TestUser,
    pub session_id: String,
}

impl TestApp {
    pub fn new() -> Self {
        let state = AppState::in_memory(Settings::for_tests());
        let router = build_router(state.clone());
        Self { state, router }
    }

    pub fn user(&self, role: Role) -> TestUser {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let claims = Claims {
            sub: id.to_string(),
            role,
            exp: (now + Duration::hours(1)).timestamp(),
            iat: now.timestamp(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.state.settings.jwt.secret.as_bytes()),
        )
        .unwrap();
        TestUser { id, token }
    }

    /// Send a request and decode the JSON body (`Value::Null` when empty)
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("Authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("Content-Type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };
        (status, value)
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None, token).await
    }

    pub async fn post(&self, uri: &str, body: Value, token: Option<&str>) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body), token).await
    }

    /// Course, enrolled student and a scheduled Teams session with a host
    /// start link and a password
    pub async fn classroom(&self, slug: &str) -> Classroom {
        let teacher = self.user(Role::Teacher);
        let student = self.user(Role::Student);

        let (status, _) = self
            .post(
                "/api/v1/admin/courses",
                json!({ "slug": slug, "name": "Intro to Python" }),
                Some(&teacher.token),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = self
            .post(
                &format!("/api/v1/admin/courses/{slug}/enrollments"),
                json!({ "userId": student.id }),
                Some(&teacher.token),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = self
            .post(
                "/api/v1/admin/live-sessions",
                json!({
                    "courseSlug": slug,
                    "title": "Week 1",
                    "provider": "teams",
                    "scheduledStart": "2026-01-05T10:00:00Z",
                    "durationMinutes": 60,
                    "joinUrl": "https://teams.microsoft.com/l/meetup-join/abc",
                    "startUrl": "https://teams.microsoft.com/l/meetup-start/abc",
                    "password": "owl-42"
                }),
                Some(&teacher.token),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");

        Classroom {
            slug: slug.to_string(),
            session_id: body["session"]["id"].as_str().unwrap().to_string(),
            teacher,
            student,
        }
    }

    pub async fn start(&self, classroom: &Classroom) -> Value {
        let (status, body) = self
            .post(
                &format!("/api/v1/admin/live-sessions/{}/start", classroom.session_id),
                json!({}),
                Some(&classroom.teacher.token),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }

    pub async fn end(&self, classroom: &Classroom) -> Value {
        let (status, body) = self
            .post(
                &format!("/api/v1/admin/live-sessions/{}/end", classroom.session_id),
                json!({}),
                Some(&classroom.teacher.token),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body
    }

    /// Serve the same state on an ephemeral port
    pub async fn spawn(&self) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let router = build_router(self.state.clone());
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        addr
    }
}

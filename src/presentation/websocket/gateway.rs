//! WebSocket Gateway
//!
//! Manages gateway connections and routes live session events to course
//! rooms. Events go out on a broadcast channel; each connection task filters
//! them against the rooms it subscribed to.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc};
use uuid::Uuid;

use super::messages::GatewaySend;
use crate::application::dto::response::{LiveSessionView, SessionEventPayload};
use crate::application::services::{LiveEventPublisher, LiveSessionEvent};
use crate::domain::LiveSession;
use crate::infrastructure::metrics;

/// Event addressed to one course room
#[derive(Debug, Clone)]
pub struct RoutedEvent {
    pub course_slug: String,
    pub name: &'static str,
    pub payload: serde_json::Value,
}

/// Connected session with message sender
pub struct ConnectedSession {
    pub user_id: Option<Uuid>,
    pub session_id: String,
    pub courses: RwLock<HashSet<String>>,
    pub sender: mpsc::UnboundedSender<GatewaySend>,
}

/// WebSocket gateway managing all connections
pub struct Gateway {
    /// Active sessions by session_id
    sessions: DashMap<String, Arc<ConnectedSession>>,
    /// Course slug to session IDs mapping
    course_sessions: DashMap<String, HashSet<String>>,
    /// Broadcast channel for events
    event_tx: broadcast::Sender<RoutedEvent>,
    /// Heartbeat interval in milliseconds
    heartbeat_interval_ms: u64,
}

fn normalize_course(slug: &str) -> Option<String> {
    let slug = slug.trim().to_lowercase();
    (!slug.is_empty()).then_some(slug)
}

impl Gateway {
    pub fn new(heartbeat_interval_ms: u64) -> Self {
        let (event_tx, _) = broadcast::channel(1024);
        Self {
            sessions: DashMap::new(),
            course_sessions: DashMap::new(),
            event_tx,
            heartbeat_interval_ms,
        }
    }

    /// Get the heartbeat interval
    pub fn heartbeat_interval(&self) -> u64 {
        self.heartbeat_interval_ms
    }

    /// Subscribe to gateway events
    pub fn subscribe(&self) -> broadcast::Receiver<RoutedEvent> {
        self.event_tx.subscribe()
    }

    /// Register an identified session and join its course rooms
    pub fn register_session(
        &self,
        session_id: String,
        user_id: Option<Uuid>,
        courses: Vec<String>,
        sender: mpsc::UnboundedSender<GatewaySend>,
    ) -> Vec<String> {
        let session = Arc::new(ConnectedSession {
            user_id,
            session_id: session_id.clone(),
            courses: RwLock::new(HashSet::new()),
            sender,
        });
        self.sessions.insert(session_id.clone(), session);
        let joined = self.subscribe_to_courses(&session_id, courses);

        tracing::info!(
            user_id = ?user_id,
            session_id = %session_id,
            courses = ?joined,
            "Session registered"
        );
        self.update_metrics();
        joined
    }

    /// Unregister a session
    pub fn unregister_session(&self, session_id: &str) {
        if let Some((_, session)) = self.sessions.remove(session_id) {
            for course in session.courses.read().iter() {
                if let Some(mut sessions) = self.course_sessions.get_mut(course) {
                    sessions.remove(session_id);
                }
            }
            self.course_sessions.retain(|_, sessions| !sessions.is_empty());

            tracing::info!(
                user_id = ?session.user_id,
                session_id = %session_id,
                "Session unregistered"
            );
        }
        self.update_metrics();
    }

    /// Add course subscriptions to a session; returns all rooms it is in
    pub fn subscribe_to_courses(&self, session_id: &str, courses: Vec<String>) -> Vec<String> {
        let Some(session) = self.sessions.get(session_id).map(|s| s.clone()) else {
            return Vec::new();
        };
        let mut joined = session.courses.write();
        for course in courses.iter().filter_map(|c| normalize_course(c)) {
            self.course_sessions
                .entry(course.clone())
                .or_default()
                .insert(session_id.to_string());
            joined.insert(course);
        }
        let mut rooms: Vec<String> = joined.iter().cloned().collect();
        rooms.sort();
        rooms
    }

    /// Remove course subscriptions from a session
    pub fn unsubscribe_from_courses(&self, session_id: &str, courses: Vec<String>) {
        let Some(session) = self.sessions.get(session_id).map(|s| s.clone()) else {
            return;
        };
        let mut joined = session.courses.write();
        for course in courses.iter().filter_map(|c| normalize_course(c)) {
            if let Some(mut sessions) = self.course_sessions.get_mut(&course) {
                sessions.remove(session_id);
            }
            joined.remove(&course);
        }
    }

    /// Whether a session follows a course room
    pub fn is_subscribed(&self, session_id: &str, course_slug: &str) -> bool {
        self.sessions
            .get(session_id)
            .is_some_and(|s| s.courses.read().contains(course_slug))
    }

    /// Broadcast an event to a course room
    pub fn dispatch_to_course(&self, course_slug: &str, name: &'static str, payload: serde_json::Value) {
        let Some(course_slug) = normalize_course(course_slug) else {
            return;
        };
        let listeners = self
            .course_sessions
            .get(&course_slug)
            .map_or(0, |sessions| sessions.len());
        tracing::debug!(course = %course_slug, event = name, listeners, "Dispatching to course room");

        let _ = self.event_tx.send(RoutedEvent {
            course_slug,
            name,
            payload,
        });
    }

    /// Get session count
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Course rooms with at least one listener
    pub fn room_count(&self) -> usize {
        self.course_sessions.iter().filter(|r| !r.is_empty()).count()
    }

    fn update_metrics(&self) {
        let identified = self
            .sessions
            .iter()
            .filter(|s| s.user_id.is_some())
            .count();
        metrics::set_gateway_connections(self.sessions.len() as i64, identified as i64);
    }
}

impl LiveEventPublisher for Gateway {
    fn publish(&self, event: LiveSessionEvent, session: &LiveSession) {
        let payload = SessionEventPayload {
            session: LiveSessionView::from(session),
        };
        match serde_json::to_value(payload) {
            Ok(payload) => self.dispatch_to_course(&session.course_slug, event.name(), payload),
            Err(e) => tracing::error!(error = %e, session_id = %session.id, "Failed to encode session event"),
        }
    }
}

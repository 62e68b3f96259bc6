//! Per-connection gateway bookkeeping.

use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

/// State of one gateway socket, owned by its connection task
#[derive(Debug)]
pub struct ConnectionState {
    pub session_id: String,
    viewer: Option<Uuid>,
    sequence: u64,
    last_heartbeat: Instant,
}

impl ConnectionState {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            viewer: None,
            sequence: 0,
            last_heartbeat: Instant::now(),
        }
    }

    /// Record who identified; `None` for anonymous viewers
    pub fn identify(&mut self, viewer: Option<Uuid>) {
        self.viewer = viewer;
        self.last_heartbeat = Instant::now();
    }

    pub fn viewer(&self) -> Option<Uuid> {
        self.viewer
    }

    /// Sequence number for the next dispatch
    pub fn next_sequence(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }

    pub fn record_heartbeat(&mut self) {
        self.last_heartbeat = Instant::now();
    }

    pub fn is_silent_for(&self, limit: Duration) -> bool {
        self.last_heartbeat.elapsed() >= limit
    }
}

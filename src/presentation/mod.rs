//! Presentation Layer
//!
//! REST handlers under `/api/v1`, auth and metrics middleware, and the
//! course-room WebSocket gateway.

pub mod http;
pub mod middleware;
pub mod websocket;

//! HTTP Handlers
//!
//! Request handlers for all HTTP endpoints.

pub mod admin_live_session;
pub mod assistant;
pub mod course;
pub mod health;
pub mod live_session;
pub mod ticket;

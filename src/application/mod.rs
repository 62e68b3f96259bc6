//! Application Layer
//!
//! Use cases of the live classroom: session lifecycle and attendance,
//! courses, support tickets and the help assistant. Request and response
//! shapes live in `dto` and are shared with the client.

pub mod dto;
pub mod services;

//! Middleware
//!
//! Tower middleware for request processing.

pub mod auth;
pub mod cors;
pub mod metrics;

pub use auth::{auth_middleware, decode_token, optional_auth_middleware, AuthUser, Claims};
pub use cors::create_cors_layer;
pub use metrics::track_metrics;

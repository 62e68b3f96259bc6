//! Integration Tests Entry Point
//!
//! - `api/` - REST, gateway and client tests against the in-memory app
//! - `common/` - Shared test utilities

mod api;
mod common;

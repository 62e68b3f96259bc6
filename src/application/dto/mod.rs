//! Wire shapes for the HTTP API.
//!
//! Requests are validated with `validator`; responses serialize in camelCase.

pub mod request;
pub mod response;

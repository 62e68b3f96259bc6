//! Error type and request validation helpers used by every layer.

pub mod error;
pub mod validation;

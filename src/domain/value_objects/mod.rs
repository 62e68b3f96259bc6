//! # Domain Value Objects
//!
//! Immutable value types that represent domain concepts without identity.
//!
//! - **Role**: the caller's role as asserted by the auth provider
//! - **AttendanceStats**: cumulative watch time and attendance percentage

mod attendance_stats;
mod role;

pub use attendance_stats::*;
pub use role::*;

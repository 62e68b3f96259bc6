//! # Domain Services
//!
//! Domain services encapsulate business rules that operate on entities
//! without belonging to a single one.
//!
//! - **AttendancePolicy**: how join, ping and leave credit watch time

mod attendance;

pub use attendance::*;

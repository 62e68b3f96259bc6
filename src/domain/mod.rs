//! # Domain Layer
//!
//! The domain layer contains the core business rules of the live classroom.
//! It is independent of any external frameworks or infrastructure concerns.
//!
//! ## Structure
//!
//! - **entities**: LiveSession, Course, Ticket and their repository traits
//! - **value_objects**: Role, AttendanceStats
//! - **services**: attendance accounting

pub mod entities;
pub mod services;
pub mod value_objects;

pub use entities::*;
pub use services::*;
pub use value_objects::*;

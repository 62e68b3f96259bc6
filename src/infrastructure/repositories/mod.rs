//! Repository implementations.
//!
//! PostgreSQL-backed repositories for production and in-memory ones for
//! database-less runs and tests.

mod course_repository;
mod live_session_repository;
mod memory;
mod ticket_repository;

pub use course_repository::PgCourseRepository;
pub use live_session_repository::PgLiveSessionRepository;
pub use memory::{InMemoryCourseRepository, InMemoryLiveSessionRepository, InMemoryTicketRepository};
pub use ticket_repository::PgTicketRepository;

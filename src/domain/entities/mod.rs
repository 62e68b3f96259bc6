//! # Domain Entities
//!
//! Core domain entities of the live classroom.
//!
//! - **LiveSession**: a scheduled or running broadcast class with its participants
//! - **Course / Enrollment**: who may attend which session
//! - **Ticket / TicketMessage**: learner support threads
//!
//! Each entity has an associated repository trait. Implementations live in
//! the infrastructure layer (PostgreSQL and in-memory).

mod course;
mod live_session;
mod ticket;

pub use course::{Course, CourseRepository, Enrollment, EnrollmentStatus};

pub use live_session::{
    JoinEvent, LiveSession, LiveSessionRepository, MeetingDetails, MeetingProvider, Participant,
    ParticipantStatus, SessionFilter, SessionStatus,
};

pub use ticket::{
    AuthorType, Ticket, TicketCategory, TicketMessage, TicketPriority, TicketRepository,
    TicketStatus,
};

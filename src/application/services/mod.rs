//! Application Services
//!
//! Business logic services that coordinate domain operations.
//!
//! ## Available Services
//!
//! - **LiveSessionService**: session lifecycle and learner attendance
//! - **CourseService**: course lookup, creation and enrollment
//! - **TicketService**: learner support tickets
//! - **AssistantService**: keyword help assistant

pub mod assistant_service;
pub mod course_service;
pub mod live_session_service;
pub mod ticket_service;

pub use assistant_service::AssistantService;

pub use course_service::{CourseError, CourseService, CourseServiceImpl};

pub use live_session_service::{
    Actor, CreateSessionDto, LiveEventPublisher, LiveSessionConfig, LiveSessionError,
    LiveSessionEvent, LiveSessionService, LiveSessionServiceImpl,
};

pub use ticket_service::{CreateTicketDto, TicketError, TicketService, TicketServiceImpl};

//! # Live Classroom
//!
//! Live class sessions for an online course platform:
//! - REST API for scheduling, starting and ending live sessions
//! - Attendance tracking through join, heartbeat ping and leave
//! - WebSocket gateway pushing session start/end to course rooms
//! - Learner support tickets and a keyword help assistant
//! - A learner-side client (`client`) driving the same API
//!
//! ## Architecture
//!
//! - **Domain Layer**: entities, attendance rules and repository traits
//! - **Application Layer**: services and DTOs
//! - **Infrastructure Layer**: PostgreSQL and in-memory repositories, metrics
//! - **Presentation Layer**: HTTP handlers and WebSocket gateway
//!
//! ## Module Structure
//!
//! ```text
//! live_classroom/
//! +-- config/         Configuration management
//! +-- domain/         Entities, value objects, attendance policy
//! +-- application/    Services and DTOs
//! +-- infrastructure/ Database, repositories, metrics
//! +-- presentation/   HTTP routes and WebSocket gateway
//! +-- client/         Learner client (REST, gateway listener, heartbeat)
//! +-- shared/         Errors and validation helpers
//! ```

pub mod config;

pub mod domain;

pub mod application;

pub mod infrastructure;

pub mod presentation;

pub mod client;

pub mod shared;

pub mod startup;

pub mod telemetry;

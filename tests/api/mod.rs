//! API Integration Tests

mod assistant_tests;
mod client_tests;
mod course_tests;
mod gateway_tests;
mod health_tests;
mod live_session_tests;
mod ticket_tests;

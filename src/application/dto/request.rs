//! Request DTOs
//!
//! Data structures for API request bodies. They also derive `Serialize` so
//! the client module can send exactly what the server expects.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Heartbeat body
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingRequest {
    /// Milliseconds since the previous ping (or since join)
    #[serde(default)]
    pub elapsed_ms: i64,
}

/// Create live session request (staff)
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateLiveSessionRequest {
    #[validate(length(min = 1, max = 200, message = "Course is required"))]
    pub course_slug: String,

    #[validate(length(max = 300, message = "Title must be at most 300 characters"))]
    pub title: Option<String>,

    #[validate(length(max = 5000, message = "Description must be at most 5000 characters"))]
    pub description: Option<String>,

    pub provider: Option<String>,

    /// RFC 3339 timestamp
    pub scheduled_start: Option<String>,

    pub duration_minutes: Option<i32>,

    pub meeting_id: Option<String>,
    pub join_url: Option<String>,
    pub start_url: Option<String>,
    pub password: Option<String>,
}

/// Start live session request (staff). A join URL overrides the stored one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartLiveSessionRequest {
    pub join_url: Option<String>,
}

/// Admin session list filters
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSessionQueryParams {
    pub course_slug: Option<String>,
    pub status: Option<String>,
}

/// Create course request (staff)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 200, message = "Slug must be 1-200 characters"))]
    pub slug: String,

    #[validate(length(min = 1, max = 300, message = "Name must be 1-300 characters"))]
    pub name: String,
}

/// Enroll a user in a course (staff)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollRequest {
    pub user_id: Uuid,
}

/// Create support ticket request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    #[validate(length(min = 1, max = 200, message = "Subject is required"))]
    pub subject: String,

    #[validate(length(min = 1, max = 5000, message = "Description is required"))]
    pub description: String,

    pub category: Option<String>,
    pub priority: Option<String>,
}

/// Post a message to a ticket
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PostTicketMessageRequest {
    #[validate(length(min = 1, max = 5000, message = "Message body is required"))]
    pub body: String,
}

/// Ticket list filters
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TicketQueryParams {
    pub status: Option<String>,
}

/// Speaker of an assistant conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One turn of assistant conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

/// Page the learner was on when asking
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageContext {
    pub path: String,
    pub title: String,
    pub course_slug: Option<String>,
}

/// Assistant chat request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AssistantChatRequest {
    #[validate(length(min = 1, max = 1000, message = "Message is required"))]
    pub message: String,

    #[serde(default)]
    pub history: Vec<ChatTurn>,

    #[serde(default)]
    pub page_context: Option<PageContext>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ping_request_is_camel_case() {
        let json = serde_json::to_string(&PingRequest { elapsed_ms: 30_000 }).unwrap();
        assert_eq!(json, r#"{"elapsedMs":30000}"#);
    }

    #[test]
    fn test_ticket_request_validation() {
        let request = CreateTicketRequest {
            subject: String::new(),
            description: "help".into(),
            category: None,
            priority: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_chat_request_defaults() {
        let request: AssistantChatRequest = serde_json::from_str(r#"{"message":"hi"}"#).unwrap();
        assert!(request.history.is_empty());
        assert!(request.page_context.is_none());
    }
}

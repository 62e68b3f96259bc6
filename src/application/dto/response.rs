//! Response DTOs
//!
//! Data structures for API response bodies. All of them deserialize as well,
//! since `live_classroom::client` consumes the same shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{
    AttendanceStats, AuthorType, Course, Enrollment, LiveSession, MeetingDetails,
    MeetingProvider, Participant, SessionStatus, Ticket, TicketCategory, TicketMessage,
    TicketPriority, TicketStatus,
};

/// Learner-facing view of a live session. The `From` conversion gives the
/// public shape; only [`LiveSessionView::for_participant`] carries the host
/// start link and the meeting password.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveSessionView {
    pub id: Uuid,
    pub course_id: Uuid,
    pub course_slug: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub provider: MeetingProvider,
    pub status: SessionStatus,
    pub scheduled_start: DateTime<Utc>,
    pub duration_minutes: i32,
    pub expected_watch_time_ms: i64,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub meeting: MeetingDetails,
    #[serde(default)]
    pub joined_count: usize,
    /// Server-wide sequence number of the last mutation; 0 when unknown
    #[serde(default)]
    pub version: i64,
}

impl From<&LiveSession> for LiveSessionView {
    fn from(session: &LiveSession) -> Self {
        Self {
            id: session.id,
            course_id: session.course_id,
            course_slug: session.course_slug.clone(),
            title: session.title.clone(),
            description: session.description.clone(),
            provider: session.provider,
            status: session.status,
            scheduled_start: session.scheduled_start,
            duration_minutes: session.duration_minutes,
            expected_watch_time_ms: session.expected_watch_time_ms,
            actual_start: session.actual_start,
            actual_end: session.actual_end,
            meeting: session.meeting.public(),
            joined_count: session.joined_count(),
            version: session.version,
        }
    }
}

impl LiveSessionView {
    /// Full view for someone who has joined or runs the session
    pub fn for_participant(session: &LiveSession) -> Self {
        Self {
            meeting: session.meeting.clone(),
            ..Self::from(session)
        }
    }
}

/// Staff view of a live session, including participants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminLiveSessionView {
    #[serde(flatten)]
    pub session: LiveSessionView,
    pub teacher_id: Option<Uuid>,
    pub participants: Vec<Participant>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&LiveSession> for AdminLiveSessionView {
    fn from(session: &LiveSession) -> Self {
        Self {
            session: LiveSessionView::for_participant(session),
            teacher_id: session.teacher_id,
            participants: session.participants.clone(),
            created_at: session.created_at,
            updated_at: session.updated_at,
        }
    }
}

/// `GET /live-sessions/courses/{slug}/active`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveSessionResponse {
    pub session: Option<LiveSessionView>,
    /// Version the answer is consistent with, even when there is no session
    #[serde(default)]
    pub version: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinResponse {
    pub session: LiveSessionView,
    pub stats: AttendanceStats,
}

/// Ping and leave responses
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatsResponse {
    pub stats: AttendanceStats,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminLiveSessionResponse {
    pub session: AdminLiveSessionView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminLiveSessionListResponse {
    pub sessions: Vec<AdminLiveSessionView>,
}

/// Payload of `live-session-started` / `live-session-ended` dispatches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEventPayload {
    pub session: LiveSessionView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseView {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub is_enrolled: bool,
}

impl CourseView {
    pub fn new(course: &Course, is_enrolled: bool) -> Self {
        Self {
            id: course.id,
            slug: course.slug.clone(),
            name: course.name.clone(),
            is_enrolled,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseResponse {
    pub course: CourseView,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentView {
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<Enrollment> for EnrollmentView {
    fn from(enrollment: Enrollment) -> Self {
        Self {
            course_id: enrollment.course_id,
            user_id: enrollment.user_id,
            status: enrollment.status.as_str().to_string(),
            created_at: enrollment.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterResponse {
    pub enrollments: Vec<EnrollmentView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketView {
    pub id: Uuid,
    pub subject: String,
    pub category: TicketCategory,
    pub priority: TicketPriority,
    pub status: TicketStatus,
    pub message_count: i32,
    pub last_message_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Ticket> for TicketView {
    fn from(ticket: Ticket) -> Self {
        Self {
            id: ticket.id,
            subject: ticket.subject,
            category: ticket.category,
            priority: ticket.priority,
            status: ticket.status,
            message_count: ticket.message_count,
            last_message_at: ticket.last_message_at,
            created_at: ticket.created_at,
            updated_at: ticket.updated_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketMessageView {
    pub id: Uuid,
    pub author_type: AuthorType,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl From<TicketMessage> for TicketMessageView {
    fn from(message: TicketMessage) -> Self {
        Self {
            id: message.id,
            author_type: message.author_type,
            body: message.body,
            created_at: message.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketListResponse {
    pub tickets: Vec<TicketView>,
}

/// A ticket together with its thread
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketDetailResponse {
    pub ticket: TicketView,
    pub messages: Vec<TicketMessageView>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketMessageResponse {
    pub ticket: TicketView,
    pub message: TicketMessageView,
}

/// Knowledge snippet the assistant based its answer on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantSource {
    pub id: String,
    pub title: String,
}

/// How an assistant reply was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    SmallTalk,
    Knowledge,
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantReply {
    pub reply: String,
    pub source: ReplySource,
    #[serde(default)]
    pub contexts: Vec<AssistantSource>,
}

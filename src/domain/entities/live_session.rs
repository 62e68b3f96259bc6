//! Live session entity and repository trait.
//!
//! Maps to the `live_sessions` table. Participants are stored alongside the
//! session as a JSONB document.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// Video-conferencing vendor hosting the actual call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MeetingProvider {
    #[default]
    Teams,
    Zoom,
}

impl MeetingProvider {
    /// Parse a provider name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "teams" => Some(Self::Teams),
            "zoom" => Some(Self::Zoom),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Teams => "teams",
            Self::Zoom => "zoom",
        }
    }

    /// Human readable vendor name.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Teams => "Microsoft Teams",
            Self::Zoom => "Zoom",
        }
    }
}

impl std::fmt::Display for MeetingProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status of a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    #[default]
    Scheduled,
    Live,
    Ended,
    Cancelled,
}

impl SessionStatus {
    /// Parse a status, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "SCHEDULED" => Some(Self::Scheduled),
            "LIVE" => Some(Self::Live),
            "ENDED" => Some(Self::Ended),
            "CANCELLED" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Scheduled => "SCHEDULED",
            Self::Live => "LIVE",
            Self::Ended => "ENDED",
            Self::Cancelled => "CANCELLED",
        }
    }

    /// Whether the session can no longer be started.
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Ended | Self::Cancelled)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// External meeting coordinates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MeetingDetails {
    pub meeting_id: String,
    pub join_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub start_url: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub password: String,
}

impl MeetingDetails {
    pub fn has_join_url(&self) -> bool {
        !self.join_url.trim().is_empty()
    }

    /// Copy without the host start link and the meeting password
    pub fn public(&self) -> Self {
        Self {
            meeting_id: self.meeting_id.clone(),
            join_url: self.join_url.clone(),
            start_url: String::new(),
            password: String::new(),
        }
    }
}

/// Participant status within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ParticipantStatus {
    #[default]
    Invited,
    Joined,
    Left,
}

/// One closed join/leave interval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinEvent {
    pub joined_at: DateTime<Utc>,
    pub left_at: DateTime<Utc>,
    pub watch_time_ms: i64,
}

/// A learner's join record and attendance counters for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Participant {
    pub student_id: Uuid,
    pub status: ParticipantStatus,
    pub accumulated_watch_time_ms: i64,
    pub attendance_percentage: u8,
    pub last_joined_at: Option<DateTime<Utc>>,
    pub last_ping_at: Option<DateTime<Utc>>,
    /// Watch time credited since `last_joined_at`
    #[serde(default)]
    pub current_join_watch_time_ms: i64,
    #[serde(default)]
    pub join_events: Vec<JoinEvent>,
}

impl Participant {
    /// A freshly invited participant with zeroed counters.
    pub fn invited(student_id: Uuid) -> Self {
        Self {
            student_id,
            status: ParticipantStatus::Invited,
            accumulated_watch_time_ms: 0,
            attendance_percentage: 0,
            last_joined_at: None,
            last_ping_at: None,
            current_join_watch_time_ms: 0,
            join_events: Vec::new(),
        }
    }

    /// Whether the participant has an open join record.
    pub fn is_joined(&self) -> bool {
        self.status == ParticipantStatus::Joined && self.last_joined_at.is_some()
    }
}

/// Represents a scheduled or in-progress broadcast class tied to a course.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveSession {
    pub id: Uuid,
    pub course_id: Uuid,
    pub course_slug: String,
    pub teacher_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub provider: MeetingProvider,
    pub status: SessionStatus,
    pub scheduled_start: DateTime<Utc>,
    pub duration_minutes: i32,
    pub expected_watch_time_ms: i64,
    pub actual_start: Option<DateTime<Utc>>,
    pub actual_end: Option<DateTime<Utc>>,
    pub meeting: MeetingDetails,
    pub participants: Vec<Participant>,
    /// Server-wide sequence number of the last mutation
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LiveSession {
    pub fn is_live(&self) -> bool {
        self.status == SessionStatus::Live
    }

    /// Expected watch time for a duration in minutes.
    pub fn expected_watch_time_for(duration_minutes: i32) -> i64 {
        i64::from(duration_minutes.max(0)) * 60 * 1000
    }

    pub fn participant(&self, student_id: Uuid) -> Option<&Participant> {
        self.participants.iter().find(|p| p.student_id == student_id)
    }

    pub fn participant_mut(&mut self, student_id: Uuid) -> Option<&mut Participant> {
        self.participants
            .iter_mut()
            .find(|p| p.student_id == student_id)
    }

    /// Get the participant record for a student, inviting them if missing.
    pub fn participant_entry(&mut self, student_id: Uuid) -> &mut Participant {
        let index = match self
            .participants
            .iter()
            .position(|p| p.student_id == student_id)
        {
            Some(index) => index,
            None => {
                self.participants.push(Participant::invited(student_id));
                self.participants.len() - 1
            }
        };
        &mut self.participants[index]
    }

    /// Invite every student that does not have a participant record yet.
    pub fn seed_participants<I>(&mut self, student_ids: I)
    where
        I: IntoIterator<Item = Uuid>,
    {
        for student_id in student_ids {
            self.participant_entry(student_id);
        }
    }

    /// Number of participants with an open join record.
    pub fn joined_count(&self) -> usize {
        self.participants.iter().filter(|p| p.is_joined()).count()
    }
}

/// Filter for listing sessions.
#[derive(Debug, Clone, Default)]
pub struct SessionFilter {
    pub course_id: Option<Uuid>,
    pub status: Option<SessionStatus>,
    pub teacher_id: Option<Uuid>,
}

impl SessionFilter {
    pub fn matches(&self, session: &LiveSession) -> bool {
        self.course_id.is_none_or(|id| session.course_id == id)
            && self.status.is_none_or(|status| session.status == status)
            && self
                .teacher_id
                .is_none_or(|id| session.teacher_id == Some(id))
    }
}

/// Repository trait for live session data access.
#[async_trait]
pub trait LiveSessionRepository: Send + Sync {
    /// Allocate the next value of the server-wide version sequence.
    async fn next_version(&self) -> Result<i64, AppError>;

    /// The most recently allocated version (0 when none).
    async fn current_version(&self) -> Result<i64, AppError>;

    /// Find a session by ID.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<LiveSession>, AppError>;

    /// Most recently updated LIVE session of a course.
    async fn find_active_by_course(&self, course_id: Uuid) -> Result<Option<LiveSession>, AppError>;

    /// List sessions matching a filter, newest scheduled start first.
    async fn list(&self, filter: &SessionFilter) -> Result<Vec<LiveSession>, AppError>;

    /// Insert a new session.
    async fn create(&self, session: &LiveSession) -> Result<LiveSession, AppError>;

    /// Replace a stored session.
    async fn update(&self, session: &LiveSession) -> Result<LiveSession, AppError>;
}

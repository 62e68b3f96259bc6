//! Live Session Service
//!
//! Owns the live session lifecycle (create, start, end) and learner
//! attendance (join, ping, leave).
//!
//! Every mutation is serialized per course and stamped with the next value
//! of the server-wide version sequence before it is persisted. The active
//! session snapshot is read under the same course lock, so its version is
//! never ahead of a mutation it does not contain and clients can order
//! fetched and pushed snapshots.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use crate::domain::{
    AttendanceError, AttendancePolicy, AttendanceStats, CourseRepository, LiveSession,
    LiveSessionRepository, MeetingDetails, MeetingProvider, Role, SessionFilter, SessionStatus,
};
use crate::infrastructure::metrics;
use crate::shared::error::AppError;
use crate::shared::validation::non_blank;

/// Authenticated caller as seen by application services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
}

/// Lifecycle events pushed to course rooms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveSessionEvent {
    Started,
    Ended,
}

impl LiveSessionEvent {
    /// Dispatch name on the gateway
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started => "live-session-started",
            Self::Ended => "live-session-ended",
        }
    }
}

/// Sink for lifecycle events (implemented by the WebSocket gateway)
#[cfg_attr(test, mockall::automock)]
pub trait LiveEventPublisher: Send + Sync {
    fn publish(&self, event: LiveSessionEvent, session: &LiveSession);
}

/// Live session service trait
#[async_trait]
pub trait LiveSessionService: Send + Sync {
    /// Schedule a new session (staff)
    async fn create_session(
        &self,
        actor: Actor,
        request: CreateSessionDto,
    ) -> Result<LiveSession, LiveSessionError>;

    /// List sessions; teachers only see their own
    async fn list_sessions(
        &self,
        actor: Actor,
        filter: SessionFilter,
    ) -> Result<Vec<LiveSession>, LiveSessionError>;

    async fn get_session(&self, actor: Actor, session_id: Uuid)
        -> Result<LiveSession, LiveSessionError>;

    /// Go live and notify the course room
    async fn start_session(
        &self,
        actor: Actor,
        session_id: Uuid,
        join_url: Option<String>,
    ) -> Result<LiveSession, LiveSessionError>;

    /// End the session, closing every open join
    async fn end_session(&self, actor: Actor, session_id: Uuid)
        -> Result<LiveSession, LiveSessionError>;

    /// Most recently updated LIVE session of a course and the version the
    /// answer is consistent with
    async fn active_for_course(
        &self,
        course_slug: &str,
    ) -> Result<(Option<LiveSession>, i64), LiveSessionError>;

    async fn join(
        &self,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<(LiveSession, AttendanceStats), LiveSessionError>;

    async fn ping(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        elapsed_ms: i64,
    ) -> Result<AttendanceStats, LiveSessionError>;

    async fn leave(&self, user_id: Uuid, session_id: Uuid)
        -> Result<AttendanceStats, LiveSessionError>;
}

/// Create session input
#[derive(Debug, Clone, Default)]
pub struct CreateSessionDto {
    pub course_slug: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub provider: Option<String>,
    pub scheduled_start: Option<String>,
    pub duration_minutes: Option<i32>,
    pub meeting: MeetingDetails,
}

/// Live session service errors
#[derive(Debug, thiserror::Error)]
pub enum LiveSessionError {
    #[error("Session not found.")]
    NotFound,

    #[error("Course not found.")]
    CourseNotFound,

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("This session is already live.")]
    AlreadyLive,

    #[error("Cannot start a session that has already ended or was cancelled.")]
    Finished,

    #[error("This session has already been ended.")]
    AlreadyEnded,

    #[error("A meeting join link could not be generated. Please provide a meeting URL.")]
    MissingJoinUrl,

    #[error("{0}")]
    InvalidRequest(String),

    #[error("This live session is not currently active.")]
    NotLive,

    #[error("You must be enrolled in this course to join the live session.")]
    NotEnrolled,

    #[error("You have not joined this live session.")]
    NotJoined,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AppError> for LiveSessionError {
    fn from(err: AppError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<AttendanceError> for LiveSessionError {
    fn from(err: AttendanceError) -> Self {
        match err {
            AttendanceError::NotJoined => Self::NotJoined,
        }
    }
}

/// Service construction parameters
#[derive(Debug, Clone, Copy)]
pub struct LiveSessionConfig {
    pub ping_interval_ms: u64,
    pub ping_tolerance_ms: u64,
    pub default_provider: MeetingProvider,
    pub default_duration_minutes: i32,
}

/// LiveSessionService implementation
pub struct LiveSessionServiceImpl<L, C>
where
    L: LiveSessionRepository,
    C: CourseRepository,
{
    sessions: Arc<L>,
    courses: Arc<C>,
    publisher: Arc<dyn LiveEventPublisher>,
    policy: AttendancePolicy,
    config: LiveSessionConfig,
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl<L, C> LiveSessionServiceImpl<L, C>
where
    L: LiveSessionRepository,
    C: CourseRepository,
{
    pub fn new(
        sessions: Arc<L>,
        courses: Arc<C>,
        publisher: Arc<dyn LiveEventPublisher>,
        config: LiveSessionConfig,
    ) -> Self {
        Self {
            sessions,
            courses,
            publisher,
            policy: AttendancePolicy::new(config.ping_interval_ms, config.ping_tolerance_ms),
            config,
            locks: DashMap::new(),
        }
    }

    async fn lock_course(&self, course_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = self
            .locks
            .entry(course_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Lock the session's course, then load the session fresh
    async fn lock_session(
        &self,
        session_id: Uuid,
    ) -> Result<(OwnedMutexGuard<()>, LiveSession), LiveSessionError> {
        let course_id = self.load(session_id).await?.course_id;
        let guard = self.lock_course(course_id).await;
        let session = self.load(session_id).await?;
        Ok((guard, session))
    }

    async fn load(&self, session_id: Uuid) -> Result<LiveSession, LiveSessionError> {
        self.sessions
            .find_by_id(session_id)
            .await?
            .ok_or(LiveSessionError::NotFound)
    }

    /// Stamp a new version and persist.
    async fn save(&self, mut session: LiveSession, now: DateTime<Utc>) -> Result<LiveSession, LiveSessionError> {
        session.version = self.sessions.next_version().await?;
        session.updated_at = now;
        Ok(self.sessions.update(&session).await?)
    }

    fn ensure_can_manage(
        actor: Actor,
        session: &LiveSession,
        message: &'static str,
    ) -> Result<(), LiveSessionError> {
        if !actor.role.is_staff() {
            return Err(LiveSessionError::Forbidden(message));
        }
        if actor.role.can_manage_all_sessions() || session.teacher_id == Some(actor.user_id) {
            Ok(())
        } else {
            Err(LiveSessionError::Forbidden(message))
        }
    }
}

#[async_trait]
impl<L, C> LiveSessionService for LiveSessionServiceImpl<L, C>
where
    L: LiveSessionRepository + 'static,
    C: CourseRepository + 'static,
{
    async fn create_session(
        &self,
        actor: Actor,
        request: CreateSessionDto,
    ) -> Result<LiveSession, LiveSessionError> {
        if !actor.role.is_staff() {
            return Err(LiveSessionError::Forbidden(
                "You do not have permission to schedule sessions.",
            ));
        }

        let scheduled_start = non_blank(request.scheduled_start).ok_or_else(|| {
            LiveSessionError::InvalidRequest("Scheduled start time is required.".into())
        })?;

        let course = self
            .courses
            .find_by_slug(request.course_slug.trim())
            .await?
            .ok_or(LiveSessionError::CourseNotFound)?;
        let _guard = self.lock_course(course.id).await;

        let scheduled_start = DateTime::parse_from_rfc3339(&scheduled_start)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|_| {
                LiveSessionError::InvalidRequest("A valid scheduled start date is required.".into())
            })?;

        let provider = match non_blank(request.provider) {
            Some(raw) => MeetingProvider::parse(&raw).ok_or_else(|| {
                LiveSessionError::InvalidRequest(format!("Unsupported meeting provider: {raw}"))
            })?,
            None => self.config.default_provider,
        };

        let duration_minutes = request
            .duration_minutes
            .filter(|minutes| *minutes > 0)
            .unwrap_or(self.config.default_duration_minutes);

        let now = Utc::now();
        let session = LiveSession {
            id: Uuid::new_v4(),
            course_id: course.id,
            course_slug: course.slug.clone(),
            teacher_id: Some(actor.user_id),
            title: non_blank(request.title)
                .unwrap_or_else(|| format!("Live Class - {}", course.name)),
            description: non_blank(request.description).unwrap_or_default(),
            provider,
            status: SessionStatus::Scheduled,
            scheduled_start,
            duration_minutes,
            expected_watch_time_ms: LiveSession::expected_watch_time_for(duration_minutes),
            actual_start: None,
            actual_end: None,
            meeting: MeetingDetails {
                meeting_id: request.meeting.meeting_id.trim().to_string(),
                join_url: request.meeting.join_url.trim().to_string(),
                start_url: request.meeting.start_url.trim().to_string(),
                password: request.meeting.password.trim().to_string(),
            },
            participants: Vec::new(),
            version: self.sessions.next_version().await?,
            created_at: now,
            updated_at: now,
        };

        let session = self.sessions.create(&session).await?;

        tracing::info!(
            session_id = %session.id,
            course = %session.course_slug,
            provider = %session.provider,
            "Live session scheduled"
        );

        Ok(session)
    }

    async fn list_sessions(
        &self,
        actor: Actor,
        mut filter: SessionFilter,
    ) -> Result<Vec<LiveSession>, LiveSessionError> {
        if !actor.role.is_staff() {
            return Err(LiveSessionError::Forbidden(
                "You do not have permission to view sessions.",
            ));
        }
        if !actor.role.can_manage_all_sessions() {
            filter.teacher_id = Some(actor.user_id);
        }
        Ok(self.sessions.list(&filter).await?)
    }

    async fn get_session(
        &self,
        actor: Actor,
        session_id: Uuid,
    ) -> Result<LiveSession, LiveSessionError> {
        let session = self.load(session_id).await?;
        Self::ensure_can_manage(actor, &session, "You do not have permission to view this session.")?;
        Ok(session)
    }

    async fn start_session(
        &self,
        actor: Actor,
        session_id: Uuid,
        join_url: Option<String>,
    ) -> Result<LiveSession, LiveSessionError> {
        let (_guard, mut session) = self.lock_session(session_id).await?;
        Self::ensure_can_manage(actor, &session, "You do not have permission to start this session.")?;

        if session.status == SessionStatus::Live {
            return Err(LiveSessionError::AlreadyLive);
        }
        if session.status.is_finished() {
            return Err(LiveSessionError::Finished);
        }

        if let Some(url) = non_blank(join_url) {
            session.meeting.join_url = url;
        }
        if !session.meeting.has_join_url() {
            return Err(LiveSessionError::MissingJoinUrl);
        }

        let now = Utc::now();
        session.status = SessionStatus::Live;
        session.actual_start = Some(now);
        session.expected_watch_time_ms =
            LiveSession::expected_watch_time_for(session.duration_minutes);

        let enrollments = self.courses.active_enrollments(session.course_id).await?;
        session.seed_participants(enrollments.into_iter().map(|e| e.user_id));

        let session = self.save(session, now).await?;

        metrics::live_session_started();
        self.publisher.publish(LiveSessionEvent::Started, &session);

        tracing::info!(
            session_id = %session.id,
            course = %session.course_slug,
            participants = session.participants.len(),
            version = session.version,
            "Live session started"
        );

        Ok(session)
    }

    async fn end_session(
        &self,
        actor: Actor,
        session_id: Uuid,
    ) -> Result<LiveSession, LiveSessionError> {
        let (guard, mut session) = self.lock_session(session_id).await?;
        Self::ensure_can_manage(actor, &session, "You do not have permission to end this session.")?;

        if session.status == SessionStatus::Ended {
            return Err(LiveSessionError::AlreadyEnded);
        }

        let was_live = session.is_live();
        let now = Utc::now();
        let expected = session.expected_watch_time_ms;
        for participant in session.participants.iter_mut() {
            self.policy.leave(participant, expected, now);
        }
        session.status = SessionStatus::Ended;
        session.actual_end = Some(now);

        let session = self.save(session, now).await?;
        drop(guard);

        if was_live {
            metrics::live_session_ended();
        }
        self.publisher.publish(LiveSessionEvent::Ended, &session);

        tracing::info!(
            session_id = %session.id,
            course = %session.course_slug,
            version = session.version,
            "Live session ended"
        );

        Ok(session)
    }

    async fn active_for_course(
        &self,
        course_slug: &str,
    ) -> Result<(Option<LiveSession>, i64), LiveSessionError> {
        let Some(course) = self.courses.find_by_slug(course_slug).await? else {
            return Ok((None, self.sessions.current_version().await?));
        };

        // No mutation of this course is in flight while the lock is held.
        let _guard = self.lock_course(course.id).await;
        let version = self.sessions.current_version().await?;
        let session = self.sessions.find_active_by_course(course.id).await?;
        let version = session
            .as_ref()
            .map_or(version, |s| s.version.max(version));

        Ok((session, version))
    }

    async fn join(
        &self,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<(LiveSession, AttendanceStats), LiveSessionError> {
        let (_guard, mut session) = self.lock_session(session_id).await?;
        if !session.is_live() {
            return Err(LiveSessionError::NotLive);
        }
        if !self.courses.is_enrolled(session.course_id, user_id).await? {
            return Err(LiveSessionError::NotEnrolled);
        }

        let now = Utc::now();
        let expected = session.expected_watch_time_ms;
        let stats = self
            .policy
            .join(session.participant_entry(user_id), expected, now);

        let session = self.save(session, now).await?;
        metrics::record_attendance("join", 0);

        tracing::debug!(%session_id, %user_id, "Participant joined");

        Ok((session, stats))
    }

    async fn ping(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        elapsed_ms: i64,
    ) -> Result<AttendanceStats, LiveSessionError> {
        let (_guard, mut session) = self.lock_session(session_id).await?;
        if !session.is_live() {
            return Err(LiveSessionError::NotLive);
        }

        let now = Utc::now();
        let expected = session.expected_watch_time_ms;
        let participant = session
            .participant_mut(user_id)
            .ok_or(LiveSessionError::NotJoined)?;
        let credited = self.policy.ping(participant, elapsed_ms, expected, now)?;
        let stats = AttendanceStats::from(&*participant);

        self.save(session, now).await?;
        metrics::record_attendance("ping", credited);

        tracing::debug!(%session_id, %user_id, elapsed_ms, credited, "Ping credited");

        Ok(stats)
    }

    async fn leave(
        &self,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<AttendanceStats, LiveSessionError> {
        let (_guard, mut session) = self.lock_session(session_id).await?;

        let now = Utc::now();
        let expected = session.expected_watch_time_ms;
        let Some(participant) = session.participant_mut(user_id) else {
            return Ok(AttendanceStats::default());
        };
        if !participant.is_joined() {
            return Ok(AttendanceStats::from(&*participant));
        }

        let before = participant.accumulated_watch_time_ms;
        let stats = self.policy.leave(participant, expected, now);

        self.save(session, now).await?;
        metrics::record_attendance("leave", stats.accumulated_watch_time_ms - before);

        tracing::debug!(%session_id, %user_id, "Participant left");

        Ok(stats)
    }
}

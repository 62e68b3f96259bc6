//! Live Session Repository Implementation
//!
//! PostgreSQL implementation of the LiveSessionRepository trait.
//! Meeting details and participants are stored as JSONB documents.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{
    LiveSession, LiveSessionRepository, MeetingDetails, MeetingProvider, Participant,
    SessionFilter, SessionStatus,
};
use crate::shared::error::AppError;

/// Database row representation of the `live_sessions` table.
#[derive(Debug, sqlx::FromRow)]
struct LiveSessionRow {
    id: Uuid,
    course_id: Uuid,
    course_slug: String,
    teacher_id: Option<Uuid>,
    title: String,
    description: String,
    provider: String,
    status: String,
    scheduled_start: DateTime<Utc>,
    duration_minutes: i32,
    expected_watch_time_ms: i64,
    actual_start: Option<DateTime<Utc>>,
    actual_end: Option<DateTime<Utc>>,
    meeting: Json<MeetingDetails>,
    participants: Json<Vec<Participant>>,
    version: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LiveSessionRow {
    fn into_session(self) -> LiveSession {
        LiveSession {
            id: self.id,
            course_id: self.course_id,
            course_slug: self.course_slug,
            teacher_id: self.teacher_id,
            title: self.title,
            description: self.description,
            provider: MeetingProvider::parse(&self.provider).unwrap_or_default(),
            status: SessionStatus::parse(&self.status).unwrap_or_default(),
            scheduled_start: self.scheduled_start,
            duration_minutes: self.duration_minutes,
            expected_watch_time_ms: self.expected_watch_time_ms,
            actual_start: self.actual_start,
            actual_end: self.actual_end,
            meeting: self.meeting.0,
            participants: self.participants.0,
            version: self.version,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, course_id, course_slug, teacher_id, title, description, provider, status,
           scheduled_start, duration_minutes, expected_watch_time_ms, actual_start, actual_end,
           meeting, participants, version, created_at, updated_at
    FROM live_sessions
"#;

/// PostgreSQL live session repository.
#[derive(Clone)]
pub struct PgLiveSessionRepository {
    pool: PgPool,
}

impl PgLiveSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LiveSessionRepository for PgLiveSessionRepository {
    async fn next_version(&self) -> Result<i64, AppError> {
        let version: i64 = sqlx::query_scalar("SELECT nextval('live_session_versions')")
            .fetch_one(&self.pool)
            .await?;
        Ok(version)
    }

    async fn current_version(&self) -> Result<i64, AppError> {
        let (last_value, is_called): (i64, bool) =
            sqlx::query_as("SELECT last_value, is_called FROM live_session_versions")
                .fetch_one(&self.pool)
                .await?;
        Ok(if is_called { last_value } else { 0 })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<LiveSession>, AppError> {
        let row = sqlx::query_as::<_, LiveSessionRow>(&format!("{SELECT_COLUMNS} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(LiveSessionRow::into_session))
    }

    async fn find_active_by_course(&self, course_id: Uuid) -> Result<Option<LiveSession>, AppError> {
        let row = sqlx::query_as::<_, LiveSessionRow>(&format!(
            "{SELECT_COLUMNS} WHERE course_id = $1 AND status = 'LIVE' ORDER BY updated_at DESC LIMIT 1"
        ))
        .bind(course_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(LiveSessionRow::into_session))
    }

    async fn list(&self, filter: &SessionFilter) -> Result<Vec<LiveSession>, AppError> {
        let rows = sqlx::query_as::<_, LiveSessionRow>(&format!(
            r#"{SELECT_COLUMNS}
            WHERE ($1::uuid IS NULL OR course_id = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::uuid IS NULL OR teacher_id = $3)
            ORDER BY scheduled_start DESC"#
        ))
        .bind(filter.course_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.teacher_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(LiveSessionRow::into_session).collect())
    }

    async fn create(&self, session: &LiveSession) -> Result<LiveSession, AppError> {
        let row = sqlx::query_as::<_, LiveSessionRow>(
            r#"
            INSERT INTO live_sessions (
                id, course_id, course_slug, teacher_id, title, description, provider, status,
                scheduled_start, duration_minutes, expected_watch_time_ms, actual_start, actual_end,
                meeting, participants, version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            RETURNING id, course_id, course_slug, teacher_id, title, description, provider, status,
                      scheduled_start, duration_minutes, expected_watch_time_ms, actual_start, actual_end,
                      meeting, participants, version, created_at, updated_at
            "#,
        )
        .bind(session.id)
        .bind(session.course_id)
        .bind(&session.course_slug)
        .bind(session.teacher_id)
        .bind(&session.title)
        .bind(&session.description)
        .bind(session.provider.as_str())
        .bind(session.status.as_str())
        .bind(session.scheduled_start)
        .bind(session.duration_minutes)
        .bind(session.expected_watch_time_ms)
        .bind(session.actual_start)
        .bind(session.actual_end)
        .bind(Json(&session.meeting))
        .bind(Json(&session.participants))
        .bind(session.version)
        .bind(session.created_at)
        .bind(session.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into_session())
    }

    async fn update(&self, session: &LiveSession) -> Result<LiveSession, AppError> {
        let row = sqlx::query_as::<_, LiveSessionRow>(
            r#"
            UPDATE live_sessions
            SET title = $2, description = $3, provider = $4, status = $5, scheduled_start = $6,
                duration_minutes = $7, expected_watch_time_ms = $8, actual_start = $9,
                actual_end = $10, meeting = $11, participants = $12, version = $13,
                updated_at = $14
            WHERE id = $1
            RETURNING id, course_id, course_slug, teacher_id, title, description, provider, status,
                      scheduled_start, duration_minutes, expected_watch_time_ms, actual_start, actual_end,
                      meeting, participants, version, created_at, updated_at
            "#,
        )
        .bind(session.id)
        .bind(&session.title)
        .bind(&session.description)
        .bind(session.provider.as_str())
        .bind(session.status.as_str())
        .bind(session.scheduled_start)
        .bind(session.duration_minutes)
        .bind(session.expected_watch_time_ms)
        .bind(session.actual_start)
        .bind(session.actual_end)
        .bind(Json(&session.meeting))
        .bind(Json(&session.participants))
        .bind(session.version)
        .bind(session.updated_at)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("Session not found.".into()))?;

        Ok(row.into_session())
    }
}

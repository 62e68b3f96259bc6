//! In-memory repository implementations.
//!
//! Used when no database URL is configured and by the test suite. State is
//! held in `DashMap`s and lost on restart.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use uuid::Uuid;

use crate::domain::{
    Course, CourseRepository, Enrollment, EnrollmentStatus, LiveSession, LiveSessionRepository,
    SessionFilter, SessionStatus, Ticket, TicketMessage, TicketRepository, TicketStatus,
};
use crate::shared::error::AppError;

#[derive(Default)]
pub struct InMemoryLiveSessionRepository {
    sessions: DashMap<Uuid, LiveSession>,
    version: AtomicI64,
}

impl InMemoryLiveSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LiveSessionRepository for InMemoryLiveSessionRepository {
    async fn next_version(&self) -> Result<i64, AppError> {
        Ok(self.version.fetch_add(1, Ordering::SeqCst) + 1)
    }

    async fn current_version(&self) -> Result<i64, AppError> {
        Ok(self.version.load(Ordering::SeqCst))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<LiveSession>, AppError> {
        Ok(self.sessions.get(&id).map(|s| s.clone()))
    }

    async fn find_active_by_course(&self, course_id: Uuid) -> Result<Option<LiveSession>, AppError> {
        Ok(self
            .sessions
            .iter()
            .filter(|s| s.course_id == course_id && s.status == SessionStatus::Live)
            .max_by_key(|s| s.updated_at)
            .map(|s| s.clone()))
    }

    async fn list(&self, filter: &SessionFilter) -> Result<Vec<LiveSession>, AppError> {
        let mut sessions: Vec<LiveSession> = self
            .sessions
            .iter()
            .filter(|s| filter.matches(s))
            .map(|s| s.clone())
            .collect();
        sessions.sort_by(|a, b| b.scheduled_start.cmp(&a.scheduled_start));
        Ok(sessions)
    }

    async fn create(&self, session: &LiveSession) -> Result<LiveSession, AppError> {
        if self.sessions.contains_key(&session.id) {
            return Err(AppError::Conflict("Session already exists.".into()));
        }
        self.sessions.insert(session.id, session.clone());
        Ok(session.clone())
    }

    async fn update(&self, session: &LiveSession) -> Result<LiveSession, AppError> {
        match self.sessions.get_mut(&session.id) {
            Some(mut stored) => {
                *stored = session.clone();
                Ok(session.clone())
            }
            None => Err(AppError::NotFound("Session not found.".into())),
        }
    }
}

#[derive(Default)]
pub struct InMemoryCourseRepository {
    courses: DashMap<Uuid, Course>,
    enrollments: DashMap<(Uuid, Uuid), Enrollment>,
}

impl InMemoryCourseRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CourseRepository for InMemoryCourseRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Course>, AppError> {
        Ok(self.courses.get(&id).map(|c| c.clone()))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Course>, AppError> {
        Ok(self
            .courses
            .iter()
            .find(|c| c.slug == slug)
            .map(|c| c.clone()))
    }

    async fn create(&self, course: &Course) -> Result<Course, AppError> {
        if self.courses.iter().any(|c| c.slug == course.slug) {
            return Err(AppError::Conflict(
                "A course with this slug already exists.".into(),
            ));
        }
        self.courses.insert(course.id, course.clone());
        Ok(course.clone())
    }

    async fn enroll(&self, course_id: Uuid, user_id: Uuid) -> Result<Enrollment, AppError> {
        let mut entry = self
            .enrollments
            .entry((course_id, user_id))
            .or_insert_with(|| Enrollment {
                course_id,
                user_id,
                status: EnrollmentStatus::Active,
                created_at: Utc::now(),
            });
        entry.status = EnrollmentStatus::Active;
        Ok(entry.clone())
    }

    async fn is_enrolled(&self, course_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        Ok(self
            .enrollments
            .get(&(course_id, user_id))
            .is_some_and(|e| e.status == EnrollmentStatus::Active))
    }

    async fn active_enrollments(&self, course_id: Uuid) -> Result<Vec<Enrollment>, AppError> {
        let mut enrollments: Vec<Enrollment> = self
            .enrollments
            .iter()
            .filter(|e| e.course_id == course_id && e.status == EnrollmentStatus::Active)
            .map(|e| e.clone())
            .collect();
        enrollments.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(enrollments)
    }
}

#[derive(Default)]
pub struct InMemoryTicketRepository {
    tickets: DashMap<Uuid, Ticket>,
    messages: DashMap<Uuid, Vec<TicketMessage>>,
}

impl InMemoryTicketRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TicketRepository for InMemoryTicketRepository {
    async fn create(&self, ticket: &Ticket, first_message: &TicketMessage) -> Result<Ticket, AppError> {
        self.tickets.insert(ticket.id, ticket.clone());
        self.messages.insert(ticket.id, vec![first_message.clone()]);
        Ok(ticket.clone())
    }

    async fn find_for_user(&self, id: Uuid, user_id: Uuid) -> Result<Option<Ticket>, AppError> {
        Ok(self
            .tickets
            .get(&id)
            .filter(|t| t.user_id == user_id)
            .map(|t| t.clone()))
    }

    async fn list_for_user(
        &self,
        user_id: Uuid,
        status: Option<TicketStatus>,
    ) -> Result<Vec<Ticket>, AppError> {
        let mut tickets: Vec<Ticket> = self
            .tickets
            .iter()
            .filter(|t| t.user_id == user_id && status.is_none_or(|s| t.status == s))
            .map(|t| t.clone())
            .collect();
        tickets.sort_by(|a, b| b.last_message_at.cmp(&a.last_message_at));
        Ok(tickets)
    }

    async fn messages(&self, ticket_id: Uuid) -> Result<Vec<TicketMessage>, AppError> {
        Ok(self
            .messages
            .get(&ticket_id)
            .map(|m| m.clone())
            .unwrap_or_default())
    }

    async fn append_message(&self, message: &TicketMessage) -> Result<Ticket, AppError> {
        let mut ticket = self
            .tickets
            .get_mut(&message.ticket_id)
            .ok_or_else(|| AppError::NotFound("Ticket not found".into()))?;
        if ticket.is_closed() {
            return Err(AppError::Conflict("This ticket is closed.".into()));
        }
        ticket.record_message(message.created_at);
        self.messages
            .entry(message.ticket_id)
            .or_default()
            .push(message.clone());
        Ok(ticket.clone())
    }

    async fn update(&self, ticket: &Ticket) -> Result<Ticket, AppError> {
        match self.tickets.get_mut(&ticket.id) {
            Some(mut stored) => {
                *stored = ticket.clone();
                Ok(ticket.clone())
            }
            None => Err(AppError::NotFound("Ticket not found".into())),
        }
    }
}

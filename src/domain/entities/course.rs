//! Course and enrollment entities.
//!
//! Maps to the `courses` and `enrollments` tables.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shared::error::AppError;

/// A course learners enroll in. Live sessions belong to exactly one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentStatus {
    #[default]
    Active,
    Inactive,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "ACTIVE",
            Self::Inactive => "INACTIVE",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "ACTIVE" => Self::Active,
            _ => Self::Inactive,
        }
    }
}

/// A user's enrollment in a course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Enrollment {
    pub course_id: Uuid,
    pub user_id: Uuid,
    pub status: EnrollmentStatus,
    pub created_at: DateTime<Utc>,
}

/// Repository trait for courses and enrollments.
#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Course>, AppError>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Course>, AppError>;

    /// Insert a course; fails with `Conflict` when the slug is taken.
    async fn create(&self, course: &Course) -> Result<Course, AppError>;

    /// Create or reactivate an enrollment.
    async fn enroll(&self, course_id: Uuid, user_id: Uuid) -> Result<Enrollment, AppError>;

    /// Whether the user holds an active enrollment.
    async fn is_enrolled(&self, course_id: Uuid, user_id: Uuid) -> Result<bool, AppError>;

    /// Active enrollments of a course, newest first.
    async fn active_enrollments(&self, course_id: Uuid) -> Result<Vec<Enrollment>, AppError>;
}

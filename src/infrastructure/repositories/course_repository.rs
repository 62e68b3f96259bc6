//! Course Repository Implementation
//!
//! PostgreSQL implementation of the CourseRepository trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{Course, CourseRepository, Enrollment, EnrollmentStatus};
use crate::infrastructure::database::map_unique_violation;
use crate::shared::error::AppError;

#[derive(Debug, sqlx::FromRow)]
struct CourseRow {
    id: Uuid,
    slug: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<CourseRow> for Course {
    fn from(row: CourseRow) -> Self {
        Self {
            id: row.id,
            slug: row.slug,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct EnrollmentRow {
    course_id: Uuid,
    user_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
}

impl From<EnrollmentRow> for Enrollment {
    fn from(row: EnrollmentRow) -> Self {
        Self {
            course_id: row.course_id,
            user_id: row.user_id,
            status: EnrollmentStatus::from_str(&row.status),
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL course repository.
#[derive(Clone)]
pub struct PgCourseRepository {
    pool: PgPool,
}

impl PgCourseRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CourseRepository for PgCourseRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Course>, AppError> {
        let row = sqlx::query_as::<_, CourseRow>(
            "SELECT id, slug, name, created_at FROM courses WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Course::from))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Course>, AppError> {
        let row = sqlx::query_as::<_, CourseRow>(
            "SELECT id, slug, name, created_at FROM courses WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Course::from))
    }

    async fn create(&self, course: &Course) -> Result<Course, AppError> {
        let row = sqlx::query_as::<_, CourseRow>(
            r#"
            INSERT INTO courses (id, slug, name, created_at)
            VALUES ($1, $2, $3, $4)
            RETURNING id, slug, name, created_at
            "#,
        )
        .bind(course.id)
        .bind(&course.slug)
        .bind(&course.name)
        .bind(course.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "A course with this slug already exists."))?;
        Ok(row.into())
    }

    async fn enroll(&self, course_id: Uuid, user_id: Uuid) -> Result<Enrollment, AppError> {
        let row = sqlx::query_as::<_, EnrollmentRow>(
            r#"
            INSERT INTO enrollments (course_id, user_id, status, created_at)
            VALUES ($1, $2, 'ACTIVE', NOW())
            ON CONFLICT (course_id, user_id) DO UPDATE SET status = 'ACTIVE'
            RETURNING course_id, user_id, status, created_at
            "#,
        )
        .bind(course_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn is_enrolled(&self, course_id: Uuid, user_id: Uuid) -> Result<bool, AppError> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM enrollments
                WHERE course_id = $1 AND user_id = $2 AND status = 'ACTIVE'
            )
            "#,
        )
        .bind(course_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn active_enrollments(&self, course_id: Uuid) -> Result<Vec<Enrollment>, AppError> {
        let rows = sqlx::query_as::<_, EnrollmentRow>(
            r#"
            SELECT course_id, user_id, status, created_at
            FROM enrollments
            WHERE course_id = $1 AND status = 'ACTIVE'
            ORDER BY created_at DESC
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Enrollment::from).collect())
    }
}

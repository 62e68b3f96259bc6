//! Course Service
//!
//! Course lookup for learners and course/enrollment management for staff.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::application::services::Actor;
use crate::domain::{Course, CourseRepository, Enrollment};
use crate::shared::error::AppError;

/// Course service trait
#[async_trait]
pub trait CourseService: Send + Sync {
    /// Find a course by slug, with the caller's enrollment state
    async fn get_course(
        &self,
        slug: &str,
        user_id: Option<Uuid>,
    ) -> Result<(Course, bool), CourseError>;

    async fn create_course(&self, actor: Actor, slug: &str, name: &str)
        -> Result<Course, CourseError>;

    async fn enroll(&self, actor: Actor, slug: &str, user_id: Uuid)
        -> Result<Enrollment, CourseError>;

    async fn roster(&self, actor: Actor, slug: &str) -> Result<Vec<Enrollment>, CourseError>;
}

/// Course service errors
#[derive(Debug, thiserror::Error)]
pub enum CourseError {
    #[error("Course not found")]
    NotFound,

    #[error("A course with this slug already exists.")]
    SlugTaken,

    #[error("Permission denied")]
    Forbidden,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AppError> for CourseError {
    fn from(err: AppError) -> Self {
        match err {
            AppError::Conflict(_) => Self::SlugTaken,
            other => Self::Internal(other.to_string()),
        }
    }
}

/// CourseService implementation
pub struct CourseServiceImpl<C: CourseRepository> {
    courses: Arc<C>,
}

impl<C: CourseRepository> CourseServiceImpl<C> {
    pub fn new(courses: Arc<C>) -> Self {
        Self { courses }
    }

    async fn find(&self, slug: &str) -> Result<Course, CourseError> {
        self.courses
            .find_by_slug(slug)
            .await?
            .ok_or(CourseError::NotFound)
    }
}

#[async_trait]
impl<C: CourseRepository + 'static> CourseService for CourseServiceImpl<C> {
    async fn get_course(
        &self,
        slug: &str,
        user_id: Option<Uuid>,
    ) -> Result<(Course, bool), CourseError> {
        let course = self.find(slug).await?;
        let is_enrolled = match user_id {
            Some(user_id) => self.courses.is_enrolled(course.id, user_id).await?,
            None => false,
        };
        Ok((course, is_enrolled))
    }

    async fn create_course(
        &self,
        actor: Actor,
        slug: &str,
        name: &str,
    ) -> Result<Course, CourseError> {
        if !actor.role.is_staff() {
            return Err(CourseError::Forbidden);
        }

        let course = Course {
            id: Uuid::new_v4(),
            slug: slug.trim().to_lowercase(),
            name: name.trim().to_string(),
            created_at: Utc::now(),
        };
        let course = self.courses.create(&course).await?;

        tracing::info!(course_id = %course.id, slug = %course.slug, "Course created");
        Ok(course)
    }

    async fn enroll(
        &self,
        actor: Actor,
        slug: &str,
        user_id: Uuid,
    ) -> Result<Enrollment, CourseError> {
        if !actor.role.is_staff() {
            return Err(CourseError::Forbidden);
        }
        let course = self.find(slug).await?;
        Ok(self.courses.enroll(course.id, user_id).await?)
    }

    async fn roster(&self, actor: Actor, slug: &str) -> Result<Vec<Enrollment>, CourseError> {
        if !actor.role.is_staff() {
            return Err(CourseError::Forbidden);
        }
        let course = self.find(slug).await?;
        Ok(self.courses.active_enrollments(course.id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;
    use crate::infrastructure::repositories::InMemoryCourseRepository;

    fn staff() -> Actor {
        Actor {
            user_id: Uuid::new_v4(),
            role: Role::Teacher,
        }
    }

    #[tokio::test]
    async fn test_course_lifecycle() {
        let service = CourseServiceImpl::new(Arc::new(InMemoryCourseRepository::new()));
        let course = service
            .create_course(staff(), " Intro-To-Python ", "Intro to Python")
            .await
            .unwrap();
        assert_eq!(course.slug, "intro-to-python");

        let learner = Uuid::new_v4();
        let (_, enrolled) = service
            .get_course("intro-to-python", Some(learner))
            .await
            .unwrap();
        assert!(!enrolled);

        service
            .enroll(staff(), "intro-to-python", learner)
            .await
            .unwrap();
        let (_, enrolled) = service
            .get_course("intro-to-python", Some(learner))
            .await
            .unwrap();
        assert!(enrolled);
        assert_eq!(
            service.roster(staff(), "intro-to-python").await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_duplicate_slug_and_permissions() {
        let service = CourseServiceImpl::new(Arc::new(InMemoryCourseRepository::new()));
        service.create_course(staff(), "rust", "Rust").await.unwrap();

        let err = service
            .create_course(staff(), "rust", "Rust again")
            .await
            .unwrap_err();
        assert!(matches!(err, CourseError::SlugTaken));

        let student = Actor {
            user_id: Uuid::new_v4(),
            role: Role::Student,
        };
        let err = service.roster(student, "rust").await.unwrap_err();
        assert!(matches!(err, CourseError::Forbidden));
        assert!(matches!(
            service.get_course("missing", None).await.unwrap_err(),
            CourseError::NotFound
        ));
    }
}

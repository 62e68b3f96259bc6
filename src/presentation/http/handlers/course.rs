//! Course Handlers

use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};

use crate::application::dto::request::{CreateCourseRequest, EnrollRequest};
use crate::application::dto::response::{
    CourseResponse, CourseView, EnrollmentView, RosterResponse,
};
use crate::application::services::CourseError;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::validate_body;
use crate::startup::AppState;

fn course_error(err: CourseError) -> AppError {
    match err {
        CourseError::NotFound => AppError::NotFound("Course not found.".into()),
        CourseError::SlugTaken => AppError::Conflict(err.to_string()),
        CourseError::Forbidden => {
            AppError::Forbidden("You do not have permission to manage courses.".into())
        }
        CourseError::Internal(e) => AppError::Internal(e),
    }
}

/// Get a course; signed-in callers also learn whether they are enrolled
pub async fn get_course(
    State(state): State<AppState>,
    auth: Option<Extension<AuthUser>>,
    Path(slug): Path<String>,
) -> Result<Json<CourseResponse>, AppError> {
    let user_id = auth.map(|Extension(auth)| auth.user_id);

    let (course, is_enrolled) = state
        .courses
        .get_course(slug.trim(), user_id)
        .await
        .map_err(course_error)?;

    Ok(Json(CourseResponse {
        course: CourseView::new(&course, is_enrolled),
    }))
}

/// Create a course (staff)
pub async fn create_course(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<CourseResponse>), AppError> {
    validate_body(&body)?;

    let course = state
        .courses
        .create_course(auth.actor(), &body.slug, &body.name)
        .await
        .map_err(course_error)?;

    Ok((
        StatusCode::CREATED,
        Json(CourseResponse {
            course: CourseView::new(&course, false),
        }),
    ))
}

/// Enroll a user (staff)
pub async fn enroll(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(slug): Path<String>,
    Json(body): Json<EnrollRequest>,
) -> Result<(StatusCode, Json<EnrollmentView>), AppError> {
    let enrollment = state
        .courses
        .enroll(auth.actor(), slug.trim(), body.user_id)
        .await
        .map_err(course_error)?;

    Ok((StatusCode::CREATED, Json(EnrollmentView::from(enrollment))))
}

/// Active enrollments of a course (staff)
pub async fn roster(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(slug): Path<String>,
) -> Result<Json<RosterResponse>, AppError> {
    let enrollments = state
        .courses
        .roster(auth.actor(), slug.trim())
        .await
        .map_err(course_error)?;

    Ok(Json(RosterResponse {
        enrollments: enrollments.into_iter().map(EnrollmentView::from).collect(),
    }))
}

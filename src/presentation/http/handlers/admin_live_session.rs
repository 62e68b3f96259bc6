//! Staff Live Session Handlers

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};

use super::live_session::{live_session_error, parse_session_id};
use crate::application::dto::request::{
    CreateLiveSessionRequest, LiveSessionQueryParams, StartLiveSessionRequest,
};
use crate::application::dto::response::{
    AdminLiveSessionListResponse, AdminLiveSessionResponse, AdminLiveSessionView,
};
use crate::application::services::{CourseError, CreateSessionDto};
use crate::domain::{MeetingDetails, SessionFilter, SessionStatus};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::{non_blank, validate_body};
use crate::startup::AppState;

/// Schedule a live session
pub async fn create_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateLiveSessionRequest>,
) -> Result<(StatusCode, Json<AdminLiveSessionResponse>), AppError> {
    validate_body(&body)?;

    let request = CreateSessionDto {
        course_slug: body.course_slug,
        title: body.title,
        description: body.description,
        provider: body.provider,
        scheduled_start: body.scheduled_start,
        duration_minutes: body.duration_minutes,
        meeting: MeetingDetails {
            meeting_id: body.meeting_id.unwrap_or_default(),
            join_url: body.join_url.unwrap_or_default(),
            start_url: body.start_url.unwrap_or_default(),
            password: body.password.unwrap_or_default(),
        },
    };

    let session = state
        .live_sessions
        .create_session(auth.actor(), request)
        .await
        .map_err(live_session_error)?;

    Ok((
        StatusCode::CREATED,
        Json(AdminLiveSessionResponse {
            session: AdminLiveSessionView::from(&session),
        }),
    ))
}

/// List sessions, optionally filtered by course and status
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<LiveSessionQueryParams>,
) -> Result<Json<AdminLiveSessionListResponse>, AppError> {
    let status = match non_blank(params.status) {
        Some(raw) => Some(
            SessionStatus::parse(&raw)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown session status: {raw}")))?,
        ),
        None => None,
    };

    let course_id = match non_blank(params.course_slug) {
        Some(slug) => {
            let (course, _) = state
                .courses
                .get_course(&slug, None)
                .await
                .map_err(|e| match e {
                    CourseError::NotFound => AppError::NotFound("Course not found.".into()),
                    e => AppError::Internal(e.to_string()),
                })?;
            Some(course.id)
        }
        None => None,
    };

    let filter = SessionFilter {
        course_id,
        status,
        teacher_id: None,
    };
    let sessions = state
        .live_sessions
        .list_sessions(auth.actor(), filter)
        .await
        .map_err(live_session_error)?;

    Ok(Json(AdminLiveSessionListResponse {
        sessions: sessions.iter().map(AdminLiveSessionView::from).collect(),
    }))
}

/// Get one session with its participants
pub async fn get_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<Json<AdminLiveSessionResponse>, AppError> {
    let session_id = parse_session_id(&session_id)?;

    let session = state
        .live_sessions
        .get_session(auth.actor(), session_id)
        .await
        .map_err(live_session_error)?;

    Ok(Json(AdminLiveSessionResponse {
        session: AdminLiveSessionView::from(&session),
    }))
}

/// Go live
pub async fn start_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(session_id): Path<String>,
    body: Option<Json<StartLiveSessionRequest>>,
) -> Result<Json<AdminLiveSessionResponse>, AppError> {
    let session_id = parse_session_id(&session_id)?;
    let join_url = body.and_then(|Json(body)| body.join_url);

    let session = state
        .live_sessions
        .start_session(auth.actor(), session_id, join_url)
        .await
        .map_err(live_session_error)?;

    Ok(Json(AdminLiveSessionResponse {
        session: AdminLiveSessionView::from(&session),
    }))
}

/// End a session
pub async fn end_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<Json<AdminLiveSessionResponse>, AppError> {
    let session_id = parse_session_id(&session_id)?;

    let session = state
        .live_sessions
        .end_session(auth.actor(), session_id)
        .await
        .map_err(live_session_error)?;

    Ok(Json(AdminLiveSessionResponse {
        session: AdminLiveSessionView::from(&session),
    }))
}

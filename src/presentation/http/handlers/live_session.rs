//! Learner Live Session Handlers
//!
//! Active session lookup and attendance (join, ping, leave).

use axum::{
    extract::{Extension, Path, State},
    Json,
};
use uuid::Uuid;

use crate::application::dto::request::PingRequest;
use crate::application::dto::response::{
    ActiveSessionResponse, JoinResponse, LiveSessionView, StatsResponse,
};
use crate::application::services::LiveSessionError;
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::startup::AppState;

/// Map service errors onto HTTP errors
pub(crate) fn live_session_error(err: LiveSessionError) -> AppError {
    let message = err.to_string();
    match err {
        LiveSessionError::NotFound | LiveSessionError::CourseNotFound => AppError::NotFound(message),
        LiveSessionError::Forbidden(_) | LiveSessionError::NotEnrolled => {
            AppError::Forbidden(message)
        }
        LiveSessionError::AlreadyLive
        | LiveSessionError::AlreadyEnded
        | LiveSessionError::NotLive
        | LiveSessionError::NotJoined => AppError::Conflict(message),
        LiveSessionError::Finished
        | LiveSessionError::MissingJoinUrl
        | LiveSessionError::InvalidRequest(_) => AppError::BadRequest(message),
        LiveSessionError::Internal(e) => AppError::Internal(e),
    }
}

/// Parse a session id path segment
pub(crate) fn parse_session_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid session ID".into()))
}

/// Active session of a course, with the version the answer is consistent with
pub async fn get_active_session(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ActiveSessionResponse>, AppError> {
    let (session, version) = state
        .live_sessions
        .active_for_course(slug.trim())
        .await
        .map_err(live_session_error)?;

    Ok(Json(ActiveSessionResponse {
        session: session.as_ref().map(LiveSessionView::from),
        version,
    }))
}

/// Join a live session
pub async fn join_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<Json<JoinResponse>, AppError> {
    let session_id = parse_session_id(&session_id)?;

    let (session, stats) = state
        .live_sessions
        .join(auth.user_id, session_id)
        .await
        .map_err(live_session_error)?;

    Ok(Json(JoinResponse {
        session: LiveSessionView::for_participant(&session),
        stats,
    }))
}

/// Heartbeat ping crediting watch time
pub async fn ping_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(session_id): Path<String>,
    Json(body): Json<PingRequest>,
) -> Result<Json<StatsResponse>, AppError> {
    let session_id = parse_session_id(&session_id)?;

    let stats = state
        .live_sessions
        .ping(auth.user_id, session_id, body.elapsed_ms)
        .await
        .map_err(live_session_error)?;

    Ok(Json(StatsResponse { stats }))
}

/// Leave a live session
pub async fn leave_session(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(session_id): Path<String>,
) -> Result<Json<StatsResponse>, AppError> {
    let session_id = parse_session_id(&session_id)?;

    let stats = state
        .live_sessions
        .leave(auth.user_id, session_id)
        .await
        .map_err(live_session_error)?;

    Ok(Json(StatsResponse { stats }))
}

//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::{auth_middleware, optional_auth_middleware, track_metrics};
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        // WebSocket gateway endpoint
        .route("/gateway", get(ws_handler))
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn(track_metrics))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API v1 routes
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/live-sessions", live_session_routes(state.clone()))
        .nest("/courses", course_routes(state.clone()))
        .nest("/tickets", ticket_routes(state.clone()))
        .nest("/assistant", assistant_routes())
        .nest("/admin", admin_routes(state))
}

/// Learner live session routes
fn live_session_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/{session_id}/join", post(handlers::live_session::join_session))
        .route("/{session_id}/ping", post(handlers::live_session::ping_session))
        .route("/{session_id}/leave", post(handlers::live_session::leave_session))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route(
            "/courses/{slug}/active",
            get(handlers::live_session::get_active_session),
        )
        .merge(protected)
}

/// Course routes (optional auth)
fn course_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/{slug}", get(handlers::course::get_course))
        .route_layer(middleware::from_fn_with_state(state, optional_auth_middleware))
}

/// Support ticket routes (protected)
fn ticket_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::ticket::list_tickets).post(handlers::ticket::create_ticket),
        )
        .route("/{ticket_id}", get(handlers::ticket::get_ticket))
        .route("/{ticket_id}/messages", post(handlers::ticket::post_message))
        .route("/{ticket_id}/close", post(handlers::ticket::close_ticket))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

/// Help assistant routes (public)
fn assistant_routes() -> Router<AppState> {
    Router::new().route("/chat", post(handlers::assistant::chat))
}

/// Staff routes (protected; role checks happen in the services)
fn admin_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/courses", post(handlers::course::create_course))
        .route("/courses/{slug}/enrollments", get(handlers::course::roster).post(handlers::course::enroll))
        .route(
            "/live-sessions",
            get(handlers::admin_live_session::list_sessions)
                .post(handlers::admin_live_session::create_session),
        )
        .route(
            "/live-sessions/{session_id}",
            get(handlers::admin_live_session::get_session),
        )
        .route(
            "/live-sessions/{session_id}/start",
            post(handlers::admin_live_session::start_session),
        )
        .route(
            "/live-sessions/{session_id}/end",
            post(handlers::admin_live_session::end_session),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}

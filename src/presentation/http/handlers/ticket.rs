//! Support Ticket Handlers

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::application::dto::request::{
    CreateTicketRequest, PostTicketMessageRequest, TicketQueryParams,
};
use crate::application::dto::response::{
    TicketDetailResponse, TicketListResponse, TicketMessageResponse, TicketMessageView,
    TicketView,
};
use crate::application::services::{CreateTicketDto, TicketError};
use crate::domain::{Ticket, TicketCategory, TicketMessage, TicketPriority, TicketStatus};
use crate::presentation::middleware::AuthUser;
use crate::shared::error::AppError;
use crate::shared::validation::{non_blank, validate_body};
use crate::startup::AppState;

fn ticket_error(err: TicketError) -> AppError {
    match err {
        TicketError::NotFound => AppError::NotFound("Ticket not found.".into()),
        TicketError::Closed => AppError::Conflict(err.to_string()),
        TicketError::Internal(e) => AppError::Internal(e),
    }
}

fn parse_ticket_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid ticket ID".into()))
}

fn detail(ticket: Ticket, messages: Vec<TicketMessage>) -> TicketDetailResponse {
    TicketDetailResponse {
        ticket: TicketView::from(ticket),
        messages: messages.into_iter().map(TicketMessageView::from).collect(),
    }
}

/// List the caller's tickets
pub async fn list_tickets(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Query(params): Query<TicketQueryParams>,
) -> Result<Json<TicketListResponse>, AppError> {
    let status = match non_blank(params.status) {
        Some(raw) => Some(
            TicketStatus::parse(&raw)
                .ok_or_else(|| AppError::BadRequest(format!("Unknown ticket status: {raw}")))?,
        ),
        None => None,
    };

    let tickets = state
        .tickets
        .list_tickets(auth.user_id, status)
        .await
        .map_err(ticket_error)?;

    Ok(Json(TicketListResponse {
        tickets: tickets.into_iter().map(TicketView::from).collect(),
    }))
}

/// Open a ticket
pub async fn create_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<TicketDetailResponse>), AppError> {
    validate_body(&body)?;

    let category = match non_blank(body.category) {
        Some(raw) => TicketCategory::parse(&raw)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown ticket category: {raw}")))?,
        None => TicketCategory::default(),
    };
    let priority = match non_blank(body.priority) {
        Some(raw) => TicketPriority::parse(&raw)
            .ok_or_else(|| AppError::BadRequest(format!("Unknown ticket priority: {raw}")))?,
        None => TicketPriority::default(),
    };

    let request = CreateTicketDto {
        subject: body.subject,
        description: body.description,
        category,
        priority,
    };

    let (ticket, messages) = state
        .tickets
        .create_ticket(auth.user_id, request)
        .await
        .map_err(ticket_error)?;

    Ok((StatusCode::CREATED, Json(detail(ticket, messages))))
}

/// Get a ticket with its messages
pub async fn get_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(ticket_id): Path<String>,
) -> Result<Json<TicketDetailResponse>, AppError> {
    let ticket_id = parse_ticket_id(&ticket_id)?;

    let (ticket, messages) = state
        .tickets
        .get_ticket(auth.user_id, ticket_id)
        .await
        .map_err(ticket_error)?;

    Ok(Json(detail(ticket, messages)))
}

/// Post a follow-up message
pub async fn post_message(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(ticket_id): Path<String>,
    Json(body): Json<PostTicketMessageRequest>,
) -> Result<(StatusCode, Json<TicketMessageResponse>), AppError> {
    validate_body(&body)?;
    let ticket_id = parse_ticket_id(&ticket_id)?;

    let (ticket, message) = state
        .tickets
        .post_message(auth.user_id, ticket_id, &body.body)
        .await
        .map_err(ticket_error)?;

    Ok((
        StatusCode::CREATED,
        Json(TicketMessageResponse {
            ticket: TicketView::from(ticket),
            message: TicketMessageView::from(message),
        }),
    ))
}

/// Close a ticket
pub async fn close_ticket(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    Path(ticket_id): Path<String>,
) -> Result<Json<TicketView>, AppError> {
    let ticket_id = parse_ticket_id(&ticket_id)?;

    let ticket = state
        .tickets
        .close_ticket(auth.user_id, ticket_id)
        .await
        .map_err(ticket_error)?;

    Ok(Json(TicketView::from(ticket)))
}

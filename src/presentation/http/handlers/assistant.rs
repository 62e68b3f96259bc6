//! Help Assistant Handler

use axum::{extract::State, Json};

use crate::application::dto::request::AssistantChatRequest;
use crate::application::dto::response::AssistantReply;
use crate::shared::error::AppError;
use crate::shared::validation::validate_body;
use crate::startup::AppState;

/// Answer a help question
pub async fn chat(
    State(state): State<AppState>,
    Json(body): Json<AssistantChatRequest>,
) -> Result<Json<AssistantReply>, AppError> {
    validate_body(&body)?;

    let reply = state.assistant.reply(&body);
    tracing::debug!(source = ?reply.source, contexts = reply.contexts.len(), "Assistant replied");

    Ok(Json(reply))
}

//! The one-shot HTTP chat endpoint.

use super::{answer_question, AppError, AppState};
use crate::types::ChatRequest;
use axum::{extract::State, Json};
use insightql::ChatResponse;
use tracing::info;

/// Answers one question. A failed run is still a `200` carrying `errorCode`.
pub async fn chat_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let question = payload
        .message
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .ok_or_else(|| AppError::BadRequest("Field 'message' is required.".to_string()))?;

    info!("Received chat message: '{question}'");
    Ok(Json(answer_question(&app_state, question).await?))
}

//! # API Route Handlers
//!
//! This module organizes all the Axum route handlers for the `insightql-server`:
//! the general service endpoints, the one-shot chat endpoint and the WebSocket
//! chat channel.

pub mod chat;
pub mod general;
pub mod ws;

pub use chat::*;
pub use general::*;
pub use ws::*;

use super::{errors::AppError, state::AppState};
use anyhow::anyhow;
use insightql::ChatResponse;

/// Runs one question through the pipeline on its own task.
///
/// The run is spawned so that a client going away mid-request does not cancel
/// it halfway through a stage. Only a panicking run is an error here.
pub(crate) async fn answer_question(
    app_state: &AppState,
    question: String,
) -> Result<ChatResponse, AppError> {
    let pipeline = app_state.pipeline.clone();
    let run = tokio::spawn(async move {
        let state = pipeline.run(&question).await;
        ChatResponse::from_state(&state)
    });

    run.await
        .map_err(|e| AppError::Internal(anyhow!("Pipeline task aborted: {e}")))
}

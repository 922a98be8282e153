//! # WebSocket Chat
//!
//! One connection carries many questions. Each `{type: "query", content}`
//! message is answered with one `ChatResponse`, strictly in arrival order.

use super::{answer_question, AppState};
use crate::types::ClientMessage;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use insightql::ChatResponse;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

const RUN_ABORTED: &str = "An internal error occurred while processing your question.";

/// The handler for `GET /ws`.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: AppState) {
    let connection_id = Uuid::new_v4();
    info!(%connection_id, "WebSocket client connected.");
    let (mut sender, mut receiver) = socket.split();

    while let Some(message) = receiver.next().await {
        let text = match message {
            Ok(Message::Text(text)) => text,
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!(%connection_id, "WebSocket receive failed: {e}");
                break;
            }
        };

        let reply = answer_message(&app_state, text.as_str()).await;
        let payload = match serde_json::to_string(&reply) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(%connection_id, "Failed to serialize reply: {e}");
                continue;
            }
        };
        if sender.send(Message::Text(payload.into())).await.is_err() {
            debug!(%connection_id, "Client went away before the reply was sent.");
            break;
        }
    }

    info!(%connection_id, "WebSocket client disconnected.");
}

async fn answer_message(app_state: &AppState, text: &str) -> ChatResponse {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(e) => {
            debug!("Malformed WebSocket message: {e}");
            return ChatResponse::error("Invalid message format. Expected {\"type\": \"query\", \"content\": \"...\"}.");
        }
    };

    if message.kind != "query" {
        return ChatResponse::error(format!("Unsupported message type '{}'.", message.kind));
    }

    match message.content.map(|c| c.trim().to_string()) {
        Some(question) if !question.is_empty() => {
            info!("Received WebSocket question: '{question}'");
            answer_question(app_state, question)
                .await
                .unwrap_or_else(|e| {
                    error!("WebSocket question failed: {e:?}");
                    ChatResponse::error(RUN_ABORTED)
                })
        }
        _ => ChatResponse::error("Message content must not be empty."),
    }
}

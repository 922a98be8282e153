//! Context validation: rejects questions unrelated to the business data.

use super::{Failure, FailureCode, RequestState, StageTask, StatePatch};
use crate::decode::decode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

const DEFAULT_REJECTION: &str = "Sorry, I can only help with questions about the sales, products, customers and employees in the database.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContextVerdict {
    #[serde(default = "allowed")]
    is_valid: bool,
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    suggested_response: Option<String>,
}

fn allowed() -> bool {
    true
}

/// Asks the model whether the question concerns the warehouse. Fails open.
pub async fn validate_context(
    task: &StageTask,
    state: &RequestState,
    timeout: Duration,
) -> StatePatch {
    let reply = match task.complete(&[("query", state.original_query())], timeout).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(request_id = %state.id(), "Context validation unavailable ({e}). Allowing query.");
            return StatePatch::default();
        }
    };

    let verdict: ContextVerdict = match decode(&reply) {
        Ok(verdict) => verdict,
        Err(e) => {
            warn!(request_id = %state.id(), "Context verdict could not be decoded ({e}). Allowing query.");
            return StatePatch::default();
        }
    };

    let reason = verdict.reason.unwrap_or_default();
    if verdict.is_valid {
        info!(request_id = %state.id(), "Query is in context: {reason}");
        return StatePatch::default();
    }

    info!(request_id = %state.id(), "Query rejected as out of context: {reason}");
    let message = verdict
        .suggested_response
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_REJECTION.to_string());
    StatePatch::failed(Failure::new(FailureCode::OutOfContext, message).with_detail(reason))
}

//! Translation of one question into one SQL statement.

use super::{Failure, FailureCode, RequestState, StageTask, StatePatch};
use crate::{
    constants::TRANSLATION_ERROR_SENTINEL,
    decode::strip_code_fences,
    types::{QueryIntent, SchemaDescription},
};
use std::time::Duration;
use tracing::{info, warn};

const MODEL_UNAVAILABLE: &str =
    "The language model is currently unavailable. Please try again in a moment.";
const EMPTY_TRANSLATION: &str = "I could not translate your question into a query.";

pub async fn translate(
    task: &StageTask,
    state: &RequestState,
    schema: &SchemaDescription,
    dialect: &str,
    timeout: Duration,
) -> StatePatch {
    let schema_context = schema.to_prompt_context();
    let intent_context = state
        .intent()
        .map(render_intent)
        .unwrap_or_else(|| "None".to_string());
    let vars = [
        ("query", state.working_query()),
        ("schema", schema_context.as_str()),
        ("intent", intent_context.as_str()),
        ("dialect", dialect),
    ];

    let reply = match task.complete(&vars, timeout).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(request_id = %state.id(), "Translation failed: {e}");
            return StatePatch::failed(
                Failure::new(FailureCode::ModelUnavailable, MODEL_UNAVAILABLE)
                    .with_detail(e.to_string()),
            );
        }
    };

    let sql = strip_code_fences(&reply);
    if sql.is_empty() {
        return StatePatch::failed(Failure::new(
            FailureCode::TranslationRejected,
            EMPTY_TRANSLATION,
        ));
    }
    if sql.starts_with(TRANSLATION_ERROR_SENTINEL) {
        info!(request_id = %state.id(), "Model declined to translate: {sql}");
        return StatePatch::failed(Failure::new(FailureCode::TranslationRejected, sql));
    }

    info!(request_id = %state.id(), sql = %sql, "Generated SQL.");
    StatePatch {
        sql_text: Some(sql),
        ..Default::default()
    }
}

fn render_intent(intent: &QueryIntent) -> String {
    let assumptions = serde_json::to_string_pretty(&intent.assumptions)
        .unwrap_or_else(|_| "{}".to_string());
    format!(
        "- Original Query: \"{}\"\n- Enriched Query: \"{}\"\n- Assumptions: {}\n- Additional Context: {}",
        intent.original_query,
        intent.enriched_query,
        assumptions,
        intent.context_enrichment.as_deref().unwrap_or("None"),
    )
}

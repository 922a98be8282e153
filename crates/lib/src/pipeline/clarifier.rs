//! Intent clarification: turns an ambiguous question into an explicit one and
//! records the assumptions that were made.

use super::{RequestState, StageTask, StatePatch};
use crate::{
    decode::try_decode,
    types::{Assumptions, MissingDimension, QueryIntent, SchemaDescription},
};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawIntent {
    #[serde(default)]
    is_ambiguous: bool,
    #[serde(default)]
    missing_dimensions: Vec<String>,
    #[serde(default)]
    internal_questions: Vec<String>,
    #[serde(default)]
    enriched_query: Option<String>,
    #[serde(default)]
    assumptions: Value,
    #[serde(default)]
    context_enrichment: Option<String>,
}

pub async fn clarify_intent(
    task: &StageTask,
    state: &RequestState,
    schema: &SchemaDescription,
    timeout: Duration,
) -> StatePatch {
    let query = state.original_query();
    let schema_context = schema.to_prompt_context();
    let vars = [("query", query), ("schema", schema_context.as_str())];

    let raw = match task.complete(&vars, timeout).await {
        Ok(reply) => try_decode::<Option<RawIntent>>(&reply, None),
        Err(e) => {
            warn!(request_id = %state.id(), "Intent clarification unavailable ({e}).");
            None
        }
    };

    let intent = match raw {
        Some(raw) => into_intent(raw, query),
        None => {
            warn!(request_id = %state.id(), "Continuing with the unclarified query.");
            QueryIntent::unclarified(query)
        }
    };

    info!(
        request_id = %state.id(),
        ambiguous = intent.is_ambiguous,
        missing = ?intent.missing_dimensions,
        "Enriched query: {}", intent.enriched_query
    );

    StatePatch {
        intent: Some(intent),
        ..Default::default()
    }
}

fn into_intent(raw: RawIntent, original_query: &str) -> QueryIntent {
    let mut missing_dimensions = Vec::new();
    for label in &raw.missing_dimensions {
        match MissingDimension::from_label(label) {
            Some(dimension) if !missing_dimensions.contains(&dimension) => {
                missing_dimensions.push(dimension)
            }
            Some(_) => {}
            None => warn!("Dropping unknown missing dimension '{label}'."),
        }
    }

    QueryIntent {
        is_ambiguous: raw.is_ambiguous,
        missing_dimensions,
        internal_questions: raw.internal_questions,
        original_query: original_query.to_string(),
        enriched_query: raw.enriched_query.unwrap_or_default(),
        assumptions: assumptions_from(&raw.assumptions),
        context_enrichment: raw.context_enrichment.filter(|s| !s.trim().is_empty()),
    }
}

/// Reads assumptions leniently: models send numbers as strings, lists as
/// single strings, and `null` for anything.
fn assumptions_from(value: &Value) -> Assumptions {
    let text = |key: &str| match value.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };
    let list = |key: &str| match value.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s.clone()),
                Value::Null => None,
                other => Some(other.to_string()),
            })
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.clone()],
        _ => Vec::new(),
    };
    let limit = match value.get("limit") {
        Some(Value::Number(n)) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };

    Assumptions {
        time_period: text("timePeriod"),
        region: text("region"),
        metric: text("metric"),
        limit,
        group_by: list("groupBy"),
        order_by: text("orderBy"),
        filters: list("filters"),
    }
}

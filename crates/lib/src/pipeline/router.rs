//! Dashboard routing: one chart, or a dashboard of sub-questions.

use super::{RequestState, StageTask, StatePatch};
use crate::{
    decode::try_decode,
    types::{SubQuestion, VisualizationKind},
};
use regex::Regex;
use serde::Deserialize;
use std::{sync::LazyLock, time::Duration};
use tracing::{info, warn};

static KIND_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*([A-Za-z][A-Za-z ]*?)\s*[-:\x{2013}\x{2014}]\s*(.+)$")
        .expect("kind prefix pattern is valid")
});

const DEFAULT_DASHBOARD_TITLE: &str = "Dashboard";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRoute {
    #[serde(default)]
    is_dashboard: bool,
    #[serde(default)]
    dashboard_title: Option<String>,
    #[serde(default, alias = "subQuestions")]
    sub_queries: Vec<RawSubQuery>,
}

#[derive(Debug, Deserialize)]
struct RawSubQuery {
    #[serde(default)]
    query: String,
    #[serde(default)]
    description: String,
}

pub async fn route(task: &StageTask, state: &RequestState, timeout: Duration) -> StatePatch {
    let raw = match task
        .complete(&[("query", state.working_query())], timeout)
        .await
    {
        Ok(reply) => try_decode::<Option<RawRoute>>(&reply, None),
        Err(e) => {
            warn!(request_id = %state.id(), "Dashboard routing unavailable ({e}).");
            None
        }
    };

    let Some(raw) = raw.filter(|r| r.is_dashboard) else {
        info!(request_id = %state.id(), "Routed to a single visualization.");
        return single_chart();
    };

    let sub_questions: Vec<SubQuestion> = raw
        .sub_queries
        .into_iter()
        .filter(|sq| !sq.query.trim().is_empty())
        .map(|sq| {
            let (hint, description) = split_kind_prefix(&sq.description);
            SubQuestion {
                query: sq.query.trim().to_string(),
                description,
                hint,
            }
        })
        .collect();

    if sub_questions.is_empty() {
        warn!(request_id = %state.id(), "Dashboard reply had no usable sub-questions. Treating as single chart.");
        return single_chart();
    }

    let title = raw
        .dashboard_title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_DASHBOARD_TITLE.to_string());
    info!(
        request_id = %state.id(),
        "Routed to dashboard '{title}' with {} sub-questions.",
        sub_questions.len()
    );

    StatePatch {
        is_dashboard: Some(true),
        dashboard_title: Some(title),
        sub_questions: Some(sub_questions),
        ..Default::default()
    }
}

fn single_chart() -> StatePatch {
    StatePatch {
        is_dashboard: Some(false),
        ..Default::default()
    }
}

/// Splits a leading kind label such as `"Bar Chart - "` off a description.
///
/// Descriptions without a recognised kind are returned unchanged.
pub fn split_kind_prefix(description: &str) -> (Option<VisualizationKind>, String) {
    if let Some(caps) = KIND_PREFIX.captures(description) {
        if let Some(kind) = VisualizationKind::from_label(&caps[1]) {
            return (Some(kind), caps[2].trim().to_string());
        }
    }
    (None, description.trim().to_string())
}

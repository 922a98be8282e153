//! Dashboard fan-out: one translate → execute → visualize run per sub-question.

use super::{Failure, FailureCode, Pipeline, RequestState, StatePatch};
use crate::types::{SchemaDescription, SubQuestion, Widget};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

const DASHBOARD_EMPTY: &str = "Could not build any widget for this dashboard.";

/// Builds the widgets of a routed dashboard state.
///
/// Sub-questions run concurrently, bounded by the configured width; widgets
/// come back in the order the router listed them. A failing sub-question is
/// skipped. If none succeed the dashboard fails.
pub async fn build_dashboard(
    pipeline: &Pipeline,
    state: &RequestState,
    schema: &SchemaDescription,
) -> StatePatch {
    let sub_questions = state.sub_questions();
    let width = pipeline.settings().dashboard_concurrency.max(1);

    let mut results: Vec<(usize, Option<Widget>)> =
        stream::iter((0..sub_questions.len()).map(|index| {
            let sub_question = &sub_questions[index];
            async move { (index, build_widget(pipeline, sub_question, schema).await) }
        }))
        .buffer_unordered(width)
        .collect()
        .await;
    results.sort_by_key(|(index, _)| *index);

    let widgets: Vec<Widget> = results.into_iter().filter_map(|(_, w)| w).collect();

    if widgets.is_empty() {
        return StatePatch::failed(Failure::new(FailureCode::DashboardEmpty, DASHBOARD_EMPTY));
    }
    if widgets.len() < sub_questions.len() {
        warn!(
            request_id = %state.id(),
            "Dashboard is partial: {} of {} widgets built.",
            widgets.len(),
            sub_questions.len()
        );
    } else {
        info!(request_id = %state.id(), "Built all {} dashboard widgets.", widgets.len());
    }

    StatePatch {
        widgets: Some(widgets),
        ..Default::default()
    }
}

async fn build_widget(
    pipeline: &Pipeline,
    sub_question: &SubQuestion,
    schema: &SchemaDescription,
) -> Option<Widget> {
    let state = RequestState::for_sub_question(&sub_question.query, sub_question.hint);
    let state = pipeline.run_single(state, schema).await;

    if let Some(failure) = state.failure() {
        warn!(
            code = %failure.code,
            "Skipping widget '{}': {}",
            sub_question.query,
            failure.message
        );
        return None;
    }

    let visualization = state.visualization()?.clone();
    Some(Widget {
        query: sub_question.query.clone(),
        description: sub_question.description.clone(),
        sql_text: state.sql_text()?.to_string(),
        rows: state.rows()?.to_vec(),
        kind: visualization.kind,
        config: visualization.config,
    })
}

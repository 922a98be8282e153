//! # Request State
//!
//! A [`RequestState`] is an immutable value threaded through the pipeline. Stages
//! never touch it directly: they return a [`StatePatch`] which the orchestrator
//! folds in with [`RequestState::apply`]. All invariants of a run are enforced here.

use crate::types::{QueryIntent, Row, SubQuestion, Visualization, VisualizationKind, Widget};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::LazyLock};
use tracing::{debug, warn};
use uuid::Uuid;

static NUMBER_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:[.,]\d+)?").expect("number pattern is valid"));

/// The fatal outcomes of a run, surfaced to the client as `errorCode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCode {
    OutOfContext,
    TranslationRejected,
    ModelUnavailable,
    ExecutionRejected,
    ExecutionFailed,
    EmptyResult,
    DashboardEmpty,
}

impl FailureCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OutOfContext => "out_of_context",
            Self::TranslationRejected => "translation_rejected",
            Self::ModelUnavailable => "model_unavailable",
            Self::ExecutionRejected => "execution_rejected",
            Self::ExecutionFailed => "execution_failed",
            Self::EmptyResult => "empty_result",
            Self::DashboardEmpty => "dashboard_empty",
        }
    }
}

impl fmt::Display for FailureCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fatal condition that ended a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub code: FailureCode,
    /// The user-facing message.
    pub message: String,
    /// Diagnostic detail for logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Failure {
    pub fn new(code: FailureCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stage {
    Start,
    ContextValidated,
    IntentClarified,
    Routed,
    Translating,
    Executing,
    Visualizing,
    DashboardBuilding,
    Done,
    Failed,
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Whether `next` may follow `self`.
    pub fn can_enter(&self, next: Stage) -> bool {
        use Stage::*;
        match (self, next) {
            (current, Failed) => !current.is_terminal(),
            (Start, ContextValidated | IntentClarified)
            | (ContextValidated, IntentClarified)
            | (IntentClarified, Routed)
            | (Routed, Translating | DashboardBuilding)
            | (Translating, Executing)
            | (Executing, Visualizing)
            | (Visualizing, Done)
            | (DashboardBuilding, Done) => true,
            _ => false,
        }
    }
}

/// The changes one stage wants to make. Unset fields leave the state untouched.
#[derive(Debug, Clone, Default)]
pub struct StatePatch {
    pub intent: Option<QueryIntent>,
    pub is_dashboard: Option<bool>,
    pub dashboard_title: Option<String>,
    pub sub_questions: Option<Vec<SubQuestion>>,
    pub sql_text: Option<String>,
    pub rows: Option<Vec<Row>>,
    pub visualization: Option<Visualization>,
    pub summary: Option<String>,
    pub widgets: Option<Vec<Widget>>,
    pub failure: Option<Failure>,
}

impl StatePatch {
    pub fn failed(failure: Failure) -> Self {
        Self {
            failure: Some(failure),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.intent.is_none()
            && self.is_dashboard.is_none()
            && self.dashboard_title.is_none()
            && self.sub_questions.is_none()
            && self.sql_text.is_none()
            && self.rows.is_none()
            && self.visualization.is_none()
            && self.summary.is_none()
            && self.widgets.is_none()
            && self.failure.is_none()
    }
}

/// The state of one pipeline run (or one dashboard sub-question).
#[derive(Debug, Clone)]
pub struct RequestState {
    id: Uuid,
    original_query: String,
    working_query: String,
    query_replaced: bool,
    intent: Option<QueryIntent>,
    routed: bool,
    is_dashboard: bool,
    dashboard_title: Option<String>,
    sub_questions: Vec<SubQuestion>,
    visualization_hint: Option<VisualizationKind>,
    sql_text: Option<String>,
    rows: Option<Vec<Row>>,
    visualization: Option<Visualization>,
    summary: Option<String>,
    failure: Option<Failure>,
    widgets: Option<Vec<Widget>>,
    stage: Stage,
}

impl RequestState {
    pub fn new(query: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_query: query.to_string(),
            working_query: query.to_string(),
            query_replaced: false,
            intent: None,
            routed: false,
            is_dashboard: false,
            dashboard_title: None,
            sub_questions: Vec::new(),
            visualization_hint: None,
            sql_text: None,
            rows: None,
            visualization: None,
            summary: None,
            failure: None,
            widgets: None,
            stage: Stage::Start,
        }
    }

    /// A routed, single-chart state for one dashboard sub-question.
    pub fn for_sub_question(query: &str, hint: Option<VisualizationKind>) -> Self {
        Self {
            routed: true,
            query_replaced: true,
            visualization_hint: hint,
            stage: Stage::Routed,
            ..Self::new(query)
        }
    }

    /// Folds `patch` into the state.
    ///
    /// A failed state is returned unchanged. Widget fields are ignored on
    /// single-chart states and single-chart fields on dashboard states.
    #[must_use]
    pub fn apply(mut self, patch: StatePatch) -> Self {
        if let Some(failure) = &self.failure {
            if !patch.is_empty() {
                debug!(request_id = %self.id, code = %failure.code, "Ignoring patch on failed state.");
            }
            return self;
        }

        if let Some(intent) = patch.intent {
            if self.query_replaced {
                debug!(request_id = %self.id, "Working query already replaced. Ignoring intent.");
            } else {
                let intent = preserve_constraints(intent);
                self.working_query = intent.enriched_query.clone();
                self.query_replaced = true;
                self.intent = Some(intent);
            }
        }

        if let Some(is_dashboard) = patch.is_dashboard {
            if self.routed {
                debug!(request_id = %self.id, "State already routed. Ignoring route.");
            } else {
                self.routed = true;
                self.is_dashboard = is_dashboard;
                if is_dashboard {
                    self.dashboard_title = patch.dashboard_title;
                    self.sub_questions = patch.sub_questions.unwrap_or_default();
                }
            }
        }

        let single_chart_patch = patch.sql_text.is_some()
            || patch.rows.is_some()
            || patch.visualization.is_some()
            || patch.summary.is_some();
        if single_chart_patch {
            if self.is_dashboard {
                warn!(request_id = %self.id, "Ignoring single-chart fields on a dashboard state.");
            } else {
                self.sql_text = patch.sql_text.or(self.sql_text);
                self.rows = patch.rows.or(self.rows);
                self.visualization = patch.visualization.or(self.visualization);
                self.summary = patch.summary.or(self.summary);
            }
        }

        if let Some(widgets) = patch.widgets {
            if self.is_dashboard {
                self.widgets = Some(widgets);
            } else {
                warn!(request_id = %self.id, "Ignoring widgets on a single-chart state.");
            }
        }

        if let Some(failure) = patch.failure {
            if !self.stage.is_terminal() {
                self.stage = Stage::Failed;
            }
            self.failure = Some(failure);
        }

        self
    }

    /// Moves to `next` if the transition is legal. Failed states do not move.
    #[must_use]
    pub fn enter(mut self, next: Stage) -> Self {
        if self.failure.is_some() {
            return self;
        }
        if self.stage.can_enter(next) {
            debug!(request_id = %self.id, from = ?self.stage, to = ?next, "Stage transition");
            self.stage = next;
        } else {
            warn!(request_id = %self.id, from = ?self.stage, to = ?next, "Illegal stage transition ignored.");
        }
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn original_query(&self) -> &str {
        &self.original_query
    }

    pub fn working_query(&self) -> &str {
        &self.working_query
    }

    pub fn intent(&self) -> Option<&QueryIntent> {
        self.intent.as_ref()
    }

    pub fn is_dashboard(&self) -> bool {
        self.is_dashboard
    }

    pub fn dashboard_title(&self) -> Option<&str> {
        self.dashboard_title.as_deref()
    }

    pub fn sub_questions(&self) -> &[SubQuestion] {
        &self.sub_questions
    }

    pub fn visualization_hint(&self) -> Option<VisualizationKind> {
        self.visualization_hint
    }

    pub fn sql_text(&self) -> Option<&str> {
        self.sql_text.as_deref()
    }

    pub fn rows(&self) -> Option<&[Row]> {
        self.rows.as_deref()
    }

    pub fn visualization(&self) -> Option<&Visualization> {
        self.visualization.as_ref()
    }

    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    pub fn widgets(&self) -> Option<&[Widget]> {
        self.widgets.as_deref()
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }
}

/// Makes sure the enriched query keeps the explicit constraints of the original.
///
/// An empty enriched query becomes the original one. If a number of the
/// original question (a limit, a year) is missing from the enriched text, the
/// original request is appended.
pub fn preserve_constraints(mut intent: QueryIntent) -> QueryIntent {
    let enriched = intent.enriched_query.trim();
    if enriched.is_empty() {
        intent.enriched_query = intent.original_query.clone();
        return intent;
    }

    let kept: Vec<&str> = NUMBER_TOKEN.find_iter(enriched).map(|m| m.as_str()).collect();
    let dropped = NUMBER_TOKEN
        .find_iter(&intent.original_query)
        .any(|m| !kept.contains(&m.as_str()));

    intent.enriched_query = if dropped {
        warn!("Enriched query dropped a constraint. Appending the original request.");
        format!("{enriched} (original request: {})", intent.original_query)
    } else {
        enriched.to_string()
    };
    intent
}

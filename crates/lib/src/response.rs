//! # Chat Response Contract
//!
//! The JSON messages sent back to a chat client, tagged by `type`.

use crate::{
    pipeline::{FailureCode, RequestState},
    types::{QueryIntent, Row, VisualizationConfig, VisualizationKind, Widget},
};
use serde::{Deserialize, Serialize};

const DEFAULT_RESULT_TEXT: &str = "Here is the visualization for your data.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatResponse {
    Result(SingleResult),
    Dashboard(DashboardResult),
    Error(ErrorMessage),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleResult {
    pub text: String,
    #[serde(default)]
    pub chart_data: Vec<Row>,
    #[serde(default)]
    pub chart_type: Option<VisualizationKind>,
    #[serde(default)]
    pub sql: Option<String>,
    #[serde(default)]
    pub chart_config: Option<VisualizationConfig>,
    #[serde(default)]
    pub query_intent: Option<QueryIntent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<FailureCode>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResult {
    pub text: String,
    pub dashboard_title: String,
    #[serde(default)]
    pub widgets: Vec<Widget>,
    #[serde(default)]
    pub query_intent: Option<QueryIntent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<FailureCode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error: String,
}

impl ChatResponse {
    pub fn error(message: impl Into<String>) -> Self {
        ChatResponse::Error(ErrorMessage {
            error: message.into(),
        })
    }

    /// Builds the reply for a finished pipeline run.
    pub fn from_state(state: &RequestState) -> Self {
        let failure = state.failure();
        let error = failure.map(|f| f.message.clone());
        let error_code = failure.map(|f| f.code);
        let query_intent = state.intent().cloned();

        if state.is_dashboard() {
            let widgets = state.widgets().map(<[Widget]>::to_vec).unwrap_or_default();
            let title = state.dashboard_title().unwrap_or("Dashboard").to_string();
            let text = match &error {
                Some(message) => message.clone(),
                None => format!("{title}: {} visualizations generated.", widgets.len()),
            };
            return ChatResponse::Dashboard(DashboardResult {
                text,
                dashboard_title: title,
                widgets,
                query_intent,
                error,
                error_code,
            });
        }

        let visualization = state.visualization();
        let text = match &error {
            Some(message) => message.clone(),
            None => state.summary().unwrap_or(DEFAULT_RESULT_TEXT).to_string(),
        };
        ChatResponse::Result(SingleResult {
            text,
            chart_data: state.rows().map(<[Row]>::to_vec).unwrap_or_default(),
            chart_type: visualization.map(|v| v.kind),
            sql: state.sql_text().map(str::to_string),
            chart_config: visualization.map(|v| v.config.clone()),
            query_intent,
            error,
            error_code,
        })
    }

    pub fn is_error(&self) -> bool {
        match self {
            ChatResponse::Result(r) => r.error.is_some(),
            ChatResponse::Dashboard(d) => d.error.is_some(),
            ChatResponse::Error(_) => true,
        }
    }
}

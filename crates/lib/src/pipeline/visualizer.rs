//! # Visualization Selection
//!
//! The model proposes a kind and a mapping; [`reconcile`] then checks that
//! proposal against the actual rows. The outcome is always renderable: when in
//! doubt, a table of every column.

use super::{Failure, FailureCode, RequestState, StageTask, StatePatch};
use crate::{
    decode::try_decode,
    types::{Row, Visualization, VisualizationConfig, VisualizationKind},
};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, warn};

const DEFAULT_SUMMARY: &str = "Here is the visualization for your data.";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawVisualization {
    #[serde(default, alias = "chartType", alias = "type")]
    visualization_type: Option<String>,
    #[serde(default, alias = "config")]
    chart_config: Value,
    #[serde(default)]
    summary: Option<String>,
}

/// A kind and raw config as proposed by the model.
#[derive(Debug, Clone)]
pub struct Proposal {
    pub kind: String,
    pub config: Value,
}

pub async fn visualize(
    task: &StageTask,
    state: &RequestState,
    sample_rows: usize,
    timeout: Duration,
) -> StatePatch {
    let rows = match state.rows() {
        Some(rows) if !rows.is_empty() => rows,
        _ => {
            return StatePatch::failed(Failure::new(
                FailureCode::EmptyResult,
                "No data found for your query.",
            ))
        }
    };

    let hint = state.visualization_hint();
    let columns = rows[0].keys().cloned().collect::<Vec<_>>().join(", ");
    let sample = serde_json::to_string(&rows[..rows.len().min(sample_rows)])
        .unwrap_or_else(|_| "[]".to_string());
    let row_count = rows.len().to_string();
    let vars = [
        ("query", state.working_query()),
        ("hint", hint.map(|h| h.as_str()).unwrap_or("None")),
        ("columns", columns.as_str()),
        ("row_count", row_count.as_str()),
        ("sample", sample.as_str()),
    ];

    let raw = match task.complete(&vars, timeout).await {
        Ok(reply) => try_decode::<Option<RawVisualization>>(&reply, None),
        Err(e) => {
            warn!(request_id = %state.id(), "Visualization model unavailable ({e}).");
            None
        }
    };

    let (proposal, summary) = match raw {
        Some(raw) => (
            raw.visualization_type.map(|kind| Proposal {
                kind,
                config: raw.chart_config,
            }),
            raw.summary.filter(|s| !s.trim().is_empty()),
        ),
        None => (None, None),
    };

    let visualization = reconcile(proposal.as_ref(), hint, rows);
    info!(request_id = %state.id(), kind = %visualization.kind, "Selected visualization.");

    StatePatch {
        visualization: Some(visualization),
        summary: Some(summary.unwrap_or_else(|| DEFAULT_SUMMARY.to_string())),
        ..Default::default()
    }
}

/// Turns a model proposal into a visualization that fits `rows`.
///
/// - No proposal, or an unknown kind: a table of every column.
/// - A hint that fits the rows wins over a different proposed kind.
/// - A kind that does not fit the rows: a table of every column.
/// - A config naming missing columns is derived from the row shape instead.
pub fn reconcile(
    proposal: Option<&Proposal>,
    hint: Option<VisualizationKind>,
    rows: &[Row],
) -> Visualization {
    let shape = RowShape::of(rows);

    let Some(proposal) = proposal else {
        warn!("No usable visualization proposal. Falling back to a table.");
        return Visualization::table_of(rows);
    };

    let Some(kind) = VisualizationKind::from_label(&proposal.kind) else {
        warn!(
            "Unknown visualization kind '{}'. Falling back to a table.",
            proposal.kind
        );
        return Visualization::table_of(rows);
    };

    if let Some(hint) = hint.filter(|h| *h != kind && shape.fits(*h)) {
        debug!("Honoring visualization hint '{hint}' over proposed '{kind}'.");
        return shape.derive(hint);
    }

    if !shape.fits(kind) {
        warn!("Proposed '{kind}' does not fit the result shape. Falling back to a table.");
        return Visualization::table_of(rows);
    }

    match config_from(kind, &proposal.config, &shape) {
        Some(config) => Visualization { kind, config },
        None => {
            debug!("Proposed config for '{kind}' is unusable. Deriving from the result shape.");
            shape.derive(kind)
        }
    }
}

/// Reads a proposed config, accepting it only if every column it names exists.
fn config_from(
    kind: VisualizationKind,
    value: &Value,
    shape: &RowShape<'_>,
) -> Option<VisualizationConfig> {
    let key = |name: &str| value.get(name).and_then(Value::as_str).map(str::to_string);

    let config = match kind {
        VisualizationKind::Bar | VisualizationKind::Line | VisualizationKind::Scatter => {
            VisualizationConfig::Axes {
                x_key: key("xKey")?,
                y_key: key("yKey")?,
            }
        }
        VisualizationKind::Pie => VisualizationConfig::Slices {
            label_key: key("labelKey")?,
            value_key: key("valueKey")?,
        },
        VisualizationKind::Card => {
            let value_key = key("valueKey")?;
            let label = key("label").unwrap_or_else(|| value_key.clone());
            VisualizationConfig::Card { value_key, label }
        }
        VisualizationKind::Table => {
            let columns: Vec<String> = value
                .get("columns")?
                .as_array()?
                .iter()
                .filter_map(|c| c.as_str().map(str::to_string))
                .collect();
            if columns.is_empty() {
                return None;
            }
            VisualizationConfig::Table { columns }
        }
    };

    let known = config.referenced_columns().iter().all(|c| shape.has(c));
    known.then_some(config)
}

/// Column facts of a result set.
struct RowShape<'a> {
    rows: &'a [Row],
    columns: Vec<&'a str>,
    numeric: Vec<&'a str>,
}

impl<'a> RowShape<'a> {
    fn of(rows: &'a [Row]) -> Self {
        let columns: Vec<&str> = rows
            .first()
            .map(|row| row.keys().map(String::as_str).collect())
            .unwrap_or_default();
        let numeric = columns
            .iter()
            .copied()
            .filter(|c| is_numeric_column(rows, c))
            .collect();
        Self {
            rows,
            columns,
            numeric,
        }
    }

    fn has(&self, column: &str) -> bool {
        self.columns.contains(&column)
    }

    fn fits(&self, kind: VisualizationKind) -> bool {
        match kind {
            VisualizationKind::Table => !self.columns.is_empty(),
            VisualizationKind::Card => self.rows.len() == 1 && !self.numeric.is_empty(),
            VisualizationKind::Scatter => self.numeric.len() >= 2,
            VisualizationKind::Bar | VisualizationKind::Line | VisualizationKind::Pie => {
                self.columns.len() >= 2 && !self.numeric.is_empty()
            }
        }
    }

    /// A config for `kind` built from the columns alone. Assumes `fits(kind)`.
    fn derive(&self, kind: VisualizationKind) -> Visualization {
        let (label, value) = self.label_and_value();
        let config = match kind {
            VisualizationKind::Bar | VisualizationKind::Line => VisualizationConfig::Axes {
                x_key: label,
                y_key: value,
            },
            VisualizationKind::Scatter => VisualizationConfig::Axes {
                x_key: self.numeric[0].to_string(),
                y_key: self.numeric[1].to_string(),
            },
            VisualizationKind::Pie => VisualizationConfig::Slices {
                label_key: label,
                value_key: value,
            },
            VisualizationKind::Card => VisualizationConfig::Card {
                label: value.replace('_', " "),
                value_key: value,
            },
            VisualizationKind::Table => return Visualization::table_of(self.rows),
        };
        Visualization { kind, config }
    }

    /// The first non-numeric column (or first column) and the first numeric column besides it.
    fn label_and_value(&self) -> (String, String) {
        let label = self
            .columns
            .iter()
            .find(|c| !self.numeric.contains(*c))
            .or_else(|| self.columns.first())
            .copied()
            .unwrap_or_default();
        let value = self
            .numeric
            .iter()
            .find(|c| **c != label)
            .or_else(|| self.numeric.first())
            .copied()
            .unwrap_or_default();
        (label.to_string(), value.to_string())
    }
}

fn is_numeric_column(rows: &[Row], column: &str) -> bool {
    let mut seen = false;
    for value in rows.iter().filter_map(|row| row.get(column)) {
        match value {
            Value::Number(_) => seen = true,
            Value::Null => {}
            _ => return false,
        }
    }
    seen
}

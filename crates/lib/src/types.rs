use crate::providers::db::storage::IntrospectionRow;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One result row: column name to value, in the column order of the query.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// A reusable configuration for a specific AI provider instance.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProviderConfig {
    /// The type of provider (e.g., "gemini", "local").
    pub provider: String,
    /// The API URL. Optional for providers like Gemini where it can be derived.
    #[serde(default)]
    pub api_url: Option<String>,
    /// The API key, which can be null for local providers.
    #[serde(default)]
    pub api_key: Option<String>,
    pub model_name: String,
    #[serde(default)]
    pub temperature: f32,
}

// --- Warehouse schema ---

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescription {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDescription {
    pub name: String,
    pub columns: Vec<ColumnDescription>,
}

/// A read-only description of the tables and columns the translator may use.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaDescription {
    pub tables: Vec<TableDescription>,
}

impl SchemaDescription {
    /// Groups catalogue rows by table, keeping the order in which tables and
    /// columns first appear.
    pub fn from_rows(rows: impl IntoIterator<Item = IntrospectionRow>) -> Self {
        let mut tables: Vec<TableDescription> = Vec::new();
        for row in rows {
            let column = ColumnDescription {
                name: row.column_name,
                data_type: row.data_type,
            };
            match tables.iter_mut().find(|t| t.name == row.table_name) {
                Some(table) => table.columns.push(column),
                None => tables.push(TableDescription {
                    name: row.table_name,
                    columns: vec![column],
                }),
            }
        }
        Self { tables }
    }

    pub fn table(&self, name: &str) -> Option<&TableDescription> {
        self.tables
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name))
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Renders the schema the way it is shown to the model.
    pub fn to_prompt_context(&self) -> String {
        let mut out = String::from("Database Schema:\n");
        for table in &self.tables {
            let columns = table
                .columns
                .iter()
                .map(|c| format!("{} ({})", c.name, c.data_type))
                .collect::<Vec<_>>()
                .join("\n  - ");
            out.push_str(&format!("Table: {}\nColumns:\n  - {columns}\n\n", table.name));
        }
        out
    }
}

// --- Intent ---

/// The fixed taxonomy of dimensions a question may leave unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MissingDimension {
    Temporal,
    Geographic,
    Categorical,
    Metric,
    AggregationLevel,
    BusinessRule,
}

impl MissingDimension {
    /// Maps a free-form label from a model reply onto the taxonomy.
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label
            .trim()
            .to_lowercase()
            .replace(['_', ' '], "-");
        match normalized.as_str() {
            "temporal" | "time" | "time-period" | "period" | "date" => Some(Self::Temporal),
            "geographic" | "geographical" | "geography" | "region" | "geográfica" => {
                Some(Self::Geographic)
            }
            "categorical" | "category" | "categórica" => Some(Self::Categorical),
            "metric" | "measure" | "métrica" => Some(Self::Metric),
            "aggregation-level" | "aggregation" | "granularity" | "grouping" => {
                Some(Self::AggregationLevel)
            }
            "business-rule" | "business-rules" | "business-logic" => Some(Self::BusinessRule),
            _ => None,
        }
    }
}

/// Default assumptions recorded for unspecified dimensions.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assumptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_period: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<String>,
}

impl Assumptions {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// The clarified reading of a user's question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryIntent {
    pub is_ambiguous: bool,
    #[serde(default)]
    pub missing_dimensions: Vec<MissingDimension>,
    #[serde(default)]
    pub internal_questions: Vec<String>,
    pub original_query: String,
    pub enriched_query: String,
    #[serde(default)]
    pub assumptions: Assumptions,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_enrichment: Option<String>,
}

impl QueryIntent {
    /// The intent used when clarification is unavailable: the question is taken as-is.
    pub fn unclarified(original_query: &str) -> Self {
        Self {
            is_ambiguous: false,
            missing_dimensions: Vec::new(),
            internal_questions: Vec::new(),
            original_query: original_query.to_string(),
            enriched_query: original_query.to_string(),
            assumptions: Assumptions::default(),
            context_enrichment: None,
        }
    }
}

// --- Visualization ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VisualizationKind {
    Bar,
    Line,
    Pie,
    Scatter,
    Table,
    Card,
}

impl VisualizationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Line => "line",
            Self::Pie => "pie",
            Self::Scatter => "scatter",
            Self::Table => "table",
            Self::Card => "card",
        }
    }

    /// Parses a kind name or a human label such as "Bar Chart" or "Scatter Plot".
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized = label.trim().to_lowercase();
        let head = normalized
            .strip_suffix(" chart")
            .or_else(|| normalized.strip_suffix(" plot"))
            .or_else(|| normalized.strip_suffix(" graph"))
            .unwrap_or(&normalized);
        match head.trim() {
            "bar" | "bars" | "column" => Some(Self::Bar),
            "line" | "trend" => Some(Self::Line),
            "pie" | "donut" => Some(Self::Pie),
            "scatter" => Some(Self::Scatter),
            "table" => Some(Self::Table),
            "card" | "kpi" | "kpi card" => Some(Self::Card),
            _ => None,
        }
    }
}

impl fmt::Display for VisualizationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How result columns map onto a presentation. The shape depends on the kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VisualizationConfig {
    /// `bar`, `line` and `scatter`.
    #[serde(rename_all = "camelCase")]
    Axes { x_key: String, y_key: String },
    /// `pie`.
    #[serde(rename_all = "camelCase")]
    Slices { label_key: String, value_key: String },
    /// `card`.
    #[serde(rename_all = "camelCase")]
    Card { value_key: String, label: String },
    /// `table`.
    Table { columns: Vec<String> },
}

impl VisualizationConfig {
    /// The result columns this config reads.
    pub fn referenced_columns(&self) -> Vec<&str> {
        match self {
            Self::Axes { x_key, y_key } => vec![x_key, y_key],
            Self::Slices {
                label_key,
                value_key,
            } => vec![label_key, value_key],
            Self::Card { value_key, .. } => vec![value_key],
            Self::Table { columns } => columns.iter().map(String::as_str).collect(),
        }
    }
}

/// A presentation kind together with its mapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Visualization {
    pub kind: VisualizationKind,
    pub config: VisualizationConfig,
}

impl Visualization {
    /// The always-renderable table of every column of the first row.
    pub fn table_of(rows: &[Row]) -> Self {
        let columns = rows
            .first()
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
        Self {
            kind: VisualizationKind::Table,
            config: VisualizationConfig::Table { columns },
        }
    }
}

// --- Dashboards ---

/// One question of a dashboard, as proposed by the router.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubQuestion {
    pub query: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<VisualizationKind>,
}

/// One self-contained visualization inside a dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    pub query: String,
    pub description: String,
    #[serde(rename = "sqlQuery")]
    pub sql_text: String,
    #[serde(rename = "data")]
    pub rows: Vec<Row>,
    #[serde(rename = "chartType")]
    pub kind: VisualizationKind,
    #[serde(rename = "chartConfig")]
    pub config: VisualizationConfig,
}

use crate::{errors::PromptError, types::Row};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// One row of the warehouse's column catalogue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntrospectionRow {
    pub table_name: String,
    pub column_name: String,
    pub data_type: String,
}

/// A trait for interacting with the warehouse backing store.
///
/// This trait defines the two capabilities the pipeline consumes: running a
/// read-only statement and describing the available tables and columns. The
/// store connection should itself be provisioned read-only; the statement
/// guardrail lives in the executor stage, not here.
#[async_trait]
pub trait Storage: Send + Sync + Debug {
    /// Returns the name of the storage provider (e.g., "SQLite").
    fn name(&self) -> &str;

    /// Returns the SQL dialect the provider understands (e.g., "SQLite SQL").
    fn dialect(&self) -> &str;

    /// Executes a statement and returns its rows as ordered JSON objects.
    async fn execute_query(&self, sql: &str) -> Result<Vec<Row>, PromptError>;

    /// Lists every user table column as `{table_name, column_name, data_type}` rows,
    /// ordered by table and column position.
    async fn introspect_schema(&self) -> Result<Vec<IntrospectionRow>, PromptError>;
}

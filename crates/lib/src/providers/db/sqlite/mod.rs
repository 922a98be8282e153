use crate::{
    errors::PromptError,
    providers::db::storage::{IntrospectionRow, Storage},
    types::Row,
};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt::{self, Debug};
use tracing::{debug, info};
use turso::{Database, Value as TursoValue};

pub mod sql;

/// A provider for the warehouse stored in a local SQLite database using Turso.
///
/// This provider holds a `Database` instance. When cloned, it shares the same
/// underlying database, allowing for concurrent and shared access to the same
/// database file or in-memory instance.
#[derive(Clone)]
pub struct SqliteProvider {
    /// The Turso database instance. It's cloneable and thread-safe.
    pub db: Database,
}

impl SqliteProvider {
    /// Creates a new `SqliteProvider` from a file path or in-memory.
    ///
    /// # Arguments
    ///
    /// * `db_path`: The path to the SQLite database file. Use ":memory:" for a unique,
    ///   isolated in-memory database. To share an in-memory database across multiple
    ///   `SqliteProvider` instances (e.g., in tests), create one provider and
    ///   then `.clone()` it.
    pub async fn new(db_path: &str) -> Result<Self, PromptError> {
        let db = turso::Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;
        // Use `query` for PRAGMA statements that return a value to avoid "unexpected row" errors.
        conn.query("PRAGMA journal_mode=WAL;", ())
            .await
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;

        Ok(Self { db })
    }

    /// Executes multiple `;`-separated statements. Used to pre-populate data.
    pub async fn initialize_with_data(&self, init_sql: &str) -> Result<(), PromptError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;

        for statement in init_sql.split(';').filter(|s| !s.trim().is_empty()) {
            conn.execute(statement, ())
                .await
                .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?;
        }
        Ok(())
    }

    /// Creates the Northwind demo tables and loads the sample rows, unless the
    /// database already holds user tables. Returns whether data was loaded.
    pub async fn seed_demo_data(&self) -> Result<bool, PromptError> {
        if !self.list_tables().await?.is_empty() {
            debug!("Warehouse already has tables. Skipping demo seed.");
            return Ok(false);
        }

        let conn = self
            .db
            .connect()
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;

        for statement in sql::NORTHWIND_TABLES
            .iter()
            .chain(sql::NORTHWIND_SAMPLE_DATA.iter())
        {
            conn.execute(statement, ())
                .await
                .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?;
        }
        info!(
            "Seeded Northwind demo warehouse with {} tables.",
            sql::NORTHWIND_TABLES.len()
        );
        Ok(true)
    }

    /// Lists the user tables of the database.
    pub async fn list_tables(&self) -> Result<Vec<String>, PromptError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;

        let mut rows = conn
            .query(sql::LIST_TABLES, ())
            .await
            .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?;

        let mut tables = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?
        {
            if let Ok(TursoValue::Text(name)) = row.get_value(0) {
                tables.push(name);
            }
        }
        Ok(tables)
    }
}

impl Debug for SqliteProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteProvider").finish_non_exhaustive()
    }
}

/// Converts a Turso value to a serde_json::Value.
fn turso_value_to_json(v: TursoValue) -> Value {
    match v {
        TursoValue::Null => Value::Null,
        TursoValue::Integer(i) => Value::Number(i.into()),
        TursoValue::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        TursoValue::Text(s) => Value::String(s),
        TursoValue::Blob(_) => Value::String("<blob>".to_string()),
    }
}

#[async_trait]
impl Storage for SqliteProvider {
    fn name(&self) -> &str {
        "SQLite"
    }

    fn dialect(&self) -> &str {
        "SQLite SQL"
    }

    /// Executes a query on SQLite and returns the rows in column order.
    async fn execute_query(&self, query: &str) -> Result<Vec<Row>, PromptError> {
        debug!(query = %query, "--> Executing SQLite query");

        let conn = self
            .db
            .connect()
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;

        let mut stmt = conn
            .prepare(query)
            .await
            .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?;

        let column_names: Vec<String> = stmt
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut rows = stmt
            .query(())
            .await
            .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?;

        let mut results: Vec<Row> = Vec::new();

        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?
        {
            let mut row_map = Row::new();
            for (i, name) in column_names.iter().enumerate() {
                let value = row
                    .get_value(i)
                    .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?;
                row_map.insert(name.clone(), turso_value_to_json(value));
            }
            results.push(row_map);
        }

        debug!("<-- SQLite query returned {} rows", results.len());
        Ok(results)
    }

    /// Describes every user table through `PRAGMA table_info`.
    async fn introspect_schema(&self) -> Result<Vec<IntrospectionRow>, PromptError> {
        let tables = self.list_tables().await?;
        let conn = self
            .db
            .connect()
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;

        let mut catalogue = Vec::new();
        for table_name in tables {
            let mut rows = conn
                .query(&sql::table_info(&table_name), ())
                .await
                .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?;

            while let Some(row) = rows
                .next()
                .await
                .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?
            {
                // PRAGMA table_info columns: cid, name, type, notnull, dflt_value, pk
                if let (Ok(TursoValue::Text(column_name)), Ok(TursoValue::Text(data_type))) =
                    (row.get_value(1), row.get_value(2))
                {
                    catalogue.push(IntrospectionRow {
                        table_name: table_name.clone(),
                        column_name,
                        data_type: data_type.to_lowercase(),
                    });
                }
            }
        }

        info!("Introspected {} warehouse columns.", catalogue.len());
        Ok(catalogue)
    }
}

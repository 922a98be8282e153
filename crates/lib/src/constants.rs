//! # Shared Constants
//!
//! This module provides a centralized location for constants that are shared across
//! the `insightql` workspace. Using these constants helps to avoid "magic numbers"
//! and ensures the server and the library agree on defaults.

use std::time::Duration;

/// The default path for the application's SQLite warehouse.
pub const DEFAULT_DB_FILE: &str = "db/northwind.db";

/// How long a fetched schema stays fresh.
pub const SCHEMA_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Upper bound for a single schema introspection round trip.
pub const SCHEMA_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound for a single model completion.
pub const MODEL_TIMEOUT: Duration = Duration::from_secs(60);

/// Upper bound for a single warehouse query.
pub const QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// How many dashboard sub-questions run at the same time.
pub const DASHBOARD_CONCURRENCY: usize = 3;

/// How many result rows are shown to the visualizer model.
pub const VISUALIZER_SAMPLE_ROWS: usize = 5;

/// The prefix a model uses in place of SQL when the schema cannot answer a question.
pub const TRANSLATION_ERROR_SENTINEL: &str = "ERROR:";

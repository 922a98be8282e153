//! Guarded execution of the translated statement.

use super::{Failure, FailureCode, RequestState, StatePatch};
use crate::{guardrail::check_read_only, providers::db::storage::Storage};
use std::time::Duration;
use tracing::{info, warn};

const NO_DATA: &str = "No data found for your query.";

pub async fn execute(storage: &dyn Storage, state: &RequestState, timeout: Duration) -> StatePatch {
    let sql = state.sql_text().unwrap_or_default();

    if let Err(violation) = check_read_only(sql) {
        warn!(request_id = %state.id(), sql = %sql, "Rejected statement: {violation}");
        return StatePatch::failed(
            Failure::new(FailureCode::ExecutionRejected, violation.to_string())
                .with_detail(sql.to_string()),
        );
    }

    let rows = match tokio::time::timeout(timeout, storage.execute_query(sql)).await {
        Ok(Ok(rows)) => rows,
        Ok(Err(e)) => {
            warn!(request_id = %state.id(), "Query failed on {}: {e}", storage.name());
            return StatePatch::failed(
                Failure::new(FailureCode::ExecutionFailed, format!("Query execution failed: {e}"))
                    .with_detail(sql.to_string()),
            );
        }
        Err(_) => {
            warn!(request_id = %state.id(), "Query timed out after {}s.", timeout.as_secs());
            return StatePatch::failed(
                Failure::new(
                    FailureCode::ExecutionFailed,
                    format!("Query timed out after {}s.", timeout.as_secs()),
                )
                .with_detail(sql.to_string()),
            );
        }
    };

    if rows.is_empty() {
        info!(request_id = %state.id(), "Query returned no rows.");
        return StatePatch::failed(Failure::new(FailureCode::EmptyResult, NO_DATA));
    }

    info!(request_id = %state.id(), "Query returned {} rows.", rows.len());
    StatePatch {
        rows: Some(rows),
        ..Default::default()
    }
}

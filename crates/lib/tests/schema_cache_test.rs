//! # Schema Cache Tests
//!
//! Verifies the TTL memoization of the schema provider and its degraded
//! behavior when the catalogue cannot be read. The tokio clock is paused so
//! TTL expiry and fetch timeouts are deterministic.

mod common;

use crate::common::setup_tracing;
use insightql::{SchemaProvider, SchemaSource};
use insightql_test_utils::{northwind_catalogue, MockStorage};
use std::sync::Arc;
use std::time::Duration;

const TTL: Duration = Duration::from_secs(300);
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

fn provider(storage: &MockStorage) -> SchemaProvider {
    SchemaProvider::with_settings(Arc::new(storage.clone()), TTL, FETCH_TIMEOUT)
}

#[tokio::test(start_paused = true)]
async fn test_schema_is_memoized_within_ttl() {
    setup_tracing();
    let storage = MockStorage::new(northwind_catalogue());
    let schemas = provider(&storage);

    let first = schemas.get_schema().await;
    assert_eq!(first.source, SchemaSource::Live);
    assert_eq!(first.schema.tables.len(), 2);
    assert_eq!(first.schema.tables[0].name, "products");
    assert_eq!(first.schema.tables[0].columns.len(), 3);

    tokio::time::advance(Duration::from_secs(60)).await;
    let second = schemas.get_schema().await;
    assert_eq!(second.source, SchemaSource::Cache);
    assert!(Arc::ptr_eq(&first.schema, &second.schema));
    assert_eq!(storage.introspection_calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_schema_is_refreshed_after_ttl() {
    setup_tracing();
    let storage = MockStorage::new(northwind_catalogue());
    let schemas = provider(&storage);

    let first = schemas.get_schema().await;
    tokio::time::advance(TTL + Duration::from_secs(1)).await;
    let second = schemas.get_schema().await;

    assert_eq!(second.source, SchemaSource::Live);
    assert!(!Arc::ptr_eq(&first.schema, &second.schema));
    assert_eq!(storage.introspection_calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_stale_copy_is_served_when_refresh_fails() {
    setup_tracing();
    let storage = MockStorage::new(northwind_catalogue());
    let schemas = provider(&storage);

    let first = schemas.get_schema().await;
    tokio::time::advance(TTL + Duration::from_secs(1)).await;
    storage.fail_introspection(Some("connection refused"));

    let stale = schemas.get_schema().await;
    assert_eq!(stale.source, SchemaSource::Stale);
    assert!(stale.source.is_degraded());
    assert!(Arc::ptr_eq(&first.schema, &stale.schema));
}

#[tokio::test(start_paused = true)]
async fn test_fallback_schema_when_nothing_is_cached() {
    setup_tracing();
    let storage = MockStorage::new(northwind_catalogue());
    storage.fail_introspection(Some("connection refused"));
    let schemas = provider(&storage);

    let snapshot = schemas.get_schema().await;
    assert_eq!(snapshot.source, SchemaSource::Fallback);
    assert!(snapshot.source.is_degraded());
    assert!(snapshot.schema.table("orders").is_some());
    assert!(snapshot.schema.table("products").is_some());

    // A later successful fetch replaces the fallback.
    storage.fail_introspection(None);
    let live = schemas.get_schema().await;
    assert_eq!(live.source, SchemaSource::Live);
}

#[tokio::test(start_paused = true)]
async fn test_empty_catalogue_is_treated_as_failure() {
    setup_tracing();
    let storage = MockStorage::new(Vec::new());
    let schemas = provider(&storage);

    assert_eq!(schemas.get_schema().await.source, SchemaSource::Fallback);
}

#[tokio::test(start_paused = true)]
async fn test_slow_catalogue_times_out() {
    setup_tracing();
    let storage = MockStorage::new(northwind_catalogue());
    storage.set_introspection_delay(Some(Duration::from_secs(60)));
    let schemas = provider(&storage);

    let snapshot = schemas.get_schema().await;
    assert_eq!(snapshot.source, SchemaSource::Fallback);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_callers_share_one_refresh() {
    setup_tracing();
    let storage = MockStorage::new(northwind_catalogue());
    storage.set_introspection_delay(Some(Duration::from_secs(1)));
    let schemas = provider(&storage);

    let snapshots =
        futures::future::join_all((0..5).map(|_| schemas.get_schema())).await;

    assert_eq!(storage.introspection_calls(), 1);
    let live = snapshots
        .iter()
        .filter(|s| s.source == SchemaSource::Live)
        .count();
    assert_eq!(live, 1);
    assert!(snapshots
        .iter()
        .all(|s| Arc::ptr_eq(&s.schema, &snapshots[0].schema)));
}

#[tokio::test(start_paused = true)]
async fn test_expired_copy_served_during_refresh_is_stale() {
    setup_tracing();
    let storage = MockStorage::new(northwind_catalogue());
    let schemas = provider(&storage);

    let first = schemas.get_schema().await;
    tokio::time::advance(TTL + Duration::from_secs(1)).await;
    storage.set_introspection_delay(Some(Duration::from_secs(5)));

    // The first call starts the refresh; the second arrives while it runs.
    let (refreshed, waiting) = tokio::join!(schemas.get_schema(), schemas.get_schema());

    assert_eq!(waiting.source, SchemaSource::Stale);
    assert!(waiting.source.is_degraded());
    assert!(Arc::ptr_eq(&first.schema, &waiting.schema));
    assert_eq!(refreshed.source, SchemaSource::Live);
    assert_eq!(storage.introspection_calls(), 2);
}

#[test]
fn test_prompt_context_lists_tables_and_columns() {
    let schema = insightql::types::SchemaDescription::from_rows(northwind_catalogue());
    let context = schema.to_prompt_context();
    assert!(context.contains("Table: products"));
    assert!(context.contains("unit_price (real)"));
    assert!(context.contains("Table: order_details"));
}

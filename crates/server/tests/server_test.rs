//! # General Endpoint Tests

mod common;

use crate::common::TestApp;
use anyhow::Result;
use insightql_server::types::HealthResponse;
use reqwest::StatusCode;
use serde_json::Value;

#[tokio::test]
async fn test_root_banner() -> Result<()> {
    let app = TestApp::spawn().await?;

    let response = app.client.get(&app.address).send().await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "insightql server is running.");
    Ok(())
}

#[tokio::test]
async fn test_health_check() -> Result<()> {
    let app = TestApp::spawn().await?;

    let response = app
        .client
        .get(format!("{}/health", app.address))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let health: HealthResponse = response.json().await?;
    assert_eq!(health.status, "ok");
    assert_eq!(health.service, "insightql");
    Ok(())
}

#[tokio::test]
async fn test_status_reports_schema_source_and_endpoints() -> Result<()> {
    let app = TestApp::spawn().await?;

    let body: Value = app
        .client
        .get(format!("{}/api/status", app.address))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["status"], "ok");
    assert!(
        matches!(body["schemaSource"].as_str(), Some("live" | "cache")),
        "unexpected schema source: {}",
        body["schemaSource"]
    );
    assert_eq!(body["environment"], "test");
    let endpoints: Vec<&str> = body["endpoints"]
        .as_array()
        .expect("endpoints is an array")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert!(endpoints.contains(&"POST /api/chat"));
    assert!(endpoints.contains(&"GET /ws"));
    assert!(chrono::DateTime::parse_from_rfc3339(
        body["timestamp"].as_str().unwrap_or_default()
    )
    .is_ok());
    Ok(())
}

#[tokio::test]
async fn test_schema_lists_the_demo_tables() -> Result<()> {
    let app = TestApp::spawn().await?;
    let url = format!("{}/api/schema", app.address);

    let first: Value = app.client.get(&url).send().await?.json().await?;
    assert_eq!(first["source"], "live");
    assert_eq!(first["degraded"], false);

    let tables: Vec<&str> = first["tables"]
        .as_array()
        .expect("tables is an array")
        .iter()
        .filter_map(|t| t["name"].as_str())
        .collect();
    assert_eq!(tables.len(), 7);
    assert!(tables.contains(&"products"));
    assert!(tables.contains(&"order_details"));

    let products = first["tables"]
        .as_array()
        .and_then(|tables| tables.iter().find(|t| t["name"] == "products"))
        .expect("products table is described");
    assert!(products["columns"]
        .as_array()
        .is_some_and(|columns| columns.iter().any(|c| c["name"] == "unit_price")));

    // Within the TTL the same catalogue is served from memory.
    let second: Value = app.client.get(&url).send().await?.json().await?;
    assert_eq!(second["source"], "cache");
    assert_eq!(second["tables"], first["tables"]);
    Ok(())
}

#[tokio::test]
async fn test_unknown_route_is_not_found() -> Result<()> {
    let app = TestApp::spawn().await?;

    let response = app
        .client
        .get(format!("{}/api/unknown", app.address))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    Ok(())
}

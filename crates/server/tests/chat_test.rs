//! # Chat Endpoint Tests
//!
//! `POST /api/chat` against the seeded demo warehouse, with every model call
//! answered by the mock chat server.

mod common;

use crate::common::{TestApp, CLARIFIER, ROUTER, TRANSLATOR, VISUALIZER};
use anyhow::Result;
use insightql::providers::db::storage::Storage;
use reqwest::StatusCode;
use serde_json::{json, Value};

const PRICIEST_SQL: &str =
    "SELECT product_name, unit_price FROM products ORDER BY unit_price DESC LIMIT 5";

#[tokio::test]
async fn test_chat_answers_from_the_demo_warehouse() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.mock_single_chart(
        "The 5 most expensive products by unit price",
        &format!("```sql\n{PRICIEST_SQL}\n```"),
        r#"{"visualizationType": "bar", "chartConfig": {"xKey": "product_name", "yKey": "unit_price"}, "summary": "Mascarpone Fabioli is the priciest product."}"#,
    )
    .await;

    let response = app
        .client
        .post(format!("{}/api/chat", app.address))
        .json(&json!({"message": "  most expensive products  "}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["type"], "result");
    assert_eq!(body["sql"], PRICIEST_SQL);
    assert_eq!(body["chartType"], "bar");
    assert_eq!(body["text"], "Mascarpone Fabioli is the priciest product.");
    assert_eq!(
        body["chartConfig"],
        json!({"xKey": "product_name", "yKey": "unit_price"})
    );

    let data = body["chartData"].as_array().expect("chartData is an array");
    assert_eq!(data.len(), 5);
    assert_eq!(data[0]["product_name"], "Mascarpone Fabioli");
    assert_eq!(data[0]["unit_price"], 32.0);
    assert_eq!(
        body["queryIntent"]["originalQuery"], "most expensive products",
        "the message should be trimmed before the run"
    );
    assert!(body.get("error").is_none());
    assert!(body.get("errorCode").is_none());
    Ok(())
}

#[tokio::test]
async fn test_chat_rejects_a_missing_or_blank_message() -> Result<()> {
    let app = TestApp::spawn().await?;

    for payload in [json!({}), json!({"message": "   "})] {
        let response = app
            .client
            .post(format!("{}/api/chat", app.address))
            .json(&payload)
            .send()
            .await?;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: Value = response.json().await?;
        assert_eq!(body["error"], "Field 'message' is required.");
    }
    Ok(())
}

#[tokio::test]
async fn test_chat_passes_a_declined_translation_through() -> Result<()> {
    let app = TestApp::spawn().await?;
    let declined = "ERROR: The warehouse has no weather data.";
    app.mock_single_chart(
        "What will the weather be tomorrow",
        declined,
        r#"{"visualizationType": "table"}"#,
    )
    .await;

    let response = app
        .client
        .post(format!("{}/api/chat", app.address))
        .json(&json!({"message": "weather tomorrow?"}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["type"], "result");
    assert_eq!(body["errorCode"], "translation_rejected");
    assert_eq!(body["error"], declined);
    assert_eq!(body["text"], declined);
    assert_eq!(body["chartData"], json!([]));
    Ok(())
}

#[tokio::test]
async fn test_chat_refuses_a_write_statement() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.mock_single_chart(
        "Remove every product",
        "DELETE FROM products",
        r#"{"visualizationType": "table"}"#,
    )
    .await;

    let body: Value = app
        .client
        .post(format!("{}/api/chat", app.address))
        .json(&json!({"message": "delete all products"}))
        .send()
        .await?
        .json()
        .await?;
    assert_eq!(body["errorCode"], "execution_rejected");

    // The warehouse is untouched.
    let rows = app
        .app_state
        .pipeline
        .storage()
        .execute_query("SELECT COUNT(*) AS product_count FROM products")
        .await?;
    assert_eq!(rows[0]["product_count"], 8);
    Ok(())
}

#[tokio::test]
async fn test_chat_builds_a_dashboard() -> Result<()> {
    let app = TestApp::spawn().await?;
    app.mock_reply(
        &[CLARIFIER],
        r#"{"isAmbiguous": false, "enrichedQuery": "An overview of the product catalogue"}"#,
    )
    .await;
    app.mock_reply(
        &[ROUTER],
        &json!({
            "isDashboard": true,
            "dashboardTitle": "Catalogue Overview",
            "subQueries": [
                {"query": "Number of products in the catalogue", "description": "Card - Product count"},
                {"query": "Unit price of every product", "description": "Bar Chart - Price by product"}
            ]
        })
        .to_string(),
    )
    .await;
    app.mock_reply(
        &[TRANSLATOR, "Number of products in the catalogue"],
        "SELECT COUNT(*) AS product_count FROM products",
    )
    .await;
    app.mock_reply(
        &[TRANSLATOR, "Unit price of every product"],
        "SELECT product_name, unit_price FROM products ORDER BY unit_price DESC",
    )
    .await;
    app.mock_reply(&[VISUALIZER], r#"{"visualizationType": "table"}"#)
        .await;

    let response = app
        .client
        .post(format!("{}/api/chat", app.address))
        .json(&json!({"message": "catalogue overview"}))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await?;
    assert_eq!(body["type"], "dashboard");
    assert_eq!(body["dashboardTitle"], "Catalogue Overview");
    assert_eq!(
        body["text"],
        "Catalogue Overview: 2 visualizations generated."
    );

    let widgets = body["widgets"].as_array().expect("widgets is an array");
    assert_eq!(widgets.len(), 2);
    assert_eq!(widgets[0]["query"], "Number of products in the catalogue");
    assert_eq!(widgets[0]["chartType"], "card");
    assert_eq!(widgets[0]["data"][0]["product_count"], 8);
    assert_eq!(widgets[1]["query"], "Unit price of every product");
    assert_eq!(widgets[1]["chartType"], "bar");
    assert_eq!(widgets[1]["data"].as_array().map(Vec::len), Some(8));
    assert!(body.get("errorCode").is_none());
    Ok(())
}

#[tokio::test]
async fn test_chat_reports_an_unreachable_model() -> Result<()> {
    let app = TestApp::spawn().await?;
    // Every stage call fails; the clarifier and router degrade, the translator cannot.
    app.mock_server
        .mock_async(|when, then| {
            when.method(httpmock::Method::POST).path(common::CHAT_PATH);
            then.status(503).body("upstream unavailable");
        })
        .await;

    let body: Value = app
        .client
        .post(format!("{}/api/chat", app.address))
        .json(&json!({"message": "top customers"}))
        .send()
        .await?
        .json()
        .await?;

    assert_eq!(body["type"], "result");
    assert_eq!(body["errorCode"], "model_unavailable");
    assert!(body["error"].as_str().is_some_and(|e| !e.contains("503")));
    Ok(())
}

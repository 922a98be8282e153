#![allow(dead_code)]
//! # Common Test Utilities
//!
//! Shared setup for the pipeline tests: tracing, the system-prompt keys each
//! stage can be recognised by, and a helper that assembles a pipeline around
//! the mocks from `insightql-test-utils`.

use dotenvy::dotenv;
use insightql::providers::db::storage::Storage;
use insightql::{Pipeline, PipelineSettings};
use insightql_test_utils::MockAiProvider;
use std::sync::{Arc, Once};

static INIT: Once = Once::new();

/// Initializes the tracing subscriber and loads .env for tests.
pub fn setup_tracing() {
    INIT.call_once(|| {
        dotenv().ok();
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

// Unique substrings of the default system prompts.
pub const VALIDATOR: &str = "Context Validator";
pub const CLARIFIER: &str = "Intent Clarifier";
pub const ROUTER: &str = "Dashboard Router";
pub const TRANSLATOR: &str = "SQL Data Analyst";
pub const VISUALIZER: &str = "Data Visualization Expert";

pub const SINGLE_CHART: &str = r#"{"isDashboard": false}"#;

/// Builds a pipeline over `storage` where every stage is answered by `ai`.
pub fn pipeline(
    ai: &MockAiProvider,
    storage: Arc<dyn Storage>,
    settings: PipelineSettings,
) -> Pipeline {
    Pipeline::builder()
        .storage(storage)
        .ai_provider(Box::new(ai.clone()))
        .settings(settings)
        .build()
        .expect("pipeline should build")
}

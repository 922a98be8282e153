//! # Configuration Loading Tests
//!
//! These tests touch process environment variables, so they run serially.

use insightql::Task;
use insightql_server::{
    config::{get_config, ConfigError, DEFAULT_PROVIDER},
    state::build_app_state,
};
use serial_test::serial;
use std::{env, fs, time::Duration};
use tempfile::{tempdir, TempDir};

const MINIMAL_CONFIG: &str = r#"
db_url: ":memory:"
providers:
  default:
    provider: "local"
    api_url: "http://127.0.0.1:1/v1/chat/completions"
    model_name: "test-model"
"#;

fn write_config(content: &str) -> (TempDir, String) {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("config.yml");
    fs::write(&path, content).expect("config file is writable");
    let path = path.to_str().expect("utf-8 path").to_string();
    (dir, path)
}

#[test]
#[serial]
fn test_placeholders_are_filled_from_the_environment() {
    env::set_var("INSIGHTQL_TEST_MODEL_NAME", "substituted-model");
    let (_dir, path) = write_config(
        r#"
providers:
  default:
    provider: "gemini"
    api_key: "secret"
    model_name: "${INSIGHTQL_TEST_MODEL_NAME}"
    api_url: "${INSIGHTQL_TEST_UNSET_URL}"
"#,
    );

    let config = get_config(Some(&path)).expect("config should load");
    env::remove_var("INSIGHTQL_TEST_MODEL_NAME");

    let provider = &config.providers[DEFAULT_PROVIDER];
    assert_eq!(provider.model_name, "substituted-model");
    assert_eq!(
        provider.api_url.as_deref(),
        Some(""),
        "unset variables become empty strings"
    );
    assert_eq!(provider.api_key.as_deref(), Some("secret"));
}

#[test]
#[serial]
fn test_every_task_gets_the_built_in_prompts() {
    let (_dir, path) = write_config(MINIMAL_CONFIG);

    let config = get_config(Some(&path)).expect("config should load");

    assert_eq!(config.port, 9090);
    assert!(config.seed_demo_data);
    assert_eq!(config.tasks.len(), Task::ALL.len());
    for task in Task::ALL {
        let task_config = &config.tasks[task.as_str()];
        let (system_prompt, user_prompt) = task.default_prompts();
        assert_eq!(task_config.provider.as_deref(), Some(DEFAULT_PROVIDER));
        assert_eq!(task_config.system_prompt.as_deref(), Some(system_prompt));
        assert_eq!(task_config.user_prompt.as_deref(), Some(user_prompt));
    }
}

#[test]
#[serial]
fn test_a_partial_task_override_keeps_the_other_defaults() {
    let (_dir, path) = write_config(&format!(
        r#"{MINIMAL_CONFIG}
tasks:
  sql_translation:
    system_prompt: "Write {{dialect}} only."
"#
    ));

    let config = get_config(Some(&path)).expect("config should load");

    let translation = &config.tasks[Task::SqlTranslation.as_str()];
    assert_eq!(
        translation.system_prompt.as_deref(),
        Some("Write {dialect} only.")
    );
    assert_eq!(translation.provider.as_deref(), Some(DEFAULT_PROVIDER));
    assert_eq!(
        translation.user_prompt.as_deref(),
        Some(Task::SqlTranslation.default_prompts().1)
    );
}

#[test]
#[serial]
fn test_environment_overrides_file_values() {
    let (_dir, path) = write_config(&format!(
        r#"{MINIMAL_CONFIG}
port: 8000
pipeline:
  model_timeout_secs: 90
  validate_context: false
"#
    ));
    env::set_var("PORT", "7777");
    env::set_var("INSIGHTQL_PIPELINE__MODEL_TIMEOUT_SECS", "5");
    env::set_var("INSIGHTQL_PIPELINE__VALIDATE_CONTEXT", "true");

    let config = get_config(Some(&path));
    env::remove_var("PORT");
    env::remove_var("INSIGHTQL_PIPELINE__MODEL_TIMEOUT_SECS");
    env::remove_var("INSIGHTQL_PIPELINE__VALIDATE_CONTEXT");

    let config = config.expect("config should load");
    assert_eq!(config.port, 7777);
    assert_eq!(config.pipeline.model_timeout_secs, 5);
    assert!(config.pipeline.validate_context);
}

#[test]
#[serial]
fn test_missing_config_file_is_reported() {
    let dir = tempdir().expect("temp dir");
    let path = dir.path().join("absent.yml");

    let result = get_config(path.to_str());

    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
#[serial]
fn test_pipeline_section_becomes_settings() {
    let (_dir, path) = write_config(&format!(
        r#"{MINIMAL_CONFIG}
pipeline:
  schema_cache_ttl_secs: 60
  query_timeout_secs: 12
  dashboard_concurrency: 0
  sample_rows: 3
"#
    ));

    let settings = get_config(Some(&path))
        .expect("config should load")
        .pipeline
        .to_settings();

    assert_eq!(settings.schema_cache_ttl, Duration::from_secs(60));
    assert_eq!(settings.query_timeout, Duration::from_secs(12));
    assert_eq!(settings.model_timeout, Duration::from_secs(60));
    assert_eq!(settings.schema_fetch_timeout, Duration::from_secs(10));
    assert_eq!(settings.dashboard_concurrency, 1);
    assert_eq!(settings.sample_rows, 3);
    assert!(!settings.validate_context);
}

#[tokio::test]
#[serial]
async fn test_a_task_on_an_unknown_provider_fails_startup() {
    let (_dir, path) = write_config(&format!(
        r#"{MINIMAL_CONFIG}
tasks:
  visualization:
    provider: "missing"
"#
    ));
    let config = get_config(Some(&path)).expect("config should load");

    let error = build_app_state(config)
        .await
        .err()
        .expect("startup should fail");

    assert!(error
        .to_string()
        .contains("refers to unknown provider 'missing'"));
}

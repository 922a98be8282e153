//! # Application Configuration
//!
//! This module defines the configuration structure for the `insightql-server` and
//! provides the logic for loading it from a `config.yml` file and environment
//! variables. The layers, from lowest to highest precedence:
//!
//! 1. The built-in prompts of every pipeline task.
//! 2. `config.yml`, or `config.{AI_PROVIDER}.yml` when it does not exist.
//! 3. An optional `prompt.yml` with prompt overrides.
//! 4. Plain environment variables for top-level keys (`PORT`, `DB_URL`).
//! 5. `INSIGHTQL_`-prefixed variables for nested keys
//!    (e.g. `INSIGHTQL_PIPELINE__VALIDATE_CONTEXT=true`).

use config::{
    Config as ConfigBuilder, Environment, File, FileFormat, Value as ConfigValue,
    ValueKind as ConfigValueKind,
};
use insightql::{
    constants::{
        DASHBOARD_CONCURRENCY, DEFAULT_DB_FILE, MODEL_TIMEOUT, QUERY_TIMEOUT, SCHEMA_CACHE_TTL,
        SCHEMA_FETCH_TIMEOUT, VISUALIZER_SAMPLE_ROWS,
    },
    types::ProviderConfig,
    PipelineSettings, Task,
};
use regex::Regex;
use serde::Deserialize;
use std::{collections::HashMap, env, fs, sync::LazyLock, time::Duration};
use tracing::info;

/// The provider every built-in task points at.
pub const DEFAULT_PROVIDER: &str = "default";

static ENV_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}").expect("placeholder pattern is valid")
});

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates a required configuration file was not found.
    NotFound(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    #[serde(default = "default_port")]
    pub port: u16,
    /// The path to the SQLite warehouse. Loaded from `DB_URL` env var.
    #[serde(default = "default_db_url")]
    pub db_url: String,
    /// Load the Northwind demo data into an empty warehouse on startup.
    #[serde(default = "default_seed_demo_data")]
    pub seed_demo_data: bool,
    /// A free-form deployment label reported by `/api/status`.
    #[serde(default = "default_environment")]
    pub environment: String,
    /// A map of named, reusable AI provider configurations.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// A map of pipeline tasks, each specifying a provider and prompts.
    pub tasks: HashMap<String, TaskConfig>,
    /// Pipeline tunables.
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

fn default_port() -> u16 {
    9090
}

fn default_db_url() -> String {
    DEFAULT_DB_FILE.to_string()
}

fn default_seed_demo_data() -> bool {
    true
}

fn default_environment() -> String {
    "development".to_string()
}

/// Defines the prompts and provider for one pipeline task.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TaskConfig {
    /// The key of the provider to use from the `providers` map.
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub user_prompt: Option<String>,
}

/// The `pipeline` section. Durations are whole seconds.
#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    #[serde(default = "default_schema_cache_ttl_secs")]
    pub schema_cache_ttl_secs: u64,
    #[serde(default = "default_schema_fetch_timeout_secs")]
    pub schema_fetch_timeout_secs: u64,
    #[serde(default = "default_model_timeout_secs")]
    pub model_timeout_secs: u64,
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
    #[serde(default = "default_dashboard_concurrency")]
    pub dashboard_concurrency: usize,
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,
    #[serde(default)]
    pub validate_context: bool,
}

fn default_schema_cache_ttl_secs() -> u64 {
    SCHEMA_CACHE_TTL.as_secs()
}

fn default_schema_fetch_timeout_secs() -> u64 {
    SCHEMA_FETCH_TIMEOUT.as_secs()
}

fn default_model_timeout_secs() -> u64 {
    MODEL_TIMEOUT.as_secs()
}

fn default_query_timeout_secs() -> u64 {
    QUERY_TIMEOUT.as_secs()
}

fn default_dashboard_concurrency() -> usize {
    DASHBOARD_CONCURRENCY
}

fn default_sample_rows() -> usize {
    VISUALIZER_SAMPLE_ROWS
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            schema_cache_ttl_secs: default_schema_cache_ttl_secs(),
            schema_fetch_timeout_secs: default_schema_fetch_timeout_secs(),
            model_timeout_secs: default_model_timeout_secs(),
            query_timeout_secs: default_query_timeout_secs(),
            dashboard_concurrency: default_dashboard_concurrency(),
            sample_rows: default_sample_rows(),
            validate_context: false,
        }
    }
}

impl PipelineConfig {
    pub fn to_settings(&self) -> PipelineSettings {
        PipelineSettings {
            schema_cache_ttl: Duration::from_secs(self.schema_cache_ttl_secs),
            schema_fetch_timeout: Duration::from_secs(self.schema_fetch_timeout_secs),
            model_timeout: Duration::from_secs(self.model_timeout_secs),
            query_timeout: Duration::from_secs(self.query_timeout_secs),
            dashboard_concurrency: self.dashboard_concurrency.max(1),
            sample_rows: self.sample_rows.max(1),
            validate_context: self.validate_context,
        }
    }
}

/// Constructs a `config::Value` map of the built-in tasks from the library.
/// This serves as the base layer of configuration.
fn build_default_tasks() -> HashMap<String, ConfigValue> {
    Task::ALL
        .iter()
        .map(|task| {
            let (system_prompt, user_prompt) = task.default_prompts();
            let mut table = HashMap::new();
            table.insert("provider".to_string(), ConfigValue::from(DEFAULT_PROVIDER));
            table.insert("system_prompt".to_string(), ConfigValue::from(system_prompt));
            table.insert("user_prompt".to_string(), ConfigValue::from(user_prompt));
            (
                task.as_str().to_string(),
                ConfigValue::new(None, ConfigValueKind::Table(table)),
            )
        })
        .collect()
}

// Reads a file and substitutes `${VAR}` placeholders from the environment.
// Returns Ok(None) if the file does not exist.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    let expanded_content = ENV_PLACEHOLDER.replace_all(&content, |caps: &regex::Captures| {
        env::var(&caps["var"]).unwrap_or_default()
    });

    Ok(Some(expanded_content.to_string()))
}

/// Loads the application configuration from a file and environment variables.
///
/// `config_path_override` replaces the `config.yml` lookup; tests use it to
/// point at a temporary file.
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let base_path = env!("CARGO_MANIFEST_DIR");
    let mut builder = ConfigBuilder::builder()
        // Layer 1: Programmatic defaults from the library.
        .set_default("tasks", build_default_tasks())?;

    // Layer 2: Main Config (with Fallback)
    let main_config_path = if let Some(override_path) = config_path_override {
        override_path.to_string()
    } else {
        let user_config_path = format!("{base_path}/config.yml");
        if std::path::Path::new(&user_config_path).exists() {
            info!("Loading user-defined configuration from '{user_config_path}'.");
            user_config_path
        } else {
            let provider = env::var("AI_PROVIDER").unwrap_or_else(|_| "gemini".to_string());
            let fallback_path = format!("{base_path}/config.{provider}.yml");
            info!("'{user_config_path}' not found. Falling back to '{fallback_path}' based on AI_PROVIDER='{provider}'.");
            fallback_path
        }
    };

    let main_content = read_and_substitute(&main_config_path)?
        .ok_or_else(|| ConfigError::NotFound(format!("Main config file not found at '{main_config_path}'. Please ensure 'config.yml' exists or your AI_PROVIDER is set to load a valid template ('local' or 'gemini').")))?;
    builder = builder.add_source(File::from_str(&main_content, FileFormat::Yaml));

    // Layer 3: User Prompt Overrides (Optional)
    let user_prompt_path = format!("{base_path}/prompt.yml");
    if let Some(user_prompts_content) = read_and_substitute(&user_prompt_path)? {
        info!("Loading user prompt overrides from '{user_prompt_path}'.");
        builder = builder.add_source(File::from_str(&user_prompts_content, FileFormat::Yaml));
    }

    let settings = builder
        // Layer 4: Load environment variables for top-level keys like PORT.
        .add_source(Environment::default())
        // Layer 5: Load prefixed environment variables for deeper overrides.
        .add_source(
            Environment::with_prefix("INSIGHTQL")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

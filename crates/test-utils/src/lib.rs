use anyhow::Result;
use async_trait::async_trait;
use insightql::errors::PromptError;
use insightql::providers::ai::AiProvider;
use insightql::providers::db::sqlite::SqliteProvider;
use insightql::providers::db::storage::{IntrospectionRow, Storage};
use insightql::types::Row;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};
use std::time::Duration;

// --- Test Setup ---

/// A helper struct to manage warehouse creation for each test.
pub struct TestSetup {
    pub provider: SqliteProvider,
}

impl TestSetup {
    /// Creates a new, isolated in-memory database seeded with the Northwind demo data.
    pub async fn new() -> Result<Self> {
        let provider = SqliteProvider::new(":memory:").await?;
        provider.seed_demo_data().await?;
        Ok(Self { provider })
    }

    pub fn storage(&self) -> Arc<dyn Storage> {
        Arc::new(self.provider.clone())
    }
}

/// Converts a JSON array of objects into result rows.
pub fn rows(value: serde_json::Value) -> Vec<Row> {
    match value {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                serde_json::Value::Object(map) => Some(map),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// A small catalogue shaped like the Northwind warehouse.
pub fn northwind_catalogue() -> Vec<IntrospectionRow> {
    [
        ("products", "product_id", "integer"),
        ("products", "product_name", "text"),
        ("products", "unit_price", "real"),
        ("order_details", "order_id", "integer"),
        ("order_details", "product_id", "integer"),
        ("order_details", "quantity", "integer"),
    ]
    .into_iter()
    .map(|(table, column, data_type)| IntrospectionRow {
        table_name: table.to_string(),
        column_name: column.to_string(),
        data_type: data_type.to_string(),
    })
    .collect()
}

// --- Mock AI Provider ---

#[derive(Clone, Debug)]
enum Reply {
    Text(String),
    Error(String),
}

#[derive(Clone, Debug)]
struct Rule {
    system_key: String,
    user_key: Option<String>,
    reply: Reply,
    delay: Option<Duration>,
}

impl Rule {
    fn matches(&self, system_prompt: &str, user_prompt: &str) -> bool {
        system_prompt.contains(&self.system_key)
            && self
                .user_key
                .as_ref()
                .is_none_or(|key| user_prompt.contains(key))
    }
}

/// An AI provider that answers from pre-programmed rules.
///
/// Rules are keyed by a unique substring of the system prompt. Rules that also
/// name a user-prompt substring take precedence over rules that do not.
#[derive(Clone, Debug)]
pub struct MockAiProvider {
    rules: Arc<Mutex<Vec<Rule>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockAiProvider {
    pub fn new() -> Self {
        Self {
            rules: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn push(&self, system_key: &str, user_key: Option<&str>, reply: Reply, delay: Option<Duration>) {
        self.rules.lock().unwrap().push(Rule {
            system_key: system_key.to_string(),
            user_key: user_key.map(str::to_string),
            reply,
            delay,
        });
    }

    /// Pre-programs a response for a specific prompt.
    /// The key should be a unique substring of the system prompt.
    pub fn add_response(&self, key: &str, response: &str) {
        self.push(key, None, Reply::Text(response.to_string()), None);
    }

    /// Pre-programs a response for prompts whose user prompt also contains `user_key`.
    pub fn add_response_for(&self, key: &str, user_key: &str, response: &str) {
        self.push(key, Some(user_key), Reply::Text(response.to_string()), None);
    }

    /// Makes matching prompts fail with a provider error.
    pub fn add_error(&self, key: &str, message: &str) {
        self.push(key, None, Reply::Error(message.to_string()), None);
    }

    /// Makes matching prompts (by system and user key) fail with a provider error.
    pub fn add_error_for(&self, key: &str, user_key: &str, message: &str) {
        self.push(key, Some(user_key), Reply::Error(message.to_string()), None);
    }

    /// Pre-programs a response that only arrives after `delay`.
    pub fn add_slow_response(&self, key: &str, response: &str, delay: Duration) {
        self.push(key, None, Reply::Text(response.to_string()), Some(delay));
    }

    /// Like `add_slow_response`, restricted to user prompts containing `user_key`.
    pub fn add_slow_response_for(&self, key: &str, user_key: &str, response: &str, delay: Duration) {
        self.push(key, Some(user_key), Reply::Text(response.to_string()), Some(delay));
    }

    /// Retrieves the recorded calls for assertion.
    pub fn get_calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }

    /// Counts the recorded calls whose system prompt contains `key`.
    pub fn calls_matching(&self, key: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(system, _)| system.contains(key))
            .count()
    }
}

impl Default for MockAiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, PromptError> {
        self.calls
            .lock()
            .unwrap()
            .push((system_prompt.to_string(), user_prompt.to_string()));

        let rule = {
            let rules = self.rules.lock().unwrap();
            rules
                .iter()
                .filter(|r| r.user_key.is_some())
                .chain(rules.iter().filter(|r| r.user_key.is_none()))
                .find(|r| r.matches(system_prompt, user_prompt))
                .cloned()
        };

        let Some(rule) = rule else {
            return Err(PromptError::AiApi(format!(
                "MockAiProvider: No response programmed for system prompt. Got: '{system_prompt}'"
            )));
        };

        if let Some(delay) = rule.delay {
            tokio::time::sleep(delay).await;
        }
        match rule.reply {
            Reply::Text(text) => Ok(text),
            Reply::Error(message) => Err(PromptError::AiApi(message)),
        }
    }
}

// --- Mock Storage ---

#[derive(Debug, Default)]
struct MockStorageState {
    catalogue: Vec<IntrospectionRow>,
    rows: Vec<Row>,
    introspection_error: Option<String>,
    introspection_delay: Option<Duration>,
    query_error: Option<String>,
    introspection_calls: usize,
    queries: Vec<String>,
}

/// A storage provider with a programmable catalogue and result set that
/// records what it was asked.
#[derive(Clone, Debug, Default)]
pub struct MockStorage {
    state: Arc<Mutex<MockStorageState>>,
}

impl MockStorage {
    pub fn new(catalogue: Vec<IntrospectionRow>) -> Self {
        let storage = Self::default();
        storage.set_catalogue(catalogue);
        storage
    }

    pub fn set_catalogue(&self, catalogue: Vec<IntrospectionRow>) {
        self.state.lock().unwrap().catalogue = catalogue;
    }

    /// Sets the rows every query returns.
    pub fn set_rows(&self, rows: Vec<Row>) {
        self.state.lock().unwrap().rows = rows;
    }

    /// Makes introspection fail (`Some`) or succeed again (`None`).
    pub fn fail_introspection(&self, error: Option<&str>) {
        self.state.lock().unwrap().introspection_error = error.map(str::to_string);
    }

    pub fn set_introspection_delay(&self, delay: Option<Duration>) {
        self.state.lock().unwrap().introspection_delay = delay;
    }

    /// Makes queries fail (`Some`) or succeed again (`None`).
    pub fn fail_queries(&self, error: Option<&str>) {
        self.state.lock().unwrap().query_error = error.map(str::to_string);
    }

    pub fn introspection_calls(&self) -> usize {
        self.state.lock().unwrap().introspection_calls
    }

    pub fn executed_queries(&self) -> Vec<String> {
        self.state.lock().unwrap().queries.clone()
    }
}

#[async_trait]
impl Storage for MockStorage {
    fn name(&self) -> &str {
        "MockDB"
    }

    fn dialect(&self) -> &str {
        "SQLite SQL"
    }

    async fn execute_query(&self, sql: &str) -> Result<Vec<Row>, PromptError> {
        let mut state = self.state.lock().unwrap();
        state.queries.push(sql.to_string());
        match &state.query_error {
            Some(error) => Err(PromptError::StorageOperationFailed(error.clone())),
            None => Ok(state.rows.clone()),
        }
    }

    async fn introspect_schema(&self) -> Result<Vec<IntrospectionRow>, PromptError> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.introspection_calls += 1;
            state.introspection_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.lock().unwrap();
        match &state.introspection_error {
            Some(error) => Err(PromptError::StorageConnection(error.clone())),
            None => Ok(state.catalogue.clone()),
        }
    }
}

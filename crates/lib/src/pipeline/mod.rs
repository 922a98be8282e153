//! # BI Pipeline
//!
//! The orchestrator that turns one natural-language question into a result:
//! (optional context validation) → intent clarification → dashboard routing →
//! translation → execution → visualization, or a fan-out over sub-questions
//! for dashboards.

pub mod clarifier;
pub mod dashboard;
pub mod executor;
pub mod router;
pub mod state;
pub mod translator;
pub mod validator;
pub mod visualizer;

pub use state::{Failure, FailureCode, RequestState, Stage, StatePatch};

use crate::{
    constants::{
        DASHBOARD_CONCURRENCY, MODEL_TIMEOUT, QUERY_TIMEOUT, SCHEMA_CACHE_TTL,
        SCHEMA_FETCH_TIMEOUT, VISUALIZER_SAMPLE_ROWS,
    },
    errors::PromptError,
    prompts::{render, tasks},
    providers::{
        ai::{generate_with_timeout, AiProvider},
        db::storage::Storage,
    },
    schema::{SchemaProvider, SchemaSnapshot},
    types::SchemaDescription,
};
use std::{collections::HashMap, fmt, sync::Arc, time::Duration};
use tracing::{debug, error, info};

/// The prompt-driven stages of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Task {
    ContextValidation,
    IntentClarification,
    DashboardRouting,
    SqlTranslation,
    Visualization,
}

impl Task {
    pub const ALL: [Task; 5] = [
        Task::ContextValidation,
        Task::IntentClarification,
        Task::DashboardRouting,
        Task::SqlTranslation,
        Task::Visualization,
    ];

    /// The key of this task in the `tasks` section of the configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::ContextValidation => "context_validation",
            Task::IntentClarification => "intent_clarification",
            Task::DashboardRouting => "dashboard_routing",
            Task::SqlTranslation => "sql_translation",
            Task::Visualization => "visualization",
        }
    }

    /// The built-in `(system, user)` prompt templates.
    pub fn default_prompts(&self) -> (&'static str, &'static str) {
        match self {
            Task::ContextValidation => (
                tasks::CONTEXT_VALIDATION_SYSTEM_PROMPT,
                tasks::CONTEXT_VALIDATION_USER_PROMPT,
            ),
            Task::IntentClarification => (
                tasks::INTENT_CLARIFICATION_SYSTEM_PROMPT,
                tasks::INTENT_CLARIFICATION_USER_PROMPT,
            ),
            Task::DashboardRouting => (
                tasks::DASHBOARD_ROUTING_SYSTEM_PROMPT,
                tasks::DASHBOARD_ROUTING_USER_PROMPT,
            ),
            Task::SqlTranslation => (
                tasks::SQL_TRANSLATION_SYSTEM_PROMPT,
                tasks::SQL_TRANSLATION_USER_PROMPT,
            ),
            Task::Visualization => (
                tasks::VISUALIZATION_SYSTEM_PROMPT,
                tasks::VISUALIZATION_USER_PROMPT,
            ),
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One prompt-driven stage: the provider that answers it and its templates.
#[derive(Debug, Clone)]
pub struct StageTask {
    pub provider: Box<dyn AiProvider>,
    pub system_prompt: String,
    pub user_prompt: String,
}

impl StageTask {
    pub fn new(
        provider: Box<dyn AiProvider>,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
        }
    }

    /// A stage using the built-in prompts of `task`.
    pub fn with_default_prompts(task: Task, provider: Box<dyn AiProvider>) -> Self {
        let (system_prompt, user_prompt) = task.default_prompts();
        Self::new(provider, system_prompt, user_prompt)
    }

    /// Renders both templates with `vars` and asks the provider, bounded by `timeout`.
    pub async fn complete(
        &self,
        vars: &[(&str, &str)],
        timeout: Duration,
    ) -> Result<String, PromptError> {
        let system_prompt = render(&self.system_prompt, vars);
        let user_prompt = render(&self.user_prompt, vars);
        debug!(system = %system_prompt, user = %user_prompt, "--> Stage prompt");
        let reply =
            generate_with_timeout(self.provider.as_ref(), &system_prompt, &user_prompt, timeout)
                .await?;
        debug!(reply = %reply, "<-- Stage reply");
        Ok(reply)
    }
}

/// Tunables of the pipeline.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub schema_cache_ttl: Duration,
    pub schema_fetch_timeout: Duration,
    pub model_timeout: Duration,
    pub query_timeout: Duration,
    pub dashboard_concurrency: usize,
    pub sample_rows: usize,
    pub validate_context: bool,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            schema_cache_ttl: SCHEMA_CACHE_TTL,
            schema_fetch_timeout: SCHEMA_FETCH_TIMEOUT,
            model_timeout: MODEL_TIMEOUT,
            query_timeout: QUERY_TIMEOUT,
            dashboard_concurrency: DASHBOARD_CONCURRENCY,
            sample_rows: VISUALIZER_SAMPLE_ROWS,
            validate_context: false,
        }
    }
}

/// The assembled pipeline. Cheap to share behind an `Arc`.
#[derive(Debug)]
pub struct Pipeline {
    storage: Arc<dyn Storage>,
    schema: SchemaProvider,
    tasks: StageTasks,
    settings: PipelineSettings,
}

/// One resolved `StageTask` per prompt-driven stage.
#[derive(Debug)]
struct StageTasks {
    context_validation: StageTask,
    intent_clarification: StageTask,
    dashboard_routing: StageTask,
    sql_translation: StageTask,
    visualization: StageTask,
}

impl StageTasks {
    fn get(&self, task: Task) -> &StageTask {
        match task {
            Task::ContextValidation => &self.context_validation,
            Task::IntentClarification => &self.intent_clarification,
            Task::DashboardRouting => &self.dashboard_routing,
            Task::SqlTranslation => &self.sql_translation,
            Task::Visualization => &self.visualization,
        }
    }
}

impl Pipeline {
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::new()
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// The current warehouse schema, as the pipeline would see it.
    pub async fn schema(&self) -> SchemaSnapshot {
        self.schema.get_schema().await
    }

    fn task(&self, task: Task) -> &StageTask {
        self.tasks.get(task)
    }

    /// Runs one question through the whole pipeline.
    ///
    /// Never fails: fatal conditions end as a failed state.
    pub async fn run(&self, query: &str) -> RequestState {
        let mut state = RequestState::new(query);
        info!(request_id = %state.id(), query = %query, "Running BI pipeline.");

        let snapshot = self.schema.get_schema().await;
        let schema = snapshot.schema.as_ref();

        if self.settings.validate_context {
            let patch = validator::validate_context(
                self.task(Task::ContextValidation),
                &state,
                self.settings.model_timeout,
            )
            .await;
            state = state.apply(patch).enter(Stage::ContextValidated);
            if state.is_failed() {
                return log_outcome(state);
            }
        }

        let patch = clarifier::clarify_intent(
            self.task(Task::IntentClarification),
            &state,
            schema,
            self.settings.model_timeout,
        )
        .await;
        state = state.apply(patch).enter(Stage::IntentClarified);

        let patch = router::route(
            self.task(Task::DashboardRouting),
            &state,
            self.settings.model_timeout,
        )
        .await;
        state = state.apply(patch).enter(Stage::Routed);

        let state = if state.is_dashboard() {
            let state = state.enter(Stage::DashboardBuilding);
            let patch = dashboard::build_dashboard(self, &state, schema).await;
            state.apply(patch).enter(Stage::Done)
        } else {
            self.run_single(state, schema).await
        };

        log_outcome(state)
    }

    /// Translator → Executor → Visualizer on one routed, single-chart state.
    pub(crate) async fn run_single(
        &self,
        state: RequestState,
        schema: &SchemaDescription,
    ) -> RequestState {
        let state = state.enter(Stage::Translating);
        let patch = translator::translate(
            self.task(Task::SqlTranslation),
            &state,
            schema,
            self.storage.dialect(),
            self.settings.model_timeout,
        )
        .await;
        let state = state.apply(patch).enter(Stage::Executing);
        if state.is_failed() {
            return state;
        }

        let patch =
            executor::execute(self.storage.as_ref(), &state, self.settings.query_timeout).await;
        let state = state.apply(patch).enter(Stage::Visualizing);
        if state.is_failed() {
            return state;
        }

        let patch = visualizer::visualize(
            self.task(Task::Visualization),
            &state,
            self.settings.sample_rows,
            self.settings.model_timeout,
        )
        .await;
        state.apply(patch).enter(Stage::Done)
    }
}

fn log_outcome(state: RequestState) -> RequestState {
    match state.failure() {
        Some(failure) => error!(
            request_id = %state.id(),
            code = %failure.code,
            detail = ?failure.detail,
            "Pipeline failed: {}", failure.message
        ),
        None => info!(
            request_id = %state.id(),
            dashboard = state.is_dashboard(),
            "Pipeline finished."
        ),
    }
    state
}

/// A builder for creating a `Pipeline`.
#[derive(Default)]
pub struct PipelineBuilder {
    storage: Option<Arc<dyn Storage>>,
    ai_provider: Option<Box<dyn AiProvider>>,
    tasks: HashMap<Task, StageTask>,
    settings: PipelineSettings,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the warehouse the pipeline reads from.
    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Sets the provider used by every stage without an explicit task.
    pub fn ai_provider(mut self, provider: Box<dyn AiProvider>) -> Self {
        self.ai_provider = Some(provider);
        self
    }

    /// Overrides the provider and prompts of one stage.
    pub fn task(mut self, task: Task, stage: StageTask) -> Self {
        self.tasks.insert(task, stage);
        self
    }

    pub fn settings(mut self, settings: PipelineSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn validate_context(mut self, enabled: bool) -> Self {
        self.settings.validate_context = enabled;
        self
    }

    /// Builds the `Pipeline`.
    ///
    /// Every stage needs either an explicit task or the default provider.
    pub fn build(self) -> Result<Pipeline, PromptError> {
        let storage = self.storage.ok_or(PromptError::MissingStorageProvider)?;

        let mut overrides = self.tasks;
        let default_provider = self.ai_provider;
        let mut resolve = |task: Task| -> Result<StageTask, PromptError> {
            if let Some(stage) = overrides.remove(&task) {
                return Ok(stage);
            }
            let provider = default_provider
                .clone()
                .ok_or_else(|| PromptError::MissingAiProvider(task.to_string()))?;
            Ok(StageTask::with_default_prompts(task, provider))
        };
        let tasks = StageTasks {
            context_validation: resolve(Task::ContextValidation)?,
            intent_clarification: resolve(Task::IntentClarification)?,
            dashboard_routing: resolve(Task::DashboardRouting)?,
            sql_translation: resolve(Task::SqlTranslation)?,
            visualization: resolve(Task::Visualization)?,
        };

        let schema = SchemaProvider::with_settings(
            storage.clone(),
            self.settings.schema_cache_ttl,
            self.settings.schema_fetch_timeout,
        );

        Ok(Pipeline {
            storage,
            schema,
            tasks,
            settings: self.settings,
        })
    }
}

//! # Application State
//!
//! This module defines the shared application state (`AppState`) and the logic
//! for building it at startup: one AI provider client per configured provider,
//! the SQLite warehouse, and the pipeline wired from the `tasks` section.

use crate::config::AppConfig;
use anyhow::{anyhow, Context};
use insightql::{
    providers::{ai::AiProvider, db::sqlite::SqliteProvider, factory::create_provider},
    Pipeline, StageTask, Task,
};
use std::{collections::HashMap, path::Path, sync::Arc, time::Instant};
use tracing::info;

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The application's configuration, loaded from `config.yml`.
    pub config: Arc<AppConfig>,
    /// The BI pipeline answering every chat message.
    pub pipeline: Arc<Pipeline>,
    /// When the server started, for `/health`.
    pub started_at: Instant,
}

/// Builds the shared application state from the configuration.
///
/// Fails when a task refers to a provider that is not configured or a
/// provider cannot be created.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let settings = config.pipeline.to_settings();

    let mut ai_providers: HashMap<String, Box<dyn AiProvider>> = HashMap::new();
    for (name, provider_config) in &config.providers {
        let provider = create_provider(name, provider_config, settings.model_timeout)?;
        ai_providers.insert(name.clone(), provider);
    }

    let storage = open_warehouse(&config).await?;

    let mut builder = Pipeline::builder()
        .storage(Arc::new(storage))
        .settings(settings);
    for task in Task::ALL {
        let task_config = config.tasks.get(task.as_str()).cloned().unwrap_or_default();
        let provider_name = task_config
            .provider
            .ok_or_else(|| anyhow!("Task '{task}' is missing required 'provider' field"))?;
        let provider = ai_providers.get(&provider_name).cloned().ok_or_else(|| {
            anyhow!("Task '{task}' refers to unknown provider '{provider_name}'")
        })?;
        let (default_system, default_user) = task.default_prompts();
        let stage = StageTask::new(
            provider,
            task_config
                .system_prompt
                .unwrap_or_else(|| default_system.to_string()),
            task_config
                .user_prompt
                .unwrap_or_else(|| default_user.to_string()),
        );
        builder = builder.task(task, stage);
    }
    let pipeline = builder.build()?;

    info!(
        validate_context = pipeline.settings().validate_context,
        "BI pipeline ready."
    );

    Ok(AppState {
        config: Arc::new(config),
        pipeline: Arc::new(pipeline),
        started_at: Instant::now(),
    })
}

async fn open_warehouse(config: &AppConfig) -> anyhow::Result<SqliteProvider> {
    if config.db_url != ":memory:" {
        if let Some(parent) = Path::new(&config.db_url).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create warehouse directory '{}'", parent.display())
                })?;
            }
        }
    }

    let provider = SqliteProvider::new(&config.db_url).await?;
    info!(db_path = %config.db_url, "Initialized warehouse storage provider (SQLite).");

    if config.seed_demo_data && provider.seed_demo_data().await? {
        info!("Loaded the Northwind demo data.");
    }
    Ok(provider)
}

//! # AI Provider Factory
//!
//! This module centralizes the logic for creating AI provider instances from their
//! configuration. By placing this logic in the `lib` crate, any consumer (the server,
//! tests, tools) builds providers the same way.

use crate::{
    errors::PromptError,
    providers::ai::{gemini::GeminiProvider, local::LocalAiProvider, AiProvider},
    types::ProviderConfig,
};
use std::time::Duration;
use tracing::info;

/// Builds the Gemini `generateContent` URL for a model name.
pub fn gemini_api_url(model_name: &str) -> String {
    format!("https://generativelanguage.googleapis.com/v1beta/models/{model_name}:generateContent")
}

/// Creates an AI provider instance from a named provider configuration.
///
/// - `gemini` providers require an `api_key`; the URL is derived from the model
///   name when `api_url` is not set.
/// - `local` providers (any OpenAI-compatible endpoint) require an `api_url`.
pub fn create_provider(
    name: &str,
    config: &ProviderConfig,
    timeout: Duration,
) -> Result<Box<dyn AiProvider>, PromptError> {
    let provider: Box<dyn AiProvider> = match config.provider.as_str() {
        "gemini" => {
            let api_key = config
                .api_key
                .clone()
                .filter(|key| !key.is_empty())
                .ok_or_else(|| {
                    PromptError::MissingAiProvider(format!(
                        "api_key is required for gemini provider '{name}'"
                    ))
                })?;
            let api_url = config
                .api_url
                .clone()
                .filter(|url| !url.is_empty())
                .unwrap_or_else(|| gemini_api_url(&config.model_name));
            info!("Configuring Gemini provider '{name}' with URL: {api_url}");
            Box::new(
                GeminiProvider::with_timeout(api_url, api_key, timeout)?
                    .temperature(config.temperature),
            )
        }
        "local" => {
            let api_url = config
                .api_url
                .clone()
                .filter(|url| !url.is_empty())
                .ok_or_else(|| {
                    PromptError::MissingAiProvider(format!(
                        "api_url is required for local provider '{name}'. Please set LOCAL_AI_API_URL in your .env file."
                    ))
                })?;
            info!("Configuring Local AI provider '{name}' with URL: {api_url}");
            Box::new(
                LocalAiProvider::with_timeout(
                    api_url,
                    config.api_key.clone().filter(|key| !key.is_empty()),
                    Some(config.model_name.clone()),
                    timeout,
                )?
                .temperature(config.temperature),
            )
        }
        other => {
            return Err(PromptError::MissingAiProvider(format!(
                "Unsupported AI provider type '{other}' for provider '{name}'"
            )));
        }
    };

    Ok(provider)
}

pub mod gemini;
pub mod local;

use crate::errors::PromptError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;
use std::time::Duration;

/// A trait for interacting with an AI provider.
///
/// This trait defines a common interface for sending one prompt-completion
/// request to different Large Language Models (e.g., Gemini, local models).
/// Every pipeline stage talks to the model exclusively through this trait.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// Generates a response from a given system and user prompt.
    ///
    /// The result should be a string containing the AI's response.
    async fn generate(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, PromptError>;
}

dyn_clone::clone_trait_object!(AiProvider);

/// Calls `generate` with an upper bound on how long the provider may take.
pub async fn generate_with_timeout(
    provider: &dyn AiProvider,
    system_prompt: &str,
    user_prompt: &str,
    timeout: Duration,
) -> Result<String, PromptError> {
    match tokio::time::timeout(timeout, provider.generate(system_prompt, user_prompt)).await {
        Ok(result) => result,
        Err(_) => Err(PromptError::Timeout {
            operation: "Model completion".to_string(),
            seconds: timeout.as_secs(),
        }),
    }
}

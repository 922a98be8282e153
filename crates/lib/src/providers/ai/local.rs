use crate::{constants::MODEL_TIMEOUT, errors::PromptError, providers::ai::AiProvider};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

const MAX_COMPLETION_TOKENS: u32 = 2048;

// --- Chat Completions wire format ---

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<&'a str>,
    temperature: f32,
    max_tokens: u32,
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

/// A provider for any OpenAI-compatible Chat Completions endpoint
/// (Ollama, LM Studio, llama.cpp, vLLM, hosted gateways).
#[derive(Clone, Debug)]
pub struct LocalAiProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
    model: Option<String>,
    temperature: f32,
}

impl LocalAiProvider {
    /// Creates a provider with the default model timeout.
    pub fn new(
        api_url: String,
        api_key: Option<String>,
        model: Option<String>,
    ) -> Result<Self, PromptError> {
        Self::with_timeout(api_url, api_key, model, MODEL_TIMEOUT)
    }

    /// Creates a provider whose HTTP requests give up after `timeout`.
    pub fn with_timeout(
        api_url: String,
        api_key: Option<String>,
        model: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PromptError> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .build()
            .map_err(PromptError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
            model,
            temperature: 0.0,
        })
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }
}

#[async_trait]
impl AiProvider for LocalAiProvider {
    async fn generate(&self, system_prompt: &str, user_prompt: &str) -> Result<String, PromptError> {
        let body = ChatCompletionRequest {
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            model: self.model.as_deref(),
            temperature: self.temperature,
            max_tokens: MAX_COMPLETION_TOKENS,
            stream: false,
        };

        let mut request = self.client.post(&self.api_url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(PromptError::AiRequest)?;
        let status = response.status();
        if !status.is_success() {
            debug!(%status, "Chat completion request was refused.");
            return Err(PromptError::AiApi(
                response.text().await.unwrap_or_default(),
            ));
        }

        let completion: ChatCompletion = response
            .json()
            .await
            .map_err(PromptError::AiDeserialization)?;

        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

use thiserror::Error;

/// Custom error types for the library.
///
/// These cover the provider and storage boundaries. Failures that end a single
/// pipeline run are not errors at this level; they are recorded on the
/// request state as a [`crate::pipeline::Failure`].
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Request to AI provider failed: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize AI provider response: {0}")]
    AiDeserialization(reqwest::Error),
    #[error("AI provider returned an error: {0}")]
    AiApi(String),
    #[error("AI provider is missing: {0}")]
    MissingAiProvider(String),
    #[error("Storage provider is missing")]
    MissingStorageProvider,
    #[error("Storage connection error: {0}")]
    StorageConnection(String),
    #[error("Storage operation failed: {0}")]
    StorageOperationFailed(String),
    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },
    #[error("JSON serialization error: {0}")]
    JsonSerialization(#[from] serde_json::Error),
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),
}

impl From<turso::Error> for PromptError {
    fn from(err: turso::Error) -> Self {
        PromptError::StorageOperationFailed(err.to_string())
    }
}

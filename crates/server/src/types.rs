use serde::{Deserialize, Serialize};

/// The body of `POST /api/chat`.
#[derive(Debug, Deserialize, Default)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

/// An inbound WebSocket message.
#[derive(Debug, Deserialize)]
pub struct ClientMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub uptime_secs: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: String,
    pub schema_source: insightql::SchemaSource,
    pub environment: String,
    pub endpoints: Vec<String>,
    pub timestamp: String,
}

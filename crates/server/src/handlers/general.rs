//! # General Route Handlers
//!
//! The root banner, health check, service status and the schema the pipeline
//! currently sees.

use super::AppState;
use crate::types::{HealthResponse, StatusResponse};
use axum::{extract::State, Json};
use insightql::SchemaSnapshot;

const SERVICE_NAME: &str = "insightql";

const ENDPOINTS: &[&str] = &[
    "GET /",
    "GET /health",
    "GET /api/status",
    "GET /api/schema",
    "POST /api/chat",
    "GET /ws",
];

/// The handler for the root (`/`) endpoint.
pub async fn root() -> &'static str {
    "insightql server is running."
}

/// The handler for the health check (`/health`) endpoint.
pub async fn health_check(State(app_state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
        uptime_secs: app_state.started_at.elapsed().as_secs(),
    })
}

/// Reports where the schema comes from and which endpoints are served.
pub async fn status_handler(State(app_state): State<AppState>) -> Json<StatusResponse> {
    let snapshot = app_state.pipeline.schema().await;
    Json(StatusResponse {
        status: if snapshot.source.is_degraded() {
            "degraded".to_string()
        } else {
            "ok".to_string()
        },
        schema_source: snapshot.source,
        environment: app_state.config.environment.clone(),
        endpoints: ENDPOINTS.iter().map(|e| e.to_string()).collect(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// The handler for `GET /api/schema`.
pub async fn schema_handler(State(app_state): State<AppState>) -> Json<SchemaSnapshot> {
    Json(app_state.pipeline.schema().await)
}

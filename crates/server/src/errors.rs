use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::{error, warn};

/// A custom error type for the server application.
///
/// A failed pipeline run is not an `AppError`: it is a regular chat response
/// carrying an `errorCode`. These are the failures around it.
#[derive(Debug)]
pub enum AppError {
    /// The request itself is unusable.
    BadRequest(String),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status_code, error_message) = match self {
            AppError::BadRequest(message) => {
                warn!("Bad request: {message}");
                (StatusCode::BAD_REQUEST, message)
            }
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred.".to_string(),
                )
            }
        };

        (status_code, Json(json!({ "error": error_message }))).into_response()
    }
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors raised by the matching and progression engine.
///
/// Every variant carries enough structured context (offending field, expected vs
/// actual state) for the caller to render a precise message. Nothing in the engine
/// catches and suppresses these; they always reach the caller.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Malformed input. Rejected before any state is touched.
    #[error("Validation error on '{field}': {message}")]
    Validation { field: String, message: String },

    /// The operation is not allowed from the current lifecycle phase.
    #[error("Invalid state for {operation}: expected {expected}, found {actual}")]
    InvalidState {
        operation: &'static str,
        expected: String,
        actual: String,
    },

    /// The persisted snapshot could not be read or breaks an invariant.
    /// Never repaired; the detail is surfaced verbatim.
    #[error("Data integrity error: {detail}")]
    DataIntegrity { detail: String },
}

impl EngineError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_state(
        operation: &'static str,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        EngineError::InvalidState {
            operation,
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn integrity(detail: impl Into<String>) -> Self {
        EngineError::DataIntegrity {
            detail: detail.into(),
        }
    }
}

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Engine(e @ EngineError::Validation { .. }) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e.to_string())
            }
            AppError::Engine(e @ EngineError::InvalidState { .. }) => {
                (StatusCode::CONFLICT, "INVALID_STATE", e.to_string())
            }
            AppError::Engine(e @ EngineError::DataIntegrity { .. }) => {
                tracing::error!("{e}");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    "DATA_INTEGRITY_ERROR",
                    e.to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

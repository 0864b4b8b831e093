use axum::extract::{rejection::JsonRejection, FromRequest};

use crate::errors::{AppError, EngineError};

/// `axum::Json` whose body rejections surface as validation errors in the standard
/// error envelope instead of axum's plain-text responses.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Engine(EngineError::validation("body", rejection.body_text()))
    }
}

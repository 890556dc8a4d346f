//! HTTP Error Types
//!
//! Maps application errors to status codes with a `{"detail": ...}` body.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use paygate_core::domain::DomainError;
use paygate_core::error::AppError;
use serde_json::json;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Request could not be parsed
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    App(#[from] AppError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status_and_detail(&self) -> (StatusCode, String) {
        let app = match self {
            ApiError::BadRequest(msg) => return (StatusCode::BAD_REQUEST, msg.clone()),
            ApiError::App(app) => app,
        };

        match app {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Domain(DomainError::ValidationError(msg)) => {
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::Domain(e @ DomainError::InvalidStateTransition { .. }) => {
                (StatusCode::CONFLICT, e.to_string())
            }
            AppError::MissingApiKey(_) => (StatusCode::UNAUTHORIZED, app.to_string()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = self.status_and_detail();
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

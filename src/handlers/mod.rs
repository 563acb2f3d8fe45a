pub mod auth;
pub mod buses;
pub mod health;
pub mod profile;
pub mod socket;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::TrackerError;

/// Errors returned by HTTP handlers, rendered as `{"message": ...}`.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Service unavailable")]
    Unavailable,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

/// Store lookup errors with a handler-specific 404 message. Anything other
/// than a missing record keeps its usual mapping.
pub(crate) fn lookup_error(message: &'static str) -> impl Fn(TrackerError) -> ApiError {
    move |err| match err {
        TrackerError::NotFound(_) => ApiError::NotFound(message.to_string()),
        other => ApiError::from(other),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "message": self.to_string() }))).into_response()
    }
}

impl From<TrackerError> for ApiError {
    fn from(err: TrackerError) -> Self {
        match err {
            TrackerError::InvalidPosition { .. } | TrackerError::InvalidQuery { .. } => {
                ApiError::BadRequest(err.to_string())
            }
            TrackerError::OutOfOrder { .. } => ApiError::BadRequest(err.to_string()),
            TrackerError::NotFound(what) => ApiError::NotFound(format!("Not found: {}", what)),
            TrackerError::Conflict(_) => ApiError::BadRequest("User already exists".to_string()),
            TrackerError::InvalidCredentials => ApiError::BadRequest("Invalid credentials".to_string()),
            TrackerError::InvalidToken => ApiError::Unauthorized("Invalid token".to_string()),
            TrackerError::Unavailable(reason) => {
                tracing::error!(reason = %reason, "Collaborator unavailable");
                ApiError::Unavailable
            }
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

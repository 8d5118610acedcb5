//! Error types and error handling for the application
//!
//! `AppError` is the boundary error returned by task orchestrators and HTTP
//! handlers. It wraps the layer errors and converts to a JSON response.

use crate::generation::{FailureReason, GenerationError, ServiceErrorKind};
use crate::state::PersistenceError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Application-level error types
#[derive(Error, Debug)]
pub enum AppError {
    /// Generation or tracking failed
    #[error(transparent)]
    Generation(#[from] GenerationError),

    /// Error occurred during state persistence
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    /// Request body or parameters are invalid
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// No state slot is registered under this name
    #[error("Unknown state key: {0}")]
    UnknownStateKey(String),

    /// No task is registered under this name
    #[error("Unknown task: {0}")]
    UnknownTask(String),

    /// Another tracker already follows this handle
    #[error("Operation already being tracked: {0}")]
    OperationInUse(String),

    /// Internal server error (catch-all for unexpected errors)
    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Generation(e) => generation_status(e),
            AppError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnknownStateKey(_) | AppError::UnknownTask(_) => StatusCode::NOT_FOUND,
            AppError::OperationInUse(_) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn generation_status(error: &GenerationError) -> StatusCode {
    match error {
        GenerationError::Validation(_) => StatusCode::BAD_REQUEST,
        GenerationError::SchemaParse { .. } => StatusCode::BAD_GATEWAY,
        GenerationError::Service { kind, .. } => match kind {
            ServiceErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ServiceErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            ServiceErrorKind::Transport
            | ServiceErrorKind::Rejected
            | ServiceErrorKind::InvalidResponse => StatusCode::BAD_GATEWAY,
        },
        GenerationError::OperationFailure { reason, .. } => match reason {
            FailureReason::TimedOut(_) => StatusCode::GATEWAY_TIMEOUT,
            FailureReason::NotReady(_) | FailureReason::AlreadyTracked => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        },
        GenerationError::InvalidTransition { .. } => StatusCode::CONFLICT,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, status = status.as_u16(), "Request failed");
        }

        let body = Json(json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_maps_to_bad_request() {
        let err = AppError::from(GenerationError::Validation("empty".to_string()));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_service_kinds() {
        let unauthorized = AppError::from(GenerationError::service(
            ServiceErrorKind::Unauthorized,
            Some(403),
            "bad key",
        ));
        let throttled = AppError::from(GenerationError::service(
            ServiceErrorKind::RateLimited,
            Some(429),
            "slow down",
        ));
        let rejected = AppError::from(GenerationError::service(
            ServiceErrorKind::Rejected,
            Some(500),
            "boom",
        ));
        assert_eq!(unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(throttled.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(rejected.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_operation_failures() {
        let timed_out = AppError::from(GenerationError::operation(
            "operations/1",
            FailureReason::TimedOut("90 polls".to_string()),
        ));
        let failed = AppError::from(GenerationError::operation(
            "operations/1",
            FailureReason::NoResult,
        ));
        assert_eq!(timed_out.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(failed.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            AppError::OperationInUse("operations/1".to_string()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_unknown_key_is_not_found() {
        let err = AppError::UnknownStateKey("nope".to_string());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Unknown state key: nope");
    }
}

//! Error types.
//!
//! [`ServiceError`] covers failures of the upstream forecasting service.
//! [`ApiError`] is what handlers return; it renders as `{error, details}`.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::warn;

use crate::resilience::Retryable;

/// Failure while talking to the forecasting service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("forecast service unreachable: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("forecast service timed out: {0}")]
    Timeout(#[source] reqwest::Error),

    #[error("forecast service returned {status}")]
    UpstreamStatus { status: reqwest::StatusCode },

    #[error("forecast service response could not be decoded: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("forecast service circuit is open")]
    CircuitOpen,
}

impl ServiceError {
    /// Classify a `reqwest` send error.
    pub fn from_send(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            ServiceError::Timeout(error)
        } else {
            ServiceError::Transport(error)
        }
    }

    /// Whether the circuit breaker should count this as a failure.
    pub fn is_breaker_failure(&self) -> bool {
        match self {
            ServiceError::Transport(_) => true,
            ServiceError::UpstreamStatus { status } => {
                status.is_server_error() || *status == reqwest::StatusCode::REQUEST_TIMEOUT
            }
            ServiceError::Timeout(_) | ServiceError::Decode(_) | ServiceError::CircuitOpen => false,
        }
    }
}

impl Retryable for ServiceError {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            ServiceError::Transport(_) | ServiceError::UpstreamStatus { .. }
        )
    }
}

/// JSON body of an error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub details: String,
}

/// Error returned by HTTP handlers.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: String,
}

impl ApiError {
    /// A 500 carrying a generic message plus the failure description.
    pub fn internal(error: &str, cause: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            error: error.to_string(),
            details: cause.to_string(),
        }
    }

    pub fn bad_request(error: &str, cause: impl std::fmt::Display) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: error.to_string(),
            details: cause.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(status = %rejection.status(), error = %rejection.body_text(), "Rejected request body");
        Self {
            status: rejection.status(),
            error: "Invalid request body".to_string(),
            details: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        warn!(status = %rejection.status(), error = %rejection.body_text(), "Rejected query string");
        Self {
            status: rejection.status(),
            error: "Invalid query string".to_string(),
            details: rejection.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.error,
            details: self.details,
        };
        (self.status, Json(body)).into_response()
    }
}

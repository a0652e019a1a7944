//! Custom error types
//!
//! One error enum shared by the scheduler, the queue, the worker pool and
//! the submission intake endpoint. Cancellation is never represented here:
//! loops observe it directly.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Service-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Redis error: {0}")]
    Redis(String),

    /// The grading service could not be reached or answered with a failure status
    #[error("Grading service unavailable: {0}")]
    GradingUnavailable(String),

    /// The grading service answered but the answer could not be used
    #[error("Grading failed: {0}")]
    Grading(String),

    #[error("No running competition")]
    NoActiveCompetition,

    #[error("Submission queue is closed")]
    QueueClosed,

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error type
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Database(_) => "DATABASE_ERROR",
            Self::Redis(_) => "REDIS_ERROR",
            Self::GradingUnavailable(_) => "GRADING_UNAVAILABLE",
            Self::Grading(_) => "GRADING_ERROR",
            Self::NoActiveCompetition => "NO_ACTIVE_COMPETITION",
            Self::QueueClosed => "QUEUE_CLOSED",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Configuration(_) => "CONFIGURATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NoActiveCompetition => StatusCode::CONFLICT,
            Self::Database(_) | Self::Redis(_) | Self::QueueClosed => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            Self::GradingUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::Grading(_)
            | Self::Serialization(_)
            | Self::Configuration(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the failure comes from an unreachable collaborator
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::Database(_) | Self::Redis(_) | Self::GradingUnavailable(_)
        )
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

/// Error details in response
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Store failures are logged here and reported generically
        let message = match &self {
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                "An internal error occurred".to_string()
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                "Submission could not be stored".to_string()
            }
            _ => self.to_string(),
        };

        let body = ErrorResponse {
            error: ErrorDetails {
                code: self.error_code().to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<redis::RedisError> for AppError {
    fn from(err: redis::RedisError) -> Self {
        AppError::Redis(err.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            AppError::Grading(err.to_string())
        } else {
            AppError::GradingUnavailable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

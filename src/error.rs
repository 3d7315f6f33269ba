use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Failure taxonomy of the relayer. `Clone` because a single deduplicated
/// submission outcome is handed to every waiter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Bad burner sig")]
    InvalidSignature,

    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Ordering conflict: {0}")]
    OrderingConflict(String),

    #[error("Submission failed: {0}")]
    SubmissionFailure(String),

    #[error("Blockchain RPC error: {0}")]
    BlockchainRPC(String),

    #[error("Rate limited")]
    RateLimitExceeded,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidSignature => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::OrderingConflict(_) => StatusCode::CONFLICT,
            AppError::SubmissionFailure(_) => StatusCode::BAD_REQUEST,
            AppError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            AppError::BlockchainRPC(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::InvalidSignature => "BAD_SIGNATURE",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::OrderingConflict(_) => "ORDERING_CONFLICT",
            AppError::SubmissionFailure(_) => "SUBMISSION_FAILED",
            AppError::BlockchainRPC(_) => "RPC_ERROR",
            AppError::RateLimitExceeded => "RATE_LIMITED",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Short machine string returned to clients.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::AuthError(msg)
            | AppError::OrderingConflict(msg)
            | AppError::SubmissionFailure(msg)
            | AppError::BlockchainRPC(msg)
            | AppError::Internal(msg) => msg.clone(),
            AppError::InvalidSignature | AppError::RateLimitExceeded => self.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
    pub code: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::debug!("Request rejected: {}", self);
        }

        let body = Json(ErrorResponse {
            ok: false,
            error: self.public_message(),
            code: self.code().to_string(),
        });

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::{
    models::ModelError,
    repositories::StoreError,
    services::{eligibility::DenyReason, results::AggregateError},
};

#[derive(Error, Debug)]
pub enum AppError {
    // Identity
    #[error("Authentication required")]
    Unauthenticated,
    #[error("Invalid token: {0}")]
    InvalidToken(#[from] JwtError),
    #[error("Only the poll owner may manage this poll")]
    Forbidden,

    // Lookups
    #[error("Poll not found")]
    PollNotFound,
    #[error("Option not found")]
    OptionNotFound,
    #[error("No such vote to retract")]
    VoteNotFound,

    // Input
    #[error("Validation failed: {0}")]
    Validation(String),
    #[error("Invalid poll data: {0}")]
    Model(#[from] ModelError),

    // Core
    #[error("{0}")]
    Vote(#[from] DenyReason),
    #[error("{0}")]
    Results(#[from] AggregateError),

    // Store
    #[error("Persistence failure: {0}")]
    Persistence(String),

    #[error("Internal error: {0}")]
    Internal(&'static str),
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JwtError {
    #[error("Token has expired")]
    TokenExpired,
    #[error("Token signature is invalid")]
    InvalidSignature,
    #[error("Token is malformed")]
    InvalidTokenFormat,
    #[error("Token has no usable subject")]
    MissingSubject,
}

/// Lost uniqueness races keep the vocabulary of the eligibility check they overlap.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(conflict) => AppError::Vote(conflict.into()),
            other => AppError::Persistence(other.to_string()),
        }
    }
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthenticated => "Unauthenticated",
            AppError::InvalidToken(_) => "InvalidToken",
            AppError::Forbidden => "Forbidden",
            AppError::PollNotFound => "PollNotFound",
            AppError::OptionNotFound => "OptionNotFound",
            AppError::VoteNotFound => "VoteNotFound",
            AppError::Validation(_) | AppError::Model(_) => "ValidationFailed",
            AppError::Vote(reason) => reason.code(),
            AppError::Results(AggregateError::NoOptions) => "NoOptions",
            AppError::Persistence(_) => "PersistenceFailure",
            AppError::Internal(_) => "InternalError",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated | AppError::InvalidToken(_) => StatusCode::UNAUTHORIZED,
            AppError::Vote(DenyReason::Unauthenticated) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::PollNotFound | AppError::OptionNotFound | AppError::VoteNotFound => {
                StatusCode::NOT_FOUND
            }
            AppError::Validation(_) | AppError::Model(_) => StatusCode::BAD_REQUEST,
            AppError::Vote(_) | AppError::Results(_) => StatusCode::BAD_REQUEST,
            AppError::Persistence(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // store internals stay in the logs
            AppError::Persistence(detail) => {
                error!("Persistence failure: {}", detail);
                "Something went wrong while talking to the database".to_string()
            }
            AppError::Internal(detail) => {
                error!("Internal error: {}", detail);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "success": false,
            "status": status.as_u16(),
            "message": message,
            "error": self.code(),
            "timestamp": chrono::Utc::now()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::VoteConflict;

    #[test]
    fn store_conflicts_reuse_eligibility_codes() {
        let single: AppError = StoreError::Conflict(VoteConflict::SinglePoll).into();
        assert_eq!(single.code(), "SingleVoteExceeded");
        assert_eq!(single.status(), StatusCode::BAD_REQUEST);

        let duplicate: AppError = StoreError::Conflict(VoteConflict::SameOption).into();
        assert_eq!(duplicate.code(), "DuplicateOption");
    }

    #[test]
    fn backend_failures_are_server_errors() {
        let err: AppError = StoreError::Backend("connection reset".into()).into();
        assert_eq!(err.code(), "PersistenceFailure");
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn status_codes_follow_the_error_taxonomy() {
        assert_eq!(AppError::Vote(DenyReason::Unauthenticated).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::Vote(DenyReason::PollClosed).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::PollNotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Results(AggregateError::NoOptions).code(), "NoOptions");
    }
}

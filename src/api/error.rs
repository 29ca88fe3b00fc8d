//! API error codes and types.
//!
//! Every failure leaves the server as a JSON envelope carrying a machine
//! readable `code` and a human readable `message`.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use super::response::error_response;
use crate::error::StoreError;
use crate::models::RequestStatus;

/// Machine readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    ValidationError,
    InvalidTransition,
    UniquenessViolation,
    NotAuthenticated,
    WrongCredentials,
    NotAuthorized,
    NotFound,
    InternalError,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::ValidationError => "validation_error",
            ErrorCode::InvalidTransition => "invalid_transition",
            ErrorCode::UniquenessViolation => "uniqueness_violation",
            ErrorCode::NotAuthenticated => "not_authenticated",
            ErrorCode::WrongCredentials => "wrong_credentials",
            ErrorCode::NotAuthorized => "not_authorized",
            ErrorCode::NotFound => "not_found",
            ErrorCode::InternalError => "internal_error",
        }
    }
}

/// API errors that can be returned to clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("Cannot move a {from} request to {to}")]
    InvalidTransition { from: RequestStatus, to: RequestStatus },

    #[error("{0}")]
    Conflict(String),

    #[error("Authentication credentials were not provided")]
    NotAuthenticated,

    #[error("Wrong email or password")]
    WrongCredentials,

    #[error("You are not allowed to perform this operation")]
    NotAuthorized,

    #[error("Not found: {0}")]
    NotFound(String),

    /// Detail is logged where the error is raised, never sent.
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ApiError::Validation(_) => ErrorCode::ValidationError,
            ApiError::InvalidTransition { .. } => ErrorCode::InvalidTransition,
            ApiError::Conflict(_) => ErrorCode::UniquenessViolation,
            ApiError::NotAuthenticated => ErrorCode::NotAuthenticated,
            ApiError::WrongCredentials => ErrorCode::WrongCredentials,
            ApiError::NotAuthorized => ErrorCode::NotAuthorized,
            ApiError::NotFound(_) => ErrorCode::NotFound,
            ApiError::Internal => ErrorCode::InternalError,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidTransition { .. } | ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::NotAuthenticated | ApiError::WrongCredentials => StatusCode::UNAUTHORIZED,
            ApiError::NotAuthorized => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> String {
        self.to_string()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(message) => ApiError::Validation(message),
            StoreError::InvalidTransition { from, to } => ApiError::InvalidTransition { from, to },
            err @ StoreError::UniquenessViolation { .. } => ApiError::Conflict(err.to_string()),
            StoreError::NotFound(what) => ApiError::NotFound(what),
            err => {
                tracing::error!(error = %err, "Request failed in the persistence layer");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error_response(&self)
    }
}

//! Core error type shared by the store, the lifecycle engine and the models.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

use crate::crypto::PasswordError;
use crate::models::RequestStatus;

/// Errors surfaced by the persistence core.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Missing or malformed field values, or a failed domain invariant.
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition { from: RequestStatus, to: RequestStatus },

    #[error("{entity} with this {field} already exists")]
    UniquenessViolation {
        entity: &'static str,
        field: &'static str,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(#[from] DieselError),

    #[error("Connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("Password error: {0}")]
    Password(#[from] PasswordError),
}

impl StoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        StoreError::Validation(message.into())
    }

    pub fn not_found(entity: &str, id: i32) -> Self {
        StoreError::NotFound(format!("{} {}", entity, id))
    }

    /// Whether the failure comes from the persistence layer rather than the caller.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            StoreError::Database(_) | StoreError::Pool(_) | StoreError::Password(_)
        )
    }
}

/// Build a mapper that turns a unique-index failure into
/// [`StoreError::UniquenessViolation`] for the given entity and field, and
/// passes every other database error through.
pub fn unique_violation(
    entity: &'static str,
    field: &'static str,
) -> impl FnOnce(DieselError) -> StoreError {
    move |err| match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            StoreError::UniquenessViolation { entity, field }
        }
        other => StoreError::Database(other),
    }
}

/// Extract a required field, failing with a validation error naming it.
pub fn required<T>(value: Option<T>, entity: &str, field: &str) -> Result<T, StoreError> {
    value.ok_or_else(|| {
        StoreError::Validation(format!("Missing required field '{}' for {}", field, entity))
    })
}

/// Extract a required text field; blank strings count as missing.
pub fn required_text(value: Option<&str>, entity: &str, field: &str) -> Result<String, StoreError> {
    match value.map(str::trim) {
        Some(text) if !text.is_empty() => Ok(text.to_string()),
        _ => Err(StoreError::Validation(format!(
            "Missing required field '{}' for {}",
            field, entity
        ))),
    }
}

//! Error handling for the Inverter Tracking Platform
//!
//! Every domain failure maps to a machine-readable code plus the offending
//! identifier, so batch callers can tell exactly which serial or part was
//! rejected. Nothing here triggers an automatic retry; recovery belongs to
//! the caller.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::lifecycle::TransitionBlock;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Duplicate entry: {0}")]
    DuplicateEntry(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    // Lifecycle invariant guards
    #[error("Lifecycle conflict on {serial_number}: {reason}")]
    LifecycleConflict {
        serial_number: String,
        reason: TransitionBlock,
    },

    #[error("Insufficient stock of {part_code}: requested {requested}, available {available}")]
    InsufficientStock {
        part_code: String,
        requested: i32,
        available: i64,
    },

    #[error("Replacement cap exceeded for {serial_number} / {part_code}")]
    ReplacementCapExceeded {
        serial_number: String,
        part_code: String,
    },

    #[error("Dispatch {dispatch_number} belongs to another service center")]
    DispatchCenterMismatch { dispatch_number: String },

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Offending serial number / part code / dispatch number, when one exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail {
                    code: "INVALID_CREDENTIALS".to_string(),
                    message: "Invalid email or password".to_string(),
                    field: None,
                    reference: None,
                },
            ),
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail {
                    code: "UNAUTHORIZED".to_string(),
                    message: message.clone(),
                    field: None,
                    reference: None,
                },
            ),
            AppError::Forbidden(message) => (
                StatusCode::FORBIDDEN,
                ErrorDetail {
                    code: "FORBIDDEN".to_string(),
                    message: message.clone(),
                    field: None,
                    reference: None,
                },
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    code: "VALIDATION_ERROR".to_string(),
                    message: message.clone(),
                    field: Some(field.clone()),
                    reference: None,
                },
            ),
            AppError::DuplicateEntry(field) => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    code: "DUPLICATE_ENTRY".to_string(),
                    message: format!("A record with this {} already exists", field),
                    field: Some(field.clone()),
                    reference: None,
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail {
                    code: "NOT_FOUND".to_string(),
                    message: format!("{} not found", resource),
                    field: None,
                    reference: None,
                },
            ),
            AppError::LifecycleConflict {
                serial_number,
                reason,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: reason.code().to_string(),
                    message: format!("{}: {}", serial_number, reason),
                    field: None,
                    reference: Some(serial_number.clone()),
                },
            ),
            AppError::InsufficientStock {
                part_code,
                requested,
                available,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "INSUFFICIENT_STOCK".to_string(),
                    message: format!(
                        "Insufficient stock of {}: requested {}, available {}",
                        part_code, requested, available
                    ),
                    field: None,
                    reference: Some(part_code.clone()),
                },
            ),
            AppError::ReplacementCapExceeded {
                serial_number,
                part_code,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "REPLACEMENT_CAP_EXCEEDED".to_string(),
                    message: format!(
                        "Unit {} already reached the replacement cap for part {}",
                        serial_number, part_code
                    ),
                    field: None,
                    reference: Some(serial_number.clone()),
                },
            ),
            AppError::DispatchCenterMismatch { dispatch_number } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    code: "DISPATCH_CENTER_MISMATCH".to_string(),
                    message: format!(
                        "Dispatch {} belongs to another service center",
                        dispatch_number
                    ),
                    field: None,
                    reference: Some(dispatch_number.clone()),
                },
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "DATABASE_ERROR".to_string(),
                    message: "A database error occurred".to_string(),
                    field: None,
                    reference: None,
                },
            ),
            AppError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: msg.clone(),
                    field: None,
                    reference: None,
                },
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred".to_string(),
                    field: None,
                    reference: None,
                },
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            if let Some(dup) = duplicate_entry(db_err.code().as_deref(), db_err.constraint()) {
                return dup;
            }
        }
        AppError::DatabaseError(err)
    }
}

/// Postgres unique_violation (23505) surfaces as DUPLICATE_ENTRY rather
/// than a bare database error, so a racer losing to a UNIQUE constraint
/// gets the same code a pre-check would have produced
fn duplicate_entry(code: Option<&str>, constraint: Option<&str>) -> Option<AppError> {
    if code == Some("23505") {
        Some(AppError::DuplicateEntry(
            constraint.unwrap_or("record").to_string(),
        ))
    } else {
        None
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_maps_to_duplicate_entry() {
        let err = duplicate_entry(Some("23505"), Some("unit_dispatches_dispatch_number_key"));
        match err {
            Some(AppError::DuplicateEntry(constraint)) => {
                assert_eq!(constraint, "unit_dispatches_dispatch_number_key");
            }
            other => panic!("expected DuplicateEntry, got {:?}", other),
        }
    }

    #[test]
    fn test_other_database_errors_pass_through() {
        assert!(duplicate_entry(Some("23503"), Some("fk")).is_none());
        assert!(duplicate_entry(None, None).is_none());
    }
}

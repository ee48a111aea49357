//! Centralized error handling.
//!
//! Provides a unified error type for the entire application,
//! with automatic HTTP response conversion.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid credentials")]
    InvalidCredentials,

    // Tenant and role checks
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Member and group belong to different churches")]
    TenantMismatch,

    // Resource errors
    #[error("Group is at full capacity")]
    CapacityExceeded,

    #[error("{0} already exists")]
    DuplicateKey(String),

    #[error("{0} not found")]
    NotFound(String),

    // Validation
    #[error("{0}")]
    Validation(String),

    #[error("Invalid input: {0}")]
    BadRequest(String),

    // External service errors
    #[error("Database error")]
    Database(#[from] sea_orm::DbErr),

    #[error("Authentication error")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl AppError {
    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized => "UNAUTHORIZED",
            AppError::InvalidCredentials => "INVALID_CREDENTIALS",
            AppError::PermissionDenied(_) => "PERMISSION_DENIED",
            AppError::TenantMismatch => "TENANT_MISMATCH",
            AppError::CapacityExceeded => "CAPACITY_EXCEEDED",
            AppError::DuplicateKey(_) => "DUPLICATE_KEY",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Jwt(_) => "AUTH_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized | AppError::InvalidCredentials | AppError::Jwt(_) => {
                StatusCode::UNAUTHORIZED
            }
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::CapacityExceeded | AppError::DuplicateKey(_) => StatusCode::CONFLICT,
            AppError::TenantMismatch => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Validation(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether a row-level import failure should be recorded and skipped
    /// rather than aborting the whole batch.
    pub fn is_row_recoverable(&self) -> bool {
        matches!(
            self,
            AppError::Validation(_)
                | AppError::BadRequest(_)
                | AppError::DuplicateKey(_)
                | AppError::NotFound(_)
                | AppError::PermissionDenied(_)
                | AppError::TenantMismatch
        )
    }

    /// Get user-facing message (hides internal details)
    pub fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::BadRequest(msg) => msg.clone(),

            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "A database error occurred".to_string()
            }
            AppError::Jwt(e) => {
                tracing::error!("JWT error: {:?}", e);
                "Invalid or expired token".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }

            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code().to_string(),
                message: self.user_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self, entity: &str) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self, entity: &str) -> AppResult<T> {
        self.ok_or_else(|| AppError::not_found(entity))
    }
}

/// Convenience constructors
impl AppError {
    pub fn duplicate(entity: impl Into<String>) -> Self {
        AppError::DuplicateKey(entity.into())
    }

    pub fn not_found(entity: impl Into<String>) -> Self {
        AppError::NotFound(entity.into())
    }

    pub fn denied(reason: impl Into<String>) -> Self {
        AppError::PermissionDenied(reason.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::denied("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::CapacityExceeded.status(), StatusCode::CONFLICT);
        assert_eq!(AppError::duplicate("User").status(), StatusCode::CONFLICT);
        assert_eq!(AppError::not_found("Group").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            AppError::TenantMismatch.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::validation("bad").status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_details_hidden() {
        let err = AppError::internal("connection pool exhausted");
        assert_eq!(err.user_message(), "An internal error occurred");
        assert_eq!(err.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_row_recoverable_classification() {
        assert!(AppError::validation("bad email").is_row_recoverable());
        assert!(AppError::duplicate("User").is_row_recoverable());
        assert!(AppError::not_found("Church").is_row_recoverable());
        assert!(!AppError::internal("boom").is_row_recoverable());
        assert!(!AppError::Unauthorized.is_row_recoverable());
    }

    #[test]
    fn test_ok_or_not_found() {
        let missing: Option<u8> = None;
        let err = missing.ok_or_not_found("Church").unwrap_err();
        assert_eq!(err.to_string(), "Church not found");
    }
}

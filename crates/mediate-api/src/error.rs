//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Maps registry, ledger, and validation errors to HTTP status codes with a
//! JSON body carrying a machine-readable code and a message. Internal error
//! details never reach the client.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mediate_core::ValidationError;
use mediate_ledger::LedgerError;
use mediate_registry::RegistryError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "NOT_FOUND", "CONFLICT").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Resource not found (404).
    #[error("not found: {0}")]
    NotFound(String),

    /// Request validation failed (422).
    #[error("validation error: {0}")]
    Validation(String),

    /// Request body could not be parsed (400).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Missing or invalid credentials (401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Caller lacks the required capability (403).
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Conflict with current record state (409).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
            Self::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        };

        if matches!(&self, Self::Internal(_)) {
            tracing::error!(error = %self, "internal server error");
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match &err {
            RegistryError::PermissionDenied { .. } => Self::Forbidden(err.to_string()),
            RegistryError::NotFound(_) => Self::NotFound(err.to_string()),
            RegistryError::Underflow(_) => Self::Conflict(err.to_string()),
            RegistryError::InvalidOwner(_) => Self::Validation(err.to_string()),
            RegistryError::InconsistentSnapshot(_) => Self::Internal(err.to_string()),
        }
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::Registry(inner) => inner.into(),
            LedgerError::PermissionDenied { .. } => Self::Forbidden(err.to_string()),
            LedgerError::NotFound(_) => Self::NotFound(err.to_string()),
            LedgerError::CaseNotJoinable { .. }
            | LedgerError::MediatorAlreadyAssigned { .. }
            | LedgerError::AlreadyClosed(_)
            | LedgerError::NoEligibleMediator { .. } => Self::Conflict(err.to_string()),
            LedgerError::InvalidParty(_) | LedgerError::InvalidDeposit { .. } => {
                Self::Validation(err.to_string())
            }
            LedgerError::InconsistentSnapshot(_) => Self::Internal(err.to_string()),
        }
    }
}

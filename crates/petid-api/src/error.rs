//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Ledger rejections keep their stable machine-readable code; the HTTP
//! status follows the rejection family:
//!
//! | Family | Status |
//! |---|---|
//! | authorization | 403 |
//! | state precondition | 409 (404 for an unregistered animal) |
//! | transfer gate | 409 |
//! | integrity | 500 |

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use petid_ledger::{ErrorCategory, LedgerError, LicenseError};

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "VACCINATION_EXPIRED").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
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

    /// The ledger rejected the operation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// The license directory rejected the operation.
    #[error(transparent)]
    License(#[from] LicenseError),

    /// Internal server error (500). Message is logged but not returned to client.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            Self::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR"),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Ledger(err) => (ledger_status(err), err.code()),
            Self::License(err) => match err {
                LicenseError::NotFound(_) => (StatusCode::NOT_FOUND, "LICENSE_NOT_FOUND"),
                LicenseError::AlreadyExists(_) => (StatusCode::CONFLICT, "LICENSE_EXISTS"),
                LicenseError::InvalidTransition { .. } | LicenseError::TerminalState(_) => {
                    (StatusCode::CONFLICT, "LICENSE_TRANSITION_REJECTED")
                }
            },
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn is_internal(&self) -> bool {
        self.status_and_code().0 == StatusCode::INTERNAL_SERVER_ERROR
    }
}

fn ledger_status(err: &LedgerError) -> StatusCode {
    match err.category() {
        ErrorCategory::Authorization => StatusCode::FORBIDDEN,
        ErrorCategory::StatePrecondition => match err {
            LedgerError::AnimalNotActive(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::CONFLICT,
        },
        ErrorCategory::TransferGate => StatusCode::CONFLICT,
        ErrorCategory::Integrity => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // Never expose internal error messages to clients.
        let message = if self.is_internal() {
            tracing::error!(error = %self, "internal server error");
            "An internal error occurred".to_string()
        } else {
            self.to_string()
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Convert identifier validation errors to API errors.
impl From<petid_core::ValidationError> for AppError {
    fn from(err: petid_core::ValidationError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<petid_records::UnknownRecordType> for AppError {
    fn from(err: petid_records::UnknownRecordType) -> Self {
        Self::Validation(err.to_string())
    }
}

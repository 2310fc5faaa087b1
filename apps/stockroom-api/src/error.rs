//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Stockroom                              │
//! │                                                                         │
//! │  Handler: Result<Json<T>, ApiError>                                     │
//! │         │                                                               │
//! │         ├── ValidationError, empty code,                                │
//! │         │   unknown or complete batch ─────► 400 VALIDATION_ERROR       │
//! │         ├── AdmissionError::DuplicateBarcode ► 409 DUPLICATE_BARCODE    │
//! │         ├── AdmissionError::WrongBatch ────► 422 WRONG_BATCH            │
//! │         ├── DbError::NotFound ─────────────► 404 NOT_FOUND              │
//! │         ├── rule conflict / UNIQUE ────────► 409 CONFLICT               │
//! │         ├── token missing / bad ───────────► 401 UNAUTHORIZED           │
//! │         ├── role lacks permission ─────────► 403 FORBIDDEN              │
//! │         └── anything else ─────────────────► 500 DATABASE_ERROR         │
//! │                                               (details only in logs)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The response body is always
//! ```json
//! { "code": "DUPLICATE_BARCODE", "message": "Barcode BATCH5-01 is already registered" }
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use stockroom_core::{AdmissionError, CoreError, ValidationError};
use stockroom_db::DbError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    DuplicateBarcode,
    WrongBatch,
    NotFound,
    Conflict,
    Unauthorized,
    Forbidden,
    DatabaseError,
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::DuplicateBarcode => StatusCode::CONFLICT,
            ErrorCode::WrongBatch => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict => StatusCode::CONFLICT,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::Forbidden => StatusCode::FORBIDDEN,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<AdmissionError> for ApiError {
    fn from(err: AdmissionError) -> Self {
        let code = match err {
            AdmissionError::EmptyCode | AdmissionError::BatchComplete { .. } => {
                ErrorCode::ValidationError
            }
            AdmissionError::DuplicateBarcode { .. } => ErrorCode::DuplicateBarcode,
            AdmissionError::WrongBatch { .. } => ErrorCode::WrongBatch,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::AdmissionRejected(rejection) => rejection.into(),
            CoreError::Validation(validation) => validation.into(),
            // Scans name the batch in the URL; an unknown one is bad input.
            CoreError::BatchNotFound(_) | CoreError::CategoryTooDeep { .. } => {
                ApiError::validation(err.to_string())
            }
            CoreError::ProductNotFound(_) | CoreError::CategoryNotFound(_) => {
                ApiError::new(ErrorCode::NotFound, err.to_string())
            }
            CoreError::QuantityBelowAdmitted { .. }
            | CoreError::BatchHasInventory { .. }
            | CoreError::CategoryCycle { .. }
            | CoreError::AdmittedExceedsQuantity { .. } => {
                ApiError::new(ErrorCode::Conflict, err.to_string())
            }
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Core(core) => core.into(),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => {
                let column = field.rsplit('.').next().unwrap_or(&field);
                ApiError::new(
                    ErrorCode::Conflict,
                    format!("{} '{}' already exists", column, value),
                )
            }
            DbError::ForeignKeyViolation { message } => ApiError::new(
                ErrorCode::Conflict,
                format!("Referenced record missing or still in use: {}", message),
            ),
            other => {
                error!(error = %other, "Database error");
                ApiError::new(ErrorCode::DatabaseError, "A database error occurred")
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::validation(rejection.body_text())
    }
}

//! # API Error Type
//!
//! Every handler returns `ApiResult<T>`. Failures leave the service as
//!
//! ```json
//! { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for Arroz: available 2, requested 3" }
//! ```
//!
//! with the HTTP status derived from the code:
//!
//! ```text
//!   CoreError / DbError                      ErrorCode            Status
//!   ───────────────────                      ─────────            ──────
//!   Validation                          ──►  VALIDATION_ERROR      400
//!   (no / unknown operator)             ──►  UNAUTHORIZED          401
//!   PermissionDenied                    ──►  PERMISSION_DENIED     403
//!   *NotFound                           ──►  NOT_FOUND             404
//!   OutOfStock / InsufficientStock      ──►  OUT_OF_STOCK / ...    409
//!   AlreadyVoided / InvalidSaleStatus   ──►  ALREADY_VOIDED / ...  409
//!   UniqueViolation                     ──►  CONFLICT              409
//!   TransactionFailed / PoolExhausted   ──►  TRANSACTION_FAILED    503
//!   anything else                       ──►  DATABASE_ERROR        500
//! ```
//!
//! Infrastructure details are logged and replaced by a generic message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gesticom_core::{CoreError, ValidationError};
use gesticom_db::DbError;
use serde::Serialize;

pub type ApiResult<T> = Result<T, ApiError>;

/// Error body returned by every endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ApiError {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable message for display
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    Unauthorized,
    PermissionDenied,
    NotFound,
    Conflict,
    OutOfStock,
    InsufficientStock,
    AlreadyVoided,
    InvalidSaleStatus,
    TransactionFailed,
    DatabaseError,
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::PermissionDenied => StatusCode::FORBIDDEN,
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::Conflict
            | ErrorCode::OutOfStock
            | ErrorCode::InsufficientStock
            | ErrorCode::AlreadyVoided
            | ErrorCode::InvalidSaleStatus => StatusCode::CONFLICT,
            ErrorCode::TransactionFailed => StatusCode::SERVICE_UNAVAILABLE,
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let code = match &err {
            CoreError::Validation(_) => ErrorCode::ValidationError,
            CoreError::OutOfStock { .. } => ErrorCode::OutOfStock,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::ProductNotFound(_)
            | CoreError::SaleNotFound(_)
            | CoreError::UserNotFound(_)
            | CoreError::CartLineNotFound(_) => ErrorCode::NotFound,
            CoreError::PermissionDenied { .. } => ErrorCode::PermissionDenied,
            CoreError::AlreadyVoided(_) => ErrorCode::AlreadyVoided,
            CoreError::InvalidSaleStatus { .. } => ErrorCode::InvalidSaleStatus,
            CoreError::TransactionFailed(_) => ErrorCode::TransactionFailed,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        CoreError::from(err).into()
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => core.into(),
            DbError::NotFound { entity, id } => {
                ApiError::new(ErrorCode::NotFound, format!("{entity} not found: {id}"))
            }
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::Conflict,
                format!("{field} '{value}' already exists"),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!(%message, "Foreign key violation");
                ApiError::validation("Invalid reference")
            }
            DbError::TransactionFailed(reason) => {
                tracing::warn!(%reason, "Returning transaction failure to client");
                ApiError::new(
                    ErrorCode::TransactionFailed,
                    "The operation could not be completed, nothing was changed. Please retry.",
                )
            }
            DbError::PoolExhausted => ApiError::new(
                ErrorCode::TransactionFailed,
                "The database is busy, please retry",
            ),
            DbError::ConnectionFailed(e)
            | DbError::MigrationFailed(e)
            | DbError::QueryFailed(e)
            | DbError::Internal(e) => {
                tracing::error!(error = %e, "Database operation failed");
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

//! # API Error Type
//!
//! The single error type that crosses the orchestrator boundary.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  OrderService::process_payment(...)                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Validation? ─── CoreError::Validation ────────┐                       │
//! │  Lookup?     ─── CoreError::NotFound ──────────┤                       │
//! │  Transition? ─── CoreError::InvalidTransition ─┼──► ApiError ──► caller│
//! │  Storage?    ─── DbError (logged, generic) ────┤                       │
//! │  Collaborator? ─ CollaboratorError (logged) ───┘                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Serialized form:
//! ```json
//! { "success": false, "code": "BUSINESS_RULE", "error": "Discount exceeds subtotal" }
//! ```

use serde::{Serialize, Serializer};
use serde::ser::SerializeStruct;

use bistro_core::CoreError;
use bistro_db::{DbError, ACTIVE_ORDER_PER_TABLE, OPEN_SHIFT_PER_CASHIER};

use crate::collaborators::CollaboratorError;

/// Error returned from every service operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    /// Machine-readable category.
    pub code: ErrorCode,

    /// User-facing message.
    pub error: String,
}

/// Error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Missing or malformed input. Raised before storage is touched.
    ValidationError,

    /// A referenced entity does not exist.
    NotFound,

    /// Illegal status transition or action on a terminal order.
    InvalidTransition,

    /// A business rule rejected the request.
    BusinessRule,

    /// Missing approval or insufficient role.
    Unauthorized,

    /// Storage or collaborator failure. Details are logged, not returned.
    OperationFailed,
}

impl ApiError {
    pub fn new(code: ErrorCode, error: impl Into<String>) -> Self {
        ApiError {
            code,
            error: error.into(),
        }
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{entity} not found: {id}"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn business(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::BusinessRule, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Unauthorized, message)
    }

    pub fn operation_failed() -> Self {
        ApiError::new(ErrorCode::OperationFailed, "Operation failed")
    }
}

impl Serialize for ApiError {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("ApiError", 3)?;
        state.serialize_field("success", &false)?;
        state.serialize_field("code", &self.code)?;
        state.serialize_field("error", &self.error)?;
        state.end()
    }
}

/// Converts storage errors.
///
/// Not-found, the two partial unique indexes and refused values reach the
/// caller. Everything else is logged and reduced to a generic message.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        if err.is_unique_violation_on(OPEN_SHIFT_PER_CASHIER) {
            return ApiError::business("Cashier already has an open shift");
        }
        if err.is_unique_violation_on(ACTIVE_ORDER_PER_TABLE) {
            return ApiError::business("Table already has an active order");
        }
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::InvalidData(e) => ApiError::validation(e.to_string()),
            other => {
                tracing::error!(error = %other, "Storage operation failed");
                ApiError::operation_failed()
            }
        }
    }
}

/// Converts domain errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        let code = match err {
            CoreError::Validation(e) => return ApiError::validation(e.to_string()),
            CoreError::NotFound { .. } => ErrorCode::NotFound,
            CoreError::InvalidTransition { .. }
            | CoreError::OrderNotActive { .. }
            | CoreError::ItemNotPending { .. } => ErrorCode::InvalidTransition,
            CoreError::BusinessRule(_)
            | CoreError::InvalidPayment { .. }
            | CoreError::BookingNotConfirmed { .. }
            | CoreError::GuestNotAuthorized { .. } => ErrorCode::BusinessRule,
            CoreError::Unauthorized(_) => ErrorCode::Unauthorized,
        };
        ApiError::new(code, message)
    }
}

impl From<bistro_core::ValidationError> for ApiError {
    fn from(err: bistro_core::ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

/// Collaborator failures are logged and surfaced generically.
impl From<CollaboratorError> for ApiError {
    fn from(err: CollaboratorError) -> Self {
        match err {
            CollaboratorError::NotFound { entity, id } => ApiError::not_found(entity, &id),
            other => {
                tracing::error!(error = %other, "Collaborator call failed");
                ApiError::operation_failed()
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.error)
    }
}

impl std::error::Error for ApiError {}

/// Result type for service operations.
pub type ApiResult<T> = Result<T, ApiError>;

//! # Error Types
//!
//! Domain-specific error types for bistro-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  bistro-core errors (this file)                                        │
//! │  ├── CoreError        - Domain errors (state machine, business rules)  │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  bistro-db errors (separate crate)                                     │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  bistro-service errors                                                 │
//! │  └── ApiError         - What callers see (serialized)                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError ← DbError                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant maps onto one of the boundary categories: validation,
/// not-found, state-machine violation, business rule, or authorization.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// A status write that the lifecycle table forbids.
    ///
    /// ## When This Occurs
    /// - OPEN → READY (skipping steps)
    /// - READY → OPEN (moving backward)
    /// - anything out of PAID / CANCELLED / VOID
    #[error("Invalid {entity} status transition from {from} to {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// The order is in a status that does not allow the operation.
    #[error("Order {order_id} is {status}; cannot {action}")]
    OrderNotActive {
        order_id: String,
        status: String,
        action: &'static str,
    },

    /// The item already left PENDING (it has been sent to the kitchen).
    #[error("Item {item_id} is {status}; only PENDING items can be {action}")]
    ItemNotPending {
        item_id: String,
        status: String,
        action: &'static str,
    },

    /// A business rule rejected the operation.
    ///
    /// ## Examples
    /// - discount exceeds subtotal
    /// - table already has an active order
    /// - cashier already has an open shift
    #[error("{0}")]
    BusinessRule(String),

    /// Payment lines do not settle the order.
    #[error("Invalid payment: {reason}")]
    InvalidPayment { reason: String },

    /// Booking cannot take a room charge.
    #[error("Booking {booking_id} is {status}; room charges require a CONFIRMED booking")]
    BookingNotConfirmed { booking_id: String, status: String },

    /// Guest on the booking may not charge to the room.
    #[error("Guest on booking {booking_id} is not authorized for room charges")]
    GuestNotAuthorized { booking_id: String },

    /// The actor lacks the authority for this operation.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error.
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Creates a BusinessRule error.
    pub fn rule(message: impl Into<String>) -> Self {
        CoreError::BusinessRule(message.into())
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These are raised before any storage access and are user-correctable.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must not be negative.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., a malformed order number).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

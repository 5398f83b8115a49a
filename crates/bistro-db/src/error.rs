//! # Database Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  sqlx::Error ───────────┐                                               │
//! │  ValidationError ───────┼──► DbError ──► ApiError (bistro-service)      │
//! │  MigrateError ──────────┘                                               │
//! │                                                                         │
//! │  NotFound           → NOT_FOUND                                         │
//! │  UniqueViolation    → BUSINESS_RULE for the partial unique indexes      │
//! │  InvalidData        → VALIDATION_ERROR                                  │
//! │  everything else    → logged, OPERATION_FAILED                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use bistro_core::ValidationError;

/// Unique index behind "one OPEN shift per cashier".
pub const OPEN_SHIFT_PER_CASHIER: &str = "shifts.cashier_id";

/// Unique index behind "one active order per table".
pub const ACTIVE_ORDER_PER_TABLE: &str = "orders.table_id";

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An order, item, table or open shift the caller expected is missing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A unique index rejected the write.
    ///
    /// `constraint` is SQLite's `table.column`, e.g. [`OPEN_SHIFT_PER_CASHIER`]
    /// for a second open shift or [`ACTIVE_ORDER_PER_TABLE`] for a second
    /// active order on a table.
    #[error("Unique constraint failed: {constraint}")]
    UniqueViolation { constraint: String },

    /// A referenced outlet, staff member, table or menu item does not exist.
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// A value was refused before it reached SQL, e.g. a rate above 100%.
    #[error(transparent)]
    InvalidData(#[from] ValidationError),

    /// The SQLite file could not be opened or the pool was closed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The embedded schema did not apply.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Begin, commit or rollback failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Any other storage failure: bad SQL, pool timeout, daily sequence overflow.
    #[error("Query failed: {0}")]
    QueryFailed(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn unique_violation(constraint: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            constraint: constraint.into(),
        }
    }

    /// True when this is a unique violation on `table.column`.
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        matches!(self, DbError::UniqueViolation { constraint } if constraint == column)
    }
}

/// ```text
/// RowNotFound                          → NotFound
/// "UNIQUE constraint failed: t.c"      → UniqueViolation { constraint: "t.c" }
/// "FOREIGN KEY constraint failed"      → ForeignKeyViolation
/// PoolClosed                           → ConnectionFailed
/// anything else                        → QueryFailed
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();
                if let Some(constraint) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::unique_violation(constraint)
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation(msg.to_string())
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),

            other => DbError::QueryFailed(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

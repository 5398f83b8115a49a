//! # bistro-db: Database Layer for Bistro POS
//!
//! SQLite storage for outlets, orders, ledgers and shifts, using sqlx for
//! async access.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bistro POS Data Flow                             │
//! │                                                                         │
//! │  OrderService / ShiftService (bistro-service)                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     bistro-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ CatalogRepo   │    │              │  │   │
//! │  │   │ UnitOfWork ───┼───►│ OrderRepo     │    │ 001_initial  │  │   │
//! │  │   │ Session    ───┼───►│ LedgerRepo    │    │  _schema.sql │  │   │
//! │  │   │               │    │ ShiftRepo     │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL, foreign keys on)                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bistro_db::{Database, DbConfig, Repositories};
//!
//! let db = Database::new(DbConfig::new("bistro.db")).await?;
//!
//! let mut uow = db.begin().await?;
//! let seq = uow.orders().next_sequence("20240309").await?;
//! uow.orders().insert(&order).await?;
//! uow.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
pub(crate) mod test_support;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, ACTIVE_ORDER_PER_TABLE, OPEN_SHIFT_PER_CASHIER};
pub use pool::{Database, DbConfig, Session, UnitOfWork};
pub use repository::{
    CatalogRepository, LedgerRepository, OrderRepository, Repositories, ShiftRepository,
};

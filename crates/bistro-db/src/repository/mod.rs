//! # Repository Module
//!
//! Database repository implementations for Bistro POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  OrderService::send_to_kitchen                                          │
//! │       │                                                                 │
//! │       │  let mut uow = db.begin().await?;                               │
//! │       │  uow.orders().get_by_id(id)                                     │
//! │       │  uow.orders().update(&order)                                    │
//! │       │  uow.orders().update_item(&item) ...                            │
//! │       │  uow.commit()                                                   │
//! │       ▼                                                                 │
//! │  OrderRepository<'c>  ── borrows the unit of work's connection          │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories borrow a connection instead of owning the pool, so every
//! read and write of one operation goes through the same transaction.
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`] - outlets, staff, dining tables, menu items
//! - [`OrderRepository`] - orders, order items, daily order sequence
//! - [`LedgerRepository`] - payments, voids, refunds
//! - [`ShiftRepository`] - cashier shifts

use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;

use bistro_core::{Money, Rate};

pub mod catalog;
pub mod ledger;
pub mod order;
pub mod shift;

pub use catalog::CatalogRepository;
pub use ledger::LedgerRepository;
pub use order::OrderRepository;
pub use shift::ShiftRepository;

/// Anything that can lend a SQLite connection to the repositories.
pub trait Repositories {
    fn connection(&mut self) -> &mut SqliteConnection;

    fn catalog(&mut self) -> CatalogRepository<'_> {
        CatalogRepository::new(self.connection())
    }

    fn orders(&mut self) -> OrderRepository<'_> {
        OrderRepository::new(self.connection())
    }

    fn ledger(&mut self) -> LedgerRepository<'_> {
        LedgerRepository::new(self.connection())
    }

    fn shifts(&mut self) -> ShiftRepository<'_> {
        ShiftRepository::new(self.connection())
    }
}

// =============================================================================
// Row helpers
// =============================================================================

pub(crate) fn money(row: &SqliteRow, column: &str) -> Result<Money, sqlx::Error> {
    Ok(Money::from_cents(row.try_get::<i64, _>(column)?))
}

pub(crate) fn money_opt(row: &SqliteRow, column: &str) -> Result<Option<Money>, sqlx::Error> {
    Ok(row.try_get::<Option<i64>, _>(column)?.map(Money::from_cents))
}

pub(crate) fn rate(row: &SqliteRow, column: &str) -> Result<Rate, sqlx::Error> {
    let bps: i64 = row.try_get(column)?;
    let bps = u32::try_from(bps).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })?;
    Ok(Rate::from_bps(bps))
}

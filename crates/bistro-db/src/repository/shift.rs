//! # Shift Repository
//!
//! Cashier shifts. The partial unique index
//! `idx_shifts_one_open_per_cashier` backs the one-open-shift rule, so a racing
//! second `insert` fails with a unique violation on `shifts.cashier_id`.

use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;
use tracing::debug;

use super::{money, money_opt};
use crate::error::{DbError, DbResult};
use bistro_core::types::{Page, PageRequest};
use bistro_core::Shift;

/// Repository for shifts.
#[derive(Debug)]
pub struct ShiftRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> ShiftRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        ShiftRepository { conn }
    }

    pub async fn insert(&mut self, shift: &Shift) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO shifts (
                id, outlet_id, cashier_id, status, starting_cash_cents, ending_cash_cents,
                expected_cash_cents, variance_cents, opened_at, closed_at, notes
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&shift.id)
        .bind(&shift.outlet_id)
        .bind(&shift.cashier_id)
        .bind(shift.status)
        .bind(shift.starting_cash.cents())
        .bind(shift.ending_cash.map(|m| m.cents()))
        .bind(shift.expected_cash.map(|m| m.cents()))
        .bind(shift.variance.map(|m| m.cents()))
        .bind(shift.opened_at)
        .bind(shift.closed_at)
        .bind(&shift.notes)
        .execute(&mut *self.conn)
        .await?;

        debug!(shift_id = %shift.id, cashier_id = %shift.cashier_id, "Shift inserted");
        Ok(())
    }

    pub async fn get_by_id(&mut self, id: &str) -> DbResult<Option<Shift>> {
        let row = sqlx::query("SELECT * FROM shifts WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row.map(|r| map_shift(&r)).transpose()?)
    }

    /// The cashier's OPEN shift, if any.
    pub async fn find_open_for_cashier(&mut self, cashier_id: &str) -> DbResult<Option<Shift>> {
        let row = sqlx::query("SELECT * FROM shifts WHERE cashier_id = ?1 AND status = 'OPEN'")
            .bind(cashier_id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row.map(|r| map_shift(&r)).transpose()?)
    }

    /// Freezes a shift as CLOSED.
    ///
    /// Guarded on `status = 'OPEN'` so a shift closes exactly once.
    pub async fn close(&mut self, shift: &Shift) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE shifts SET
                status = 'CLOSED',
                ending_cash_cents = ?1,
                expected_cash_cents = ?2,
                variance_cents = ?3,
                closed_at = ?4,
                notes = ?5
            WHERE id = ?6 AND status = 'OPEN'
            "#,
        )
        .bind(shift.ending_cash.map(|m| m.cents()))
        .bind(shift.expected_cash.map(|m| m.cents()))
        .bind(shift.variance.map(|m| m.cents()))
        .bind(shift.closed_at)
        .bind(&shift.notes)
        .bind(&shift.id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Open shift", &shift.id));
        }
        debug!(shift_id = %shift.id, "Shift closed");
        Ok(())
    }

    /// Newest-first page of an outlet's shifts.
    pub async fn list_for_outlet(
        &mut self,
        outlet_id: &str,
        page: PageRequest,
    ) -> DbResult<Page<Shift>> {
        let total_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shifts WHERE outlet_id = ?1")
            .bind(outlet_id)
            .fetch_one(&mut *self.conn)
            .await?;

        let rows = sqlx::query(
            "SELECT * FROM shifts WHERE outlet_id = ?1 ORDER BY opened_at DESC LIMIT ?2 OFFSET ?3",
        )
        .bind(outlet_id)
        .bind(i64::from(page.page_size))
        .bind(page.offset())
        .fetch_all(&mut *self.conn)
        .await?;

        Ok(Page {
            items: rows.iter().map(map_shift).collect::<Result<_, _>>()?,
            total_count,
            page: page.page,
            page_size: page.page_size,
        })
    }
}

fn map_shift(row: &SqliteRow) -> Result<Shift, sqlx::Error> {
    Ok(Shift {
        id: row.try_get("id")?,
        outlet_id: row.try_get("outlet_id")?,
        cashier_id: row.try_get("cashier_id")?,
        status: row.try_get("status")?,
        starting_cash: money(row, "starting_cash_cents")?,
        ending_cash: money_opt(row, "ending_cash_cents")?,
        expected_cash: money_opt(row, "expected_cash_cents")?,
        variance: money_opt(row, "variance_cents")?,
        opened_at: row.try_get("opened_at")?,
        closed_at: row.try_get("closed_at")?,
        notes: row.try_get("notes")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Repositories;
    use crate::test_support::seed_catalog;
    use crate::{Database, DbConfig};
    use bistro_core::{Money, ShiftStatus};
    use chrono::Utc;

    fn open_shift(id: &str) -> Shift {
        Shift {
            id: id.into(),
            outlet_id: "out-1".into(),
            cashier_id: "c-1".into(),
            status: ShiftStatus::Open,
            starting_cash: Money::from_cents(100_000),
            ending_cash: None,
            expected_cash: None,
            variance: None,
            opened_at: Utc::now(),
            closed_at: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_one_open_shift_per_cashier() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_catalog(&db).await;
        let mut uow = db.begin().await.unwrap();

        uow.shifts().insert(&open_shift("sh-1")).await.unwrap();
        let err = uow.shifts().insert(&open_shift("sh-2")).await.unwrap_err();
        assert!(err.is_unique_violation_on(crate::error::OPEN_SHIFT_PER_CASHIER), "{err:?}");

        let open = uow.shifts().find_open_for_cashier("c-1").await.unwrap();
        assert_eq!(open.map(|s| s.id), Some("sh-1".to_string()));
    }

    #[tokio::test]
    async fn test_close_freezes_once() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed_catalog(&db).await;
        let mut uow = db.begin().await.unwrap();

        let mut shift = open_shift("sh-1");
        uow.shifts().insert(&shift).await.unwrap();

        shift.status = ShiftStatus::Closed;
        shift.ending_cash = Some(Money::from_cents(150_000));
        shift.expected_cash = Some(Money::from_cents(145_000));
        shift.variance = Some(Money::from_cents(5_000));
        shift.closed_at = Some(Utc::now());
        uow.shifts().close(&shift).await.unwrap();
        assert!(uow.shifts().close(&shift).await.is_err());

        let stored = uow.shifts().get_by_id("sh-1").await.unwrap().unwrap();
        assert_eq!(stored.status, ShiftStatus::Closed);
        assert_eq!(stored.variance, Some(Money::from_cents(5_000)));
        assert!(uow.shifts().find_open_for_cashier("c-1").await.unwrap().is_none());

        // a closed shift no longer blocks a new one
        uow.shifts().insert(&open_shift("sh-2")).await.unwrap();
        let page = uow
            .shifts()
            .list_for_outlet("out-1", PageRequest::new(1, 10))
            .await
            .unwrap();
        assert_eq!(page.total_count, 2);
    }
}

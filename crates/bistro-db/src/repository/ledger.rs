//! # Ledger Repository
//!
//! Append-only money records hanging off an order: payments, voids and
//! refunds. There are no update or delete statements in this file.

use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;
use tracing::debug;

use super::money;
use crate::error::DbResult;
use bistro_core::{Payment, Refund, Void};

/// Repository for payments, voids and refunds.
#[derive(Debug)]
pub struct LedgerRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> LedgerRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        LedgerRepository { conn }
    }

    // -------------------------------------------------------------------------
    // Payments
    // -------------------------------------------------------------------------

    pub async fn insert_payment(&mut self, payment: &Payment) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                id, order_id, method, amount_cents, change_cents, reference, processed_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&payment.id)
        .bind(&payment.order_id)
        .bind(payment.method)
        .bind(payment.amount.cents())
        .bind(payment.change_given.cents())
        .bind(&payment.reference)
        .bind(&payment.processed_by)
        .bind(payment.created_at)
        .execute(&mut *self.conn)
        .await?;

        debug!(
            payment_id = %payment.id,
            order_id = %payment.order_id,
            amount = %payment.amount,
            "Payment recorded"
        );
        Ok(())
    }

    pub async fn list_payments(&mut self, order_id: &str) -> DbResult<Vec<Payment>> {
        let rows = sqlx::query("SELECT * FROM payments WHERE order_id = ?1 ORDER BY created_at, rowid")
            .bind(order_id)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows.iter().map(map_payment).collect::<Result<_, _>>()?)
    }

    /// Payments on every order linked to a shift.
    pub async fn list_payments_for_shift(&mut self, shift_id: &str) -> DbResult<Vec<Payment>> {
        let rows = sqlx::query(
            r#"
            SELECT p.* FROM payments p
            JOIN orders o ON o.id = p.order_id
            WHERE o.shift_id = ?1
            ORDER BY p.created_at, p.rowid
            "#,
        )
        .bind(shift_id)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows.iter().map(map_payment).collect::<Result<_, _>>()?)
    }

    // -------------------------------------------------------------------------
    // Voids
    // -------------------------------------------------------------------------

    pub async fn insert_void(&mut self, void: &Void) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO voids (
                id, order_id, order_item_id, reason, amount_cents, voided_by, approved_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&void.id)
        .bind(&void.order_id)
        .bind(&void.order_item_id)
        .bind(&void.reason)
        .bind(void.amount.cents())
        .bind(&void.voided_by)
        .bind(&void.approved_by)
        .bind(void.created_at)
        .execute(&mut *self.conn)
        .await?;

        debug!(void_id = %void.id, order_id = %void.order_id, "Void recorded");
        Ok(())
    }

    pub async fn list_voids(&mut self, order_id: &str) -> DbResult<Vec<Void>> {
        let rows = sqlx::query("SELECT * FROM voids WHERE order_id = ?1 ORDER BY created_at, rowid")
            .bind(order_id)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows.iter().map(map_void).collect::<Result<_, _>>()?)
    }

    pub async fn list_voids_for_shift(&mut self, shift_id: &str) -> DbResult<Vec<Void>> {
        let rows = sqlx::query(
            r#"
            SELECT v.* FROM voids v
            JOIN orders o ON o.id = v.order_id
            WHERE o.shift_id = ?1
            ORDER BY v.created_at, v.rowid
            "#,
        )
        .bind(shift_id)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows.iter().map(map_void).collect::<Result<_, _>>()?)
    }

    // -------------------------------------------------------------------------
    // Refunds
    // -------------------------------------------------------------------------

    pub async fn insert_refund(&mut self, refund: &Refund) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO refunds (
                id, order_id, method, amount_cents, reason, processed_by, approved_by, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&refund.id)
        .bind(&refund.order_id)
        .bind(refund.method)
        .bind(refund.amount.cents())
        .bind(&refund.reason)
        .bind(&refund.processed_by)
        .bind(&refund.approved_by)
        .bind(refund.created_at)
        .execute(&mut *self.conn)
        .await?;

        debug!(refund_id = %refund.id, order_id = %refund.order_id, "Refund recorded");
        Ok(())
    }

    pub async fn list_refunds(&mut self, order_id: &str) -> DbResult<Vec<Refund>> {
        let rows = sqlx::query("SELECT * FROM refunds WHERE order_id = ?1 ORDER BY created_at, rowid")
            .bind(order_id)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows.iter().map(map_refund).collect::<Result<_, _>>()?)
    }

    pub async fn list_refunds_for_shift(&mut self, shift_id: &str) -> DbResult<Vec<Refund>> {
        let rows = sqlx::query(
            r#"
            SELECT r.* FROM refunds r
            JOIN orders o ON o.id = r.order_id
            WHERE o.shift_id = ?1
            ORDER BY r.created_at, r.rowid
            "#,
        )
        .bind(shift_id)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows.iter().map(map_refund).collect::<Result<_, _>>()?)
    }
}

fn map_payment(row: &SqliteRow) -> Result<Payment, sqlx::Error> {
    Ok(Payment {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        method: row.try_get("method")?,
        amount: money(row, "amount_cents")?,
        change_given: money(row, "change_cents")?,
        reference: row.try_get("reference")?,
        processed_by: row.try_get("processed_by")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_void(row: &SqliteRow) -> Result<Void, sqlx::Error> {
    Ok(Void {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        order_item_id: row.try_get("order_item_id")?,
        reason: row.try_get("reason")?,
        amount: money(row, "amount_cents")?,
        voided_by: row.try_get("voided_by")?,
        approved_by: row.try_get("approved_by")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_refund(row: &SqliteRow) -> Result<Refund, sqlx::Error> {
    Ok(Refund {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        method: row.try_get("method")?,
        amount: money(row, "amount_cents")?,
        reason: row.try_get("reason")?,
        processed_by: row.try_get("processed_by")?,
        approved_by: row.try_get("approved_by")?,
        created_at: row.try_get("created_at")?,
    })
}

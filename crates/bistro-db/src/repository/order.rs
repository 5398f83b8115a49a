//! # Order Repository
//!
//! Orders, their items and the daily order-number sequence.
//!
//! ## Order Lifecycle (storage view)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. CREATE                                                              │
//! │     └── next_sequence(day) → insert() → Order { status: OPEN }          │
//! │                                                                         │
//! │  2. MUTATE (same unit of work each time)                                │
//! │     └── insert_item() / update_item() / delete_item()                   │
//! │     └── update()  ← totals, status, notes, guest references             │
//! │                                                                         │
//! │  3. TERMINAL                                                            │
//! │     └── update() → PAID / CANCELLED / VOID                              │
//! │         the partial unique index on table_id releases the table         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};
use tracing::debug;

use super::money;
use crate::error::{DbError, DbResult};
use bistro_core::types::{OrderFilter, Page, PageRequest};
use bistro_core::{Order, OrderItem, OrderStatus};

/// Repository for orders and order items.
#[derive(Debug)]
pub struct OrderRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> OrderRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        OrderRepository { conn }
    }

    // -------------------------------------------------------------------------
    // Order numbers
    // -------------------------------------------------------------------------

    /// Claims the next sequence number for `day` (`YYYYMMDD`), starting at 1.
    ///
    /// Runs as a single upsert so two creates in the same day never share a
    /// number.
    pub async fn next_sequence(&mut self, day: &str) -> DbResult<u32> {
        let seq: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO order_sequences (day, last_seq) VALUES (?1, 1)
            ON CONFLICT(day) DO UPDATE SET last_seq = last_seq + 1
            RETURNING last_seq
            "#,
        )
        .bind(day)
        .fetch_one(&mut *self.conn)
        .await?;

        u32::try_from(seq).map_err(|_| DbError::QueryFailed(format!("sequence overflow on {day}")))
    }

    // -------------------------------------------------------------------------
    // Orders
    // -------------------------------------------------------------------------

    pub async fn insert(&mut self, order: &Order) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, outlet_id, server_id, table_id, booking_id, guest_id,
                shift_id, status, subtotal_cents, tax_cents, service_charge_cents,
                discount_cents, tip_cents, total_cents, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)
            "#,
        )
        .bind(&order.id)
        .bind(&order.order_number)
        .bind(&order.outlet_id)
        .bind(&order.server_id)
        .bind(&order.table_id)
        .bind(&order.booking_id)
        .bind(&order.guest_id)
        .bind(&order.shift_id)
        .bind(order.status)
        .bind(order.subtotal.cents())
        .bind(order.tax_amount.cents())
        .bind(order.service_charge.cents())
        .bind(order.discount_amount.cents())
        .bind(order.tip_amount.cents())
        .bind(order.total.cents())
        .bind(&order.notes)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *self.conn)
        .await?;

        debug!(order_id = %order.id, order_number = %order.order_number, "Order inserted");
        Ok(())
    }

    pub async fn get_by_id(&mut self, id: &str) -> DbResult<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row.map(|r| map_order(&r)).transpose()?)
    }

    pub async fn get_by_number(&mut self, order_number: &str) -> DbResult<Option<Order>> {
        let row = sqlx::query("SELECT * FROM orders WHERE order_number = ?1")
            .bind(order_number)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row.map(|r| map_order(&r)).transpose()?)
    }

    /// Writes every mutable column of an order.
    pub async fn update(&mut self, order: &Order) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                booking_id = ?1,
                guest_id = ?2,
                status = ?3,
                subtotal_cents = ?4,
                tax_cents = ?5,
                service_charge_cents = ?6,
                discount_cents = ?7,
                tip_cents = ?8,
                total_cents = ?9,
                notes = ?10,
                updated_at = ?11
            WHERE id = ?12
            "#,
        )
        .bind(&order.booking_id)
        .bind(&order.guest_id)
        .bind(order.status)
        .bind(order.subtotal.cents())
        .bind(order.tax_amount.cents())
        .bind(order.service_charge.cents())
        .bind(order.discount_amount.cents())
        .bind(order.tip_amount.cents())
        .bind(order.total.cents())
        .bind(&order.notes)
        .bind(order.updated_at)
        .bind(&order.id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", &order.id));
        }
        debug!(order_id = %order.id, status = %order.status, total = %order.total, "Order updated");
        Ok(())
    }

    /// The non-terminal order on a table, if any.
    pub async fn find_active_for_table(&mut self, table_id: &str) -> DbResult<Option<Order>> {
        let row = sqlx::query(
            r#"
            SELECT * FROM orders
            WHERE table_id = ?1
              AND status IN ('OPEN', 'SENT_TO_KITCHEN', 'IN_PROGRESS', 'READY', 'SERVED')
            LIMIT 1
            "#,
        )
        .bind(table_id)
        .fetch_optional(&mut *self.conn)
        .await?;
        Ok(row.map(|r| map_order(&r)).transpose()?)
    }

    pub async fn list_for_shift(&mut self, shift_id: &str) -> DbResult<Vec<Order>> {
        let rows = sqlx::query("SELECT * FROM orders WHERE shift_id = ?1 ORDER BY created_at")
            .bind(shift_id)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows.iter().map(map_order).collect::<Result<_, _>>()?)
    }

    /// Filtered, newest-first page of orders.
    pub async fn list(&mut self, filter: &OrderFilter, page: PageRequest) -> DbResult<Page<Order>> {
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM orders WHERE 1 = 1");
        push_filter(&mut count, filter);
        let total_count: i64 = count
            .build_query_scalar()
            .fetch_one(&mut *self.conn)
            .await?;

        let mut select = QueryBuilder::<Sqlite>::new("SELECT * FROM orders WHERE 1 = 1");
        push_filter(&mut select, filter);
        select
            .push(" ORDER BY created_at DESC, order_number DESC LIMIT ")
            .push_bind(i64::from(page.page_size))
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows = select.build().fetch_all(&mut *self.conn).await?;

        Ok(Page {
            items: rows.iter().map(map_order).collect::<Result<_, _>>()?,
            total_count,
            page: page.page,
            page_size: page.page_size,
        })
    }

    // -------------------------------------------------------------------------
    // Items
    // -------------------------------------------------------------------------

    pub async fn insert_item(&mut self, item: &OrderItem) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, menu_item_id, name_snapshot, quantity, unit_price_cents,
                modifiers, notes, status, sent_to_kitchen_at, prepared_at, served_at,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&item.id)
        .bind(&item.order_id)
        .bind(&item.menu_item_id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.unit_price.cents())
        .bind(&item.modifiers)
        .bind(&item.notes)
        .bind(item.status)
        .bind(item.sent_to_kitchen_at)
        .bind(item.prepared_at)
        .bind(item.served_at)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    pub async fn get_item(&mut self, id: &str) -> DbResult<Option<OrderItem>> {
        let row = sqlx::query("SELECT * FROM order_items WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row.map(|r| map_item(&r)).transpose()?)
    }

    pub async fn list_items(&mut self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let rows = sqlx::query(
            "SELECT * FROM order_items WHERE order_id = ?1 ORDER BY created_at, rowid",
        )
        .bind(order_id)
        .fetch_all(&mut *self.conn)
        .await?;
        Ok(rows.iter().map(map_item).collect::<Result<_, _>>()?)
    }

    /// Writes quantity, notes, status and kitchen timestamps.
    ///
    /// The unit price snapshot is never rewritten.
    pub async fn update_item(&mut self, item: &OrderItem) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE order_items SET
                quantity = ?1,
                modifiers = ?2,
                notes = ?3,
                status = ?4,
                sent_to_kitchen_at = ?5,
                prepared_at = ?6,
                served_at = ?7,
                updated_at = ?8
            WHERE id = ?9
            "#,
        )
        .bind(item.quantity)
        .bind(&item.modifiers)
        .bind(&item.notes)
        .bind(item.status)
        .bind(item.sent_to_kitchen_at)
        .bind(item.prepared_at)
        .bind(item.served_at)
        .bind(item.updated_at)
        .bind(&item.id)
        .execute(&mut *self.conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order item", &item.id));
        }
        Ok(())
    }

    /// Deletes an item row. Only PENDING items are ever deleted.
    pub async fn delete_item(&mut self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM order_items WHERE id = ?1 AND status = 'PENDING'")
            .bind(id)
            .execute(&mut *self.conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Pending order item", id));
        }
        debug!(item_id = %id, "Order item deleted");
        Ok(())
    }
}

fn push_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &OrderFilter) {
    if let Some(outlet_id) = &filter.outlet_id {
        builder.push(" AND outlet_id = ").push_bind(outlet_id.clone());
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(from) = filter.created_from {
        builder.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.created_to {
        builder.push(" AND created_at < ").push_bind(to);
    }
}

pub(crate) fn map_order(row: &SqliteRow) -> Result<Order, sqlx::Error> {
    Ok(Order {
        id: row.try_get("id")?,
        order_number: row.try_get("order_number")?,
        outlet_id: row.try_get("outlet_id")?,
        server_id: row.try_get("server_id")?,
        table_id: row.try_get("table_id")?,
        booking_id: row.try_get("booking_id")?,
        guest_id: row.try_get("guest_id")?,
        shift_id: row.try_get("shift_id")?,
        status: row.try_get::<OrderStatus, _>("status")?,
        subtotal: money(row, "subtotal_cents")?,
        tax_amount: money(row, "tax_cents")?,
        service_charge: money(row, "service_charge_cents")?,
        discount_amount: money(row, "discount_cents")?,
        tip_amount: money(row, "tip_cents")?,
        total: money(row, "total_cents")?,
        notes: row.try_get("notes")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn map_item(row: &SqliteRow) -> Result<OrderItem, sqlx::Error> {
    Ok(OrderItem {
        id: row.try_get("id")?,
        order_id: row.try_get("order_id")?,
        menu_item_id: row.try_get("menu_item_id")?,
        name: row.try_get("name_snapshot")?,
        quantity: row.try_get("quantity")?,
        unit_price: money(row, "unit_price_cents")?,
        modifiers: row.try_get("modifiers")?,
        notes: row.try_get("notes")?,
        status: row.try_get("status")?,
        sent_to_kitchen_at: row.try_get("sent_to_kitchen_at")?,
        prepared_at: row.try_get("prepared_at")?,
        served_at: row.try_get("served_at")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

//! # Catalog Repository
//!
//! Outlets, staff, dining tables and menu items. Orders only read these,
//! except for table status which follows the order lifecycle.

use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnection, SqliteRow};
use sqlx::Row;
use tracing::debug;

use super::{money, rate};
use crate::error::{DbError, DbResult};
use bistro_core::validation::validate_rate_bps;
use bistro_core::{DiningTable, MenuItem, Outlet, Staff, TableStatus};

/// Repository for catalog entities.
#[derive(Debug)]
pub struct CatalogRepository<'c> {
    conn: &'c mut SqliteConnection,
}

impl<'c> CatalogRepository<'c> {
    pub fn new(conn: &'c mut SqliteConnection) -> Self {
        CatalogRepository { conn }
    }

    // -------------------------------------------------------------------------
    // Outlets
    // -------------------------------------------------------------------------

    /// Rates above 10000 bps are refused before the insert.
    pub async fn insert_outlet(&mut self, outlet: &Outlet) -> DbResult<()> {
        validate_rate_bps("tax_rate", outlet.tax_rate.bps())?;
        validate_rate_bps("service_charge_rate", outlet.service_charge_rate.bps())?;

        sqlx::query(
            r#"
            INSERT INTO outlets (
                id, property_id, name, is_active,
                tax_rate_bps, service_charge_bps, warehouse_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&outlet.id)
        .bind(&outlet.property_id)
        .bind(&outlet.name)
        .bind(outlet.is_active)
        .bind(i64::from(outlet.tax_rate.bps()))
        .bind(i64::from(outlet.service_charge_rate.bps()))
        .bind(&outlet.warehouse_id)
        .bind(outlet.created_at)
        .execute(&mut *self.conn)
        .await?;

        debug!(outlet_id = %outlet.id, "Outlet inserted");
        Ok(())
    }

    pub async fn get_outlet(&mut self, id: &str) -> DbResult<Option<Outlet>> {
        let row = sqlx::query("SELECT * FROM outlets WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row.map(|r| map_outlet(&r)).transpose()?)
    }

    // -------------------------------------------------------------------------
    // Staff
    // -------------------------------------------------------------------------

    pub async fn insert_staff(&mut self, staff: &Staff) -> DbResult<()> {
        sqlx::query("INSERT INTO staff (id, name, role, is_active) VALUES (?1, ?2, ?3, ?4)")
            .bind(&staff.id)
            .bind(&staff.name)
            .bind(staff.role)
            .bind(staff.is_active)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }

    pub async fn get_staff(&mut self, id: &str) -> DbResult<Option<Staff>> {
        let row = sqlx::query("SELECT id, name, role, is_active FROM staff WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;

        let staff = row
            .map(|r| -> Result<Staff, sqlx::Error> {
                Ok(Staff {
                    id: r.try_get("id")?,
                    name: r.try_get("name")?,
                    role: r.try_get("role")?,
                    is_active: r.try_get("is_active")?,
                })
            })
            .transpose()?;
        Ok(staff)
    }

    // -------------------------------------------------------------------------
    // Dining tables
    // -------------------------------------------------------------------------

    pub async fn insert_table(&mut self, table: &DiningTable) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO dining_tables (id, outlet_id, label, capacity, status, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&table.id)
        .bind(&table.outlet_id)
        .bind(&table.label)
        .bind(table.capacity)
        .bind(table.status)
        .bind(table.updated_at)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    pub async fn get_table(&mut self, id: &str) -> DbResult<Option<DiningTable>> {
        let row = sqlx::query("SELECT * FROM dining_tables WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;
        Ok(row.map(|r| map_table(&r)).transpose()?)
    }

    pub async fn list_tables(&mut self, outlet_id: &str) -> DbResult<Vec<DiningTable>> {
        let rows = sqlx::query("SELECT * FROM dining_tables WHERE outlet_id = ?1 ORDER BY label")
            .bind(outlet_id)
            .fetch_all(&mut *self.conn)
            .await?;
        Ok(rows.iter().map(map_table).collect::<Result<_, _>>()?)
    }

    /// Writes a table status without checking the table state machine.
    pub async fn set_table_status(
        &mut self,
        id: &str,
        status: TableStatus,
        at: DateTime<Utc>,
    ) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE dining_tables SET status = ?1, updated_at = ?2 WHERE id = ?3")
                .bind(status)
                .bind(at)
                .bind(id)
                .execute(&mut *self.conn)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Table", id));
        }
        debug!(table_id = %id, status = %status, "Table status written");
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Menu items
    // -------------------------------------------------------------------------

    pub async fn insert_menu_item(&mut self, item: &MenuItem) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO menu_items (id, property_id, name, price_cents, is_available, unavailable_reason)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&item.id)
        .bind(&item.property_id)
        .bind(&item.name)
        .bind(item.price.cents())
        .bind(item.is_available)
        .bind(&item.unavailable_reason)
        .execute(&mut *self.conn)
        .await?;
        Ok(())
    }

    pub async fn get_menu_item(&mut self, id: &str) -> DbResult<Option<MenuItem>> {
        let row = sqlx::query("SELECT * FROM menu_items WHERE id = ?1")
            .bind(id)
            .fetch_optional(&mut *self.conn)
            .await?;

        let item = row
            .map(|r| -> Result<MenuItem, sqlx::Error> {
                Ok(MenuItem {
                    id: r.try_get("id")?,
                    property_id: r.try_get("property_id")?,
                    name: r.try_get("name")?,
                    price: money(&r, "price_cents")?,
                    is_available: r.try_get("is_available")?,
                    unavailable_reason: r.try_get("unavailable_reason")?,
                })
            })
            .transpose()?;
        Ok(item)
    }

    /// Marks a menu item (un)available, e.g. after a stock refresh.
    pub async fn set_menu_item_availability(
        &mut self,
        id: &str,
        is_available: bool,
        reason: Option<&str>,
    ) -> DbResult<()> {
        sqlx::query("UPDATE menu_items SET is_available = ?1, unavailable_reason = ?2 WHERE id = ?3")
            .bind(is_available)
            .bind(reason)
            .bind(id)
            .execute(&mut *self.conn)
            .await?;
        Ok(())
    }
}

fn map_outlet(row: &SqliteRow) -> Result<Outlet, sqlx::Error> {
    Ok(Outlet {
        id: row.try_get("id")?,
        property_id: row.try_get("property_id")?,
        name: row.try_get("name")?,
        is_active: row.try_get("is_active")?,
        tax_rate: rate(row, "tax_rate_bps")?,
        service_charge_rate: rate(row, "service_charge_bps")?,
        warehouse_id: row.try_get("warehouse_id")?,
        created_at: row.try_get("created_at")?,
    })
}

fn map_table(row: &SqliteRow) -> Result<DiningTable, sqlx::Error> {
    Ok(DiningTable {
        id: row.try_get("id")?,
        outlet_id: row.try_get("outlet_id")?,
        label: row.try_get("label")?,
        capacity: row.try_get("capacity")?,
        status: row.try_get("status")?,
        updated_at: row.try_get("updated_at")?,
    })
}

//! User-driven table status changes.
//!
//! Orders move tables to OCCUPIED and DIRTY themselves without consulting the
//! table state machine. Staff changes made here always go through it.

use chrono::Utc;
use tracing::info;

use bistro_core::validation::validate_required;
use bistro_core::{DiningTable, Lifecycle, TableStatus};
use bistro_db::{Database, Repositories};

use crate::context::Actor;
use crate::error::{ApiError, ApiResult};

#[derive(Clone)]
pub struct TableService {
    db: Database,
}

impl TableService {
    pub fn new(db: Database) -> Self {
        TableService { db }
    }

    /// Moves a table to `status` if the table state machine allows it.
    ///
    /// A table with an active order cannot be made AVAILABLE, RESERVED or
    /// OUT_OF_SERVICE.
    pub async fn change_status(
        &self,
        actor: &Actor,
        table_id: &str,
        status: TableStatus,
    ) -> ApiResult<DiningTable> {
        validate_required("table_id", table_id)?;

        let mut uow = self.db.begin().await?;
        let mut table = uow
            .catalog()
            .get_table(table_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Table", table_id))?;

        table.status.ensure_transition(status)?;
        if status != TableStatus::Occupied && status != TableStatus::Dirty {
            if let Some(order) = uow.orders().find_active_for_table(&table.id).await? {
                return Err(ApiError::business(format!(
                    "Table {} has an active order ({})",
                    table.label, order.order_number
                )));
            }
        }

        let now = Utc::now();
        uow.catalog().set_table_status(&table.id, status, now).await?;
        uow.commit().await?;

        info!(
            table_id = %table.id,
            from = %table.status,
            to = %status,
            actor = %actor.user_id,
            "Table status changed"
        );
        table.status = status;
        table.updated_at = now;
        Ok(table)
    }

    pub async fn list_tables(&self, outlet_id: &str) -> ApiResult<Vec<DiningTable>> {
        validate_required("outlet_id", outlet_id)?;
        let mut session = self.db.acquire().await?;
        Ok(session.catalog().list_tables(outlet_id).await?)
    }
}

//! # bistro-service: Order and Shift Orchestration
//!
//! The layer callers talk to. It ties the pure rules in `bistro-core` to the
//! storage in `bistro-db` and to the hotel's external systems.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  caller ── Actor + request ──► OrderService / ShiftService / TableService│
//! │                                    │                                    │
//! │                   ┌────────────────┼──────────────────┐                │
//! │                   ▼                ▼                  ▼                │
//! │            bistro-core        UnitOfWork        collaborators          │
//! │            (validate,         (one tx per       BookingFolio           │
//! │             transition,        operation)       PinVerifier            │
//! │             totals)                             InventoryRefresher     │
//! │                                    │                                    │
//! │  caller ◄── Result<T, ApiError> ───┘                                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! let config = PosConfig::load(None)?;
//! telemetry::init_tracing(&config.logging.filter);
//!
//! let pos = Bistro::connect(&config, folio, pins, inventory).await?;
//! let order = pos.orders.create_order(&actor, request).await?;
//! ```

pub mod approval;
pub mod collaborators;
pub mod config;
pub mod context;
pub mod error;
pub mod orders;
pub mod payments;
pub mod shifts;
pub mod tables;
pub mod telemetry;

pub use approval::{Approval, ApprovalGate};
pub use collaborators::{
    BookingFolio, BookingInfo, CollaboratorError, InventoryRefresher, NoopInventory,
    PinVerification, PinVerifier,
};
pub use config::PosConfig;
pub use context::Actor;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use orders::{AddItemRequest, CreateOrderRequest, CustomerAssignment, OrderService, VoidReceipt};
pub use payments::PaymentReceipt;
pub use shifts::ShiftService;
pub use tables::TableService;

use std::sync::Arc;

use bistro_db::Database;
use tracing::info;

/// All services over one database.
#[derive(Clone)]
pub struct Bistro {
    pub db: Database,
    pub orders: OrderService,
    pub shifts: ShiftService,
    pub tables: TableService,
}

impl Bistro {
    /// Wires services over an existing database.
    pub fn new(
        db: Database,
        config: &PosConfig,
        folio: Arc<dyn BookingFolio>,
        pins: Arc<dyn PinVerifier>,
        inventory: Arc<dyn InventoryRefresher>,
    ) -> Self {
        let gate = ApprovalGate::new(pins);
        Bistro {
            orders: OrderService::new(
                db.clone(),
                gate,
                folio,
                inventory,
                config.orders.clone(),
            ),
            shifts: ShiftService::new(db.clone(), config.orders.clone()),
            tables: TableService::new(db.clone()),
            db,
        }
    }

    /// Opens the configured database (running migrations) and wires services.
    pub async fn connect(
        config: &PosConfig,
        folio: Arc<dyn BookingFolio>,
        pins: Arc<dyn PinVerifier>,
        inventory: Arc<dyn InventoryRefresher>,
    ) -> ApiResult<Self> {
        let db = Database::new(config.database.to_db_config()).await?;
        info!(path = %config.database.path.display(), "Bistro services ready");
        Ok(Self::new(db, config, folio, pins, inventory))
    }
}

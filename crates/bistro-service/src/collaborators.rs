//! # External Collaborators
//!
//! Systems the POS talks to but does not own. Each is a trait object so the
//! hotel application can plug in its own implementation and tests can plug in
//! fakes.
//!
//! | Trait | Owner | Used by |
//! |-------|-------|---------|
//! | [`BookingFolio`] | hotel booking module | customer assignment, room charge |
//! | [`PinVerifier`] | identity provider | [`ApprovalGate`](crate::approval::ApprovalGate) |
//! | [`InventoryRefresher`] | inventory module | add item (fire-and-forget) |

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use bistro_core::{BookingStatus, Money};

/// Failure reported by a collaborator.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{service} unavailable: {reason}")]
    Unavailable { service: &'static str, reason: String },

    #[error("{service} rejected the request: {reason}")]
    Rejected { service: &'static str, reason: String },
}

pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

// =============================================================================
// Booking / Folio
// =============================================================================

/// What the POS needs to know about a booking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingInfo {
    pub id: String,
    pub guest_id: String,
    pub status: BookingStatus,
    pub guest_authorized_for_room_charge: bool,
    /// Current balance on the guest folio.
    pub amount_due: Money,
}

#[async_trait]
pub trait BookingFolio: Send + Sync {
    /// Looks up a booking. `Ok(None)` when it does not exist.
    async fn get_booking(&self, booking_id: &str) -> CollaboratorResult<Option<BookingInfo>>;

    /// Posts a charge to the booking's folio, setting its amount due to
    /// `new_amount_due`.
    async fn post_charge(
        &self,
        booking_id: &str,
        amount: Money,
        new_amount_due: Money,
        description: &str,
    ) -> CollaboratorResult<()>;
}

// =============================================================================
// PIN verification
// =============================================================================

/// Outcome of a PIN check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinVerification {
    pub success: bool,
    pub approver_id: Option<String>,
    pub approver_name: Option<String>,
}

impl PinVerification {
    pub fn approved(approver_id: impl Into<String>, approver_name: impl Into<String>) -> Self {
        PinVerification {
            success: true,
            approver_id: Some(approver_id.into()),
            approver_name: Some(approver_name.into()),
        }
    }

    pub fn rejected() -> Self {
        PinVerification {
            success: false,
            approver_id: None,
            approver_name: None,
        }
    }
}

#[async_trait]
pub trait PinVerifier: Send + Sync {
    /// Checks a manager PIN. PIN storage and hashing live behind this call.
    async fn verify_pin(&self, pin: &str) -> CollaboratorResult<PinVerification>;
}

// =============================================================================
// Inventory
// =============================================================================

#[async_trait]
pub trait InventoryRefresher: Send + Sync {
    /// Recomputes availability of a menu item against a warehouse's stock.
    async fn refresh_availability(
        &self,
        menu_item_id: &str,
        warehouse_id: Option<&str>,
    ) -> CollaboratorResult<()>;
}

/// Refresher for deployments without an inventory module.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopInventory;

#[async_trait]
impl InventoryRefresher for NoopInventory {
    async fn refresh_availability(
        &self,
        _menu_item_id: &str,
        _warehouse_id: Option<&str>,
    ) -> CollaboratorResult<()> {
        Ok(())
    }
}

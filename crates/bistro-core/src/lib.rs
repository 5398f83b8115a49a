//! # bistro-core: Pure Business Logic for Bistro POS
//!
//! The restaurant point-of-sale rules for the hotel application: status
//! machines, money arithmetic and the consistency checks that keep order
//! totals, split payments, shift cash and room-charge folios in agreement.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bistro POS Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 bistro-service (orchestrators)                  │   │
//! │  │   OrderService, ShiftService, TableService, ApprovalGate        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ bistro-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────────────┐  │   │
//! │  │   │  money   │ │  status  │ │  totals  │ │ split_payment    │  │   │
//! │  │   │ Money    │ │ Order    │ │ Totals   │ │ reconciliation   │  │   │
//! │  │   │ Rate     │ │ Item     │ │ discount │ │ folio, report    │  │   │
//! │  │   └──────────┘ │ Table    │ └──────────┘ └──────────────────┘  │   │
//! │  │                └──────────┘                                     │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    bistro-db (Database Layer)                   │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - `Money` (two-place decimal) and `Rate` (basis points)
//! - [`status`] - order, item and table state machines
//! - [`totals`] - subtotal / tax / service charge / total derivation
//! - [`reconciliation`] - expected cash and variance
//! - [`split_payment`] - payment line validation and change due
//! - [`folio`] - room-charge arithmetic and booking eligibility
//! - [`report`] - shift report and X-reading aggregation
//! - [`order_number`] - `ORD-YYYYMMDD-NNNN`
//! - [`types`] - domain entities
//! - [`validation`] - input checks
//! - [`error`] - domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use bistro_core::money::{Money, Rate};
//! use bistro_core::totals::{calculate_totals, verify_totals, LineItem};
//!
//! let items = [LineItem::new(2, Money::from_cents(25000))];
//! let totals = calculate_totals(&items, Rate::from_bps(1200), Rate::from_bps(1000), Money::ZERO, Money::ZERO);
//!
//! assert_eq!(totals.total.to_string(), "610.00");
//! assert!(verify_totals(&totals));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod folio;
pub mod money;
pub mod order_number;
pub mod reconciliation;
pub mod report;
pub mod split_payment;
pub mod status;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Rate};
pub use status::{is_valid_transition, ItemStatus, Lifecycle, OrderStatus, TableStatus};
pub use totals::Totals;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Default upper bound for a single line's quantity.
///
/// Catches typing 100 instead of 10. The service layer can lower it via config.
pub const MAX_ITEM_QUANTITY: i64 = 99;

/// Longest accepted free-text field (notes, reasons, modifiers).
pub const MAX_TEXT_LENGTH: usize = 500;

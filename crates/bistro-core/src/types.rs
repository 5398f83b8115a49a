//! # Domain Types
//!
//! Core domain types used throughout Bistro POS.
//!
//! ## Type Map
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog (read by orders)          Ledger (written by orders)           │
//! │  ┌─────────────────┐               ┌─────────────────┐                  │
//! │  │ Outlet          │◄──────────────│ Order           │                  │
//! │  │  tax / svc rate │               │  order_number   │                  │
//! │  ├─────────────────┤               │  status, totals │                  │
//! │  │ DiningTable     │◄── 0..1 ──────│  shift / table  │                  │
//! │  ├─────────────────┤               └──┬───┬───┬───┬──┘                  │
//! │  │ MenuItem        │◄── snapshot ─ OrderItem  │   │                      │
//! │  ├─────────────────┤                   Payment  Void  Refund            │
//! │  │ Staff           │                                                    │
//! │  └─────────────────┘               Shift ◄── 0..1 ── Order              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Monetary fields are `Money` (two-place decimal). The storage layer keeps
//! them as integer cents and converts at the row boundary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::{Money, Rate};
use crate::status::{ItemStatus, OrderStatus, TableStatus};
use crate::totals::Totals;

// =============================================================================
// Staff
// =============================================================================

/// Role of a staff member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffRole {
    Server,
    Cashier,
    Manager,
    Admin,
}

impl StaffRole {
    /// Managers and admins may void and discount without a PIN.
    #[inline]
    pub fn is_manager(self) -> bool {
        matches!(self, StaffRole::Manager | StaffRole::Admin)
    }
}

/// A member of staff (server, cashier or manager).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Staff {
    pub id: String,
    pub name: String,
    pub role: StaffRole,
    pub is_active: bool,
}

// =============================================================================
// Catalog
// =============================================================================

/// A sales point (restaurant, bar) within a property.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Outlet {
    pub id: String,
    /// Property (hotel) this outlet belongs to; menu items are scoped by it.
    pub property_id: String,
    pub name: String,
    pub is_active: bool,
    pub tax_rate: Rate,
    pub service_charge_rate: Rate,
    /// Stock location used for availability refreshes.
    pub warehouse_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A physical table on the floor of an outlet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiningTable {
    pub id: String,
    pub outlet_id: String,
    pub label: String,
    pub capacity: i64,
    pub status: TableStatus,
    pub updated_at: DateTime<Utc>,
}

/// A sellable dish or drink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: String,
    pub property_id: String,
    pub name: String,
    pub price: Money,
    pub is_available: bool,
    pub unavailable_reason: Option<String>,
}

// =============================================================================
// Order
// =============================================================================

/// A guest's tab at an outlet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// `ORD-YYYYMMDD-NNNN`, see [`crate::order_number`].
    pub order_number: String,
    pub outlet_id: String,
    pub server_id: String,
    pub table_id: Option<String>,
    pub booking_id: Option<String>,
    pub guest_id: Option<String>,
    pub shift_id: Option<String>,
    pub status: OrderStatus,
    pub subtotal: Money,
    pub tax_amount: Money,
    pub service_charge: Money,
    pub discount_amount: Money,
    pub tip_amount: Money,
    pub total: Money,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The six monetary fields as a `Totals` value.
    pub fn totals(&self) -> Totals {
        Totals {
            subtotal: self.subtotal,
            tax_amount: self.tax_amount,
            service_charge: self.service_charge,
            discount_amount: self.discount_amount,
            tip_amount: self.tip_amount,
            total: self.total,
        }
    }

    /// Overwrites the six monetary fields.
    pub fn set_totals(&mut self, totals: &Totals) {
        self.subtotal = totals.subtotal;
        self.tax_amount = totals.tax_amount;
        self.service_charge = totals.service_charge;
        self.discount_amount = totals.discount_amount;
        self.tip_amount = totals.tip_amount;
        self.total = totals.total;
    }

    /// True while items, discounts and tips may still change.
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Appends a line to the notes, never overwriting what is there.
    pub fn append_note(&mut self, line: &str) {
        self.notes = Some(append_line(self.notes.take(), line));
    }

    /// Inserts a line before any existing notes.
    pub fn prepend_note(&mut self, line: &str) {
        self.notes = Some(match self.notes.take() {
            Some(existing) if !existing.is_empty() => format!("{line}\n{existing}"),
            _ => line.to_string(),
        });
    }
}

/// Joins `line` onto optional existing text with a newline.
pub fn append_line(existing: Option<String>, line: &str) -> String {
    match existing {
        Some(existing) if !existing.is_empty() => format!("{existing}\n{line}"),
        _ => line.to_string(),
    }
}

/// One line in an order.
///
/// `name` and `unit_price` are frozen copies of the menu item at add time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub menu_item_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub modifiers: Option<String>,
    pub notes: Option<String>,
    pub status: ItemStatus,
    pub sent_to_kitchen_at: Option<DateTime<Utc>>,
    pub prepared_at: Option<DateTime<Utc>>,
    pub served_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl OrderItem {
    /// quantity × unit price.
    #[inline]
    pub fn line_amount(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// Counts toward the subtotal (anything not cancelled).
    #[inline]
    pub fn is_billable(&self) -> bool {
        self.status != ItemStatus::Cancelled
    }
}

// =============================================================================
// Payments, Voids, Refunds
// =============================================================================

/// How a payment was tendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Cash,
    CreditCard,
    DebitCard,
    RoomCharge,
    Voucher,
    Complimentary,
}

impl PaymentMethod {
    #[inline]
    pub fn is_cash(self) -> bool {
        self == PaymentMethod::Cash
    }
}

/// A settlement record against an order. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    pub method: PaymentMethod,
    /// Amount tendered. For cash this may exceed what was owed.
    pub amount: Money,
    /// Change handed back (cash only, otherwise zero).
    pub change_given: Money,
    pub reference: Option<String>,
    pub processed_by: String,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    /// Amount that stays in the drawer or on the account.
    #[inline]
    pub fn net_amount(&self) -> Money {
        self.amount - self.change_given
    }
}

/// Audit record of a voided order (no item) or a voided item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Void {
    pub id: String,
    pub order_id: String,
    pub order_item_id: Option<String>,
    pub reason: String,
    pub amount: Money,
    pub voided_by: String,
    pub approved_by: String,
    pub created_at: DateTime<Utc>,
}

/// Money handed back to a guest after an order was paid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Refund {
    pub id: String,
    pub order_id: String,
    pub method: PaymentMethod,
    pub amount: Money,
    pub reason: String,
    pub processed_by: String,
    pub approved_by: String,
    pub created_at: DateTime<Utc>,
}

/// An order with everything hanging off it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetails {
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub payments: Vec<Payment>,
    pub voids: Vec<Void>,
    pub refunds: Vec<Refund>,
}

impl OrderDetails {
    /// Net amount collected so far (tendered minus change).
    pub fn amount_paid(&self) -> Money {
        self.payments.iter().map(Payment::net_amount).sum()
    }

    /// Sum of refunds already issued.
    pub fn amount_refunded(&self) -> Money {
        self.refunds.iter().map(|r| r.amount).sum()
    }

    /// What is still owed, never negative.
    pub fn balance_due(&self) -> Money {
        (self.order.total - self.amount_paid()).clamp_non_negative()
    }
}

// =============================================================================
// Discounts
// =============================================================================

/// How a discount value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountKind {
    /// Value is a percentage of the subtotal (0 to 100).
    Percentage,
    /// Value is an absolute amount.
    FixedAmount,
}

// =============================================================================
// Shift
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftStatus {
    Open,
    Closed,
}

/// A cashier's accountability period at an outlet.
///
/// `ending_cash`, `expected_cash` and `variance` stay `None` until close and
/// are frozen afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    pub id: String,
    pub outlet_id: String,
    pub cashier_id: String,
    pub status: ShiftStatus,
    pub starting_cash: Money,
    pub ending_cash: Option<Money>,
    pub expected_cash: Option<Money>,
    pub variance: Option<Money>,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Shift {
    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == ShiftStatus::Open
    }
}

// =============================================================================
// Hotel Booking
// =============================================================================

/// Status of a hotel booking as reported by the folio collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Confirmed => "CONFIRMED",
            BookingStatus::Cancelled => "CANCELLED",
            BookingStatus::Completed => "COMPLETED",
        })
    }
}

// =============================================================================
// Queries
// =============================================================================

/// Filter for order listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderFilter {
    pub outlet_id: Option<String>,
    pub status: Option<OrderStatus>,
    /// Inclusive lower bound on `created_at`.
    pub created_from: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`.
    pub created_to: Option<DateTime<Utc>>,
}

/// Page request: 1-based page number and page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
}

impl PageRequest {
    pub fn new(page: u32, page_size: u32) -> Self {
        PageRequest { page, page_size }
    }

    /// Row offset for this page.
    #[inline]
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }
}

/// One page of results plus the total match count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total_count: i64,
    pub page: u32,
    pub page_size: u32,
}

impl<T> Page<T> {
    /// Number of pages needed for `total_count` rows.
    pub fn page_count(&self) -> i64 {
        if self.page_size == 0 {
            return 0;
        }
        let size = i64::from(self.page_size);
        (self.total_count + size - 1) / size
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

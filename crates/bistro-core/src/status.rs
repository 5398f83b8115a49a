//! # Status State Machines
//!
//! Transition tables for orders, order items and dining tables.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  OPEN ─► SENT_TO_KITCHEN ─► IN_PROGRESS ─► READY ─► SERVED ─► PAID      │
//! │    │            │                │           │         │               │
//! │    └────────────┴────────────────┴───────────┴─────────┴─► CANCELLED   │
//! │                                                          └─► VOID      │
//! │                                                                         │
//! │  Terminal: PAID, CANCELLED, VOID (no outgoing transitions)             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Item Lifecycle
//! ```text
//! PENDING ─► SENT ─► PREPARING ─► READY ─► SERVED
//!    └────────┴──────────┴──────────┴─► CANCELLED
//! ```
//!
//! All three machines share one shape: a same-state write is always legal,
//! anything else must appear in the source state's allowed set.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, ValidationError};

// =============================================================================
// Lifecycle Trait
// =============================================================================

/// A closed set of states with a static transition table.
pub trait Lifecycle: Copy + Eq + fmt::Display + 'static {
    /// Entity name used in error messages ("order", "item", "table").
    const ENTITY: &'static str;

    /// States reachable in one step from `self`.
    fn allowed_next(self) -> &'static [Self];

    /// True when no transition leaves this state.
    fn is_terminal(self) -> bool {
        self.allowed_next().is_empty()
    }

    /// True for a same-state no-op or a listed transition.
    fn can_transition_to(self, to: Self) -> bool {
        self == to || self.allowed_next().contains(&to)
    }

    /// Returns an error naming both states when the transition is illegal.
    fn ensure_transition(self, to: Self) -> Result<(), CoreError> {
        if self.can_transition_to(to) {
            Ok(())
        } else {
            Err(CoreError::InvalidTransition {
                entity: Self::ENTITY,
                from: self.to_string(),
                to: to.to_string(),
            })
        }
    }
}

/// Pure, total transition predicate for any lifecycle.
///
/// ## Example
/// ```rust
/// use bistro_core::status::{is_valid_transition, OrderStatus};
///
/// assert!(is_valid_transition(OrderStatus::Open, OrderStatus::SentToKitchen));
/// assert!(!is_valid_transition(OrderStatus::Open, OrderStatus::Ready));
/// ```
#[inline]
pub fn is_valid_transition<S: Lifecycle>(from: S, to: S) -> bool {
    from.can_transition_to(to)
}

// =============================================================================
// Order Status
// =============================================================================

/// The status of an order (a guest's tab).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Open,
    SentToKitchen,
    InProgress,
    Ready,
    Served,
    Paid,
    Cancelled,
    Void,
}

impl OrderStatus {
    /// Every order status, in lifecycle order.
    pub const ALL: [OrderStatus; 8] = [
        OrderStatus::Open,
        OrderStatus::SentToKitchen,
        OrderStatus::InProgress,
        OrderStatus::Ready,
        OrderStatus::Served,
        OrderStatus::Paid,
        OrderStatus::Cancelled,
        OrderStatus::Void,
    ];

    /// Statuses in which items, discounts and tips may still change.
    pub const ACTIVE: [OrderStatus; 5] = [
        OrderStatus::Open,
        OrderStatus::SentToKitchen,
        OrderStatus::InProgress,
        OrderStatus::Ready,
        OrderStatus::Served,
    ];

    /// True for the non-terminal statuses.
    #[inline]
    pub fn is_active(self) -> bool {
        !self.is_terminal()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Open => "OPEN",
            OrderStatus::SentToKitchen => "SENT_TO_KITCHEN",
            OrderStatus::InProgress => "IN_PROGRESS",
            OrderStatus::Ready => "READY",
            OrderStatus::Served => "SERVED",
            OrderStatus::Paid => "PAID",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Void => "VOID",
        }
    }

    /// The next status on the main progression, if any.
    fn next_forward(self) -> Option<OrderStatus> {
        match self {
            OrderStatus::Open => Some(OrderStatus::SentToKitchen),
            OrderStatus::SentToKitchen => Some(OrderStatus::InProgress),
            OrderStatus::InProgress => Some(OrderStatus::Ready),
            OrderStatus::Ready => Some(OrderStatus::Served),
            OrderStatus::Served => Some(OrderStatus::Paid),
            OrderStatus::Paid | OrderStatus::Cancelled | OrderStatus::Void => None,
        }
    }

    /// Legal single-step path from `self` to `target` along the main
    /// progression, excluding `self` and including `target`.
    ///
    /// Returns `None` when `target` is not ahead of `self`. An empty path
    /// means `self == target`.
    ///
    /// ## Example
    /// ```rust
    /// use bistro_core::status::OrderStatus;
    ///
    /// let path = OrderStatus::Ready.forward_path(OrderStatus::Paid).unwrap();
    /// assert_eq!(path, vec![OrderStatus::Served, OrderStatus::Paid]);
    /// ```
    pub fn forward_path(self, target: OrderStatus) -> Option<Vec<OrderStatus>> {
        let mut path = Vec::new();
        let mut current = self;
        while current != target {
            let next = current.next_forward()?;
            debug_assert!(is_valid_transition(current, next));
            path.push(next);
            current = next;
        }
        Some(path)
    }
}

impl Lifecycle for OrderStatus {
    const ENTITY: &'static str = "order";

    fn allowed_next(self) -> &'static [Self] {
        use OrderStatus::*;
        match self {
            Open => &[SentToKitchen, Cancelled, Void],
            SentToKitchen => &[InProgress, Cancelled, Void],
            InProgress => &[Ready, Cancelled, Void],
            Ready => &[Served, Cancelled, Void],
            Served => &[Paid, Cancelled, Void],
            Paid | Cancelled | Void => &[],
        }
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Open
    }
}

// =============================================================================
// Item Status
// =============================================================================

/// The kitchen status of a single order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ItemStatus {
    Pending,
    Sent,
    Preparing,
    Ready,
    Served,
    Cancelled,
}

impl ItemStatus {
    pub const ALL: [ItemStatus; 6] = [
        ItemStatus::Pending,
        ItemStatus::Sent,
        ItemStatus::Preparing,
        ItemStatus::Ready,
        ItemStatus::Served,
        ItemStatus::Cancelled,
    ];

    /// Counts toward "the order is ready" (READY, SERVED or CANCELLED).
    #[inline]
    pub fn is_ready_or_done(self) -> bool {
        matches!(
            self,
            ItemStatus::Ready | ItemStatus::Served | ItemStatus::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ItemStatus::Pending => "PENDING",
            ItemStatus::Sent => "SENT",
            ItemStatus::Preparing => "PREPARING",
            ItemStatus::Ready => "READY",
            ItemStatus::Served => "SERVED",
            ItemStatus::Cancelled => "CANCELLED",
        }
    }
}

impl Lifecycle for ItemStatus {
    const ENTITY: &'static str = "item";

    fn allowed_next(self) -> &'static [Self] {
        use ItemStatus::*;
        match self {
            Pending => &[Sent, Cancelled],
            Sent => &[Preparing, Cancelled],
            Preparing => &[Ready, Cancelled],
            Ready => &[Served, Cancelled],
            Served | Cancelled => &[],
        }
    }
}

impl Default for ItemStatus {
    fn default() -> Self {
        ItemStatus::Pending
    }
}

// =============================================================================
// Table Status
// =============================================================================

/// The floor status of a dining table.
///
/// No state is terminal; a table always cycles back to AVAILABLE.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "SCREAMING_SNAKE_CASE"))]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    Available,
    Occupied,
    Reserved,
    Dirty,
    OutOfService,
}

impl TableStatus {
    pub const ALL: [TableStatus; 5] = [
        TableStatus::Available,
        TableStatus::Occupied,
        TableStatus::Reserved,
        TableStatus::Dirty,
        TableStatus::OutOfService,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TableStatus::Available => "AVAILABLE",
            TableStatus::Occupied => "OCCUPIED",
            TableStatus::Reserved => "RESERVED",
            TableStatus::Dirty => "DIRTY",
            TableStatus::OutOfService => "OUT_OF_SERVICE",
        }
    }
}

impl Lifecycle for TableStatus {
    const ENTITY: &'static str = "table";

    fn allowed_next(self) -> &'static [Self] {
        use TableStatus::*;
        match self {
            Available => &[Occupied, Reserved, OutOfService],
            Occupied => &[Dirty, Available],
            Reserved => &[Occupied, Available],
            Dirty => &[Available, OutOfService],
            OutOfService => &[Available],
        }
    }
}

// =============================================================================
// Display / FromStr
// =============================================================================

macro_rules! status_text {
    ($ty:ident, $field:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_uppercase();
                $ty::ALL
                    .iter()
                    .copied()
                    .find(|status| status.as_str() == wanted)
                    .ok_or_else(|| ValidationError::NotAllowed {
                        field: $field.to_string(),
                        allowed: $ty::ALL.iter().map(|s| s.as_str().to_string()).collect(),
                    })
            }
        }
    };
}

status_text!(OrderStatus, "order status");
status_text!(ItemStatus, "item status");
status_text!(TableStatus, "table status");

// =============================================================================
// Unit Tests
// =============================================================================

//! # Order Totals
//!
//! Derives subtotal, tax, service charge and total from item lines.
//!
//! ```text
//! subtotal       = Σ(quantity × unit_price)           rounded
//! tax_amount     = subtotal × tax_rate                 rounded
//! service_charge = subtotal × service_charge_rate      rounded
//! total          = subtotal + tax + service_charge − discount + tip
//! ```
//!
//! Tax and service charge are computed on the full subtotal; a discount only
//! subtracts at the final step.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{Money, Rate, DERIVED_TOLERANCE};
use crate::types::{DiscountKind, OrderItem};

/// Minimal view of an order line for totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineItem {
    pub quantity: i64,
    pub unit_price: Money,
}

impl LineItem {
    pub fn new(quantity: i64, unit_price: Money) -> Self {
        LineItem {
            quantity,
            unit_price,
        }
    }

    #[inline]
    pub fn amount(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

impl From<&OrderItem> for LineItem {
    fn from(item: &OrderItem) -> Self {
        LineItem::new(item.quantity, item.unit_price)
    }
}

/// The six monetary fields of an order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: Money,
    pub tax_amount: Money,
    pub service_charge: Money,
    pub discount_amount: Money,
    pub tip_amount: Money,
    pub total: Money,
}

impl Totals {
    /// Total recomputed from the other five fields.
    pub fn expected_total(&self) -> Money {
        self.subtotal + self.tax_amount + self.service_charge - self.discount_amount
            + self.tip_amount
    }
}

/// Σ(quantity × unit price), rounded.
pub fn subtotal_of(items: &[LineItem]) -> Money {
    items.iter().map(LineItem::amount).sum()
}

/// Computes order totals.
///
/// The discount is not clamped here; callers reject a discount above the
/// subtotal before calling.
///
/// ## Example
/// ```rust
/// use bistro_core::money::{Money, Rate};
/// use bistro_core::totals::{calculate_totals, LineItem};
///
/// let items = [
///     LineItem::new(2, Money::from_cents(25000)),
///     LineItem::new(1, Money::from_cents(10000)),
/// ];
/// let t = calculate_totals(&items, Rate::from_bps(1200), Rate::from_bps(1000), Money::ZERO, Money::ZERO);
/// assert_eq!(t.total, Money::from_cents(73200));
/// ```
pub fn calculate_totals(
    items: &[LineItem],
    tax_rate: Rate,
    service_charge_rate: Rate,
    discount_amount: Money,
    tip_amount: Money,
) -> Totals {
    if items.is_empty() {
        return Totals::default();
    }

    let subtotal = subtotal_of(items);
    let tax_amount = tax_rate.apply(subtotal);
    let service_charge = service_charge_rate.apply(subtotal);
    let mut totals = Totals {
        subtotal,
        tax_amount,
        service_charge,
        discount_amount,
        tip_amount,
        total: Money::ZERO,
    };
    totals.total = totals.expected_total();
    totals
}

/// Checks that `total` matches the other fields within 0.02.
pub fn verify_totals(totals: &Totals) -> bool {
    totals
        .total
        .approx_eq(totals.expected_total(), DERIVED_TOLERANCE)
}

/// Turns a discount request into an amount against `subtotal`.
///
/// Percentages must be within 0..=100; fixed amounts must not be negative.
/// Either form is rejected when it would exceed the subtotal.
pub fn resolve_discount(kind: DiscountKind, value: Decimal, subtotal: Money) -> CoreResult<Money> {
    let amount = match kind {
        DiscountKind::Percentage => {
            if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
                return Err(ValidationError::OutOfRange {
                    field: "discount percentage".to_string(),
                    min: 0,
                    max: 100,
                }
                .into());
            }
            subtotal.percentage(value)
        }
        DiscountKind::FixedAmount => {
            if value < Decimal::ZERO {
                return Err(ValidationError::MustNotBeNegative {
                    field: "discount amount".to_string(),
                }
                .into());
            }
            Money::new(value)
        }
    };

    if amount > subtotal {
        return Err(CoreError::rule(format!(
            "Discount {amount} exceeds subtotal {subtotal}"
        )));
    }
    Ok(amount)
}

/// Discount as a percentage of the subtotal (100 when the subtotal is zero
/// and the discount is not).
pub fn discount_share_percent(discount: Money, subtotal: Money) -> Decimal {
    if subtotal.is_zero() {
        return if discount.is_zero() {
            Decimal::ZERO
        } else {
            Decimal::ONE_HUNDRED
        };
    }
    discount.amount() * Decimal::ONE_HUNDRED / subtotal.amount()
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Shift Cash Reconciliation
//!
//! ```text
//! expected_cash = starting_cash + Σ cash_payments − Σ cash_refunds
//! variance      = ending_cash − expected_cash
//!
//!   variance > 0  overage
//!   variance < 0  shortage
//!   variance = 0  balanced
//! ```

use serde::{Deserialize, Serialize};

use crate::money::Money;

/// Cash expected in the drawer.
pub fn calculate_expected_cash(
    starting_cash: Money,
    cash_payments: &[Money],
    cash_refunds: &[Money],
) -> Money {
    let paid_in: Money = cash_payments.iter().sum();
    let paid_out: Money = cash_refunds.iter().sum();
    starting_cash + paid_in - paid_out
}

/// Counted cash minus expected cash.
#[inline]
pub fn calculate_variance(ending_cash: Money, expected_cash: Money) -> Money {
    ending_cash - expected_cash
}

/// Sign of a variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VarianceKind {
    Overage,
    Shortage,
    Balanced,
}

impl VarianceKind {
    pub fn of(variance: Money) -> Self {
        if variance.is_positive() {
            VarianceKind::Overage
        } else if variance.is_negative() {
            VarianceKind::Shortage
        } else {
            VarianceKind::Balanced
        }
    }
}

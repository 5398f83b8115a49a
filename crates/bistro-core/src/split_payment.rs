//! # Split-Payment Validation
//!
//! Checks one or more payment lines against an amount owed.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  lines empty                        → reject                            │
//! │  any amount ≤ 0                     → reject                            │
//! │  no CASH line:  |Σ − owed| ≤ 0.01   → accept, no change                 │
//! │  CASH present:  Σ ≥ owed − 0.01     → accept, change = max(0, Σ − owed) │
//! │  otherwise                          → reject                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, INPUT_TOLERANCE};
use crate::types::PaymentMethod;

/// One tender line in a split settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentLine {
    pub method: PaymentMethod,
    pub amount: Money,
    #[serde(default)]
    pub reference: Option<String>,
}

impl PaymentLine {
    pub fn new(method: PaymentMethod, amount: Money) -> Self {
        PaymentLine {
            method,
            amount,
            reference: None,
        }
    }
}

/// Validates payment lines against `order_total`.
pub fn validate_payments(order_total: Money, lines: &[PaymentLine]) -> CoreResult<()> {
    if lines.is_empty() {
        return Err(invalid("at least one payment required"));
    }
    if lines.iter().any(|l| !l.amount.is_positive()) {
        return Err(invalid("payment amount must be positive"));
    }

    let sum: Money = lines.iter().map(|l| l.amount).sum();
    let has_cash = lines.iter().any(|l| l.method.is_cash());

    if has_cash {
        if sum < order_total && !sum.approx_eq(order_total, INPUT_TOLERANCE) {
            return Err(invalid(&format!(
                "insufficient payment: {sum} tendered against {order_total}"
            )));
        }
    } else if !sum.approx_eq(order_total, INPUT_TOLERANCE) {
        return Err(invalid(&format!(
            "non-cash payments must equal the total exactly: {sum} tendered against {order_total}"
        )));
    }
    Ok(())
}

/// Excess tendered over `order_total`, never negative.
pub fn calculate_change_due(order_total: Money, lines: &[PaymentLine]) -> Money {
    let sum: Money = lines.iter().map(|l| l.amount).sum();
    (sum - order_total).clamp_non_negative()
}

/// Raw sum of `amounts` equals `order_total` within 0.01, regardless of method.
pub fn verify_split_payment_integrity(order_total: Money, amounts: &[Money]) -> bool {
    let sum: Money = amounts.iter().sum();
    sum.approx_eq(order_total, INPUT_TOLERANCE)
}

fn invalid(reason: &str) -> CoreError {
    CoreError::InvalidPayment {
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use PaymentMethod::*;

    fn line(method: PaymentMethod, cents: i64) -> PaymentLine {
        PaymentLine::new(method, Money::from_cents(cents))
    }

    #[test]
    fn test_empty_and_non_positive_rejected() {
        let total = Money::from_cents(10_000);
        let err = validate_payments(total, &[]).unwrap_err();
        assert!(err.to_string().contains("at least one payment"));

        for bad in [0, -500] {
            let err = validate_payments(total, &[line(Cash, 10_000), line(CreditCard, bad)])
                .unwrap_err();
            assert!(err.to_string().contains("must be positive"));
        }
    }

    #[test]
    fn test_non_cash_must_match_exactly() {
        let total = Money::from_cents(68_200);
        assert!(validate_payments(total, &[line(CreditCard, 40_000), line(RoomCharge, 28_200)]).is_ok());
        assert!(validate_payments(total, &[line(CreditCard, 68_201)]).is_ok());
        assert!(validate_payments(total, &[line(CreditCard, 68_300)]).is_err());
        assert!(validate_payments(total, &[line(DebitCard, 60_000)]).is_err());
    }

    #[test]
    fn test_cash_may_overpay_but_not_underpay() {
        let total = Money::from_cents(68_200);
        let lines = [line(Cash, 70_000)];
        assert!(validate_payments(total, &lines).is_ok());
        assert_eq!(calculate_change_due(total, &lines), Money::from_cents(1_800));

        let mixed = [line(CreditCard, 50_000), line(Cash, 20_000)];
        assert!(validate_payments(total, &mixed).is_ok());
        assert_eq!(calculate_change_due(total, &mixed), Money::from_cents(1_800));

        assert!(validate_payments(total, &[line(Cash, 68_000)]).is_err());
    }

    #[test]
    fn test_change_never_negative() {
        let total = Money::from_cents(10_000);
        assert_eq!(calculate_change_due(total, &[line(Cash, 5_000)]), Money::ZERO);
        assert_eq!(calculate_change_due(total, &[]), Money::ZERO);
    }

    #[test]
    fn test_integrity_ignores_method() {
        let total = Money::from_cents(73_200);
        let amounts = [Money::from_cents(33_200), Money::from_cents(40_000)];
        assert!(verify_split_payment_integrity(total, &amounts));
        assert!(!verify_split_payment_integrity(total, &amounts[..1]));
    }
}

//! # Shift Report
//!
//! Read-only aggregation over one shift's orders and their ledger rows. The
//! same builder serves both the interim X-reading of an open shift and the
//! final report of a closed one.
//!
//! ```text
//!   Shift ─┬─ orders ──► sales by status, discounts, tips
//!          ├─ payments ► by method, net cash collected
//!          ├─ voids ───► count / amount
//!          └─ refunds ─► count / amount, cash paid out
//!                              │
//!                              ▼
//!          expected cash = starting + net cash − cash refunds
//!          variance      = counted − expected      (when counted is known)
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::money::Money;
use crate::reconciliation::{calculate_expected_cash, calculate_variance};
use crate::status::OrderStatus;
use crate::types::{Order, Payment, PaymentMethod, Refund, Shift, ShiftStatus, Void};

/// Count and amount for one payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MethodTotal {
    pub method: PaymentMethod,
    pub count: i64,
    pub amount: Money,
}

/// Count and total for one order status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTotal {
    pub status: OrderStatus,
    pub count: i64,
    pub amount: Money,
}

/// Snapshot of a shift's sales and cash position.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftReport {
    pub shift_id: String,
    pub outlet_id: String,
    pub cashier_id: String,
    pub status: ShiftStatus,
    /// False for an X-reading of a shift that is still open.
    pub is_final: bool,
    pub generated_at: DateTime<Utc>,

    pub order_count: i64,
    pub sales_by_status: Vec<StatusTotal>,
    /// Net of change given.
    pub payments_by_method: Vec<MethodTotal>,
    pub void_count: i64,
    pub void_amount: Money,
    pub discount_count: i64,
    pub discount_amount: Money,
    pub tip_amount: Money,
    pub refund_count: i64,
    pub refund_amount: Money,

    pub starting_cash: Money,
    pub cash_collected: Money,
    pub cash_refunded: Money,
    pub expected_cash: Money,
    pub counted_cash: Option<Money>,
    pub variance: Option<Money>,
}

/// Ledger rows belonging to one shift.
#[derive(Debug, Clone, Copy)]
pub struct ShiftActivity<'a> {
    pub orders: &'a [Order],
    pub payments: &'a [Payment],
    pub voids: &'a [Void],
    pub refunds: &'a [Refund],
}

impl<'a> ShiftActivity<'a> {
    /// Net cash taken per payment (tendered minus change).
    pub fn cash_payments(&self) -> Vec<Money> {
        self.payments
            .iter()
            .filter(|p| p.method.is_cash())
            .map(Payment::net_amount)
            .collect()
    }

    pub fn cash_refunds(&self) -> Vec<Money> {
        self.refunds
            .iter()
            .filter(|r| r.method.is_cash())
            .map(|r| r.amount)
            .collect()
    }
}

impl ShiftReport {
    /// Builds a report.
    ///
    /// For a closed shift the frozen expected cash, counted cash and variance
    /// are reported as stored. For an open shift they are computed, with the
    /// variance present only when `counted_cash` is supplied.
    pub fn build(
        shift: &Shift,
        activity: ShiftActivity<'_>,
        counted_cash: Option<Money>,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let mut by_status: Vec<StatusTotal> = Vec::new();
        for status in OrderStatus::ALL {
            let matching: Vec<&Order> =
                activity.orders.iter().filter(|o| o.status == status).collect();
            if matching.is_empty() {
                continue;
            }
            by_status.push(StatusTotal {
                status,
                count: matching.len() as i64,
                amount: matching.iter().map(|o| o.total).sum(),
            });
        }

        let mut by_method: BTreeMap<PaymentMethod, (i64, Money)> = BTreeMap::new();
        for payment in activity.payments {
            let entry = by_method.entry(payment.method).or_insert((0, Money::ZERO));
            entry.0 += 1;
            entry.1 += payment.net_amount();
        }

        let discounted: Vec<&Order> = activity
            .orders
            .iter()
            .filter(|o| o.discount_amount.is_positive())
            .collect();

        let cash_payments = activity.cash_payments();
        let cash_refunds = activity.cash_refunds();
        let computed_expected =
            calculate_expected_cash(shift.starting_cash, &cash_payments, &cash_refunds);

        let (is_final, expected_cash, counted_cash, variance) = match shift.status {
            ShiftStatus::Closed => {
                let expected = shift.expected_cash.unwrap_or(computed_expected);
                let counted = shift.ending_cash;
                let variance = shift
                    .variance
                    .or_else(|| counted.map(|c| calculate_variance(c, expected)));
                (true, expected, counted, variance)
            }
            ShiftStatus::Open => (
                false,
                computed_expected,
                counted_cash,
                counted_cash.map(|c| calculate_variance(c, computed_expected)),
            ),
        };

        ShiftReport {
            shift_id: shift.id.clone(),
            outlet_id: shift.outlet_id.clone(),
            cashier_id: shift.cashier_id.clone(),
            status: shift.status,
            is_final,
            generated_at,
            order_count: activity.orders.len() as i64,
            sales_by_status: by_status,
            payments_by_method: by_method
                .into_iter()
                .map(|(method, (count, amount))| MethodTotal {
                    method,
                    count,
                    amount,
                })
                .collect(),
            void_count: activity.voids.len() as i64,
            void_amount: activity.voids.iter().map(|v| v.amount).sum(),
            discount_count: discounted.len() as i64,
            discount_amount: discounted.iter().map(|o| o.discount_amount).sum(),
            tip_amount: activity.orders.iter().map(|o| o.tip_amount).sum(),
            refund_count: activity.refunds.len() as i64,
            refund_amount: activity.refunds.iter().map(|r| r.amount).sum(),
            starting_cash: shift.starting_cash,
            cash_collected: cash_payments.iter().sum(),
            cash_refunded: cash_refunds.iter().sum(),
            expected_cash,
            counted_cash,
            variance,
        }
    }

    /// Amount taken for one method, zero when unused.
    pub fn amount_for(&self, method: PaymentMethod) -> Money {
        self.payments_by_method
            .iter()
            .find(|m| m.method == method)
            .map(|m| m.amount)
            .unwrap_or(Money::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(cents: i64) -> Money {
        Money::from_cents(cents)
    }

    fn shift(status: ShiftStatus) -> Shift {
        Shift {
            id: "sh-1".into(),
            outlet_id: "out-1".into(),
            cashier_id: "c-1".into(),
            status,
            starting_cash: m(100_000),
            ending_cash: None,
            expected_cash: None,
            variance: None,
            opened_at: Utc::now(),
            closed_at: None,
            notes: None,
        }
    }

    fn order(id: &str, status: OrderStatus, total: i64, discount: i64, tip: i64) -> Order {
        let now = Utc::now();
        Order {
            id: id.into(),
            order_number: format!("ORD-20240309-000{id}"),
            outlet_id: "out-1".into(),
            server_id: "c-1".into(),
            table_id: None,
            booking_id: None,
            guest_id: None,
            shift_id: Some("sh-1".into()),
            status,
            subtotal: m(total),
            tax_amount: Money::ZERO,
            service_charge: Money::ZERO,
            discount_amount: m(discount),
            tip_amount: m(tip),
            total: m(total),
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn payment(order_id: &str, method: PaymentMethod, amount: i64, change: i64) -> Payment {
        Payment {
            id: format!("p-{order_id}-{amount}"),
            order_id: order_id.into(),
            method,
            amount: m(amount),
            change_given: m(change),
            reference: None,
            processed_by: "c-1".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_x_reading_of_open_shift() {
        let orders = vec![
            order("1", OrderStatus::Paid, 30_000, 0, 0),
            order("2", OrderStatus::Paid, 15_000, 1_000, 500),
            order("3", OrderStatus::Open, 9_900, 0, 0),
        ];
        let payments = vec![
            payment("1", PaymentMethod::Cash, 30_000, 0),
            payment("2", PaymentMethod::Cash, 20_000, 5_000),
        ];
        let voids = vec![Void {
            id: "v-1".into(),
            order_id: "3".into(),
            order_item_id: Some("i-1".into()),
            reason: "wrong dish".into(),
            amount: m(1_200),
            voided_by: "c-1".into(),
            approved_by: "mgr".into(),
            created_at: Utc::now(),
        }];
        let activity = ShiftActivity {
            orders: &orders,
            payments: &payments,
            voids: &voids,
            refunds: &[],
        };

        let report = ShiftReport::build(&shift(ShiftStatus::Open), activity, Some(m(150_000)), Utc::now());

        assert!(!report.is_final);
        assert_eq!(report.order_count, 3);
        assert_eq!(report.cash_collected, m(45_000));
        assert_eq!(report.expected_cash, m(145_000));
        assert_eq!(report.variance, Some(m(5_000)));
        assert_eq!(report.amount_for(PaymentMethod::Cash), m(45_000));
        assert_eq!(report.amount_for(PaymentMethod::Voucher), Money::ZERO);
        assert_eq!(report.void_count, 1);
        assert_eq!(report.void_amount, m(1_200));
        assert_eq!(report.discount_count, 1);
        assert_eq!(report.discount_amount, m(1_000));
        assert_eq!(report.tip_amount, m(500));

        let paid = report
            .sales_by_status
            .iter()
            .find(|s| s.status == OrderStatus::Paid)
            .unwrap();
        assert_eq!((paid.count, paid.amount), (2, m(45_000)));
    }

    #[test]
    fn test_cash_refunds_reduce_expected_cash() {
        let payments = vec![payment("1", PaymentMethod::Cash, 30_000, 0)];
        let refunds = vec![
            Refund {
                id: "r-1".into(),
                order_id: "1".into(),
                method: PaymentMethod::Cash,
                amount: m(2_000),
                reason: "cold".into(),
                processed_by: "c-1".into(),
                approved_by: "mgr".into(),
                created_at: Utc::now(),
            },
            Refund {
                id: "r-2".into(),
                order_id: "1".into(),
                method: PaymentMethod::CreditCard,
                amount: m(1_000),
                reason: "slow".into(),
                processed_by: "c-1".into(),
                approved_by: "mgr".into(),
                created_at: Utc::now(),
            },
        ];
        let activity = ShiftActivity {
            orders: &[],
            payments: &payments,
            voids: &[],
            refunds: &refunds,
        };
        let report = ShiftReport::build(&shift(ShiftStatus::Open), activity, None, Utc::now());
        assert_eq!(report.expected_cash, m(128_000));
        assert_eq!(report.cash_refunded, m(2_000));
        assert_eq!(report.refund_amount, m(3_000));
        assert_eq!(report.variance, None);
    }

    #[test]
    fn test_closed_shift_reports_frozen_values() {
        let mut closed = shift(ShiftStatus::Closed);
        closed.ending_cash = Some(m(150_000));
        closed.expected_cash = Some(m(145_000));
        closed.variance = Some(m(5_000));

        let activity = ShiftActivity {
            orders: &[],
            payments: &[],
            voids: &[],
            refunds: &[],
        };
        let report = ShiftReport::build(&closed, activity, Some(m(1)), Utc::now());
        assert!(report.is_final);
        assert_eq!(report.expected_cash, m(145_000));
        assert_eq!(report.counted_cash, Some(m(150_000)));
        assert_eq!(report.variance, Some(m(5_000)));
    }
}

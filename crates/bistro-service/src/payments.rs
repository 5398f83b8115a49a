//! # Payments
//!
//! Settlement of an order: single payments, split tenders, room charges and
//! refunds.
//!
//! ## Settlement
//! ```text
//!  remaining = total − Σ(net payments)
//!
//!  process_payment(line)            settle_with_split_payments(lines)
//!        │                                  │
//!        ├─ non-cash ≤ remaining            ├─ validate_payments(remaining, lines)
//!        ├─ cash: change = excess           ├─ change only from cash lines
//!        ▼                                  ▼
//!   ROOM_CHARGE? ──► folio charge (failure aborts everything)
//!        │
//!        ▼
//!   append Payment rows ──► paid in full? ──► walk to PAID, table DIRTY
//! ```
//!
//! `Payment.amount` is what was tendered and `Payment.change_given` what went
//! back, so the amount kept is `amount − change_given`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use bistro_core::folio::{apply_room_charge, validate_room_charge_booking};
use bistro_core::money::INPUT_TOLERANCE;
use bistro_core::split_payment::{
    calculate_change_due, validate_payments, verify_split_payment_integrity, PaymentLine,
};
use bistro_core::validation::{validate_optional_text, validate_payment_amount, validate_reason};
use bistro_core::{
    CoreError, Lifecycle, Money, Order, OrderStatus, Payment, PaymentMethod, Refund,
};
use bistro_db::{Repositories, UnitOfWork};

use crate::context::Actor;
use crate::error::{ApiError, ApiResult};
use crate::orders::{load_order, release_table, transition, OrderService};

/// Result of a payment call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub order: Order,
    /// Rows appended by this call.
    pub payments: Vec<Payment>,
    pub change_due: Money,
    pub balance_due: Money,
}

impl PaymentReceipt {
    pub fn is_settled(&self) -> bool {
        self.order.status == OrderStatus::Paid
    }
}

impl OrderService {
    /// Takes one payment.
    ///
    /// Non-cash payments may not exceed the balance due. A cash payment above
    /// the balance is accepted and the excess recorded as change. The order
    /// becomes PAID once the balance reaches zero.
    pub async fn process_payment(
        &self,
        actor: &Actor,
        order_id: &str,
        line: PaymentLine,
    ) -> ApiResult<PaymentReceipt> {
        validate_payment_amount(line.amount)?;
        let reference = validate_optional_text("reference", line.reference.as_deref())?;

        let mut uow = self.db.begin().await?;
        let mut order = load_order(&mut uow, order_id).await?;
        ensure_payable(&order)?;

        let remaining = balance_due(&mut uow, &order).await?;
        if !line.method.is_cash() && line.amount > remaining + INPUT_TOLERANCE {
            return Err(CoreError::InvalidPayment {
                reason: format!(
                    "{} payment of {} exceeds the balance due of {remaining}",
                    method_label(line.method),
                    line.amount
                ),
            }
            .into());
        }
        let change = if line.method.is_cash() {
            calculate_change_due(remaining, std::slice::from_ref(&line))
        } else {
            Money::ZERO
        };

        if line.method == PaymentMethod::RoomCharge {
            self.charge_to_room(&order, &[line.amount]).await?;
        }

        let now = Utc::now();
        let payment = Payment {
            id: Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            method: line.method,
            amount: line.amount,
            change_given: change,
            reference,
            processed_by: actor.user_id.clone(),
            created_at: now,
        };
        uow.ledger().insert_payment(&payment).await?;

        let balance = (remaining - payment.net_amount()).clamp_non_negative();
        settle_if_paid(&mut uow, &mut order, balance, now).await?;
        uow.commit().await?;

        info!(
            order_id = %order.id,
            payment_id = %payment.id,
            method = ?payment.method,
            amount = %payment.amount,
            change = %change,
            balance = %balance,
            status = %order.status,
            actor = %actor.user_id,
            "Payment processed"
        );
        Ok(PaymentReceipt {
            order,
            payments: vec![payment],
            change_due: change,
            balance_due: balance,
        })
    }

    /// Settles the balance with several tenders at once.
    ///
    /// The lines must settle the whole balance: non-cash lines exactly,
    /// cash lines may overpay by up to the cash tendered. All rows are
    /// appended in one transaction.
    pub async fn settle_with_split_payments(
        &self,
        actor: &Actor,
        order_id: &str,
        lines: Vec<PaymentLine>,
    ) -> ApiResult<PaymentReceipt> {
        let mut references = Vec::with_capacity(lines.len());
        for line in &lines {
            references.push(validate_optional_text("reference", line.reference.as_deref())?);
        }

        let mut uow = self.db.begin().await?;
        let mut order = load_order(&mut uow, order_id).await?;
        ensure_payable(&order)?;

        let remaining = balance_due(&mut uow, &order).await?;
        validate_payments(remaining, &lines)?;

        let change = calculate_change_due(remaining, &lines);
        let cash_tendered: Money = lines
            .iter()
            .filter(|l| l.method.is_cash())
            .map(|l| l.amount)
            .sum();
        if change > cash_tendered {
            return Err(CoreError::InvalidPayment {
                reason: format!(
                    "change of {change} exceeds the {cash_tendered} tendered in cash"
                ),
            }
            .into());
        }

        let room_charges: Vec<Money> = lines
            .iter()
            .filter(|l| l.method == PaymentMethod::RoomCharge)
            .map(|l| l.amount)
            .collect();
        if !room_charges.is_empty() {
            self.charge_to_room(&order, &room_charges).await?;
        }

        let now = Utc::now();
        let changes = allocate_change(&lines, change);
        let mut payments = Vec::with_capacity(lines.len());
        for ((line, reference), change_given) in lines.iter().zip(references).zip(changes) {
            let payment = Payment {
                id: Uuid::new_v4().to_string(),
                order_id: order.id.clone(),
                method: line.method,
                amount: line.amount,
                change_given,
                reference,
                processed_by: actor.user_id.clone(),
                created_at: now,
            };
            uow.ledger().insert_payment(&payment).await?;
            payments.push(payment);
        }

        debug_assert!(verify_split_payment_integrity(
            remaining,
            &payments.iter().map(Payment::net_amount).collect::<Vec<_>>()
        ));
        settle_if_paid(&mut uow, &mut order, Money::ZERO, now).await?;
        uow.commit().await?;

        info!(
            order_id = %order.id,
            tenders = payments.len(),
            change = %change,
            actor = %actor.user_id,
            "Order settled with split payment"
        );
        Ok(PaymentReceipt {
            order,
            payments,
            change_due: change,
            balance_due: Money::ZERO,
        })
    }

    /// Closes an order that has billable items but nothing left to pay,
    /// e.g. fully comped or already covered before a later discount.
    ///
    /// No payment row is written. The order walks to PAID and the table is
    /// released.
    pub async fn settle_zero_balance(
        &self,
        actor: &Actor,
        order_id: &str,
    ) -> ApiResult<PaymentReceipt> {
        let mut uow = self.db.begin().await?;
        let mut order = load_order(&mut uow, order_id).await?;
        ensure_payable(&order)?;

        let remaining = outstanding(&mut uow, &order).await?;
        if remaining > INPUT_TOLERANCE {
            return Err(ApiError::business(format!(
                "Order {} still has {remaining} due",
                order.order_number
            )));
        }
        let items = uow.orders().list_items(&order.id).await?;
        if !items.iter().any(|i| i.is_billable()) {
            return Err(ApiError::business(format!(
                "Order {} has no items to settle",
                order.order_number
            )));
        }

        settle_if_paid(&mut uow, &mut order, Money::ZERO, Utc::now()).await?;
        uow.commit().await?;

        info!(order_id = %order.id, actor = %actor.user_id, "Zero-balance order settled");
        Ok(PaymentReceipt {
            order,
            payments: Vec::new(),
            change_due: Money::ZERO,
            balance_due: Money::ZERO,
        })
    }

    /// Refunds part or all of a PAID order. Needs a verified manager PIN.
    pub async fn refund_payment(
        &self,
        actor: &Actor,
        order_id: &str,
        method: PaymentMethod,
        amount: Money,
        reason: &str,
        manager_pin: Option<&str>,
    ) -> ApiResult<Refund> {
        validate_payment_amount(amount)?;
        let reason = validate_reason("reason", reason)?;

        let mut uow = self.db.begin().await?;
        let mut order = load_order(&mut uow, order_id).await?;
        if order.status != OrderStatus::Paid {
            return Err(CoreError::OrderNotActive {
                order_id: order.order_number.clone(),
                status: order.status.to_string(),
                action: "refund an unpaid order",
            }
            .into());
        }

        let paid: Money = uow
            .ledger()
            .list_payments(&order.id)
            .await?
            .iter()
            .map(Payment::net_amount)
            .sum();
        let refunded: Money = uow
            .ledger()
            .list_refunds(&order.id)
            .await?
            .iter()
            .map(|r| r.amount)
            .sum();
        let refundable = (paid - refunded).clamp_non_negative();
        if amount > refundable {
            return Err(ApiError::business(format!(
                "Refund of {amount} exceeds the refundable balance of {refundable}"
            )));
        }

        let approval = self.gate.authorize(actor, manager_pin, "refund this order").await?;

        let now = Utc::now();
        let refund = Refund {
            id: Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            method,
            amount,
            reason,
            processed_by: actor.user_id.clone(),
            approved_by: approval.approver_id().to_string(),
            created_at: now,
        };
        uow.ledger().insert_refund(&refund).await?;

        order.append_note(&format!(
            "Refund {amount} ({}) approved by {}",
            method_label(method),
            approval.approver_name()
        ));
        order.updated_at = now;
        uow.orders().update(&order).await?;
        uow.commit().await?;

        warn!(
            order_id = %order.id,
            refund_id = %refund.id,
            amount = %amount,
            approver = %refund.approved_by,
            actor = %actor.user_id,
            "Refund issued"
        );
        Ok(refund)
    }

    /// Posts room charges to the order's booking folio.
    ///
    /// The booking must be CONFIRMED and the guest authorized. Each charge is
    /// posted with the running amount due.
    async fn charge_to_room(&self, order: &Order, charges: &[Money]) -> ApiResult<()> {
        let booking_id = order.booking_id.as_deref().ok_or_else(|| {
            ApiError::business(format!(
                "Order {} has no hotel booking to charge",
                order.order_number
            ))
        })?;

        let booking = self
            .folio
            .get_booking(booking_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Booking", booking_id))?;
        validate_room_charge_booking(
            booking_id,
            booking.status,
            booking.guest_authorized_for_room_charge,
        )?;

        let description = format!("Restaurant order {}", order.order_number);
        let mut amount_due = booking.amount_due;
        for charge in charges {
            amount_due = apply_room_charge(amount_due, *charge)?;
            self.folio
                .post_charge(booking_id, *charge, amount_due, &description)
                .await?;
            info!(
                order_id = %order.id,
                booking_id,
                charge = %charge,
                amount_due = %amount_due,
                "Room charge posted"
            );
        }
        Ok(())
    }
}

fn ensure_payable(order: &Order) -> Result<(), CoreError> {
    if order.status.is_terminal() {
        return Err(CoreError::OrderNotActive {
            order_id: order.order_number.clone(),
            status: order.status.to_string(),
            action: "accept payments",
        });
    }
    Ok(())
}

/// Total minus net payments so far.
async fn outstanding(uow: &mut UnitOfWork, order: &Order) -> ApiResult<Money> {
    let paid: Money = uow
        .ledger()
        .list_payments(&order.id)
        .await?
        .iter()
        .map(Payment::net_amount)
        .sum();
    Ok((order.total - paid).clamp_non_negative())
}

/// Outstanding balance for a call that takes a tender. Zero balances are
/// rejected; [`OrderService::settle_zero_balance`] closes those.
async fn balance_due(uow: &mut UnitOfWork, order: &Order) -> ApiResult<Money> {
    let remaining = outstanding(uow, order).await?;
    if remaining.is_zero() {
        return Err(ApiError::business(format!(
            "Order {} has no balance due",
            order.order_number
        )));
    }
    Ok(remaining)
}

/// Moves the order to PAID when `balance` is within tolerance of zero.
///
/// Each intermediate status on the way is checked; the table is released.
async fn settle_if_paid(
    uow: &mut UnitOfWork,
    order: &mut Order,
    balance: Money,
    now: DateTime<Utc>,
) -> ApiResult<()> {
    if balance > INPUT_TOLERANCE {
        return Ok(());
    }

    let path = order
        .status
        .forward_path(OrderStatus::Paid)
        .ok_or_else(|| CoreError::InvalidTransition {
            entity: OrderStatus::ENTITY,
            from: order.status.to_string(),
            to: OrderStatus::Paid.to_string(),
        })?;
    for step in path {
        transition(order, step)?;
    }

    order.updated_at = now;
    uow.orders().update(order).await?;
    release_table(uow, order, now).await?;
    Ok(())
}

/// Change handed back per line, taken from cash lines last-first.
fn allocate_change(lines: &[PaymentLine], change: Money) -> Vec<Money> {
    let mut left = change;
    let mut allocation = vec![Money::ZERO; lines.len()];
    for (slot, line) in allocation.iter_mut().zip(lines).rev() {
        if left.is_zero() {
            break;
        }
        if line.method.is_cash() {
            let take = left.min(line.amount);
            *slot = take;
            left -= take;
        }
    }
    allocation
}

fn method_label(method: PaymentMethod) -> &'static str {
    match method {
        PaymentMethod::Cash => "cash",
        PaymentMethod::CreditCard => "credit card",
        PaymentMethod::DebitCard => "debit card",
        PaymentMethod::RoomCharge => "room charge",
        PaymentMethod::Voucher => "voucher",
        PaymentMethod::Complimentary => "complimentary",
    }
}

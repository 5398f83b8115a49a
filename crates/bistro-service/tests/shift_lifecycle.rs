//! Shift open/close, cash reconciliation and table status changes.

mod support;

use bistro_core::split_payment::PaymentLine;
use bistro_core::{Money, Order, OrderStatus, PaymentMethod, ShiftStatus, TableStatus};
use bistro_service::{AddItemRequest, CreateOrderRequest, ErrorCode};

use support::{cashier, manager, money, other_server, server, Harness, MANAGER_PIN};

/// An order at the bar (no tax or service charge) served by the cashier.
async fn bar_order(h: &Harness, menu_item_id: &str) -> Order {
    let order = h
        .pos
        .orders
        .create_order(
            &cashier(),
            CreateOrderRequest {
                outlet_id: "out-2".into(),
                server_id: "c-1".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    h.pos
        .orders
        .add_item(&cashier(), &order.id, AddItemRequest::new(menu_item_id, 1))
        .await
        .unwrap();
    h.pos.orders.get_order_details(&order.id).await.unwrap().order
}

async fn pay_cash(h: &Harness, order: &Order, tendered: &str) {
    h.pos
        .orders
        .process_payment(&cashier(), &order.id, PaymentLine::new(PaymentMethod::Cash, money(tendered)))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_shift_close_reconciles_cash() {
    let h = Harness::new().await;
    let shift = h
        .pos
        .shifts
        .open_shift(&cashier(), "out-2", "c-1", money("1000.00"), None)
        .await
        .unwrap();
    assert_eq!(shift.status, ShiftStatus::Open);

    let first = bar_order(&h, "m-300").await;
    assert_eq!(first.total, money("300.00"));
    pay_cash(&h, &first, "300.00").await;

    let second = bar_order(&h, "m-150").await;
    pay_cash(&h, &second, "200.00").await;

    let closed = h
        .pos
        .shifts
        .close_shift(&cashier(), &shift.id, money("1500.00"), Some("Busy night"))
        .await
        .unwrap();

    assert_eq!(closed.status, ShiftStatus::Closed);
    assert_eq!(closed.expected_cash, Some(money("1450.00")));
    assert_eq!(closed.ending_cash, Some(money("1500.00")));
    assert_eq!(closed.variance, Some(money("50.00")));
    assert!(closed.closed_at.is_some());
    assert_eq!(closed.notes.as_deref(), Some("Busy night"));
}

#[tokio::test]
async fn test_orders_attach_to_open_shift() {
    let h = Harness::new().await;
    let shift = h
        .pos
        .shifts
        .open_shift(&cashier(), "out-2", "c-1", money("500.00"), None)
        .await
        .unwrap();

    let during = bar_order(&h, "m-150").await;
    assert_eq!(during.shift_id.as_deref(), Some(shift.id.as_str()));

    let other = h
        .pos
        .orders
        .create_order(
            &server(),
            CreateOrderRequest {
                outlet_id: "out-1".into(),
                server_id: "s-1".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(other.shift_id, None);

    h.pos
        .shifts
        .close_shift(&cashier(), &shift.id, money("500.00"), None)
        .await
        .unwrap();
    let after = bar_order(&h, "m-150").await;
    assert_eq!(after.shift_id, None);
}

#[tokio::test]
async fn test_one_open_shift_per_cashier() {
    let h = Harness::new().await;
    let shift = h
        .pos
        .shifts
        .open_shift(&cashier(), "out-2", "c-1", money("100.00"), None)
        .await
        .unwrap();

    let err = h
        .pos
        .shifts
        .open_shift(&cashier(), "out-1", "c-1", money("100.00"), None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::BusinessRule);

    let current = h.pos.shifts.current_shift("c-1").await.unwrap().unwrap();
    assert_eq!(current.id, shift.id);
    assert!(h.pos.shifts.current_shift("s-1").await.unwrap().is_none());

    h.pos
        .shifts
        .close_shift(&cashier(), &shift.id, money("100.00"), None)
        .await
        .unwrap();
    h.pos
        .shifts
        .open_shift(&cashier(), "out-1", "c-1", money("100.00"), None)
        .await
        .unwrap();

    let page = h.pos.shifts.list_shifts("out-2", None).await.unwrap();
    assert_eq!(page.total_count, 1);
}

#[tokio::test]
async fn test_shift_access_and_validation() {
    let h = Harness::new().await;

    let err = h
        .pos
        .shifts
        .open_shift(&other_server(), "out-2", "c-1", money("100.00"), None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Unauthorized);

    let err = h
        .pos
        .shifts
        .open_shift(&manager(), "out-2", "nobody", money("100.00"), None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);

    let err = h
        .pos
        .shifts
        .open_shift(&cashier(), "out-2", "c-1", money("-5.00"), None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let shift = h
        .pos
        .shifts
        .open_shift(&manager(), "out-2", "c-1", money("100.00"), None)
        .await
        .unwrap();
    let err = h
        .pos
        .shifts
        .close_shift(&other_server(), &shift.id, money("100.00"), None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::Unauthorized);
}

#[tokio::test]
async fn test_closed_shift_is_frozen() {
    let h = Harness::new().await;
    let shift = h
        .pos
        .shifts
        .open_shift(&cashier(), "out-2", "c-1", money("200.00"), Some("Float from safe"))
        .await
        .unwrap();
    let order = bar_order(&h, "m-150").await;
    pay_cash(&h, &order, "150.00").await;

    let closed = h
        .pos
        .shifts
        .close_shift(&cashier(), &shift.id, money("340.00"), Some("Short ten"))
        .await
        .unwrap();
    assert_eq!(closed.variance, Some(money("-10.00")));
    assert_eq!(closed.notes.as_deref(), Some("Float from safe\nShort ten"));

    let err = h
        .pos
        .shifts
        .close_shift(&cashier(), &shift.id, money("350.00"), None)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::BusinessRule);

    let report = h.pos.shifts.shift_report(&shift.id).await.unwrap();
    assert!(report.is_final);
    assert_eq!(report.expected_cash, money("350.00"));
    assert_eq!(report.counted_cash, Some(money("340.00")));
    assert_eq!(report.variance, Some(money("-10.00")));
}

#[tokio::test]
async fn test_x_reading_does_not_close_shift() {
    let h = Harness::new().await;
    let shift = h
        .pos
        .shifts
        .open_shift(&cashier(), "out-2", "c-1", money("1000.00"), None)
        .await
        .unwrap();
    let order = bar_order(&h, "m-300").await;
    pay_cash(&h, &order, "500.00").await;

    let reading = h
        .pos
        .shifts
        .x_reading(&shift.id, Some(money("1290.00")))
        .await
        .unwrap();
    assert!(!reading.is_final);
    assert_eq!(reading.order_count, 1);
    assert_eq!(reading.cash_collected, money("300.00"));
    assert_eq!(reading.amount_for(PaymentMethod::Cash), money("300.00"));
    assert_eq!(reading.expected_cash, money("1300.00"));
    assert_eq!(reading.variance, Some(money("-10.00")));

    let again = h.pos.shifts.x_reading(&shift.id, None).await.unwrap();
    assert_eq!(again.expected_cash, money("1300.00"));
    assert_eq!(again.variance, None);

    let current = h.pos.shifts.current_shift("c-1").await.unwrap().unwrap();
    assert_eq!(current.status, ShiftStatus::Open);
    assert_eq!(current.expected_cash, None);
    assert_eq!(current.ending_cash, None);
}

#[tokio::test]
async fn test_cash_refund_reduces_expected_cash() {
    let h = Harness::new().await;
    let shift = h
        .pos
        .shifts
        .open_shift(&cashier(), "out-2", "c-1", money("1000.00"), None)
        .await
        .unwrap();
    let order = bar_order(&h, "m-300").await;
    pay_cash(&h, &order, "300.00").await;
    let card = bar_order(&h, "m-150").await;
    h.pos
        .orders
        .process_payment(
            &cashier(),
            &card.id,
            PaymentLine::new(PaymentMethod::CreditCard, money("150.00")),
        )
        .await
        .unwrap();

    h.pos
        .orders
        .refund_payment(
            &cashier(),
            &order.id,
            PaymentMethod::Cash,
            money("40.00"),
            "Overcooked",
            Some(MANAGER_PIN),
        )
        .await
        .unwrap();

    let report = h.pos.shifts.x_reading(&shift.id, None).await.unwrap();
    assert_eq!(report.cash_refunded, money("40.00"));
    assert_eq!(report.refund_count, 1);
    assert_eq!(report.amount_for(PaymentMethod::CreditCard), money("150.00"));
    assert_eq!(report.expected_cash, money("1260.00"));
    let paid: Money = report
        .sales_by_status
        .iter()
        .filter(|s| s.status == OrderStatus::Paid)
        .map(|s| s.amount)
        .sum();
    assert_eq!(paid, money("450.00"));

    let closed = h
        .pos
        .shifts
        .close_shift(&cashier(), &shift.id, money("1260.00"), None)
        .await
        .unwrap();
    assert_eq!(closed.variance, Some(money("0.00")));
}

// =============================================================================
// Tables
// =============================================================================

#[tokio::test]
async fn test_table_status_changes() {
    let h = Harness::new().await;

    let err = h
        .pos
        .tables
        .change_status(&server(), "t-2", TableStatus::Dirty)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidTransition);

    let reserved = h
        .pos
        .tables
        .change_status(&server(), "t-2", TableStatus::Reserved)
        .await
        .unwrap();
    assert_eq!(reserved.status, TableStatus::Reserved);

    let order = h
        .pos
        .orders
        .create_order(
            &server(),
            CreateOrderRequest {
                outlet_id: "out-1".into(),
                server_id: "s-1".into(),
                table_id: Some("t-1".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let err = h
        .pos
        .tables
        .change_status(&server(), "t-1", TableStatus::Available)
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::BusinessRule);

    h.pos.orders.cancel_order(&server(), &order.id, None).await.unwrap();
    let cleaned = h
        .pos
        .tables
        .change_status(&server(), "t-1", TableStatus::Available)
        .await
        .unwrap();
    assert_eq!(cleaned.status, TableStatus::Available);

    let tables = h.pos.tables.list_tables("out-1").await.unwrap();
    assert_eq!(tables.len(), 2);
}

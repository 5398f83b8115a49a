//! Fixtures shared by the repository tests.

use chrono::Utc;

use crate::repository::Repositories;
use crate::Database;
use bistro_core::{
    DiningTable, MenuItem, Money, Order, OrderStatus, Outlet, Rate, Staff, StaffRole, TableStatus,
};

/// Outlet `out-1`, server `s-1`, cashier `c-1`, tables `t-1`/`t-2`, menu item `m-1`.
pub async fn seed_catalog(db: &Database) {
    let now = Utc::now();
    let mut uow = db.begin().await.unwrap();

    uow.catalog()
        .insert_outlet(&Outlet {
            id: "out-1".into(),
            property_id: "prop-1".into(),
            name: "Lobby Restaurant".into(),
            is_active: true,
            tax_rate: Rate::from_bps(1200),
            service_charge_rate: Rate::from_bps(1000),
            warehouse_id: None,
            created_at: now,
        })
        .await
        .unwrap();

    for (id, role) in [("s-1", StaffRole::Server), ("c-1", StaffRole::Cashier)] {
        uow.catalog()
            .insert_staff(&Staff {
                id: id.into(),
                name: id.to_uppercase(),
                role,
                is_active: true,
            })
            .await
            .unwrap();
    }

    for (id, label) in [("t-1", "T1"), ("t-2", "T2")] {
        uow.catalog()
            .insert_table(&DiningTable {
                id: id.into(),
                outlet_id: "out-1".into(),
                label: label.into(),
                capacity: 4,
                status: TableStatus::Available,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    uow.catalog()
        .insert_menu_item(&MenuItem {
            id: "m-1".into(),
            property_id: "prop-1".into(),
            name: "Adobo".into(),
            price: Money::from_cents(25_000),
            is_available: true,
            unavailable_reason: None,
        })
        .await
        .unwrap();

    uow.commit().await.unwrap();
}

/// An OPEN, zero-total order at `out-1` served by `s-1`.
pub fn sample_order(id: &str, number: &str, table_id: Option<&str>) -> Order {
    let now = Utc::now();
    Order {
        id: id.into(),
        order_number: number.into(),
        outlet_id: "out-1".into(),
        server_id: "s-1".into(),
        table_id: table_id.map(str::to_string),
        booking_id: None,
        guest_id: None,
        shift_id: None,
        status: OrderStatus::Open,
        subtotal: Money::ZERO,
        tax_amount: Money::ZERO,
        service_charge: Money::ZERO,
        discount_amount: Money::ZERO,
        tip_amount: Money::ZERO,
        total: Money::ZERO,
        notes: None,
        created_at: now,
        updated_at: now,
    }
}

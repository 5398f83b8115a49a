//! # Seed Data Generator
//!
//! Creates a demo outlet with staff, tables and a small menu.
//!
//! ## Usage
//! ```bash
//! cargo run -p bistro-db --bin seed
//!
//! # Specify database path
//! cargo run -p bistro-db --bin seed -- --db ./data/bistro.db
//! ```
//!
//! Prints the created ids as JSON so they can be pasted into requests.

use chrono::Utc;
use std::env;
use uuid::Uuid;

use bistro_core::{DiningTable, MenuItem, Money, Outlet, Rate, Staff, StaffRole, TableStatus};
use bistro_db::{Database, DbConfig, Repositories};

const DEMO_OUTLET_ID: &str = "00000000-0000-0000-0000-0000000000a1";
const DEMO_PROPERTY_ID: &str = "00000000-0000-0000-0000-0000000000b1";

/// (name, price in cents)
const MENU: &[(&str, i64)] = &[
    ("Chicken Adobo", 25_000),
    ("Sinigang na Baboy", 32_000),
    ("Pancit Canton", 18_000),
    ("Garlic Rice", 6_000),
    ("Halo-Halo", 15_000),
    ("Calamansi Juice", 9_500),
    ("San Miguel Pale Pilsen", 12_000),
    ("Brewed Coffee", 10_000),
];

const STAFF: &[(&str, StaffRole)] = &[
    ("Maria Santos", StaffRole::Server),
    ("Jose Reyes", StaffRole::Server),
    ("Ana Cruz", StaffRole::Cashier),
    ("Ramon Dela Cruz", StaffRole::Manager),
];

const TABLE_COUNT: usize = 12;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./bistro_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Bistro POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./bistro_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Bistro POS Seed Data Generator");
    println!("==============================");
    println!("Database: {}", db_path);

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected, migrations applied");

    let mut uow = db.begin().await?;
    if uow.catalog().get_outlet(DEMO_OUTLET_ID).await?.is_some() {
        println!("⚠ Demo outlet already exists; delete the database file to regenerate.");
        return Ok(());
    }

    let now = Utc::now();
    uow.catalog()
        .insert_outlet(&Outlet {
            id: DEMO_OUTLET_ID.to_string(),
            property_id: DEMO_PROPERTY_ID.to_string(),
            name: "Lobby Restaurant".to_string(),
            is_active: true,
            tax_rate: Rate::from_bps(1200),
            service_charge_rate: Rate::from_bps(1000),
            warehouse_id: Some(Uuid::new_v4().to_string()),
            created_at: now,
        })
        .await?;

    let mut staff_ids = Vec::new();
    for (name, role) in STAFF {
        let staff = Staff {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            role: *role,
            is_active: true,
        };
        uow.catalog().insert_staff(&staff).await?;
        staff_ids.push(serde_json::json!({ "id": staff.id, "name": staff.name, "role": staff.role }));
    }

    let mut table_ids = Vec::new();
    for n in 1..=TABLE_COUNT {
        let table = DiningTable {
            id: Uuid::new_v4().to_string(),
            outlet_id: DEMO_OUTLET_ID.to_string(),
            label: format!("T{n}"),
            capacity: if n % 3 == 0 { 6 } else { 4 },
            status: TableStatus::Available,
            updated_at: now,
        };
        uow.catalog().insert_table(&table).await?;
        table_ids.push(serde_json::json!({ "id": table.id, "label": table.label }));
    }

    let mut menu_ids = Vec::new();
    for (name, cents) in MENU {
        let item = MenuItem {
            id: Uuid::new_v4().to_string(),
            property_id: DEMO_PROPERTY_ID.to_string(),
            name: name.to_string(),
            price: Money::from_cents(*cents),
            is_available: true,
            unavailable_reason: None,
        };
        uow.catalog().insert_menu_item(&item).await?;
        menu_ids.push(serde_json::json!({ "id": item.id, "name": item.name, "price": item.price }));
    }

    uow.commit().await?;

    let summary = serde_json::json!({
        "outlet_id": DEMO_OUTLET_ID,
        "property_id": DEMO_PROPERTY_ID,
        "staff": staff_ids,
        "tables": table_ids,
        "menu": menu_ids,
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    println!("✓ Seed complete!");

    Ok(())
}

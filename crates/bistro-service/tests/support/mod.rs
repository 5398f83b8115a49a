//! Shared fixtures: a seeded in-memory database and fake collaborators.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use bistro_core::{
    BookingStatus, DiningTable, MenuItem, Money, Outlet, Rate, Staff, StaffRole, TableStatus,
};
use bistro_db::{Database, DbConfig, Repositories};
use bistro_service::collaborators::{CollaboratorError, CollaboratorResult};
use bistro_service::{
    Actor, Bistro, BookingFolio, BookingInfo, InventoryRefresher, PinVerification, PinVerifier,
    PosConfig,
};

pub const MANAGER_PIN: &str = "4321";

pub fn money(value: &str) -> Money {
    value.parse().unwrap()
}

// =============================================================================
// Fakes
// =============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct PostedCharge {
    pub booking_id: String,
    pub amount: Money,
    pub new_amount_due: Money,
    pub description: String,
}

#[derive(Default)]
pub struct FakeFolio {
    bookings: Mutex<HashMap<String, BookingInfo>>,
    posted: Mutex<Vec<PostedCharge>>,
}

impl FakeFolio {
    pub fn add_booking(&self, id: &str, guest_id: &str, status: BookingStatus, authorized: bool) {
        self.bookings.lock().unwrap().insert(
            id.to_string(),
            BookingInfo {
                id: id.to_string(),
                guest_id: guest_id.to_string(),
                status,
                guest_authorized_for_room_charge: authorized,
                amount_due: money("1000.00"),
            },
        );
    }

    pub fn set_status(&self, id: &str, status: BookingStatus) {
        if let Some(booking) = self.bookings.lock().unwrap().get_mut(id) {
            booking.status = status;
        }
    }

    pub fn amount_due(&self, id: &str) -> Money {
        self.bookings.lock().unwrap()[id].amount_due
    }

    pub fn posted(&self) -> Vec<PostedCharge> {
        self.posted.lock().unwrap().clone()
    }
}

#[async_trait]
impl BookingFolio for FakeFolio {
    async fn get_booking(&self, booking_id: &str) -> CollaboratorResult<Option<BookingInfo>> {
        Ok(self.bookings.lock().unwrap().get(booking_id).cloned())
    }

    async fn post_charge(
        &self,
        booking_id: &str,
        amount: Money,
        new_amount_due: Money,
        description: &str,
    ) -> CollaboratorResult<()> {
        let mut bookings = self.bookings.lock().unwrap();
        let booking = bookings
            .get_mut(booking_id)
            .ok_or_else(|| CollaboratorError::NotFound {
                entity: "Booking",
                id: booking_id.to_string(),
            })?;
        booking.amount_due = new_amount_due;
        self.posted.lock().unwrap().push(PostedCharge {
            booking_id: booking_id.to_string(),
            amount,
            new_amount_due,
            description: description.to_string(),
        });
        Ok(())
    }
}

pub struct FakePins;

#[async_trait]
impl PinVerifier for FakePins {
    async fn verify_pin(&self, pin: &str) -> CollaboratorResult<PinVerification> {
        if pin == MANAGER_PIN {
            Ok(PinVerification::approved("mgr-1", "Manager One"))
        } else {
            Ok(PinVerification::rejected())
        }
    }
}

#[derive(Default)]
pub struct FakeInventory {
    pub fail: AtomicBool,
    pub calls: AtomicUsize,
}

impl FakeInventory {
    /// Waits until at least `n` refreshes have run.
    pub async fn wait_for_calls(&self, n: usize) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while self.calls.load(Ordering::SeqCst) < n {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("inventory refresh never ran");
    }
}

#[async_trait]
impl InventoryRefresher for FakeInventory {
    async fn refresh_availability(
        &self,
        _menu_item_id: &str,
        _warehouse_id: Option<&str>,
    ) -> CollaboratorResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(CollaboratorError::Unavailable {
                service: "inventory",
                reason: "warehouse offline".into(),
            });
        }
        Ok(())
    }
}

// =============================================================================
// Harness
// =============================================================================

/// Services over a seeded in-memory database.
///
/// | id | what |
/// |----|------|
/// | `out-1` | restaurant, 12% tax, 10% service charge, property `prop-1` |
/// | `out-2` | bar, no tax or service charge, property `prop-1` |
/// | `s-1`, `s-2` | servers |
/// | `c-1` | cashier |
/// | `mgr-1` | manager |
/// | `t-1`, `t-2` | tables at `out-1`; `t-9` at `out-2` |
/// | `m-250`, `m-100`, `m-300`, `m-150` | menu items priced as named |
/// | `m-off` | unavailable ("Out of stock") |
/// | `m-far` | belongs to `prop-2` |
pub struct Harness {
    pub pos: Bistro,
    pub folio: Arc<FakeFolio>,
    pub inventory: Arc<FakeInventory>,
}

impl Harness {
    pub async fn new() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        seed(&db).await;

        let folio = Arc::new(FakeFolio::default());
        let inventory = Arc::new(FakeInventory::default());
        let pos = Bistro::new(
            db,
            &PosConfig::default(),
            folio.clone(),
            Arc::new(FakePins),
            inventory.clone(),
        );
        Harness {
            pos,
            folio,
            inventory,
        }
    }

    pub async fn table_status(&self, table_id: &str) -> TableStatus {
        let mut session = self.pos.db.acquire().await.unwrap();
        session
            .catalog()
            .get_table(table_id)
            .await
            .unwrap()
            .unwrap()
            .status
    }
}

pub fn server() -> Actor {
    Actor::new("s-1", "Maria", StaffRole::Server)
}

pub fn other_server() -> Actor {
    Actor::new("s-2", "Jose", StaffRole::Server)
}

pub fn cashier() -> Actor {
    Actor::new("c-1", "Ana", StaffRole::Cashier)
}

pub fn manager() -> Actor {
    Actor::new("mgr-1", "Manager One", StaffRole::Manager)
}

async fn seed(db: &Database) {
    let now = Utc::now();
    let mut uow = db.begin().await.unwrap();

    for (id, name, tax, service) in [("out-1", "Lobby Restaurant", 1200, 1000), ("out-2", "Pool Bar", 0, 0)] {
        uow.catalog()
            .insert_outlet(&Outlet {
                id: id.into(),
                property_id: "prop-1".into(),
                name: name.into(),
                is_active: true,
                tax_rate: Rate::from_bps(tax),
                service_charge_rate: Rate::from_bps(service),
                warehouse_id: Some(format!("wh-{id}")),
                created_at: now,
            })
            .await
            .unwrap();
    }

    for (id, name, role) in [
        ("s-1", "Maria", StaffRole::Server),
        ("s-2", "Jose", StaffRole::Server),
        ("c-1", "Ana", StaffRole::Cashier),
        ("mgr-1", "Manager One", StaffRole::Manager),
    ] {
        uow.catalog()
            .insert_staff(&Staff {
                id: id.into(),
                name: name.into(),
                role,
                is_active: true,
            })
            .await
            .unwrap();
    }

    for (id, outlet, label) in [("t-1", "out-1", "T1"), ("t-2", "out-1", "T2"), ("t-9", "out-2", "B1")] {
        uow.catalog()
            .insert_table(&DiningTable {
                id: id.into(),
                outlet_id: outlet.into(),
                label: label.into(),
                capacity: 4,
                status: TableStatus::Available,
                updated_at: now,
            })
            .await
            .unwrap();
    }

    for (id, property, name, price, available, reason) in [
        ("m-250", "prop-1", "Chicken Adobo", "250.00", true, None),
        ("m-100", "prop-1", "Halo-Halo", "100.00", true, None),
        ("m-300", "prop-1", "Lechon Kawali", "300.00", true, None),
        ("m-150", "prop-1", "Calamansi Juice", "150.00", true, None),
        ("m-off", "prop-1", "Kare-Kare", "420.00", false, Some("Out of stock")),
        ("m-far", "prop-2", "Sisig", "200.00", true, None),
    ] {
        uow.catalog()
            .insert_menu_item(&MenuItem {
                id: id.into(),
                property_id: property.into(),
                name: name.into(),
                price: money(price),
                is_available: available,
                unavailable_reason: reason.map(str::to_string),
            })
            .await
            .unwrap();
    }

    uow.commit().await.unwrap();
}

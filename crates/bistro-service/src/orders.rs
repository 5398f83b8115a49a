//! # Order Service
//!
//! The order lifecycle: create, edit items, route to the kitchen, discount,
//! tip, cancel and void. Payments live in [`crate::payments`].
//!
//! ## Lifecycle
//! ```text
//!  create_order ──► OPEN ──send_to_kitchen──► SENT_TO_KITCHEN
//!                                                  │ item PREPARING
//!                                                  ▼
//!                                             IN_PROGRESS
//!                                                  │ all items READY/SERVED/CANCELLED
//!                                                  ▼
//!                                                READY
//!                                                  │ all items SERVED/CANCELLED
//!                                                  ▼
//!                                               SERVED ──paid in full──► PAID
//!
//!  any active status ──cancel_order──► CANCELLED
//!                    ──void_order────► VOID   (manager PIN)
//! ```
//!
//! Every mutating method opens one [`UnitOfWork`], re-reads the order inside
//! it, checks the transition, writes, and commits. Nothing is visible to other
//! requests until the commit.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use bistro_core::order_number::{day_key, format_order_number};
use bistro_core::totals::{
    calculate_totals, discount_share_percent, resolve_discount, subtotal_of, verify_totals,
    LineItem,
};
use bistro_core::validation::{
    validate_non_negative, validate_optional_text, validate_page, validate_quantity,
    validate_reason, validate_required,
};
use bistro_core::{
    CoreError, DiscountKind, ItemStatus, Lifecycle, Money, Order, OrderDetails, OrderFilter,
    OrderItem, OrderStatus, Outlet, Page, PageRequest, TableStatus, ValidationError, Void,
};
use bistro_db::{Database, Repositories, UnitOfWork};

use crate::approval::{Approval, ApprovalGate};
use crate::collaborators::{BookingFolio, InventoryRefresher};
use crate::config::OrderSettings;
use crate::context::Actor;
use crate::error::{ApiError, ApiResult};

// =============================================================================
// Requests and results
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    pub outlet_id: String,
    pub server_id: String,
    pub table_id: Option<String>,
    pub booking_id: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddItemRequest {
    pub menu_item_id: String,
    pub quantity: i64,
    pub modifiers: Option<String>,
    pub notes: Option<String>,
}

impl AddItemRequest {
    pub fn new(menu_item_id: impl Into<String>, quantity: i64) -> Self {
        AddItemRequest {
            menu_item_id: menu_item_id.into(),
            quantity,
            modifiers: None,
            notes: None,
        }
    }
}

/// Who the order is for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerAssignment {
    /// Recorded as a note at the top of the order.
    WalkIn { name: String, phone: Option<String> },
    /// Links the order to a hotel booking.
    HotelGuest { booking_id: String, guest_id: String },
}

/// A void record together with the order it changed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoidReceipt {
    pub order: Order,
    pub void: Void,
}

// =============================================================================
// OrderService
// =============================================================================

/// Orchestrates the order lifecycle.
#[derive(Clone)]
pub struct OrderService {
    pub(crate) db: Database,
    pub(crate) gate: ApprovalGate,
    pub(crate) folio: Arc<dyn BookingFolio>,
    inventory: Arc<dyn InventoryRefresher>,
    settings: OrderSettings,
}

impl OrderService {
    pub fn new(
        db: Database,
        gate: ApprovalGate,
        folio: Arc<dyn BookingFolio>,
        inventory: Arc<dyn InventoryRefresher>,
        settings: OrderSettings,
    ) -> Self {
        OrderService {
            db,
            gate,
            folio,
            inventory,
            settings,
        }
    }

    // -------------------------------------------------------------------------
    // Create
    // -------------------------------------------------------------------------

    /// Opens a new order.
    ///
    /// The order carries the server's open shift if there is one, and its
    /// table (if any) becomes OCCUPIED in the same transaction.
    pub async fn create_order(&self, actor: &Actor, req: CreateOrderRequest) -> ApiResult<Order> {
        validate_required("outlet_id", &req.outlet_id)?;
        validate_required("server_id", &req.server_id)?;
        let notes = validate_optional_text("notes", req.notes.as_deref())?;

        let mut uow = self.db.begin().await?;

        let outlet = load_outlet(&mut uow, &req.outlet_id).await?;
        if !outlet.is_active {
            return Err(ApiError::business(format!("Outlet {} is not active", outlet.name)));
        }

        let server = uow
            .catalog()
            .get_staff(&req.server_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Server", &req.server_id))?;
        if !server.is_active {
            return Err(ApiError::business(format!("Server {} is not active", server.name)));
        }

        if let Some(table_id) = &req.table_id {
            let table = uow
                .catalog()
                .get_table(table_id)
                .await?
                .ok_or_else(|| ApiError::not_found("Table", table_id))?;
            if table.outlet_id != outlet.id {
                return Err(ApiError::business(format!(
                    "Table {} does not belong to outlet {}",
                    table.label, outlet.name
                )));
            }
            if let Some(active) = uow.orders().find_active_for_table(table_id).await? {
                return Err(ApiError::business(format!(
                    "Table {} already has an active order ({})",
                    table.label, active.order_number
                )));
            }
        }

        let mut guest_id = None;
        if let Some(booking_id) = &req.booking_id {
            let booking = self
                .folio
                .get_booking(booking_id)
                .await?
                .ok_or_else(|| ApiError::not_found("Booking", booking_id))?;
            if booking.status != bistro_core::BookingStatus::Confirmed {
                return Err(CoreError::BookingNotConfirmed {
                    booking_id: booking_id.clone(),
                    status: booking.status.to_string(),
                }
                .into());
            }
            guest_id = Some(booking.guest_id);
        }

        let shift_id = uow
            .shifts()
            .find_open_for_cashier(&server.id)
            .await?
            .map(|shift| shift.id);

        let now = Utc::now();
        let sequence = uow.orders().next_sequence(&day_key(now.date_naive())).await?;

        let order = Order {
            id: Uuid::new_v4().to_string(),
            order_number: format_order_number(now.date_naive(), sequence),
            outlet_id: outlet.id.clone(),
            server_id: server.id.clone(),
            table_id: req.table_id.clone(),
            booking_id: req.booking_id.clone(),
            guest_id,
            shift_id,
            status: OrderStatus::Open,
            subtotal: Money::ZERO,
            tax_amount: Money::ZERO,
            service_charge: Money::ZERO,
            discount_amount: Money::ZERO,
            tip_amount: Money::ZERO,
            total: Money::ZERO,
            notes,
            created_at: now,
            updated_at: now,
        };

        uow.orders().insert(&order).await?;
        if let Some(table_id) = &order.table_id {
            uow.catalog()
                .set_table_status(table_id, TableStatus::Occupied, now)
                .await?;
        }
        uow.commit().await?;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            table_id = ?order.table_id,
            shift_id = ?order.shift_id,
            actor = %actor.user_id,
            "Order created"
        );
        Ok(order)
    }

    // -------------------------------------------------------------------------
    // Items
    // -------------------------------------------------------------------------

    /// Adds a line at the menu item's current price and recalculates totals.
    ///
    /// A stock refresh for the menu item is started in the background once
    /// the add has committed. Its outcome never affects this call.
    pub async fn add_item(
        &self,
        actor: &Actor,
        order_id: &str,
        req: AddItemRequest,
    ) -> ApiResult<OrderItem> {
        validate_required("menu_item_id", &req.menu_item_id)?;
        validate_quantity(req.quantity, self.settings.max_item_quantity)?;
        let modifiers = validate_optional_text("modifiers", req.modifiers.as_deref())?;
        let notes = validate_optional_text("notes", req.notes.as_deref())?;

        let mut uow = self.db.begin().await?;
        let mut order = load_order(&mut uow, order_id).await?;
        ensure_active(&order, "add items")?;

        let menu_item = uow
            .catalog()
            .get_menu_item(&req.menu_item_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Menu item", &req.menu_item_id))?;
        let outlet = load_outlet(&mut uow, &order.outlet_id).await?;

        if menu_item.property_id != outlet.property_id {
            return Err(ApiError::business(format!(
                "Menu item {} is not sold at this property",
                menu_item.name
            )));
        }
        if !menu_item.is_available {
            return Err(ApiError::business(match &menu_item.unavailable_reason {
                Some(reason) => format!("{} is unavailable: {}", menu_item.name, reason),
                None => format!("{} is unavailable", menu_item.name),
            }));
        }

        let now = Utc::now();
        let item = OrderItem {
            id: Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            menu_item_id: menu_item.id.clone(),
            name: menu_item.name.clone(),
            quantity: req.quantity,
            unit_price: menu_item.price,
            modifiers,
            notes,
            status: ItemStatus::Pending,
            sent_to_kitchen_at: None,
            prepared_at: None,
            served_at: None,
            created_at: now,
            updated_at: now,
        };
        uow.orders().insert_item(&item).await?;

        recalculate(&mut uow, &mut order, &outlet, now).await?;
        uow.orders().update(&order).await?;
        uow.commit().await?;

        info!(
            order_id = %order.id,
            item_id = %item.id,
            menu_item = %item.name,
            quantity = item.quantity,
            total = %order.total,
            actor = %actor.user_id,
            "Item added"
        );

        self.spawn_inventory_refresh(menu_item.id, outlet.warehouse_id);
        Ok(item)
    }

    /// Deletes a PENDING line and recalculates totals.
    pub async fn remove_item(&self, actor: &Actor, order_id: &str, item_id: &str) -> ApiResult<Order> {
        let mut uow = self.db.begin().await?;
        let mut order = load_order(&mut uow, order_id).await?;
        ensure_active(&order, "remove items")?;

        let item = load_item(&mut uow, &order, item_id).await?;
        ensure_pending(&item, "removed")?;

        uow.orders().delete_item(&item.id).await?;

        let outlet = load_outlet(&mut uow, &order.outlet_id).await?;
        let now = Utc::now();
        recalculate(&mut uow, &mut order, &outlet, now).await?;
        uow.orders().update(&order).await?;
        uow.commit().await?;

        info!(order_id = %order.id, item_id = %item.id, actor = %actor.user_id, "Item removed");
        Ok(order)
    }

    /// Changes the quantity of a PENDING line and recalculates totals.
    pub async fn update_item_quantity(
        &self,
        actor: &Actor,
        order_id: &str,
        item_id: &str,
        quantity: i64,
    ) -> ApiResult<OrderItem> {
        validate_quantity(quantity, self.settings.max_item_quantity)?;

        let mut uow = self.db.begin().await?;
        let mut order = load_order(&mut uow, order_id).await?;
        ensure_active(&order, "change quantities")?;

        let mut item = load_item(&mut uow, &order, item_id).await?;
        ensure_pending(&item, "changed")?;

        let now = Utc::now();
        item.quantity = quantity;
        item.updated_at = now;
        uow.orders().update_item(&item).await?;

        let outlet = load_outlet(&mut uow, &order.outlet_id).await?;
        recalculate(&mut uow, &mut order, &outlet, now).await?;
        uow.orders().update(&order).await?;
        uow.commit().await?;

        info!(order_id = %order.id, item_id = %item.id, quantity, actor = %actor.user_id, "Item quantity changed");
        Ok(item)
    }

    /// Replaces the free-text notes of an active order.
    pub async fn update_order_notes(
        &self,
        actor: &Actor,
        order_id: &str,
        notes: Option<&str>,
    ) -> ApiResult<Order> {
        let notes = validate_optional_text("notes", notes)?;

        let mut uow = self.db.begin().await?;
        let mut order = load_order(&mut uow, order_id).await?;
        ensure_active(&order, "edit notes")?;

        order.notes = notes;
        order.updated_at = Utc::now();
        uow.orders().update(&order).await?;
        uow.commit().await?;

        debug!(order_id = %order.id, actor = %actor.user_id, "Order notes updated");
        Ok(order)
    }

    /// Attaches a walk-in customer or a hotel guest to the order.
    pub async fn assign_customer(
        &self,
        actor: &Actor,
        order_id: &str,
        customer: CustomerAssignment,
    ) -> ApiResult<Order> {
        let mut uow = self.db.begin().await?;
        let mut order = load_order(&mut uow, order_id).await?;
        ensure_active(&order, "assign a customer")?;

        match customer {
            CustomerAssignment::WalkIn { name, phone } => {
                let name = validate_reason("customer name", &name)?;
                let line = match validate_optional_text("phone", phone.as_deref())? {
                    Some(phone) => format!("Customer: {name} ({phone})"),
                    None => format!("Customer: {name}"),
                };
                order.prepend_note(&line);
            }
            CustomerAssignment::HotelGuest { booking_id, guest_id } => {
                validate_required("booking_id", &booking_id)?;
                validate_required("guest_id", &guest_id)?;
                let booking = self
                    .folio
                    .get_booking(&booking_id)
                    .await?
                    .ok_or_else(|| ApiError::not_found("Booking", &booking_id))?;
                if booking.guest_id != guest_id {
                    return Err(ApiError::business(format!(
                        "Guest {guest_id} is not on booking {booking_id}"
                    )));
                }
                order.booking_id = Some(booking_id);
                order.guest_id = Some(guest_id);
            }
        }

        order.updated_at = Utc::now();
        uow.orders().update(&order).await?;
        uow.commit().await?;

        info!(order_id = %order.id, booking_id = ?order.booking_id, actor = %actor.user_id, "Customer assigned");
        Ok(order)
    }

    // -------------------------------------------------------------------------
    // Kitchen
    // -------------------------------------------------------------------------

    /// Sends every PENDING item to the kitchen.
    ///
    /// An OPEN order moves to SENT_TO_KITCHEN; an order already further along
    /// keeps its status.
    pub async fn send_to_kitchen(&self, actor: &Actor, order_id: &str) -> ApiResult<Order> {
        let mut uow = self.db.begin().await?;
        let mut order = load_order(&mut uow, order_id).await?;
        ensure_active(&order, "send to the kitchen")?;

        let items = uow.orders().list_items(&order.id).await?;
        if items.is_empty() {
            return Err(ApiError::business("Order has no items"));
        }
        let mut pending: Vec<OrderItem> = items
            .into_iter()
            .filter(|i| i.status == ItemStatus::Pending)
            .collect();
        if pending.is_empty() {
            return Err(ApiError::business("No pending items to send to the kitchen"));
        }

        let now = Utc::now();
        if order.status == OrderStatus::Open {
            transition(&mut order, OrderStatus::SentToKitchen)?;
        }
        for item in &mut pending {
            item.status.ensure_transition(ItemStatus::Sent)?;
            item.status = ItemStatus::Sent;
            item.sent_to_kitchen_at = Some(now);
            item.updated_at = now;
            uow.orders().update_item(item).await?;
        }

        order.updated_at = now;
        uow.orders().update(&order).await?;
        uow.commit().await?;

        info!(
            order_id = %order.id,
            items = pending.len(),
            status = %order.status,
            actor = %actor.user_id,
            "Order sent to kitchen"
        );
        Ok(order)
    }

    /// Kitchen progress on one item: PREPARING, READY or SERVED.
    ///
    /// The order follows its items; see [`cascade_order_status`].
    pub async fn update_item_status(
        &self,
        actor: &Actor,
        order_id: &str,
        item_id: &str,
        status: ItemStatus,
    ) -> ApiResult<OrderItem> {
        if !matches!(
            status,
            ItemStatus::Preparing | ItemStatus::Ready | ItemStatus::Served
        ) {
            return Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: vec!["PREPARING".into(), "READY".into(), "SERVED".into()],
            }
            .into());
        }

        let mut uow = self.db.begin().await?;
        let mut order = load_order(&mut uow, order_id).await?;
        ensure_active(&order, "update items")?;

        let mut item = load_item(&mut uow, &order, item_id).await?;
        if item.status == status {
            return Ok(item);
        }
        item.status.ensure_transition(status)?;

        let now = Utc::now();
        item.status = status;
        item.updated_at = now;
        match status {
            ItemStatus::Ready => item.prepared_at = Some(now),
            ItemStatus::Served => item.served_at = Some(now),
            _ => {}
        }
        uow.orders().update_item(&item).await?;

        let items = uow.orders().list_items(&order.id).await?;
        let before = order.status;
        for next in cascade_order_status(order.status, &items) {
            transition(&mut order, next)?;
        }
        if order.status != before {
            order.updated_at = now;
            uow.orders().update(&order).await?;
        }
        uow.commit().await?;

        debug!(
            order_id = %order.id,
            item_id = %item.id,
            item_status = %item.status,
            order_status = %order.status,
            actor = %actor.user_id,
            "Item status updated"
        );
        Ok(item)
    }

    // -------------------------------------------------------------------------
    // Adjustments
    // -------------------------------------------------------------------------

    /// Applies a discount against a freshly computed subtotal.
    ///
    /// Tax and service charge stay on the full subtotal; the discount only
    /// comes off the total. A discount above the configured share of the
    /// subtotal needs a manager (or a manager PIN).
    pub async fn apply_discount(
        &self,
        actor: &Actor,
        order_id: &str,
        kind: DiscountKind,
        value: Decimal,
        reason: Option<&str>,
        manager_pin: Option<&str>,
    ) -> ApiResult<Order> {
        let reason = validate_optional_text("reason", reason)?;

        let mut uow = self.db.begin().await?;
        let mut order = load_order(&mut uow, order_id).await?;
        ensure_active(&order, "apply a discount")?;

        let items = uow.orders().list_items(&order.id).await?;
        let subtotal = subtotal_of(&billable_lines(&items));
        let amount = resolve_discount(kind, value, subtotal)?;

        let approval: Option<Approval> = if discount_share_percent(amount, subtotal)
            > self.settings.discount_approval_threshold_percent
        {
            Some(
                self.gate
                    .authorize_unless_manager(actor, manager_pin, "apply this discount")
                    .await?,
            )
        } else {
            None
        };

        let outlet = load_outlet(&mut uow, &order.outlet_id).await?;
        let now = Utc::now();
        order.discount_amount = amount;
        apply_totals(&mut order, &items, &outlet);

        let mut note = match kind {
            DiscountKind::Percentage => format!("Discount {value}%: -{amount} by {}", actor.name),
            DiscountKind::FixedAmount => format!("Discount: -{amount} by {}", actor.name),
        };
        if let Some(approval) = &approval {
            note.push_str(&format!(" (approved by {})", approval.approver_name()));
        }
        if let Some(reason) = &reason {
            note.push_str(&format!(": {reason}"));
        }
        order.append_note(&note);
        order.updated_at = now;

        uow.orders().update(&order).await?;
        uow.commit().await?;

        info!(
            order_id = %order.id,
            discount = %amount,
            total = %order.total,
            approver = ?approval.as_ref().map(Approval::approver_id),
            actor = %actor.user_id,
            "Discount applied"
        );
        Ok(order)
    }

    /// Sets the tip. Only the total moves.
    pub async fn add_tip(&self, actor: &Actor, order_id: &str, tip: Money) -> ApiResult<Order> {
        validate_non_negative("tip", tip)?;

        let mut uow = self.db.begin().await?;
        let mut order = load_order(&mut uow, order_id).await?;
        ensure_active(&order, "add a tip")?;

        // Adjusts the current total so an earlier item void stays off the bill.
        order.total = (order.total - order.tip_amount + tip).clamp_non_negative();
        order.tip_amount = tip;
        order.updated_at = Utc::now();

        uow.orders().update(&order).await?;
        uow.commit().await?;

        info!(order_id = %order.id, tip = %tip, total = %order.total, actor = %actor.user_id, "Tip added");
        Ok(order)
    }

    // -------------------------------------------------------------------------
    // Cancel / Void
    // -------------------------------------------------------------------------

    /// Cancels an order: items cancelled, table released to DIRTY.
    pub async fn cancel_order(
        &self,
        actor: &Actor,
        order_id: &str,
        reason: Option<&str>,
    ) -> ApiResult<Order> {
        let reason = validate_optional_text("reason", reason)?;

        let mut uow = self.db.begin().await?;
        let mut order = load_order(&mut uow, order_id).await?;
        ensure_active(&order, "cancel")?;
        transition(&mut order, OrderStatus::Cancelled)?;

        let now = Utc::now();
        let cancelled = cancel_open_items(&mut uow, &order.id, now).await?;
        release_table(&mut uow, &order, now).await?;

        order.append_note(&match reason {
            Some(reason) => format!("Cancelled by {}: {reason}", actor.name),
            None => format!("Cancelled by {}", actor.name),
        });
        order.updated_at = now;
        uow.orders().update(&order).await?;
        uow.commit().await?;

        info!(order_id = %order.id, items_cancelled = cancelled, actor = %actor.user_id, "Order cancelled");
        Ok(order)
    }

    /// Voids a whole order. Always needs a verified manager PIN.
    pub async fn void_order(
        &self,
        actor: &Actor,
        order_id: &str,
        reason: &str,
        manager_pin: Option<&str>,
    ) -> ApiResult<VoidReceipt> {
        let reason = validate_reason("reason", reason)?;

        let mut uow = self.db.begin().await?;
        let mut order = load_order(&mut uow, order_id).await?;
        ensure_active(&order, "void")?;
        order.status.ensure_transition(OrderStatus::Void)?;

        let approval = self.gate.authorize(actor, manager_pin, "void this order").await?;

        let now = Utc::now();
        let void = Void {
            id: Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            order_item_id: None,
            reason,
            amount: order.total,
            voided_by: actor.user_id.clone(),
            approved_by: approval.approver_id().to_string(),
            created_at: now,
        };
        uow.ledger().insert_void(&void).await?;

        transition(&mut order, OrderStatus::Void)?;
        let cancelled = cancel_open_items(&mut uow, &order.id, now).await?;
        release_table(&mut uow, &order, now).await?;
        order.updated_at = now;
        uow.orders().update(&order).await?;
        uow.commit().await?;

        warn!(
            order_id = %order.id,
            amount = %void.amount,
            items_cancelled = cancelled,
            approver = %void.approved_by,
            actor = %actor.user_id,
            "Order voided"
        );
        Ok(VoidReceipt { order, void })
    }

    /// Voids one line.
    ///
    /// The order's own server and managers may void without a PIN; anyone
    /// else needs one. The line amount comes straight off the order total;
    /// subtotal, tax and service charge are left as they were.
    pub async fn void_item(
        &self,
        actor: &Actor,
        order_id: &str,
        item_id: &str,
        reason: &str,
        manager_pin: Option<&str>,
    ) -> ApiResult<VoidReceipt> {
        let reason = validate_reason("reason", reason)?;

        let mut uow = self.db.begin().await?;
        let mut order = load_order(&mut uow, order_id).await?;
        ensure_active(&order, "void items")?;

        let mut item = load_item(&mut uow, &order, item_id).await?;
        if item.status == ItemStatus::Cancelled {
            return Err(ApiError::business(format!("Item {} is already cancelled", item.name)));
        }
        item.status.ensure_transition(ItemStatus::Cancelled)?;

        let approval = if actor.user_id == order.server_id || actor.is_manager() {
            Approval::by_actor(actor)
        } else {
            self.gate.authorize(actor, manager_pin, "void this item").await?
        };

        let now = Utc::now();
        let amount = item.line_amount();
        let void = Void {
            id: Uuid::new_v4().to_string(),
            order_id: order.id.clone(),
            order_item_id: Some(item.id.clone()),
            reason,
            amount,
            voided_by: actor.user_id.clone(),
            approved_by: approval.approver_id().to_string(),
            created_at: now,
        };
        uow.ledger().insert_void(&void).await?;

        item.status = ItemStatus::Cancelled;
        item.updated_at = now;
        uow.orders().update_item(&item).await?;

        order.total = (order.total - amount).clamp_non_negative();
        order.updated_at = now;
        uow.orders().update(&order).await?;
        uow.commit().await?;

        warn!(
            order_id = %order.id,
            item_id = %item.id,
            amount = %amount,
            approver = %void.approved_by,
            actor = %actor.user_id,
            "Item voided"
        );
        Ok(VoidReceipt { order, void })
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub async fn get_order_details(&self, order_id: &str) -> ApiResult<OrderDetails> {
        let mut session = self.db.acquire().await?;
        let order = load_order(&mut session, order_id).await?;
        let items = session.orders().list_items(&order.id).await?;
        let payments = session.ledger().list_payments(&order.id).await?;
        let voids = session.ledger().list_voids(&order.id).await?;
        let refunds = session.ledger().list_refunds(&order.id).await?;
        Ok(OrderDetails {
            order,
            items,
            payments,
            voids,
            refunds,
        })
    }

    pub async fn get_order_by_number(&self, order_number: &str) -> ApiResult<Order> {
        let mut session = self.db.acquire().await?;
        session
            .orders()
            .get_by_number(order_number)
            .await?
            .ok_or_else(|| ApiError::not_found("Order", order_number))
    }

    /// Newest-first page of orders. `page` defaults to the first page at the
    /// configured size.
    pub async fn list_orders(
        &self,
        filter: &OrderFilter,
        page: Option<PageRequest>,
    ) -> ApiResult<Page<Order>> {
        let page = page.unwrap_or(PageRequest::new(1, self.settings.default_page_size));
        validate_page(page.page, page.page_size, self.settings.max_page_size)?;

        let mut session = self.db.acquire().await?;
        Ok(session.orders().list(filter, page).await?)
    }

    // -------------------------------------------------------------------------
    // Background
    // -------------------------------------------------------------------------

    fn spawn_inventory_refresh(&self, menu_item_id: String, warehouse_id: Option<String>) {
        let inventory = Arc::clone(&self.inventory);
        tokio::spawn(async move {
            if let Err(e) = inventory
                .refresh_availability(&menu_item_id, warehouse_id.as_deref())
                .await
            {
                warn!(menu_item_id = %menu_item_id, error = %e, "Inventory refresh failed");
            }
        });
    }
}

// =============================================================================
// Shared helpers
// =============================================================================

pub(crate) async fn load_order(repos: &mut impl Repositories, id: &str) -> ApiResult<Order> {
    validate_required("order_id", id)?;
    repos
        .orders()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Order", id))
}

pub(crate) async fn load_outlet(repos: &mut impl Repositories, id: &str) -> ApiResult<Outlet> {
    repos
        .catalog()
        .get_outlet(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Outlet", id))
}

/// An item of `order`. Items of other orders are reported as not found.
async fn load_item(repos: &mut impl Repositories, order: &Order, item_id: &str) -> ApiResult<OrderItem> {
    validate_required("item_id", item_id)?;
    repos
        .orders()
        .get_item(item_id)
        .await?
        .filter(|item| item.order_id == order.id)
        .ok_or_else(|| ApiError::not_found("Order item", item_id))
}

pub(crate) fn ensure_active(order: &Order, action: &'static str) -> Result<(), CoreError> {
    if order.is_active() {
        Ok(())
    } else {
        Err(CoreError::OrderNotActive {
            order_id: order.order_number.clone(),
            status: order.status.to_string(),
            action,
        })
    }
}

fn ensure_pending(item: &OrderItem, action: &'static str) -> Result<(), CoreError> {
    if item.status == ItemStatus::Pending {
        Ok(())
    } else {
        Err(CoreError::ItemNotPending {
            item_id: item.id.clone(),
            status: item.status.to_string(),
            action,
        })
    }
}

/// Checked status write.
pub(crate) fn transition(order: &mut Order, to: OrderStatus) -> Result<(), CoreError> {
    order.status.ensure_transition(to)?;
    order.status = to;
    Ok(())
}

/// System-triggered release: bypasses the table state machine.
pub(crate) async fn release_table(
    uow: &mut UnitOfWork,
    order: &Order,
    now: DateTime<Utc>,
) -> ApiResult<()> {
    if let Some(table_id) = &order.table_id {
        uow.catalog()
            .set_table_status(table_id, TableStatus::Dirty, now)
            .await?;
    }
    Ok(())
}

fn billable_lines(items: &[OrderItem]) -> Vec<LineItem> {
    items
        .iter()
        .filter(|i| i.is_billable())
        .map(LineItem::from)
        .collect()
}

/// Recomputes the six monetary fields from `items`, keeping the current
/// discount (capped at the new subtotal) and tip.
fn apply_totals(order: &mut Order, items: &[OrderItem], outlet: &Outlet) {
    let lines = billable_lines(items);
    let discount = order.discount_amount.min(subtotal_of(&lines));
    let totals = calculate_totals(
        &lines,
        outlet.tax_rate,
        outlet.service_charge_rate,
        discount,
        order.tip_amount,
    );
    debug_assert!(verify_totals(&totals));
    order.set_totals(&totals);
}

async fn recalculate(
    uow: &mut UnitOfWork,
    order: &mut Order,
    outlet: &Outlet,
    now: DateTime<Utc>,
) -> ApiResult<()> {
    let items = uow.orders().list_items(&order.id).await?;
    apply_totals(order, &items, outlet);
    order.updated_at = now;
    Ok(())
}

/// Cancels every non-terminal item of an order. Returns how many changed.
async fn cancel_open_items(
    uow: &mut UnitOfWork,
    order_id: &str,
    now: DateTime<Utc>,
) -> ApiResult<usize> {
    let items = uow.orders().list_items(order_id).await?;
    let mut cancelled = 0;
    for mut item in items.into_iter().filter(|i| !i.status.is_terminal()) {
        item.status.ensure_transition(ItemStatus::Cancelled)?;
        item.status = ItemStatus::Cancelled;
        item.updated_at = now;
        uow.orders().update_item(&item).await?;
        cancelled += 1;
    }
    Ok(cancelled)
}

/// Order statuses implied by kitchen progress, in the order they apply.
///
/// - SENT_TO_KITCHEN → IN_PROGRESS once any item is past SENT
/// - IN_PROGRESS → READY once every item is READY, SERVED or CANCELLED
/// - READY → SERVED once every item is SERVED or CANCELLED
///
/// An order whose items are all cancelled does not move.
pub fn cascade_order_status(current: OrderStatus, items: &[OrderItem]) -> Vec<OrderStatus> {
    let mut steps = Vec::new();
    if !items.iter().any(OrderItem::is_billable) {
        return steps;
    }

    let mut status = current;
    loop {
        let next = match status {
            OrderStatus::SentToKitchen
                if items.iter().any(|i| {
                    matches!(
                        i.status,
                        ItemStatus::Preparing | ItemStatus::Ready | ItemStatus::Served
                    )
                }) =>
            {
                OrderStatus::InProgress
            }
            OrderStatus::InProgress if items.iter().all(|i| i.status.is_ready_or_done()) => {
                OrderStatus::Ready
            }
            OrderStatus::Ready
                if items
                    .iter()
                    .all(|i| matches!(i.status, ItemStatus::Served | ItemStatus::Cancelled)) =>
            {
                OrderStatus::Served
            }
            _ => break,
        };
        steps.push(next);
        status = next;
    }
    steps
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(status: ItemStatus) -> OrderItem {
        let now = Utc::now();
        OrderItem {
            id: Uuid::new_v4().to_string(),
            order_id: "o-1".into(),
            menu_item_id: "m-1".into(),
            name: "Adobo".into(),
            quantity: 1,
            unit_price: Money::from_cents(25_000),
            modifiers: None,
            notes: None,
            status,
            sent_to_kitchen_at: None,
            prepared_at: None,
            served_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_first_preparing_item_starts_the_order() {
        let items = [item(ItemStatus::Preparing), item(ItemStatus::Sent)];
        assert_eq!(
            cascade_order_status(OrderStatus::SentToKitchen, &items),
            vec![OrderStatus::InProgress]
        );
    }

    #[test]
    fn test_all_ready_moves_order_to_ready() {
        let items = [item(ItemStatus::Ready), item(ItemStatus::Cancelled)];
        assert_eq!(
            cascade_order_status(OrderStatus::InProgress, &items),
            vec![OrderStatus::Ready]
        );

        let items = [item(ItemStatus::Ready), item(ItemStatus::Preparing)];
        assert!(cascade_order_status(OrderStatus::InProgress, &items).is_empty());
    }

    #[test]
    fn test_all_served_walks_every_step() {
        let items = [item(ItemStatus::Served), item(ItemStatus::Served)];
        let steps = cascade_order_status(OrderStatus::SentToKitchen, &items);
        assert_eq!(
            steps,
            vec![OrderStatus::InProgress, OrderStatus::Ready, OrderStatus::Served]
        );

        let mut status = OrderStatus::SentToKitchen;
        for step in steps {
            assert!(bistro_core::is_valid_transition(status, step));
            status = step;
        }
    }

    #[test]
    fn test_cascade_never_touches_open_or_all_cancelled_orders() {
        let served = [item(ItemStatus::Served)];
        assert!(cascade_order_status(OrderStatus::Open, &served).is_empty());

        let cancelled = [item(ItemStatus::Cancelled)];
        assert!(cascade_order_status(OrderStatus::InProgress, &cancelled).is_empty());
    }

    #[test]
    fn test_ensure_active_names_the_status() {
        let mut order = bistro_core::Order {
            id: "o-1".into(),
            order_number: "ORD-20240309-0001".into(),
            outlet_id: "out-1".into(),
            server_id: "s-1".into(),
            table_id: None,
            booking_id: None,
            guest_id: None,
            shift_id: None,
            status: OrderStatus::Paid,
            subtotal: Money::ZERO,
            tax_amount: Money::ZERO,
            service_charge: Money::ZERO,
            discount_amount: Money::ZERO,
            tip_amount: Money::ZERO,
            total: Money::ZERO,
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let err = ensure_active(&order, "add items").unwrap_err();
        assert!(err.to_string().contains("PAID"));

        order.status = OrderStatus::Served;
        assert!(ensure_active(&order, "add items").is_ok());
    }
}

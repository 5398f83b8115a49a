//! # Shift Service
//!
//! Opening and closing cashier shifts, and the reports read from them.
//!
//! ```text
//!  open_shift(starting_cash) ──► OPEN ──close_shift(counted)──► CLOSED
//!                                 │                              (frozen)
//!                                 └── x_reading(counted?)  read-only
//!
//!  expected = starting + Σ net cash payments − Σ cash refunds
//!  variance = counted − expected      (+ overage, − shortage)
//! ```
//!
//! Payments and refunds belong to a shift through their order's `shift_id`.

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use bistro_core::reconciliation::{calculate_expected_cash, calculate_variance, VarianceKind};
use bistro_core::report::{ShiftActivity, ShiftReport};
use bistro_core::types::append_line;
use bistro_core::validation::{
    validate_non_negative, validate_optional_text, validate_page, validate_required,
};
use bistro_core::{Money, Page, PageRequest, Shift, ShiftStatus};
use bistro_db::{Database, Repositories};

use crate::config::OrderSettings;
use crate::context::Actor;
use crate::error::{ApiError, ApiResult};
use crate::orders::load_outlet;

/// Orchestrates cashier shifts.
#[derive(Clone)]
pub struct ShiftService {
    db: Database,
    settings: OrderSettings,
}

impl ShiftService {
    pub fn new(db: Database, settings: OrderSettings) -> Self {
        ShiftService { db, settings }
    }

    /// Opens a shift for `cashier_id`.
    ///
    /// A cashier holds at most one OPEN shift. The check runs inside the
    /// insert transaction and a unique index backs it up.
    pub async fn open_shift(
        &self,
        actor: &Actor,
        outlet_id: &str,
        cashier_id: &str,
        starting_cash: Money,
        notes: Option<&str>,
    ) -> ApiResult<Shift> {
        validate_required("outlet_id", outlet_id)?;
        validate_required("cashier_id", cashier_id)?;
        validate_non_negative("starting cash", starting_cash)?;
        let notes = validate_optional_text("notes", notes)?;
        ensure_own_or_manager(actor, cashier_id, "open a shift for another cashier")?;

        let mut uow = self.db.begin().await?;

        let outlet = load_outlet(&mut uow, outlet_id).await?;
        if !outlet.is_active {
            return Err(ApiError::business(format!("Outlet {} is not active", outlet.name)));
        }
        let cashier = uow
            .catalog()
            .get_staff(cashier_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Cashier", cashier_id))?;

        if let Some(open) = uow.shifts().find_open_for_cashier(&cashier.id).await? {
            return Err(ApiError::business(format!(
                "Cashier {} already has an open shift ({})",
                cashier.name, open.id
            )));
        }

        let shift = Shift {
            id: Uuid::new_v4().to_string(),
            outlet_id: outlet.id.clone(),
            cashier_id: cashier.id.clone(),
            status: ShiftStatus::Open,
            starting_cash,
            ending_cash: None,
            expected_cash: None,
            variance: None,
            opened_at: Utc::now(),
            closed_at: None,
            notes,
        };
        uow.shifts().insert(&shift).await?;
        uow.commit().await?;

        info!(
            shift_id = %shift.id,
            cashier_id = %shift.cashier_id,
            starting_cash = %starting_cash,
            actor = %actor.user_id,
            "Shift opened"
        );
        Ok(shift)
    }

    /// Closes a shift against the counted drawer.
    ///
    /// Expected cash, counted cash and variance are frozen; closing notes are
    /// appended to any existing notes.
    pub async fn close_shift(
        &self,
        actor: &Actor,
        shift_id: &str,
        ending_cash: Money,
        notes: Option<&str>,
    ) -> ApiResult<Shift> {
        validate_non_negative("ending cash", ending_cash)?;
        let notes = validate_optional_text("notes", notes)?;

        let mut uow = self.db.begin().await?;
        let mut shift = load_shift(&mut uow, shift_id).await?;
        if !shift.is_open() {
            return Err(ApiError::business(format!("Shift {} is already closed", shift.id)));
        }
        ensure_own_or_manager(actor, &shift.cashier_id, "close another cashier's shift")?;

        let payments = uow.ledger().list_payments_for_shift(&shift.id).await?;
        let refunds = uow.ledger().list_refunds_for_shift(&shift.id).await?;
        let activity = ShiftActivity {
            orders: &[],
            payments: &payments,
            voids: &[],
            refunds: &refunds,
        };

        let expected = calculate_expected_cash(
            shift.starting_cash,
            &activity.cash_payments(),
            &activity.cash_refunds(),
        );
        let variance = calculate_variance(ending_cash, expected);

        shift.status = ShiftStatus::Closed;
        shift.ending_cash = Some(ending_cash);
        shift.expected_cash = Some(expected);
        shift.variance = Some(variance);
        shift.closed_at = Some(Utc::now());
        if let Some(notes) = notes {
            shift.notes = Some(append_line(shift.notes.take(), &notes));
        }

        uow.shifts().close(&shift).await?;
        uow.commit().await?;

        match VarianceKind::of(variance) {
            VarianceKind::Balanced => info!(
                shift_id = %shift.id,
                expected = %expected,
                actor = %actor.user_id,
                "Shift closed balanced"
            ),
            kind => warn!(
                shift_id = %shift.id,
                expected = %expected,
                counted = %ending_cash,
                variance = %variance,
                kind = ?kind,
                actor = %actor.user_id,
                "Shift closed with variance"
            ),
        }
        Ok(shift)
    }

    /// The cashier's OPEN shift, if any.
    pub async fn current_shift(&self, cashier_id: &str) -> ApiResult<Option<Shift>> {
        validate_required("cashier_id", cashier_id)?;
        let mut session = self.db.acquire().await?;
        Ok(session.shifts().find_open_for_cashier(cashier_id).await?)
    }

    pub async fn list_shifts(
        &self,
        outlet_id: &str,
        page: Option<PageRequest>,
    ) -> ApiResult<Page<Shift>> {
        validate_required("outlet_id", outlet_id)?;
        let page = page.unwrap_or(PageRequest::new(1, self.settings.default_page_size));
        validate_page(page.page, page.page_size, self.settings.max_page_size)?;

        let mut session = self.db.acquire().await?;
        Ok(session.shifts().list_for_outlet(outlet_id, page).await?)
    }

    /// Report for a shift. Final once the shift is closed.
    pub async fn shift_report(&self, shift_id: &str) -> ApiResult<ShiftReport> {
        self.build_report(shift_id, None).await
    }

    /// Interim snapshot of an open shift. Never writes.
    ///
    /// With `counted_cash` the report carries the variance the drawer would
    /// show if the shift closed now.
    pub async fn x_reading(
        &self,
        shift_id: &str,
        counted_cash: Option<Money>,
    ) -> ApiResult<ShiftReport> {
        if let Some(counted) = counted_cash {
            validate_non_negative("counted cash", counted)?;
        }
        self.build_report(shift_id, counted_cash).await
    }

    async fn build_report(
        &self,
        shift_id: &str,
        counted_cash: Option<Money>,
    ) -> ApiResult<ShiftReport> {
        let mut session = self.db.acquire().await?;
        let shift = load_shift(&mut session, shift_id).await?;

        let orders = session.orders().list_for_shift(&shift.id).await?;
        let payments = session.ledger().list_payments_for_shift(&shift.id).await?;
        let voids = session.ledger().list_voids_for_shift(&shift.id).await?;
        let refunds = session.ledger().list_refunds_for_shift(&shift.id).await?;

        let activity = ShiftActivity {
            orders: &orders,
            payments: &payments,
            voids: &voids,
            refunds: &refunds,
        };
        Ok(ShiftReport::build(&shift, activity, counted_cash, Utc::now()))
    }
}

async fn load_shift(repos: &mut impl Repositories, id: &str) -> ApiResult<Shift> {
    validate_required("shift_id", id)?;
    repos
        .shifts()
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Shift", id))
}

fn ensure_own_or_manager(actor: &Actor, cashier_id: &str, action: &str) -> ApiResult<()> {
    if actor.user_id == cashier_id || actor.is_manager() {
        Ok(())
    } else {
        Err(ApiError::unauthorized(format!("Only a manager may {action}")))
    }
}

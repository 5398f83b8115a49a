//! # Money Module
//!
//! Provides the `Money` and `Rate` types for handling monetary values safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  On a restaurant check:                                                 │
//! │    250.00 × 2 × 0.12 drifts by fractions of a cent per line            │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 Decimal, rounded to 2 places                     │
//! │    every derived field is rounded at its own boundary                   │
//! │    (subtotal, tax, service charge, total) - never only at the end       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use bistro_core::money::{Money, Rate};
//!
//! let price = Money::from_cents(25000);          // 250.00
//! let line = price * 2;                          // 500.00
//! let tax = Rate::from_bps(1200).apply(line);    // 12% → 60.00
//! assert_eq!(tax.cents(), 6000);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;

use crate::error::ValidationError;

/// Decimal places kept for every monetary value.
pub const MONEY_SCALE: u32 = 2;

/// Tolerance for input-level comparisons (payment sums, settlement): 0.01
pub const INPUT_TOLERANCE: Money = Money(Decimal::from_parts(1, 0, 0, false, 2));

/// Tolerance for derived comparisons (recomputed totals): 0.02
pub const DERIVED_TOLERANCE: Money = Money(Decimal::from_parts(2, 0, 0, false, 2));

/// Rounds a decimal to two places, midpoint away from zero, and pins the
/// scale at two so `50` and `50.00` serialize alike.
#[inline]
fn round2(value: Decimal) -> Decimal {
    let mut rounded =
        value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value with exactly two decimal places.
///
/// ## Design Decisions
/// - **Decimal (signed)**: negative values exist for adjustments and variance
/// - **Always rounded**: every constructor and operator result is rounded to
///   two places, so a `Money` can never carry sub-cent residue
/// - **Serialized as a string**: `"682.00"`, never as a JSON float
///
/// ## Where Money is Used
/// ```text
/// MenuItem.price ──► OrderItem.unit_price ──► line amount
///                                               │
/// Order.subtotal ──► tax / service charge ──► Order.total ──► Payment.amount
///                                               │
/// Shift.starting_cash + cash payments ──► expected cash ──► variance
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Decimal", into = "Decimal")]
pub struct Money(Decimal);

impl Money {
    /// Zero money value.
    pub const ZERO: Money = Money(Decimal::ZERO);

    /// Creates a Money value from a decimal, rounding to two places.
    #[inline]
    pub fn new(value: Decimal) -> Self {
        Money(round2(value))
    }

    /// Creates a Money value from cents (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use bistro_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.to_string(), "10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, MONEY_SCALE))
    }

    /// Returns the value in cents.
    ///
    /// This is the storage representation used by the database layer.
    pub fn cents(&self) -> i64 {
        (self.0 * Decimal::ONE_HUNDRED)
            .trunc()
            .to_i64()
            .unwrap_or(if self.0.is_sign_negative() { i64::MIN } else { i64::MAX })
    }

    /// Returns the underlying decimal.
    #[inline]
    pub fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money::ZERO
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is strictly greater than zero.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is strictly less than zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Returns the absolute value.
    #[inline]
    pub fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns the larger of `self` and zero.
    #[inline]
    pub fn clamp_non_negative(self) -> Self {
        if self.is_negative() {
            Money::ZERO
        } else {
            self
        }
    }

    /// Checks whether two amounts differ by at most `tolerance`.
    ///
    /// ## Example
    /// ```rust
    /// use bistro_core::money::{Money, INPUT_TOLERANCE};
    ///
    /// let a = Money::from_cents(68200);
    /// let b = Money::from_cents(68201);
    /// assert!(a.approx_eq(b, INPUT_TOLERANCE));
    /// ```
    #[inline]
    pub fn approx_eq(&self, other: Money, tolerance: Money) -> bool {
        (self.0 - other.0).abs() <= tolerance.0
    }

    /// Multiplies by an integer quantity.
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Self {
        Money::new(self.0 * Decimal::from(qty))
    }

    /// Computes `percent`% of this amount (percent in 0..=100).
    pub fn percentage(&self, percent: Decimal) -> Self {
        Money::new(self.0 * percent / Decimal::ONE_HUNDRED)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Always prints two decimals: `682.00`, `-50.00`.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::ZERO
    }
}

impl From<Decimal> for Money {
    fn from(value: Decimal) -> Self {
        Money::new(value)
    }
}

impl From<Money> for Decimal {
    fn from(value: Money) -> Self {
        value.0
    }
}

impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim())
            .map(Money::new)
            .map_err(|e| ValidationError::InvalidFormat {
                field: "amount".to_string(),
                reason: e.to_string(),
            })
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money::new(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money::new(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::ZERO, |acc, m| acc + *m)
    }
}

// =============================================================================
// Rate
// =============================================================================

/// A percentage rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1200 bps = 12% (VAT), 1000 bps = 10% (service charge)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a decimal fraction (1200 bps → 0.12).
    #[inline]
    pub fn as_fraction(&self) -> Decimal {
        Decimal::new(self.0 as i64, 4)
    }

    /// Applies the rate to an amount and rounds to two places.
    pub fn apply(&self, amount: Money) -> Money {
        Money::new(amount.amount() * self.as_fraction())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

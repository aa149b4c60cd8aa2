//! # Money Module
//!
//! Provides the `Money` and `Rate` types used by every calculation in Till.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  A drawer that is "one cent short" because of float drift is            │
//! │  indistinguishable from a drawer that is one cent short because         │
//! │  someone took a penny. Variance reports must be exact.                  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Cents                                            │
//! │    Every amount is an i64 count of cents. Rates (tax, surcharge,        │
//! │    percent discounts) are basis points. Rounding happens at exactly     │
//! │    one place per rate application, half-up.                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::money::{Money, Rate};
//!
//! let price = Money::from_cents(1728);        // $17.28
//! let surcharge = price.apply_rate(Rate::from_bps(400)); // 4% -> $0.69
//! assert_eq!((price + surcharge).cents(), 1797);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (cents for USD).
///
/// ## Design Decisions
/// - **i64 (signed)**: Drawer variance and change math need negative values
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for wire payloads and records
///
/// Every amount in the system flows through this type: line totals, tax,
/// surcharges, tips, tendered cash, change, drawer floats, and variance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from cents (the smallest currency unit).
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in cents.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is strictly positive.
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative.
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Subtracts `other`, flooring the result at zero.
    ///
    /// ## Why floor at zero?
    /// A global discount larger than the cart subtotal must clamp to zero
    /// effect, not drive the total negative. Same for the taxable base
    /// after discount allocation.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// let subtotal = Money::from_cents(1800);
    /// assert_eq!(subtotal.sub_to_zero(Money::from_cents(200)).cents(), 1600);
    /// assert_eq!(subtotal.sub_to_zero(Money::from_cents(5000)).cents(), 0);
    /// ```
    #[inline]
    pub const fn sub_to_zero(self, other: Money) -> Money {
        let diff = self.0 - other.0;
        if diff < 0 {
            Money(0)
        } else {
            Money(diff)
        }
    }

    /// Multiplies by a quantity.
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Applies a rate (tax, surcharge, percent discount) and returns the
    /// resulting amount, rounded half-up.
    ///
    /// ## Implementation
    /// Integer math in i128 to prevent overflow on large amounts:
    /// `(cents × bps + 5000) / 10000`. The +5000 rounds the half cent up.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::{Money, Rate};
    ///
    /// // $16.00 at 8% tax = $1.28
    /// let base = Money::from_cents(1600);
    /// assert_eq!(base.apply_rate(Rate::from_bps(800)).cents(), 128);
    ///
    /// // $17.28 at a 4% card surcharge = $0.69 (69.12 rounds down)
    /// let cash_total = Money::from_cents(1728);
    /// assert_eq!(cash_total.apply_rate(Rate::from_bps(400)).cents(), 69);
    /// ```
    pub fn apply_rate(&self, rate: Rate) -> Money {
        let amount = (self.0 as i128 * rate.bps() as i128 + 5000) / 10000;
        Money::from_cents(amount as i64)
    }

    /// Applies a percentage discount expressed in basis points and returns
    /// the discounted amount (the remainder, not the discount).
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// // $20.00 with a 10% line discount = $18.00
    /// let line = Money::from_cents(2000);
    /// assert_eq!(line.discount_bps(1000).cents(), 1800);
    /// ```
    pub fn discount_bps(&self, discount_bps: u32) -> Money {
        *self - self.apply_rate(Rate::from_bps(discount_bps))
    }

    /// Allocates a share of this amount proportional to `part / whole`,
    /// rounded half-up.
    ///
    /// Used to spread a global discount across the taxable portion of a
    /// cart: `discount.allocate(taxable_base, subtotal)` is the slice of
    /// the discount the taxable side absorbs, so a discount over a mixed
    /// cart is not wholly absorbed by one side.
    ///
    /// Returns zero when `whole` is zero.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::money::Money;
    ///
    /// // $2.00 discount, $12.00 of an $18.00 cart is taxable -> $1.33
    /// let discount = Money::from_cents(200);
    /// let share = discount.allocate(Money::from_cents(1200), Money::from_cents(1800));
    /// assert_eq!(share.cents(), 133);
    /// ```
    pub fn allocate(&self, part: Money, whole: Money) -> Money {
        if whole.is_zero() {
            return Money::zero();
        }
        let whole = whole.0 as i128;
        let share = (self.0 as i128 * part.0 as i128 + whole / 2) / whole;
        Money::from_cents(share as i64)
    }
}

// =============================================================================
// Rate Type
// =============================================================================

/// A rate in basis points (1 bp = 0.01%).
///
/// ## Why Basis Points?
/// 825 bps = 8.25% sales tax, 400 bps = a 4% card surcharge. Keeping rates
/// integral means rate application has exactly one rounding step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    /// Creates a rate from a whole-number percentage.
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        Rate(pct * 100)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero rate.
    #[inline]
    pub const fn zero() -> Self {
        Rate(0)
    }

    /// Checks if the rate is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for Rate {
    fn default() -> Self {
        Rate::zero()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money in a human-readable format.
///
/// Used in error messages ("Cash tendered $20.00 is less than $22.15 due")
/// where the amount must be visible to the operator.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}${}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

/// Summing line totals into a subtotal.
impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents_and_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::from_cents(500)), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!(a.multiply_quantity(4).cents(), 4000);
    }

    #[test]
    fn test_sub_to_zero_clamps() {
        let subtotal = Money::from_cents(1800);
        assert_eq!(subtotal.sub_to_zero(Money::from_cents(200)).cents(), 1600);
        assert_eq!(subtotal.sub_to_zero(Money::from_cents(1800)).cents(), 0);
        assert_eq!(subtotal.sub_to_zero(Money::from_cents(9999)).cents(), 0);
    }

    #[test]
    fn test_apply_rate_rounding() {
        // $16.00 at 8% = $1.28 exactly
        assert_eq!(
            Money::from_cents(1600).apply_rate(Rate::from_bps(800)).cents(),
            128
        );
        // $10.00 at 8.25% = $0.825 -> rounds to $0.83
        assert_eq!(
            Money::from_cents(1000).apply_rate(Rate::from_bps(825)).cents(),
            83
        );
        // $17.28 at 4% = $0.6912 -> rounds to $0.69
        assert_eq!(
            Money::from_cents(1728).apply_rate(Rate::from_bps(400)).cents(),
            69
        );
    }

    #[test]
    fn test_discount_bps() {
        // 10% off $20.00 = $18.00
        assert_eq!(Money::from_cents(2000).discount_bps(1000).cents(), 1800);
        // 0% off leaves the amount untouched
        assert_eq!(Money::from_cents(2000).discount_bps(0).cents(), 2000);
        // 100% off is free
        assert_eq!(Money::from_cents(2000).discount_bps(10000).cents(), 0);
    }

    #[test]
    fn test_allocate_proportionally() {
        let discount = Money::from_cents(200);
        // Fully taxable cart absorbs the whole discount
        assert_eq!(
            discount
                .allocate(Money::from_cents(1800), Money::from_cents(1800))
                .cents(),
            200
        );
        // Two-thirds taxable absorbs two-thirds of the discount
        assert_eq!(
            discount
                .allocate(Money::from_cents(1200), Money::from_cents(1800))
                .cents(),
            133
        );
        // Zero whole never divides by zero
        assert_eq!(
            discount.allocate(Money::zero(), Money::zero()).cents(),
            0
        );
    }

    #[test]
    fn test_rate_constructors() {
        assert_eq!(Rate::from_percent(8).bps(), 800);
        assert_eq!(Rate::from_bps(825).bps(), 825);
        assert!((Rate::from_bps(825).percentage() - 8.25).abs() < 0.001);
        assert!(Rate::zero().is_zero());
    }

    #[test]
    fn test_sum() {
        let total: Money = [100, 250, 399]
            .iter()
            .map(|c| Money::from_cents(*c))
            .sum();
        assert_eq!(total.cents(), 749);
    }
}

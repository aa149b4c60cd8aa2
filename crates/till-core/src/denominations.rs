//! # Denomination Counter
//!
//! Maps bill/coin counts to a monetary total. Used by both the drawer-open
//! (float count) and drawer-close (closing count) flows.
//!
//! ## Counting Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Employee counts the drawer                                             │
//! │                                                                         │
//! │   $100 × 2   $50 × 0   $20 × 5   $10 × 3   $5 × 4   $1 × 10            │
//! │   25¢ × 8    10¢ × 5   5¢ × 4    1¢ × 17                               │
//! │        │                                                                │
//! │        ▼                                                                │
//! │   total() = $382.92  ← the only number the drawer flows consume        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The counting UI shows only the running total as it is entered — never
//! the expected amount (see the drawer module for why).

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

/// Counts per US cash denomination.
///
/// Counts are `u32`: a negative count of bills is not a thing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase", default)]
pub struct DenominationCount {
    pub hundreds: u32,
    pub fifties: u32,
    pub twenties: u32,
    pub tens: u32,
    pub fives: u32,
    pub ones: u32,
    pub quarters: u32,
    pub dimes: u32,
    pub nickels: u32,
    pub pennies: u32,
}

impl DenominationCount {
    /// An all-zero count.
    pub const fn empty() -> Self {
        DenominationCount {
            hundreds: 0,
            fifties: 0,
            twenties: 0,
            tens: 0,
            fives: 0,
            ones: 0,
            quarters: 0,
            dimes: 0,
            nickels: 0,
            pennies: 0,
        }
    }

    /// `(count, cents-per-unit)` pairs, largest denomination first.
    fn entries(&self) -> [(u32, i64); 10] {
        [
            (self.hundreds, 10_000),
            (self.fifties, 5_000),
            (self.twenties, 2_000),
            (self.tens, 1_000),
            (self.fives, 500),
            (self.ones, 100),
            (self.quarters, 25),
            (self.dimes, 10),
            (self.nickels, 5),
            (self.pennies, 1),
        ]
    }

    /// Total value of the counted cash.
    pub fn total(&self) -> Money {
        let cents: i64 = self
            .entries()
            .iter()
            .map(|(count, unit)| *count as i64 * unit)
            .sum();
        Money::from_cents(cents)
    }

    /// Checks if nothing was counted.
    pub fn is_empty(&self) -> bool {
        self.total().is_zero()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

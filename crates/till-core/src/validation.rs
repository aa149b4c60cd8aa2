//! # Validation Module
//!
//! Tender and amount validation for Till.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Register UI                                                  │
//! │  ├── Basic format checks (empty, numeric)                              │
//! │  └── Immediate operator feedback                                       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - business rule validation                       │
//! │  ├── Amounts non-negative, tenders cover what is due                   │
//! │  └── Runs BEFORE the terminal is touched: a failed validation must     │
//! │      leave no partial state and no charged card                        │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Backend recorder (server-side revalidation)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::SPLIT_TOLERANCE_CENTS;

// =============================================================================
// Amount Validators
// =============================================================================

/// Validates that an amount is non-negative.
///
/// Zero is allowed (a zero tip is an explicit customer choice).
pub fn validate_amount(field: &'static str, amount: Money) -> Result<(), ValidationError> {
    if amount.is_negative() {
        return Err(ValidationError::InvalidAmount { field, amount });
    }
    Ok(())
}

/// Validates that an amount is strictly positive.
pub fn validate_positive(field: &'static str, amount: Money) -> Result<(), ValidationError> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive { field });
    }
    Ok(())
}

// =============================================================================
// Tender Validators
// =============================================================================

/// Validates that cash handed over covers the amount due and returns the
/// change owed.
///
/// ## Example
/// ```rust
/// use till_core::money::Money;
/// use till_core::validation::validate_tender;
///
/// let change = validate_tender(Money::from_cents(2000), Money::from_cents(1728)).unwrap();
/// assert_eq!(change.cents(), 272);
/// assert!(validate_tender(Money::from_cents(1000), Money::from_cents(1728)).is_err());
/// ```
pub fn validate_tender(tendered: Money, due: Money) -> CoreResult<Money> {
    validate_amount("tendered cash", tendered)?;
    if tendered < due {
        return Err(CoreError::InsufficientCash { tendered, due });
    }
    Ok(tendered - due)
}

/// Validates that a split pair covers the amount due within the one-cent
/// tolerance.
///
/// ## User Workflow
/// ```text
/// Operator keys: $20.00 cash + $30.00 card against a $50.00 total
///       │
///       ▼
/// validate_split ← THIS FUNCTION
///       │
///       ├── |cash + card − due| > 1¢ → SplitMismatch (nothing charged)
///       │
///       └── OK → proceed to the card charge for the card half
/// ```
pub fn validate_split(cash: Money, card: Money, due: Money) -> CoreResult<()> {
    validate_positive("split cash portion", cash)?;
    validate_positive("split card portion", card)?;

    let delta = (cash + card - due).abs();
    if delta.cents() > SPLIT_TOLERANCE_CENTS {
        return Err(CoreError::SplitMismatch { cash, card, due });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  till-sync errors (separate crate)                                     │
//! │  └── SyncError        - Display store / state machine failures         │
//! │                                                                         │
//! │  till-engine errors (separate crate)                                   │
//! │  └── EngineError      - Settlement / terminal / persistence failures   │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError → Operator            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Cash-handling mistakes are costly to diagnose after the fact, so
//!    every money-related message carries the amounts involved
//! 3. Errors are enum variants, never String

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These errors represent business rule violations. They are recovered
/// locally and surfaced to the operator; no state is mutated when one is
/// returned.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Cart has exceeded maximum allowed items.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Item quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Split tender halves do not cover the amount due.
    ///
    /// ## When This Occurs
    /// The operator keyed a cash/card pair that does not sum to the total
    /// (within the one-cent tolerance). Surfaced before anything is
    /// charged, so the sale can be re-tendered safely.
    #[error("Split payment of {cash} cash + {card} card does not match the {due} due")]
    SplitMismatch { cash: Money, card: Money, due: Money },

    /// Cash handed over is less than the amount due.
    #[error("Cash tendered {tendered} is less than the {due} due")]
    InsufficientCash { tendered: Money, due: Money },

    /// A drawer cannot be opened with an empty float.
    ///
    /// A zero count almost always means the employee skipped the count,
    /// which makes the closing variance meaningless.
    #[error("Drawer float must be counted and greater than zero")]
    EmptyFloat,

    /// Operation attempted on a closed drawer session.
    #[error("Shift {0} is already closed")]
    ShiftClosed(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These occur when input doesn't meet requirements. Used for early
/// validation before business logic runs. Rejecting is deliberate: a
/// negative amount coerced to zero would mask an upstream bug and produce
/// a drawer that doesn't reconcile.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A monetary amount is negative where only non-negative is meaningful.
    #[error("{field} must not be negative (got {amount})")]
    InvalidAmount { field: &'static str, amount: Money },

    /// A monetary amount must be strictly positive.
    #[error("{field} must be greater than zero")]
    MustBePositive { field: &'static str },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: &'static str, min: i64, max: i64 },

    /// A required value is missing.
    #[error("{field} is required")]
    Required { field: &'static str },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

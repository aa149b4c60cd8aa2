//! # till-core: Pure Business Logic for Till
//!
//! This crate is the **heart** of the Till point of sale. It contains the
//! money math, the cart, the pricing calculator, and the cash-drawer
//! arithmetic as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Till Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Register UI / Customer Display                 │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │        till-engine (settlement, shifts, orchestration)          │   │
//! │  │        till-sync   (display channel, tip solicitation)          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                ★ till-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ │   │
//! │  │   │  money  │ │  cart   │ │ pricing │ │ drawer  │ │  denom  │ │   │
//! │  │   │  Money  │ │  Cart   │ │ Totals  │ │ Session │ │  Count  │ │   │
//! │  │   │  Rate   │ │ LineItem│ │ compute │ │ Report  │ │  total  │ │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO CLOCK • NO NETWORK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer-cents arithmetic (no floating point!)
//! - [`types`] - Domain types (pricing config, payment method, transaction)
//! - [`cart`] - The cart store and its immutable snapshots
//! - [`pricing`] - The totals calculator (dual pricing, tax, tips)
//! - [`denominations`] - Bill/coin counting for drawer open and close
//! - [`drawer`] - Cash-drawer session lifecycle math and the shift report
//! - [`validation`] - Input validation rules
//! - [`error`] - Domain error types
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Stores, terminals, and clocks live behind seams in till-engine
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod denominations;
pub mod drawer;
pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use till_core::Money` instead of
// `use till_core::money::Money`

pub use cart::{Cart, CartSnapshot, LineItem};
pub use denominations::DenominationCount;
pub use drawer::{DrawerSession, ShiftReport, ShiftStatus, VarianceOutcome};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, Rate};
pub use pricing::{card_price, compute_totals, tip_suggestions, Totals};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Fallback tax rate applied when the configuration provider is unreachable.
///
/// ## Why a fallback instead of failing?
/// A register that cannot reach the config service must still ring up sales.
/// 800 bps (8%) is the documented default; the correct per-location rate
/// replaces it as soon as configuration loads.
pub const DEFAULT_TAX_RATE_BPS: u32 = 800;

/// Maximum unique line items allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable transaction sizes.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line item.
///
/// ## Business Reason
/// Prevents accidental over-ringing (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Tolerance, in cents, when validating that a split payment covers the
/// amount due. One cent absorbs rounding between the two tender halves.
pub const SPLIT_TOLERANCE_CENTS: i64 = 1;

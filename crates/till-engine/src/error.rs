//! # Engine Error Taxonomy
//!
//! What can go wrong between "charge it" and "recorded", and how each class
//! is handled.
//!
//! ## Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Engine Error Classes                              │
//! │                                                                         │
//! │  Core/Validation    bad amounts, split mismatch, insufficient cash     │
//! │                     → recovered locally, NOTHING mutated               │
//! │                                                                         │
//! │  Terminal           declined / timeout / fault                         │
//! │                     → settlement aborts, cart preserved for retry      │
//! │                                                                         │
//! │  Persistence        recorder or shift store unreachable                │
//! │                     → retried with the same idempotency key first      │
//! │                                                                         │
//! │  CaptureUnrecorded  the card WAS charged but the record never stuck    │
//! │                     → the most serious state in the system: the        │
//! │                       transaction (with its approval metadata) rides   │
//! │                       on the error so the evidence cannot be lost;     │
//! │                       surfaced as "manual reconciliation required",    │
//! │                       never as a generic failure                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cash-handling mistakes are costly to diagnose after the fact, so every
//! user-visible failure names the amount and payment method involved.

use thiserror::Error;

use till_core::{CoreError, Money, PaymentMethod, Transaction};
use till_sync::SyncError;

// =============================================================================
// Terminal Error
// =============================================================================

/// Failures reported by the external payment terminal.
///
/// All of them abort settlement without mutating the cart or the shift.
#[derive(Debug, Clone, Error)]
pub enum TerminalError {
    /// The issuer declined the card.
    #[error("card declined: {0}")]
    Declined(String),

    /// The terminal did not answer within its window.
    #[error("payment terminal timed out")]
    Timeout,

    /// The terminal itself failed (comms, hardware).
    #[error("payment terminal fault: {0}")]
    Faulted(String),
}

// =============================================================================
// Persistence Error
// =============================================================================

/// A backing store (transaction recorder, shift store) was unreachable or
/// rejected the write.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct PersistenceError(pub String);

/// Failures from the shift store seam.
#[derive(Debug, Error)]
pub enum ShiftStoreError {
    /// The register already has an open drawer session.
    #[error("register {0} already has an open shift")]
    AlreadyOpen(String),

    /// No session under that id.
    #[error("shift {0} not found")]
    NotFound(String),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

// =============================================================================
// Engine Error
// =============================================================================

/// Top-level error type for settlement and shift operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Business-rule or validation failure; nothing was charged or stored.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Display sync / state machine failure.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// The card charge failed. The amount and method ride on the message
    /// because that is what the operator needs to retell the customer.
    #[error("{method} charge of {amount} failed: {source}")]
    Terminal {
        amount: Money,
        method: PaymentMethod,
        #[source]
        source: TerminalError,
    },

    /// A persistence call failed before any money moved.
    #[error("{context}: {source}")]
    Persistence {
        context: String,
        #[source]
        source: PersistenceError,
    },

    /// Money was captured on the card but the transaction record did not
    /// persist, even after retrying with the same idempotency key.
    ///
    /// The full transaction (including the gateway approval) is carried
    /// here: the UI must show "payment captured but not recorded - manual
    /// reconciliation required" and must NOT discard this evidence.
    #[error(
        "{} {} payment captured (gateway {}) but transaction {} was not recorded - manual reconciliation required",
        .transaction.total(),
        .transaction.method,
        .transaction.card.as_ref().map(|c| c.gateway_tx_id.as_str()).unwrap_or("n/a"),
        .transaction.id
    )]
    CaptureUnrecorded {
        transaction: Box<Transaction>,
        #[source]
        source: PersistenceError,
    },

    /// Shift operations need an open drawer session.
    #[error("no open shift for register {0}")]
    NoOpenShift(String),

    /// Only one drawer session may be open per register.
    #[error("register {0} already has an open shift")]
    ShiftAlreadyOpen(String),

    /// The referenced drawer session does not exist.
    #[error("shift {0} not found")]
    ShiftNotFound(String),
}

/// Convenience type alias for Results with EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

impl From<ShiftStoreError> for EngineError {
    fn from(err: ShiftStoreError) -> Self {
        match err {
            ShiftStoreError::AlreadyOpen(register) => EngineError::ShiftAlreadyOpen(register),
            ShiftStoreError::NotFound(id) => EngineError::ShiftNotFound(id),
            ShiftStoreError::Persistence(source) => EngineError::Persistence {
                context: "shift store".to_string(),
                source,
            },
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

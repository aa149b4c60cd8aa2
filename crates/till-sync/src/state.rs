//! # Checkout State Machine
//!
//! Enforces the checkout lifecycle for one register session.
//!
//! ## Transition Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  From          To            Trigger                                    │
//! │  ───────────   ───────────   ─────────────────────────────────────────  │
//! │  Idle          Active        cart becomes non-empty                     │
//! │  Active        Idle          cart cleared (cancel or completed+reset)   │
//! │  Active        AwaitingTip   checkout initiated, tipping enabled        │
//! │  Active        Settling      checkout initiated, tipping disabled       │
//! │  AwaitingTip   TipSelected   customer chose (zero counts) OR timeout    │
//! │  AwaitingTip   Active        operator skipped tip collection            │
//! │  TipSelected   Settling      settlement begins                          │
//! │  Settling      Completed     settlement succeeded                       │
//! │  Settling      Active        settlement failed (cart preserved)         │
//! │  Active        Cancelled     operator abandoned the sale                │
//! │  AwaitingTip   Cancelled     operator abandoned the sale                │
//! │  Completed     Idle          reset for the next customer                │
//! │  Cancelled     Idle          reset for the next customer                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! One instance exists per active register session. Everything else (what
//! gets published, when polling runs) hangs off the current phase.

use till_core::CheckoutPhase;
use tracing::debug;

use crate::error::{SyncError, SyncResult};

/// The checkout state machine for one register session.
#[derive(Debug, Default)]
pub struct CheckoutStateMachine {
    phase: CheckoutPhase,
}

impl CheckoutStateMachine {
    /// Starts in `Idle`.
    pub fn new() -> Self {
        CheckoutStateMachine {
            phase: CheckoutPhase::Idle,
        }
    }

    /// Current phase.
    pub fn phase(&self) -> CheckoutPhase {
        self.phase
    }

    /// Reacts to a cart mutation: Idle ↔ Active tracking emptiness.
    ///
    /// Only meaningful outside a checkout; during AwaitingTip/Settling the
    /// channel suppresses cart publications, and this is a no-op.
    /// Returns true when the phase changed.
    pub fn cart_changed(&mut self, cart_empty: bool) -> bool {
        let next = match (self.phase, cart_empty) {
            (CheckoutPhase::Idle, false) => Some(CheckoutPhase::Active),
            (CheckoutPhase::Active, true) => Some(CheckoutPhase::Idle),
            _ => None,
        };
        if let Some(next) = next {
            debug!(from = ?self.phase, to = ?next, "checkout phase");
            self.phase = next;
            true
        } else {
            false
        }
    }

    /// Initiates checkout from `Active`; lands in `AwaitingTip` when the
    /// tip prompt is enabled, else directly in `Settling`.
    pub fn begin_checkout(&mut self, tipping_enabled: bool) -> SyncResult<CheckoutPhase> {
        let to = if tipping_enabled {
            CheckoutPhase::AwaitingTip
        } else {
            CheckoutPhase::Settling
        };
        self.transition(to)?;
        Ok(to)
    }

    /// The customer's tip choice arrived (or the poll timed out, which
    /// resolves to a zero tip by policy).
    pub fn tip_selected(&mut self) -> SyncResult<()> {
        self.transition(CheckoutPhase::TipSelected)
    }

    /// The operator skipped tip collection; back to the live cart.
    pub fn skip_tip(&mut self) -> SyncResult<()> {
        match self.phase {
            CheckoutPhase::AwaitingTip => {
                debug!(from = ?self.phase, to = ?CheckoutPhase::Active, "checkout phase");
                self.phase = CheckoutPhase::Active;
                Ok(())
            }
            from => Err(SyncError::InvalidTransition {
                from,
                to: CheckoutPhase::Active,
            }),
        }
    }

    /// Settlement starts after a tip was selected.
    pub fn begin_settling(&mut self) -> SyncResult<()> {
        self.transition(CheckoutPhase::Settling)
    }

    /// Settlement succeeded.
    pub fn settled(&mut self) -> SyncResult<()> {
        self.transition(CheckoutPhase::Completed)
    }

    /// Settlement failed; the cart is preserved so the operator can retry
    /// without re-ringing items.
    pub fn settlement_failed(&mut self) -> SyncResult<()> {
        match self.phase {
            CheckoutPhase::Settling => {
                debug!(from = ?self.phase, to = ?CheckoutPhase::Active, "checkout phase");
                self.phase = CheckoutPhase::Active;
                Ok(())
            }
            from => Err(SyncError::InvalidTransition {
                from,
                to: CheckoutPhase::Active,
            }),
        }
    }

    /// Operator abandoned the sale.
    pub fn cancel(&mut self) -> SyncResult<()> {
        self.transition(CheckoutPhase::Cancelled)
    }

    /// Back to `Idle` after a completed or cancelled sale.
    pub fn reset(&mut self) -> SyncResult<()> {
        self.transition(CheckoutPhase::Idle)
    }

    /// Applies a transition if the table allows it.
    fn transition(&mut self, to: CheckoutPhase) -> SyncResult<()> {
        use CheckoutPhase::*;

        let allowed = matches!(
            (self.phase, to),
            (Idle, Active)
                | (Active, Idle)
                | (Active, AwaitingTip)
                | (Active, Settling)
                | (AwaitingTip, TipSelected)
                | (AwaitingTip, Active)
                | (AwaitingTip, Cancelled)
                | (TipSelected, Settling)
                | (Settling, Completed)
                | (Settling, Active)
                | (Active, Cancelled)
                | (Completed, Idle)
                | (Cancelled, Idle)
        );

        if !allowed {
            return Err(SyncError::InvalidTransition {
                from: self.phase,
                to,
            });
        }

        debug!(from = ?self.phase, to = ?to, "checkout phase");
        self.phase = to;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Payment Terminal Seam
//!
//! The card-present terminal is an opaque collaborator: we hand it an
//! amount, it hands back an approval or a typed failure. Its wire protocol
//! is not our concern.
//!
//! ## Contract
//! ```text
//! charge(amount) ──► { gateway_tx_id, auth_code, card_last4, card_brand }
//!               └──► Declined | Timeout | Faulted  (nothing was captured*)
//!
//! * a Timeout is the gray zone: the terminal MAY have captured the charge.
//!   Settlement still aborts without local mutation; the credit-card batch
//!   report is where an orphaned capture would surface.
//! ```

use async_trait::async_trait;

use till_core::{CardApproval, Money};

use crate::error::TerminalError;

/// The external card terminal.
#[async_trait]
pub trait PaymentTerminal: Send + Sync {
    /// Requests a card-present charge for `amount`.
    ///
    /// Implementations must not retry internally: once settlement has
    /// requested a charge it never re-requests, to rule out double charges.
    async fn charge(&self, amount: Money) -> Result<CardApproval, TerminalError>;
}

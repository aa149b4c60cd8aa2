//! # Sync Error Types

use thiserror::Error;
use till_core::CheckoutPhase;

/// Errors from display synchronization and the checkout state machine.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The checkout state machine was asked for a transition the protocol
    /// does not allow (e.g. settling a cart that never reached checkout).
    #[error("Checkout cannot move from {from:?} to {to:?}")]
    InvalidTransition {
        from: CheckoutPhase,
        to: CheckoutPhase,
    },

    /// A compare-and-set write lost the race: the stored document moved on.
    ///
    /// The writer re-reads and retries with the found sequence number.
    #[error("Stale write for display key '{key}': expected seq {expected}, found {found}")]
    StaleWrite {
        key: String,
        expected: u64,
        found: u64,
    },

    /// The backing display store could not be reached.
    #[error("Display store unavailable: {0}")]
    StoreUnavailable(String),

    /// The display channel worker has shut down.
    #[error("Display channel closed")]
    ChannelClosed,
}

/// Convenience type alias for Results with SyncError.
pub type SyncResult<T> = Result<T, SyncError>;

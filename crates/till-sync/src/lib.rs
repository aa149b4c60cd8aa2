//! # till-sync: Customer Display Synchronization for Till
//!
//! Keeps a second, customer-facing screen in step with the register: the
//! live cart, the checkout phase, the tip prompt, and the thank-you screen.
//!
//! ## Sync Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   Register (POS)                              Customer Display          │
//! │   ┌────────────┐    debounced (300ms)         ┌────────────────┐       │
//! │   │ cart edits ├──► DisplayChannel ──────┐    │ polls store    │       │
//! │   └────────────┘                         ▼    │ every 500ms    │       │
//! │   ┌────────────┐    immediate      ┌─────────┐│                │       │
//! │   │ checkout   ├──► publish_now ──►│ Display ││◄───────────────┘       │
//! │   │ phases     │                   │  Store  ││                        │
//! │   └────────────┘                   │ (seq'd) ││  writes TIP_SELECTED   │
//! │                                    └─────────┘◄────────────────────────│
//! │        same-process fast path: tokio broadcast (opportunistic)         │
//! │                                                                         │
//! │   The durable store is AUTHORITATIVE: a display that reloads reads     │
//! │   the latest document and discards anything older than the highest    │
//! │   sequence number it has seen.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`] - The checkout state machine (IDLE → … → COMPLETED)
//! - [`snapshot`] - The display document contract
//! - [`store`] - The durable keyed store trait + in-memory implementation
//! - [`channel`] - Debounced publisher with suppression and fast path
//! - [`tip`] - The tip solicitation protocol
//! - [`error`] - Sync error types

pub mod channel;
pub mod error;
pub mod snapshot;
pub mod state;
pub mod store;
pub mod tip;

pub use channel::{DisplayChannel, DisplayChannelHandle};
pub use error::{SyncError, SyncResult};
pub use snapshot::{DisplayDocument, DisplayLine, DisplaySnapshot, TipPromptInfo};
pub use state::CheckoutStateMachine;
pub use store::{DisplayStore, MemoryDisplayStore};
pub use tip::{TipOutcome, TipPrompt, TIP_POLL_ATTEMPTS, TIP_POLL_INTERVAL};

/// How long cart edits are coalesced before a store write.
///
/// Bounds the write rate while an operator rings items in quick succession;
/// the display still feels instant through the broadcast fast path.
pub const PUBLISH_DEBOUNCE: std::time::Duration = std::time::Duration::from_millis(300);

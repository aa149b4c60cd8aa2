//! # till-engine: Settlement & Orchestration for Till
//!
//! Where a priced cart becomes collected money: the settlement pipeline,
//! the cash-drawer (shift) manager, and the per-register orchestrator that
//! wires the cart, the display channel, and the tip prompt together.
//!
//! ## Data & Control Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  UI events ──► Register ──► Cart (till-core) ──► totals on every read  │
//! │                   │                                                     │
//! │                   ├── cart mutations ──► DisplayChannel (till-sync)    │
//! │                   │                                                     │
//! │                   └── checkout(request)                                 │
//! │                          │                                              │
//! │                          ├── TipPrompt (till-sync)   [if tipping on]   │
//! │                          │                                              │
//! │                          └── Settlement                                 │
//! │                                 │ 1. validate tender    (no side fx)    │
//! │                                 │ 2. charge card        (terminal)      │
//! │                                 │ 3. record transaction (retry + key)   │
//! │                                 │ 4. update shift       (cash portion)  │
//! │                                 └► Transaction / typed failure          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`terminal`] - Payment terminal seam
//! - [`recorder`] - Transaction recorder seam + in-memory fake
//! - [`providers`] - Configuration/catalog seams with documented fallbacks
//! - [`shift`] - The cash-drawer session manager + in-memory store
//! - [`settlement`] - The settlement pipeline
//! - [`register`] - Per-register orchestration
//! - [`error`] - Engine error taxonomy

pub mod error;
pub mod providers;
pub mod recorder;
pub mod register;
pub mod settlement;
pub mod shift;
pub mod terminal;

pub use error::{EngineError, EngineResult, PersistenceError, ShiftStoreError, TerminalError};
pub use providers::{CatalogProvider, ConfigProvider, StaticConfigProvider};
pub use recorder::{MemoryTransactionRecorder, TransactionRecorder};
pub use register::{CheckoutOutcome, CheckoutRequest, Register};
pub use settlement::{Settlement, SettlementOutcome, SettlementRequest, SplitTender};
pub use shift::{MemoryShiftStore, ShiftManager, ShiftStore};
pub use terminal::PaymentTerminal;

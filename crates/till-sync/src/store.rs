//! # Display Store
//!
//! The durable, location-scoped key-value store both screens share. The
//! register writes the current document; the customer display polls it and
//! writes the tip choice back. Keys are register/station ids.
//!
//! ## Why Compare-And-Set?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  LAST-WRITE-WINS RACE (the bug this design removes)                     │
//! │                                                                         │
//! │  POS publishes AWAITING_TIP ───────────────┐                            │
//! │  stale tab publishes ACTIVE ────────────┐  │                            │
//! │                                         ▼  ▼                            │
//! │  store ends up ACTIVE, tip handshake silently lost                     │
//! │                                                                         │
//! │  WITH SEQUENCE NUMBERS                                                 │
//! │  Every write carries the seq the writer last saw. A writer holding     │
//! │  an old seq gets StaleWrite and must re-read before writing, so one    │
//! │  side always observes the other's update instead of clobbering it.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{SyncError, SyncResult};
use crate::snapshot::{DisplayDocument, DisplaySnapshot};

// =============================================================================
// Store Trait
// =============================================================================

/// The durable store shared by the register and the customer display.
///
/// Production backends put this on a server reachable by both screens; the
/// in-memory implementation below serves single-process setups and tests.
/// All implementations must make `put_if_seq` atomic per key.
#[async_trait]
pub trait DisplayStore: Send + Sync {
    /// Reads the latest document for a key, if any.
    async fn get(&self, key: &str) -> SyncResult<Option<DisplayDocument>>;

    /// Writes a new document if the stored sequence still equals
    /// `expected_seq` (0 means "no document yet"). Returns the new
    /// sequence on success.
    ///
    /// A conflicting concurrent write surfaces as [`SyncError::StaleWrite`]
    /// carrying the sequence actually found, so the caller can re-read and
    /// retry.
    async fn put_if_seq(
        &self,
        key: &str,
        expected_seq: u64,
        snapshot: DisplaySnapshot,
    ) -> SyncResult<u64>;
}

// =============================================================================
// In-Memory Store
// =============================================================================

/// Reference [`DisplayStore`] backed by a `RwLock<HashMap>`.
///
/// The write lock makes `put_if_seq` atomic per process, which is exactly
/// the compare-and-set contract scaled down to one machine.
#[derive(Debug, Default)]
pub struct MemoryDisplayStore {
    documents: RwLock<HashMap<String, DisplayDocument>>,
}

impl MemoryDisplayStore {
    pub fn new() -> Self {
        MemoryDisplayStore::default()
    }
}

#[async_trait]
impl DisplayStore for MemoryDisplayStore {
    async fn get(&self, key: &str) -> SyncResult<Option<DisplayDocument>> {
        Ok(self.documents.read().await.get(key).cloned())
    }

    async fn put_if_seq(
        &self,
        key: &str,
        expected_seq: u64,
        snapshot: DisplaySnapshot,
    ) -> SyncResult<u64> {
        let mut documents = self.documents.write().await;
        let found = documents.get(key).map(|d| d.seq).unwrap_or(0);

        if found != expected_seq {
            return Err(SyncError::StaleWrite {
                key: key.to_string(),
                expected: expected_seq,
                found,
            });
        }

        let seq = expected_seq + 1;
        debug!(key = %key, seq = seq, status = ?snapshot.status, "display document written");
        documents.insert(
            key.to_string(),
            DisplayDocument {
                seq,
                snapshot,
                updated_at: Utc::now(),
            },
        );
        Ok(seq)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

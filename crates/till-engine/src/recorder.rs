//! # Transaction Recorder Seam
//!
//! Persists completed transactions. The engine retries failed submissions
//! with the SAME client-generated transaction id, so the recorder can (and
//! should) deduplicate on it - that id is the idempotency key.
//!
//! ## Idempotency
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  submit(tx id=K) ──✗ network drop (did it land? unknown)               │
//! │  submit(tx id=K) ──✓                                                   │
//! │                                                                         │
//! │  A recorder keyed on K stores ONE transaction either way. Without      │
//! │  the key, the retry above could double-record a sale - which is why    │
//! │  the id is generated BEFORE the first attempt, never per attempt.      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::info;

use till_core::Transaction;

use crate::error::PersistenceError;

// =============================================================================
// Recorder Trait
// =============================================================================

/// The external transaction store.
#[async_trait]
pub trait TransactionRecorder: Send + Sync {
    /// Persists a transaction. Must be idempotent on `tx.id`: recording
    /// the same id twice is a no-op, not a duplicate sale.
    async fn record(&self, tx: &Transaction) -> Result<(), PersistenceError>;
}

// =============================================================================
// In-Memory Recorder
// =============================================================================

/// Reference recorder for tests and the demo binary.
///
/// Keyed by transaction id, so replays of the same id overwrite instead of
/// duplicating - the behavior a production recorder must provide.
#[derive(Debug, Default)]
pub struct MemoryTransactionRecorder {
    records: RwLock<HashMap<String, Transaction>>,
}

impl MemoryTransactionRecorder {
    pub fn new() -> Self {
        MemoryTransactionRecorder::default()
    }

    /// Number of distinct transactions recorded.
    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Fetches a recorded transaction by id.
    pub async fn get(&self, id: &str) -> Option<Transaction> {
        self.records.read().await.get(id).cloned()
    }
}

#[async_trait]
impl TransactionRecorder for MemoryTransactionRecorder {
    async fn record(&self, tx: &Transaction) -> Result<(), PersistenceError> {
        let mut records = self.records.write().await;
        let replay = records.insert(tx.id.clone(), tx.clone()).is_some();
        info!(
            tx_id = %tx.id,
            total = %tx.total(),
            method = %tx.method,
            replay = replay,
            "transaction recorded"
        );
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use till_core::PaymentMethod;

    fn sample_tx(id: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            receipt_number: "250807-0001".into(),
            items: vec![],
            subtotal_cents: 1000,
            discount_cents: 0,
            tax_cents: 80,
            tip_cents: 0,
            total_cents: 1080,
            method: PaymentMethod::Cash,
            cash_cents: 1080,
            card_cents: 0,
            change_cents: 0,
            card: None,
            shift_id: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_record_and_fetch() {
        let recorder = MemoryTransactionRecorder::new();
        recorder.record(&sample_tx("tx-1")).await.unwrap();

        assert_eq!(recorder.count().await, 1);
        assert_eq!(recorder.get("tx-1").await.unwrap().total_cents, 1080);
    }

    #[tokio::test]
    async fn test_same_id_does_not_duplicate() {
        let recorder = MemoryTransactionRecorder::new();
        let tx = sample_tx("tx-1");
        recorder.record(&tx).await.unwrap();
        recorder.record(&tx).await.unwrap();

        assert_eq!(recorder.count().await, 1);
    }
}

//! # Tip Solicitation Protocol
//!
//! Orchestrates the AWAITING_TIP phase: publish the tip screen, poll the
//! shared store for the customer's choice, resolve within a bounded window.
//!
//! ## Protocol Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Tip Solicitation                                    │
//! │                                                                         │
//! │  Register                    Store                   Customer Display   │
//! │  ────────                    ─────                   ────────────────   │
//! │  publish_now(AWAITING_TIP) ─►│                                          │
//! │                              │◄──────────── polls, renders tip screen   │
//! │  poll every 1s ─────────────►│                                          │
//! │  (up to 120 attempts)        │◄─ writes TIP_SELECTED + amount ───────   │
//! │  sees TIP_SELECTED ─────────►│                                          │
//! │  → Selected(amount)          │                                          │
//! │                                                                         │
//! │  RESOLUTIONS                                                            │
//! │  • Selected(amount)  customer tapped a tip (zero is a real choice)      │
//! │  • TimedOut          120s elapsed; the tip becomes zero BY POLICY,      │
//! │                      not by customer decision (default-deny)            │
//! │  • Skipped           operator cancelled the prompt from the register    │
//! │                                                                         │
//! │  The poll loop MUST stop on every resolution path - an orphaned 1s     │
//! │  timer polling a shared store is a leak that outlives the sale.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use till_core::{CheckoutPhase, Money};

use crate::channel::DisplayChannelHandle;
use crate::error::SyncResult;
use crate::snapshot::DisplaySnapshot;
use crate::store::DisplayStore;

// =============================================================================
// Constants
// =============================================================================

/// How often the register polls the store while awaiting a tip.
pub const TIP_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Poll ceiling: 120 attempts × 1s = a two-minute window.
pub const TIP_POLL_ATTEMPTS: u32 = 120;

// =============================================================================
// Outcome
// =============================================================================

/// How the tip step resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipOutcome {
    /// The customer chose this amount (zero included - an explicit "no tip").
    Selected(Money),
    /// The window elapsed with no choice; callers apply a zero tip.
    TimedOut,
    /// The operator cancelled the prompt.
    Skipped,
}

impl TipOutcome {
    /// The tip to settle with. Timeout and skip both resolve to zero.
    pub fn tip(&self) -> Money {
        match self {
            TipOutcome::Selected(amount) => *amount,
            TipOutcome::TimedOut | TipOutcome::Skipped => Money::zero(),
        }
    }
}

// =============================================================================
// Tip Prompt
// =============================================================================

/// Runs the tip step for one register.
pub struct TipPrompt {
    store: Arc<dyn DisplayStore>,
    key: String,
    poll_interval: Duration,
    max_attempts: u32,
}

impl TipPrompt {
    /// Prompt with production timing (1s × 120).
    pub fn new(store: Arc<dyn DisplayStore>, key: impl Into<String>) -> Self {
        TipPrompt {
            store,
            key: key.into(),
            poll_interval: TIP_POLL_INTERVAL,
            max_attempts: TIP_POLL_ATTEMPTS,
        }
    }

    /// Overrides the poll cadence (tests shrink the window).
    pub fn with_timing(mut self, poll_interval: Duration, max_attempts: u32) -> Self {
        self.poll_interval = poll_interval;
        self.max_attempts = max_attempts;
        self
    }

    /// Publishes the tip screen and polls until the customer chooses, the
    /// window closes, or the operator cancels.
    ///
    /// `cancel` is the operator's skip line; dropping the sender without
    /// sending leaves the prompt to run its window out. Every return path
    /// falls out of the loop, so the interval timer is dropped with it.
    pub async fn solicit(
        &self,
        channel: &DisplayChannelHandle,
        prompt: DisplaySnapshot,
        mut cancel: mpsc::Receiver<()>,
    ) -> SyncResult<TipOutcome> {
        channel.publish_now(prompt).await?;
        info!(key = %self.key, "tip prompt published, polling for selection");

        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // An interval's first tick is immediate; burn it so attempt #1
        // happens one interval after the prompt goes up.
        ticker.tick().await;

        let mut attempts = 0u32;
        let mut cancel_open = true;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    attempts += 1;
                    match self.poll_once().await {
                        Some(tip) => {
                            info!(key = %self.key, tip = %tip, attempts = attempts, "tip selected");
                            return Ok(TipOutcome::Selected(tip));
                        }
                        None if attempts >= self.max_attempts => {
                            info!(
                                key = %self.key,
                                attempts = attempts,
                                "tip window elapsed, defaulting to zero"
                            );
                            return Ok(TipOutcome::TimedOut);
                        }
                        None => {}
                    }
                }

                skipped = cancel.recv(), if cancel_open => {
                    match skipped {
                        Some(()) => {
                            info!(key = %self.key, "tip prompt skipped by operator");
                            return Ok(TipOutcome::Skipped);
                        }
                        // Sender dropped without skipping: keep polling,
                        // stop selecting on the closed channel.
                        None => cancel_open = false,
                    }
                }
            }
        }
    }

    /// One store read. Store hiccups are logged and treated as "no answer
    /// yet" - the next tick polls again.
    async fn poll_once(&self) -> Option<Money> {
        match self.store.get(&self.key).await {
            Ok(Some(doc)) => {
                let snapshot = doc.snapshot;
                if snapshot.status == CheckoutPhase::TipSelected && snapshot.tip_selected {
                    return Some(Money::from_cents(snapshot.tip_cents.unwrap_or(0)));
                }
                debug!(key = %self.key, status = ?snapshot.status, "no tip selection yet");
                None
            }
            Ok(None) => None,
            Err(e) => {
                warn!(key = %self.key, error = %e, "tip poll failed, will retry");
                None
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::DisplayChannel;
    use crate::store::MemoryDisplayStore;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn awaiting_prompt() -> DisplaySnapshot {
        DisplaySnapshot::awaiting_tip(
            DisplaySnapshot {
                status: CheckoutPhase::Active,
                total_cents: 1728,
                cash_total_cents: 1728,
                card_total_cents: 1797,
                ..DisplaySnapshot::idle()
            },
            &[Money::from_cents(240), Money::from_cents(320)],
        )
    }

    /// Store wrapper that counts reads, for asserting polling stopped.
    struct CountingStore {
        inner: MemoryDisplayStore,
        reads: AtomicU64,
    }

    #[async_trait::async_trait]
    impl DisplayStore for CountingStore {
        async fn get(&self, key: &str) -> SyncResult<Option<crate::snapshot::DisplayDocument>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key).await
        }

        async fn put_if_seq(
            &self,
            key: &str,
            expected_seq: u64,
            snapshot: DisplaySnapshot,
        ) -> SyncResult<u64> {
            self.inner.put_if_seq(key, expected_seq, snapshot).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_customer_selection_resolves_polling() {
        let store = Arc::new(MemoryDisplayStore::new());
        let channel = DisplayChannel::spawn(store.clone(), "reg-1");
        let prompt = TipPrompt::new(store.clone(), "reg-1");

        let (_cancel_tx, cancel_rx) = mpsc::channel(1);
        let solicit = tokio::spawn({
            let store = store.clone();
            async move {
                // Simulate the customer display: wait a few seconds, then
                // write the choice back on top of the current document.
                tokio::time::sleep(Duration::from_secs(3)).await;
                let doc = store.get("reg-1").await.unwrap().unwrap();
                store
                    .put_if_seq(
                        "reg-1",
                        doc.seq,
                        DisplaySnapshot::tip_chosen(doc.snapshot, Money::from_cents(300)),
                    )
                    .await
                    .unwrap();
            }
        });

        let outcome = prompt
            .solicit(&channel, awaiting_prompt(), cancel_rx)
            .await
            .unwrap();
        assert_eq!(outcome, TipOutcome::Selected(Money::from_cents(300)));
        assert_eq!(outcome.tip().cents(), 300);
        solicit.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_tip_is_an_explicit_selection() {
        let store = Arc::new(MemoryDisplayStore::new());
        let channel = DisplayChannel::spawn(store.clone(), "reg-1");
        let prompt = TipPrompt::new(store.clone(), "reg-1");

        let (_cancel_tx, cancel_rx) = mpsc::channel(1);
        tokio::spawn({
            let store = store.clone();
            async move {
                tokio::time::sleep(Duration::from_secs(2)).await;
                let doc = store.get("reg-1").await.unwrap().unwrap();
                store
                    .put_if_seq(
                        "reg-1",
                        doc.seq,
                        DisplaySnapshot::tip_chosen(doc.snapshot, Money::zero()),
                    )
                    .await
                    .unwrap();
            }
        });

        let outcome = prompt
            .solicit(&channel, awaiting_prompt(), cancel_rx)
            .await
            .unwrap();
        assert_eq!(outcome, TipOutcome::Selected(Money::zero()));
    }

    /// The full window elapses with no response: TIP_SELECTED never shows
    /// up, the outcome defaults to a zero tip, and polling stops.
    #[tokio::test(start_paused = true)]
    async fn test_timeout_defaults_to_zero_and_stops_polling() {
        let store = Arc::new(CountingStore {
            inner: MemoryDisplayStore::new(),
            reads: AtomicU64::new(0),
        });
        let channel = DisplayChannel::spawn(store.clone(), "reg-1");
        let prompt = TipPrompt::new(store.clone(), "reg-1").with_timing(TIP_POLL_INTERVAL, 5);

        let (_cancel_tx, cancel_rx) = mpsc::channel(1);
        let outcome = prompt
            .solicit(&channel, awaiting_prompt(), cancel_rx)
            .await
            .unwrap();
        assert_eq!(outcome, TipOutcome::TimedOut);
        assert_eq!(outcome.tip(), Money::zero());

        // No further store reads once the window closed
        let reads_at_resolution = store.reads.load(Ordering::SeqCst);
        assert_eq!(reads_at_resolution, 5);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(store.reads.load(Ordering::SeqCst), reads_at_resolution);
    }

    #[tokio::test(start_paused = true)]
    async fn test_operator_skip_cancels_immediately() {
        let store = Arc::new(MemoryDisplayStore::new());
        let channel = DisplayChannel::spawn(store.clone(), "reg-1");
        let prompt = TipPrompt::new(store.clone(), "reg-1");

        let (cancel_tx, cancel_rx) = mpsc::channel(1);
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(1500)).await;
            let _ = cancel_tx.send(()).await;
        });

        let outcome = prompt
            .solicit(&channel, awaiting_prompt(), cancel_rx)
            .await
            .unwrap();
        assert_eq!(outcome, TipOutcome::Skipped);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_cancel_sender_keeps_polling() {
        let store = Arc::new(MemoryDisplayStore::new());
        let channel = DisplayChannel::spawn(store.clone(), "reg-1");
        let prompt = TipPrompt::new(store.clone(), "reg-1").with_timing(TIP_POLL_INTERVAL, 3);

        let (cancel_tx, cancel_rx) = mpsc::channel(1);
        drop(cancel_tx);

        let outcome = prompt
            .solicit(&channel, awaiting_prompt(), cancel_rx)
            .await
            .unwrap();
        // The closed channel is not a skip; the window still runs out.
        assert_eq!(outcome, TipOutcome::TimedOut);
    }
}

//! # Display Channel
//!
//! The one-way pipe from the register to the customer display. Cart edits
//! are debounced and coalesced before hitting the durable store; checkout
//! phase changes go out immediately and gate further cart publications.
//!
//! ## Publication Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Display Channel Rules                              │
//! │                                                                         │
//! │  publish(snapshot)        debounced 300ms, coalescing: ten rapid cart  │
//! │   (cart edits)            edits become one store write                 │
//! │                                                                         │
//! │  publish_now(snapshot)    immediate write; used for AWAITING_TIP,      │
//! │   (checkout phases)       SETTLING, COMPLETED, CANCELLED, and the      │
//! │                           post-sale idle screen                        │
//! │                                                                         │
//! │  SUPPRESSION              while the last phase written is              │
//! │                           AWAITING_TIP or SETTLING, debounced cart     │
//! │                           publications are DROPPED: a stale ACTIVE     │
//! │                           write must not race the tip handshake        │
//! │                                                                         │
//! │  FAST PATH                every successful write is also broadcast     │
//! │                           in-process; same-device displays render      │
//! │                           without polling. The store stays             │
//! │                           authoritative for cross-device recovery.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All writes go through one worker task, so store sequence numbers are
//! handled in one place: on a stale write the worker re-reads the found
//! sequence and retries (the display bumps the document when it writes the
//! tip choice back).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use till_core::CheckoutPhase;

use crate::error::{SyncError, SyncResult};
use crate::snapshot::DisplaySnapshot;
use crate::store::DisplayStore;
use crate::PUBLISH_DEBOUNCE;

/// Stale-write retries before giving up on a publication.
const MAX_CAS_ATTEMPTS: u32 = 3;

/// Fast-path buffer; a lagging subscriber just misses frames.
const FAST_PATH_CAPACITY: usize = 64;

// =============================================================================
// Commands
// =============================================================================

enum Command {
    /// Debounced cart publication.
    Publish(DisplaySnapshot),
    /// Immediate phase publication; replies with the written sequence.
    PublishNow(DisplaySnapshot, oneshot::Sender<SyncResult<u64>>),
    /// Graceful shutdown.
    Shutdown,
}

// =============================================================================
// Handle
// =============================================================================

/// Cloneable handle for publishing to one register's display.
#[derive(Clone)]
pub struct DisplayChannelHandle {
    cmd_tx: mpsc::Sender<Command>,
    fast_tx: broadcast::Sender<DisplaySnapshot>,
}

impl DisplayChannelHandle {
    /// Queues a cart snapshot for debounced publication.
    ///
    /// Dropped silently if the current checkout phase suppresses cart
    /// publications (tip handshake or settlement in flight).
    pub async fn publish(&self, snapshot: DisplaySnapshot) -> SyncResult<()> {
        self.cmd_tx
            .send(Command::Publish(snapshot))
            .await
            .map_err(|_| SyncError::ChannelClosed)
    }

    /// Writes a checkout-phase snapshot immediately, bypassing the
    /// debounce, and returns the stored sequence number.
    pub async fn publish_now(&self, snapshot: DisplaySnapshot) -> SyncResult<u64> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::PublishNow(snapshot, reply_tx))
            .await
            .map_err(|_| SyncError::ChannelClosed)?;
        reply_rx.await.map_err(|_| SyncError::ChannelClosed)?
    }

    /// Subscribes to the same-process fast path.
    pub fn subscribe(&self) -> broadcast::Receiver<DisplaySnapshot> {
        self.fast_tx.subscribe()
    }

    /// Shuts the worker down; any pending debounced publication is dropped.
    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(Command::Shutdown).await;
    }
}

// =============================================================================
// Channel Worker
// =============================================================================

/// Spawns the publisher worker for one register key.
pub struct DisplayChannel;

impl DisplayChannel {
    /// Spawns with the default 300ms debounce.
    pub fn spawn(store: Arc<dyn DisplayStore>, key: impl Into<String>) -> DisplayChannelHandle {
        DisplayChannel::spawn_with_debounce(store, key, PUBLISH_DEBOUNCE)
    }

    /// Spawns with a custom debounce window (tests use a short one).
    pub fn spawn_with_debounce(
        store: Arc<dyn DisplayStore>,
        key: impl Into<String>,
        debounce: Duration,
    ) -> DisplayChannelHandle {
        let (cmd_tx, cmd_rx) = mpsc::channel(64);
        let (fast_tx, _) = broadcast::channel(FAST_PATH_CAPACITY);

        let worker = Worker {
            store,
            key: key.into(),
            debounce,
            last_seq: 0,
            suppressed: false,
            fast_tx: fast_tx.clone(),
        };
        tokio::spawn(worker.run(cmd_rx));

        DisplayChannelHandle { cmd_tx, fast_tx }
    }
}

struct Worker {
    store: Arc<dyn DisplayStore>,
    key: String,
    debounce: Duration,
    /// Sequence of our last successful write (0 before the first).
    last_seq: u64,
    /// True while the last written phase gates cart publications.
    suppressed: bool,
    fast_tx: broadcast::Sender<DisplaySnapshot>,
}

impl Worker {
    async fn run(mut self, mut cmd_rx: mpsc::Receiver<Command>) {
        info!(key = %self.key, "display channel started");

        // Resettable debounce timer; parked far in the future while idle.
        let timer = sleep(Duration::from_secs(86_400));
        tokio::pin!(timer);
        let mut pending: Option<DisplaySnapshot> = None;

        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    None | Some(Command::Shutdown) => break,

                    Some(Command::Publish(snapshot)) => {
                        if self.suppressed {
                            debug!(key = %self.key, "cart publication suppressed during checkout");
                            continue;
                        }
                        pending = Some(snapshot);
                        timer.as_mut().reset(Instant::now() + self.debounce);
                    }

                    Some(Command::PublishNow(snapshot, reply)) => {
                        // A queued cart frame is stale the moment a phase
                        // change goes out.
                        pending = None;
                        self.suppressed = matches!(
                            snapshot.status,
                            CheckoutPhase::AwaitingTip | CheckoutPhase::Settling
                        );
                        let result = self.write(&snapshot).await;
                        if result.is_ok() {
                            let _ = self.fast_tx.send(snapshot);
                        }
                        let _ = reply.send(result);
                    }
                },

                _ = &mut timer, if pending.is_some() => {
                    let snapshot = pending.take().unwrap();
                    match self.write(&snapshot).await {
                        Ok(_) => {
                            let _ = self.fast_tx.send(snapshot);
                        }
                        Err(e) => {
                            // Cart frames are best-effort; the next edit
                            // republishes a fresher one anyway.
                            warn!(key = %self.key, error = %e, "debounced publication failed");
                        }
                    }
                }
            }
        }

        info!(key = %self.key, "display channel stopped");
    }

    /// Compare-and-set write with re-read on a lost race. The display
    /// writing its tip choice back is the expected concurrent writer.
    async fn write(&mut self, snapshot: &DisplaySnapshot) -> SyncResult<u64> {
        let mut attempts = 0;
        loop {
            match self
                .store
                .put_if_seq(&self.key, self.last_seq, snapshot.clone())
                .await
            {
                Ok(seq) => {
                    self.last_seq = seq;
                    return Ok(seq);
                }
                Err(SyncError::StaleWrite { found, .. }) if attempts < MAX_CAS_ATTEMPTS => {
                    attempts += 1;
                    debug!(
                        key = %self.key,
                        found = found,
                        attempt = attempts,
                        "display write lost a race, retrying at found seq"
                    );
                    self.last_seq = found;
                }
                Err(e) => return Err(e),
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
    use crate::snapshot::DisplayDocument;
    use crate::store::MemoryDisplayStore;
    use till_core::Money;

    async fn stored(store: &MemoryDisplayStore, key: &str) -> Option<DisplayDocument> {
        store.get(key).await.unwrap()
    }

    fn active_snapshot(total_cents: i64) -> DisplaySnapshot {
        DisplaySnapshot {
            status: CheckoutPhase::Active,
            total_cents,
            ..DisplaySnapshot::idle()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_rapid_publishes_coalesce_into_one_write() {
        let store = Arc::new(MemoryDisplayStore::new());
        let handle = DisplayChannel::spawn(store.clone(), "reg-1");

        handle.publish(active_snapshot(100)).await.unwrap();
        handle.publish(active_snapshot(200)).await.unwrap();
        handle.publish(active_snapshot(300)).await.unwrap();

        tokio::time::sleep(Duration::from_millis(400)).await;

        let doc = stored(&store, "reg-1").await.unwrap();
        assert_eq!(doc.seq, 1, "three edits must become one write");
        assert_eq!(doc.snapshot.total_cents, 300, "the latest frame wins");
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_now_bypasses_debounce() {
        let store = Arc::new(MemoryDisplayStore::new());
        let handle = DisplayChannel::spawn(store.clone(), "reg-1");

        let seq = handle
            .publish_now(DisplaySnapshot::settling(active_snapshot(500)))
            .await
            .unwrap();
        assert_eq!(seq, 1);

        let doc = stored(&store, "reg-1").await.unwrap();
        assert_eq!(doc.snapshot.status, CheckoutPhase::Settling);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cart_publications_suppressed_during_tip_handshake() {
        let store = Arc::new(MemoryDisplayStore::new());
        let handle = DisplayChannel::spawn(store.clone(), "reg-1");

        let awaiting = DisplaySnapshot::awaiting_tip(active_snapshot(500), &[Money::from_cents(100)]);
        handle.publish_now(awaiting).await.unwrap();

        // A stale cart frame must not overwrite the tip screen
        handle.publish(active_snapshot(999)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        let doc = stored(&store, "reg-1").await.unwrap();
        assert_eq!(doc.snapshot.status, CheckoutPhase::AwaitingTip);
        assert_eq!(doc.seq, 1);

        // Once the checkout resolves, cart frames flow again
        handle.publish_now(DisplaySnapshot::idle()).await.unwrap();
        handle.publish(active_snapshot(999)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(500)).await;

        let doc = stored(&store, "reg-1").await.unwrap();
        assert_eq!(doc.snapshot.status, CheckoutPhase::Active);
        assert_eq!(doc.snapshot.total_cents, 999);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_display_writes_back() {
        let store = Arc::new(MemoryDisplayStore::new());
        let handle = DisplayChannel::spawn(store.clone(), "reg-1");

        handle.publish_now(active_snapshot(500)).await.unwrap();

        // The customer display writes the tip choice, bumping the sequence
        // behind the register's back.
        let doc = stored(&store, "reg-1").await.unwrap();
        store
            .put_if_seq(
                "reg-1",
                doc.seq,
                DisplaySnapshot::tip_chosen(doc.snapshot, Money::from_cents(300)),
            )
            .await
            .unwrap();

        // The register's next write re-reads and lands on top.
        let seq = handle
            .publish_now(DisplaySnapshot::settling(active_snapshot(800)))
            .await
            .unwrap();
        assert_eq!(seq, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fast_path_broadcast() {
        let store = Arc::new(MemoryDisplayStore::new());
        let handle = DisplayChannel::spawn(store.clone(), "reg-1");
        let mut fast_rx = handle.subscribe();

        handle.publish_now(active_snapshot(700)).await.unwrap();

        let frame = fast_rx.recv().await.unwrap();
        assert_eq!(frame.total_cents, 700);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_drops_pending_frame() {
        let store = Arc::new(MemoryDisplayStore::new());
        let handle = DisplayChannel::spawn(store.clone(), "reg-1");

        handle.publish(active_snapshot(100)).await.unwrap();
        handle.shutdown().await;
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert!(stored(&store, "reg-1").await.is_none());
        assert!(matches!(
            handle.publish(active_snapshot(200)).await,
            Err(SyncError::ChannelClosed)
        ));
    }
}

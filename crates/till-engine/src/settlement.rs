//! # Checkout Settlement
//!
//! The ordered pipeline that turns validated tender into a recorded
//! transaction.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Settlement Pipeline                                 │
//! │                                                                         │
//! │  1. VALIDATE     split sums, tendered cash covers the due amount        │
//! │     │            fails fast - NOTHING has been charged or stored        │
//! │     ▼                                                                   │
//! │  2. CHARGE CARD  card / card-portion via the terminal seam              │
//! │     │            a typed failure aborts with cart & shift untouched     │
//! │     ▼                                                                   │
//! │  3. RECORD       submit the Transaction; bounded exponential retry      │
//! │     │            reusing the SAME client-generated id (idempotency)     │
//! │     │            still failing after a captured charge →                │
//! │     │            CaptureUnrecorded (manual reconciliation state)        │
//! │     ▼                                                                   │
//! │  4. SHIFT        add the cash portion to the drawer session counter     │
//! │                                                                         │
//! │  Steps run strictly in order; no reordering, no speculation. There is  │
//! │  no cancellation once step 2 has been requested (rules out double      │
//! │  charges); before step 2, aborting discards only local state.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Which total is due?
//! Cash pays the cash-priced total; card pays the card-priced (surcharged)
//! total; a split is validated against the card-priced total, since the
//! card rail is in play.

use std::sync::Arc;
use std::time::Duration;

use backoff::ExponentialBackoff;
use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use till_core::{
    validation::{validate_split, validate_tender},
    CartSnapshot, Money, PaymentMethod, Totals, Transaction, TransactionItem, ValidationError,
};

use crate::error::{EngineError, EngineResult};
use crate::recorder::TransactionRecorder;
use crate::shift::ShiftManager;
use crate::terminal::PaymentTerminal;

/// How long recorder submissions are retried before surfacing failure.
const DEFAULT_RECORD_RETRY_WINDOW: Duration = Duration::from_secs(5);

// =============================================================================
// Request / Outcome
// =============================================================================

/// The two halves of a split payment, as keyed by the operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitTender {
    pub cash: Money,
    pub card: Money,
}

/// Everything settlement needs for one sale.
#[derive(Debug, Clone)]
pub struct SettlementRequest {
    /// The cart exactly as priced (frozen onto the transaction).
    pub cart: CartSnapshot,

    /// Resolved totals, tip included.
    pub totals: Totals,

    pub method: PaymentMethod,

    /// Physical cash handed over (cash and split sales).
    pub cash_tendered: Option<Money>,

    /// Required for [`PaymentMethod::Split`].
    pub split: Option<SplitTender>,

    /// Drawer session to attribute the cash portion to.
    pub shift_id: Option<String>,
}

/// A settled sale.
#[derive(Debug, Clone)]
pub struct SettlementOutcome {
    pub transaction: Transaction,

    /// Change owed back to the customer.
    pub change: Money,
}

// =============================================================================
// Settlement
// =============================================================================

/// The settlement pipeline for one register.
#[derive(Clone)]
pub struct Settlement {
    terminal: Arc<dyn PaymentTerminal>,
    recorder: Arc<dyn TransactionRecorder>,
    shifts: ShiftManager,
    record_retry_window: Duration,
}

impl Settlement {
    pub fn new(
        terminal: Arc<dyn PaymentTerminal>,
        recorder: Arc<dyn TransactionRecorder>,
        shifts: ShiftManager,
    ) -> Self {
        Settlement {
            terminal,
            recorder,
            shifts,
            record_retry_window: DEFAULT_RECORD_RETRY_WINDOW,
        }
    }

    /// Shrinks the recorder retry window (tests).
    pub fn with_record_retry_window(mut self, window: Duration) -> Self {
        self.record_retry_window = window;
        self
    }

    /// Runs the pipeline. On any error the cart and shift are exactly as
    /// they were - except [`EngineError::CaptureUnrecorded`], where money
    /// has moved and the error itself carries the evidence.
    pub async fn settle(&self, request: SettlementRequest) -> EngineResult<SettlementOutcome> {
        if request.cart.is_empty() {
            return Err(till_core::CoreError::from(ValidationError::Required {
                field: "cart items",
            })
            .into());
        }

        let totals = &request.totals;

        // ---- Step 1: validate tender (no side effects) ----
        let (cash_due, card_due, change) = match request.method {
            PaymentMethod::Cash => {
                let due = totals.total_cash_with_tip();
                let tendered = request.cash_tendered.ok_or_else(|| {
                    till_core::CoreError::from(ValidationError::Required {
                        field: "tendered cash",
                    })
                })?;
                let change = validate_tender(tendered, due)?;
                (due, Money::zero(), change)
            }
            PaymentMethod::Card => (Money::zero(), totals.total_card_with_tip(), Money::zero()),
            PaymentMethod::Split => {
                let split = request.split.ok_or_else(|| {
                    till_core::CoreError::from(ValidationError::Required {
                        field: "split amounts",
                    })
                })?;
                let due = totals.total_card_with_tip();
                validate_split(split.cash, split.card, due)?;

                // The customer may hand over more cash than their half.
                let tendered = request.cash_tendered.unwrap_or(split.cash);
                let change = validate_tender(tendered, split.cash)?;
                (split.cash, split.card, change)
            }
        };

        // ---- Step 2: charge the card portion ----
        let approval = if card_due.is_positive() {
            let approval = self
                .terminal
                .charge(card_due)
                .await
                .map_err(|source| EngineError::Terminal {
                    amount: card_due,
                    method: request.method,
                    source,
                })?;
            info!(
                amount = %card_due,
                gateway_tx = %approval.gateway_tx_id,
                last4 = %approval.card_last4,
                "card charge approved"
            );
            Some(approval)
        } else {
            None
        };

        // ---- Step 3: build and record the transaction ----
        let transaction = build_transaction(&request, cash_due, card_due, change, approval);

        if let Err(source) = self.record_with_retry(&transaction).await {
            return Err(if transaction.card.is_some() {
                error!(
                    tx_id = %transaction.id,
                    amount = %transaction.total(),
                    "card captured but transaction not recorded - RECONCILIATION REQUIRED"
                );
                EngineError::CaptureUnrecorded {
                    transaction: Box::new(transaction),
                    source,
                }
            } else {
                EngineError::Persistence {
                    context: format!(
                        "{} {} sale was not recorded",
                        transaction.total(),
                        transaction.method
                    ),
                    source,
                }
            });
        }

        // ---- Step 4: attribute the cash portion to the shift ----
        if let Some(shift_id) = &request.shift_id {
            if cash_due.is_positive() {
                // The transaction is already durable; a stale drawer counter
                // surfaces as variance at close rather than failing the sale.
                if let Err(e) = self.shifts.record_cash_sale(shift_id, cash_due).await {
                    error!(
                        tx_id = %transaction.id,
                        shift_id = %shift_id,
                        amount = %cash_due,
                        error = %e,
                        "cash portion not added to shift counter"
                    );
                }
            }
        }

        info!(
            tx_id = %transaction.id,
            receipt = %transaction.receipt_number,
            method = %transaction.method,
            total = %transaction.total(),
            change = %change,
            "sale settled"
        );

        Ok(SettlementOutcome {
            transaction,
            change,
        })
    }

    /// Submits to the recorder with bounded exponential retry. Every
    /// attempt carries the same transaction (same id), so a submission
    /// that landed but whose ack was lost cannot double-record.
    async fn record_with_retry(
        &self,
        transaction: &Transaction,
    ) -> Result<(), crate::error::PersistenceError> {
        let policy = ExponentialBackoff {
            initial_interval: Duration::from_millis(100),
            max_elapsed_time: Some(self.record_retry_window),
            ..ExponentialBackoff::default()
        };

        backoff::future::retry(policy, || async {
            self.recorder.record(transaction).await.map_err(|e| {
                warn!(tx_id = %transaction.id, error = %e, "recorder submission failed, retrying");
                backoff::Error::transient(e)
            })
        })
        .await
    }
}

/// Freezes the request into the immutable transaction record.
fn build_transaction(
    request: &SettlementRequest,
    cash: Money,
    card: Money,
    change: Money,
    approval: Option<till_core::CardApproval>,
) -> Transaction {
    let items = request
        .cart
        .items
        .iter()
        .map(|line| TransactionItem {
            catalog_id: line.id.clone(),
            kind: line.kind,
            name: line.name.clone(),
            unit_price_cents: line.unit_price_cents,
            quantity: line.quantity,
            line_discount_bps: line.line_discount_bps,
            line_total_cents: line.line_total().cents(),
        })
        .collect();

    Transaction {
        id: Uuid::new_v4().to_string(),
        receipt_number: generate_receipt_number(),
        items,
        subtotal_cents: request.totals.subtotal_cents,
        discount_cents: request.totals.discount_cents,
        tax_cents: request.totals.tax_cents,
        tip_cents: request.totals.tip_cents,
        total_cents: (cash + card).cents(),
        method: request.method,
        cash_cents: cash.cents(),
        card_cents: card.cents(),
        change_cents: change.cents(),
        card: approval,
        shift_id: request.shift_id.clone(),
        created_at: Utc::now(),
    }
}

/// Date-prefixed receipt number with a sub-second discriminator.
fn generate_receipt_number() -> String {
    let now = Utc::now();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    format!("{}-{:04}", now.format("%y%m%d-%H%M%S"), nanos % 10000)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    use till_core::{
        compute_totals, CardApproval, Cart, CatalogItem, DenominationCount, ItemKind,
        PricingConfig,
    };

    use crate::error::{PersistenceError, TerminalError};
    use crate::recorder::MemoryTransactionRecorder;
    use crate::shift::{MemoryShiftStore, ShiftManager};

    // -------------------------------------------------------------------------
    // Scripted collaborators
    // -------------------------------------------------------------------------

    struct ApprovingTerminal {
        charges: AtomicU32,
    }

    impl ApprovingTerminal {
        fn new() -> Self {
            ApprovingTerminal {
                charges: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl PaymentTerminal for ApprovingTerminal {
        async fn charge(&self, _amount: Money) -> Result<CardApproval, TerminalError> {
            self.charges.fetch_add(1, Ordering::SeqCst);
            Ok(CardApproval {
                gateway_tx_id: "gw-1".into(),
                auth_code: "AUTH".into(),
                card_last4: "4242".into(),
                card_brand: "visa".into(),
            })
        }
    }

    struct DecliningTerminal;

    #[async_trait]
    impl PaymentTerminal for DecliningTerminal {
        async fn charge(&self, _amount: Money) -> Result<CardApproval, TerminalError> {
            Err(TerminalError::Declined("insufficient funds".into()))
        }
    }

    /// Fails the first `failures` attempts, then succeeds.
    struct FlakyRecorder {
        inner: MemoryTransactionRecorder,
        failures: AtomicU32,
    }

    #[async_trait]
    impl TransactionRecorder for FlakyRecorder {
        async fn record(&self, tx: &Transaction) -> Result<(), PersistenceError> {
            if self.failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |f| {
                    if f > 0 { Some(f - 1) } else { None }
                })
                .is_ok()
            {
                return Err(PersistenceError("recorder unreachable".into()));
            }
            self.inner.record(tx).await
        }
    }

    struct DeadRecorder;

    #[async_trait]
    impl TransactionRecorder for DeadRecorder {
        async fn record(&self, _tx: &Transaction) -> Result<(), PersistenceError> {
            Err(PersistenceError("recorder unreachable".into()))
        }
    }

    // -------------------------------------------------------------------------
    // Fixtures
    // -------------------------------------------------------------------------

    fn fifty_dollar_cart() -> (CartSnapshot, Totals) {
        let mut cart = Cart::new();
        cart.add_item(
            &CatalogItem {
                id: "svc".into(),
                name: "Color & Style".into(),
                price_cents: 5000,
            },
            ItemKind::Service,
        )
        .unwrap();
        let snapshot = cart.snapshot();
        // Services untaxed under the default config, standard pricing:
        // every total is exactly $50.00.
        let totals = compute_totals(&snapshot, &PricingConfig::default(), Money::zero()).unwrap();
        assert_eq!(totals.total_card_with_tip_cents, 5000);
        (snapshot, totals)
    }

    async fn shift_fixture() -> (ShiftManager, String) {
        let manager = ShiftManager::new(Arc::new(MemoryShiftStore::new()), "reg-1");
        let session = manager
            .open(
                "emp-1",
                &DenominationCount {
                    ones: 100,
                    ..DenominationCount::empty()
                },
            )
            .await
            .unwrap();
        (manager, session.id)
    }

    fn request(
        cart: CartSnapshot,
        totals: Totals,
        method: PaymentMethod,
        cash_tendered: Option<Money>,
        split: Option<SplitTender>,
        shift_id: Option<String>,
    ) -> SettlementRequest {
        SettlementRequest {
            cart,
            totals,
            method,
            cash_tendered,
            split,
            shift_id,
        }
    }

    // -------------------------------------------------------------------------
    // Tests
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_cash_settlement_with_change() {
        let (cart, totals) = fifty_dollar_cart();
        let (shifts, shift_id) = shift_fixture().await;
        let recorder = Arc::new(MemoryTransactionRecorder::new());
        let settlement = Settlement::new(
            Arc::new(ApprovingTerminal::new()),
            recorder.clone(),
            shifts.clone(),
        );

        let outcome = settlement
            .settle(request(
                cart,
                totals,
                PaymentMethod::Cash,
                Some(Money::from_cents(6000)),
                None,
                Some(shift_id.clone()),
            ))
            .await
            .unwrap();

        assert_eq!(outcome.change.cents(), 1000);
        assert_eq!(outcome.transaction.cash_cents, 5000);
        assert_eq!(outcome.transaction.card_cents, 0);
        assert!(outcome.transaction.card.is_none());
        assert_eq!(recorder.count().await, 1);

        // The drawer counter saw the amount due, not the tendered amount
        let report = shifts
            .close(
                &shift_id,
                &DenominationCount {
                    ones: 150,
                    ..DenominationCount::empty()
                },
            )
            .await
            .unwrap();
        assert_eq!(report.cash_sales_cents, 5000);
    }

    #[tokio::test]
    async fn test_insufficient_cash_mutates_nothing() {
        let (cart, totals) = fifty_dollar_cart();
        let (shifts, shift_id) = shift_fixture().await;
        let recorder = Arc::new(MemoryTransactionRecorder::new());
        let settlement = Settlement::new(
            Arc::new(ApprovingTerminal::new()),
            recorder.clone(),
            shifts.clone(),
        );

        let err = settlement
            .settle(request(
                cart,
                totals,
                PaymentMethod::Cash,
                Some(Money::from_cents(4000)),
                None,
                Some(shift_id.clone()),
            ))
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::Core(_)));
        assert_eq!(recorder.count().await, 0);

        let report = shifts
            .close(
                &shift_id,
                &DenominationCount {
                    ones: 100,
                    ..DenominationCount::empty()
                },
            )
            .await
            .unwrap();
        assert_eq!(report.cash_sales_cents, 0);
    }

    #[tokio::test]
    async fn test_card_settlement_records_approval() {
        let (cart, totals) = fifty_dollar_cart();
        let (shifts, _) = shift_fixture().await;
        let recorder = Arc::new(MemoryTransactionRecorder::new());
        let settlement =
            Settlement::new(Arc::new(ApprovingTerminal::new()), recorder.clone(), shifts);

        let outcome = settlement
            .settle(request(cart, totals, PaymentMethod::Card, None, None, None))
            .await
            .unwrap();

        assert_eq!(outcome.transaction.card_cents, 5000);
        let approval = outcome.transaction.card.unwrap();
        assert_eq!(approval.card_last4, "4242");
        assert_eq!(outcome.change.cents(), 0);
    }

    #[tokio::test]
    async fn test_card_decline_aborts_without_recording() {
        let (cart, totals) = fifty_dollar_cart();
        let (shifts, _) = shift_fixture().await;
        let recorder = Arc::new(MemoryTransactionRecorder::new());
        let settlement = Settlement::new(Arc::new(DecliningTerminal), recorder.clone(), shifts);

        let err = settlement
            .settle(request(cart, totals, PaymentMethod::Card, None, None, None))
            .await
            .unwrap_err();

        match err {
            EngineError::Terminal { amount, method, .. } => {
                assert_eq!(amount.cents(), 5000);
                assert_eq!(method, PaymentMethod::Card);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(recorder.count().await, 0);
    }

    /// The reference split scenario: $50.00 total, $20.00 cash + $30.00
    /// card, exactly $20.00 handed over → settles with zero change.
    #[tokio::test]
    async fn test_split_settlement_reference_scenario() {
        let (cart, totals) = fifty_dollar_cart();
        let (shifts, shift_id) = shift_fixture().await;
        let recorder = Arc::new(MemoryTransactionRecorder::new());
        let terminal = Arc::new(ApprovingTerminal::new());
        let settlement = Settlement::new(terminal.clone(), recorder.clone(), shifts.clone());

        let outcome = settlement
            .settle(request(
                cart,
                totals,
                PaymentMethod::Split,
                Some(Money::from_cents(2000)),
                Some(SplitTender {
                    cash: Money::from_cents(2000),
                    card: Money::from_cents(3000),
                }),
                Some(shift_id.clone()),
            ))
            .await
            .unwrap();

        assert_eq!(outcome.change.cents(), 0);
        assert_eq!(outcome.transaction.cash_cents, 2000);
        assert_eq!(outcome.transaction.card_cents, 3000);
        assert_eq!(outcome.transaction.total_cents, 5000);
        assert_eq!(terminal.charges.load(Ordering::SeqCst), 1);

        // Only the cash half reaches the drawer
        let report = shifts
            .close(
                &shift_id,
                &DenominationCount {
                    ones: 120,
                    ..DenominationCount::empty()
                },
            )
            .await
            .unwrap();
        assert_eq!(report.cash_sales_cents, 2000);
    }

    #[tokio::test]
    async fn test_split_mismatch_never_touches_the_terminal() {
        let (cart, totals) = fifty_dollar_cart();
        let (shifts, _) = shift_fixture().await;
        let terminal = Arc::new(ApprovingTerminal::new());
        let settlement = Settlement::new(
            terminal.clone(),
            Arc::new(MemoryTransactionRecorder::new()),
            shifts,
        );

        let err = settlement
            .settle(request(
                cart,
                totals,
                PaymentMethod::Split,
                None,
                Some(SplitTender {
                    cash: Money::from_cents(2000),
                    card: Money::from_cents(2500),
                }),
                None,
            ))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EngineError::Core(till_core::CoreError::SplitMismatch { .. })
        ));
        assert_eq!(terminal.charges.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recorder_retry_recovers_with_one_record() {
        let (cart, totals) = fifty_dollar_cart();
        let (shifts, _) = shift_fixture().await;
        let recorder = Arc::new(FlakyRecorder {
            inner: MemoryTransactionRecorder::new(),
            failures: AtomicU32::new(2),
        });
        let settlement =
            Settlement::new(Arc::new(ApprovingTerminal::new()), recorder.clone(), shifts);

        let outcome = settlement
            .settle(request(
                cart,
                totals,
                PaymentMethod::Cash,
                Some(Money::from_cents(5000)),
                None,
                None,
            ))
            .await
            .unwrap();

        // Two failures, then success - and exactly one record under the
        // one id that every attempt shared.
        assert_eq!(recorder.inner.count().await, 1);
        assert!(recorder.inner.get(&outcome.transaction.id).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_capture_unrecorded_preserves_evidence() {
        let (cart, totals) = fifty_dollar_cart();
        let (shifts, _) = shift_fixture().await;
        let settlement = Settlement::new(
            Arc::new(ApprovingTerminal::new()),
            Arc::new(DeadRecorder),
            shifts,
        )
        .with_record_retry_window(Duration::from_millis(300));

        let err = settlement
            .settle(request(cart, totals, PaymentMethod::Card, None, None, None))
            .await
            .unwrap_err();

        match err {
            EngineError::CaptureUnrecorded { transaction, .. } => {
                assert_eq!(transaction.card_cents, 5000);
                assert!(transaction.card.is_some(), "approval evidence must survive");
            }
            other => panic!("expected CaptureUnrecorded, got: {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cash_persistence_failure_is_not_reconciliation() {
        let (cart, totals) = fifty_dollar_cart();
        let (shifts, _) = shift_fixture().await;
        let settlement = Settlement::new(
            Arc::new(ApprovingTerminal::new()),
            Arc::new(DeadRecorder),
            shifts,
        )
        .with_record_retry_window(Duration::from_millis(300));

        let err = settlement
            .settle(request(
                cart,
                totals,
                PaymentMethod::Cash,
                Some(Money::from_cents(5000)),
                None,
                None,
            ))
            .await
            .unwrap_err();

        // No card was captured, so this is a plain persistence failure -
        // and its message still names amount and method.
        match err {
            EngineError::Persistence { context, .. } => {
                assert!(context.contains("$50.00"));
                assert!(context.contains("cash"));
            }
            other => panic!("expected Persistence, got: {other}"),
        }
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let (shifts, _) = shift_fixture().await;
        let settlement = Settlement::new(
            Arc::new(ApprovingTerminal::new()),
            Arc::new(MemoryTransactionRecorder::new()),
            shifts,
        );

        let err = settlement
            .settle(request(
                CartSnapshot::empty(),
                Totals::zero(),
                PaymentMethod::Cash,
                Some(Money::zero()),
                None,
                None,
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Core(_)));
    }
}

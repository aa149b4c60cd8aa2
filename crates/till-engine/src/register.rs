//! # Register Orchestration
//!
//! One [`Register`] per physical till: it owns the cart, the checkout state
//! machine, the display channel, and the shift handle, and drives the tip
//! prompt and settlement pipeline through a checkout.
//!
//! ## A Card Sale With Tip, End To End
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  add_item × n      cart mutates, IDLE→ACTIVE, debounced publish        │
//! │       │                                                                 │
//! │  checkout(Card)                                                         │
//! │       │                                                                 │
//! │       ├─► ACTIVE→AWAITING_TIP, tip screen published                     │
//! │       │      customer picks $3.00 on the display (or the window         │
//! │       │      times out → $0.00, or the operator skips → back to        │
//! │       │      ACTIVE with the cart intact)                              │
//! │       │                                                                 │
//! │       ├─► TIP_SELECTED→SETTLING, processing screen published            │
//! │       │      validate → charge card → record → update shift            │
//! │       │                                                                 │
//! │       ├─► success: SETTLING→COMPLETED, thank-you screen, cart          │
//! │       │      cleared, tip reset, COMPLETED→IDLE                        │
//! │       │                                                                 │
//! │       └─► failure: SETTLING→ACTIVE, cart PRESERVED so the operator     │
//! │              can retry (different tender, re-swipe) without            │
//! │              re-ringing a single item                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cancellation before the card charge discards local state only; there is
//! deliberately no cancellation path once the charge has been requested.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::info;

use till_core::{
    compute_totals, tip_suggestions, Cart, CatalogItem, CheckoutPhase, CoreError,
    DenominationCount, ItemKind, Money, PricingConfig, ShiftReport, TipConfig, Totals,
    ValidationError,
};
use till_sync::{
    CheckoutStateMachine, DisplayChannel, DisplayChannelHandle, DisplaySnapshot, DisplayStore,
    TipOutcome, TipPrompt,
};

use crate::error::{EngineError, EngineResult};
use crate::settlement::{Settlement, SettlementOutcome, SettlementRequest, SplitTender};
use crate::shift::ShiftManager;

// =============================================================================
// Checkout Request / Outcome
// =============================================================================

/// Operator input for one checkout.
pub struct CheckoutRequest {
    pub method: till_core::PaymentMethod,

    /// Physical cash handed over (cash and split sales).
    pub cash_tendered: Option<Money>,

    /// Required for split sales.
    pub split: Option<SplitTender>,

    /// Operator's tip-skip line; send `()` to cancel the tip prompt.
    /// `None` lets the prompt run its full window.
    pub tip_skip: Option<mpsc::Receiver<()>>,
}

impl CheckoutRequest {
    pub fn cash(tendered: Money) -> Self {
        CheckoutRequest {
            method: till_core::PaymentMethod::Cash,
            cash_tendered: Some(tendered),
            split: None,
            tip_skip: None,
        }
    }

    pub fn card() -> Self {
        CheckoutRequest {
            method: till_core::PaymentMethod::Card,
            cash_tendered: None,
            split: None,
            tip_skip: None,
        }
    }

    pub fn split(cash: Money, card: Money, tendered: Money) -> Self {
        CheckoutRequest {
            method: till_core::PaymentMethod::Split,
            cash_tendered: Some(tendered),
            split: Some(SplitTender { cash, card }),
            tip_skip: None,
        }
    }

    /// Attaches an operator skip line to the tip prompt.
    pub fn with_tip_skip(mut self, rx: mpsc::Receiver<()>) -> Self {
        self.tip_skip = Some(rx);
        self
    }
}

/// How a checkout ended.
#[derive(Debug)]
pub enum CheckoutOutcome {
    /// The sale settled; the cart has been cleared.
    Settled(SettlementOutcome),

    /// The operator cancelled the tip prompt; the cart is untouched and
    /// checkout can be re-initiated.
    TipCancelled,
}

// =============================================================================
// Register
// =============================================================================

/// One register session: cart + state machine + display + shift handle.
pub struct Register {
    register_id: String,
    pricing: PricingConfig,
    tips: TipConfig,
    cart: Cart,
    machine: CheckoutStateMachine,
    channel: DisplayChannelHandle,
    tip_prompt: TipPrompt,
    settlement: Settlement,
    shifts: ShiftManager,
    shift_id: Option<String>,
    customer_name: Option<String>,
    pending_tip: Money,
}

impl Register {
    /// Wires a register onto a display store key equal to its id.
    pub fn new(
        register_id: impl Into<String>,
        pricing: PricingConfig,
        tips: TipConfig,
        display_store: Arc<dyn DisplayStore>,
        settlement: Settlement,
        shifts: ShiftManager,
    ) -> Self {
        let register_id = register_id.into();
        let channel = DisplayChannel::spawn(display_store.clone(), register_id.clone());
        let tip_prompt = TipPrompt::new(display_store, register_id.clone());

        Register {
            register_id,
            pricing,
            tips,
            cart: Cart::new(),
            machine: CheckoutStateMachine::new(),
            channel,
            tip_prompt,
            settlement,
            shifts,
            shift_id: None,
            customer_name: None,
            pending_tip: Money::zero(),
        }
    }

    /// Swaps the tip prompt (tests shrink the polling window).
    pub fn with_tip_prompt(mut self, prompt: TipPrompt) -> Self {
        self.tip_prompt = prompt;
        self
    }

    /// The display channel (subscribe for the same-process fast path).
    pub fn display(&self) -> &DisplayChannelHandle {
        &self.channel
    }

    /// Current checkout phase.
    pub fn phase(&self) -> CheckoutPhase {
        self.machine.phase()
    }

    /// The open drawer session, if any.
    pub fn shift_id(&self) -> Option<&str> {
        self.shift_id.as_deref()
    }

    /// Lines currently rung.
    pub fn line_count(&self) -> usize {
        self.cart.line_count()
    }

    /// Names the customer on the display (loyalty lookup).
    pub async fn set_customer(&mut self, name: Option<String>) -> EngineResult<()> {
        self.customer_name = name;
        self.publish_cart().await
    }

    // =========================================================================
    // Shift Operations
    // =========================================================================

    /// Opens a drawer session and binds it to this register.
    pub async fn open_shift(
        &mut self,
        employee_id: &str,
        float: &DenominationCount,
    ) -> EngineResult<String> {
        let session = self.shifts.open(employee_id, float).await?;
        self.shift_id = Some(session.id.clone());
        Ok(session.id)
    }

    /// Closes the bound drawer session against a closing count.
    pub async fn close_shift(&mut self, counted: &DenominationCount) -> EngineResult<ShiftReport> {
        let shift_id = self
            .shift_id
            .clone()
            .ok_or_else(|| EngineError::NoOpenShift(self.register_id.clone()))?;
        let report = self.shifts.close(&shift_id, counted).await?;
        self.shift_id = None;
        Ok(report)
    }

    /// Records a cash drop on the bound session.
    pub async fn record_drop(&mut self, amount: Money) -> EngineResult<()> {
        let shift_id = self
            .shift_id
            .clone()
            .ok_or_else(|| EngineError::NoOpenShift(self.register_id.clone()))?;
        self.shifts.record_drop(&shift_id, amount).await
    }

    // =========================================================================
    // Cart Operations
    // =========================================================================

    pub async fn add_item(&mut self, item: &CatalogItem, kind: ItemKind) -> EngineResult<()> {
        self.cart.add_item(item, kind)?;
        self.publish_cart().await
    }

    pub async fn remove_item(&mut self, index: usize) -> EngineResult<()> {
        self.cart.remove_item(index);
        self.publish_cart().await
    }

    pub async fn set_quantity(&mut self, index: usize, quantity: i64) -> EngineResult<()> {
        self.cart.set_quantity(index, quantity);
        self.publish_cart().await
    }

    pub async fn apply_line_discount(&mut self, index: usize, percent: u32) -> EngineResult<()> {
        self.cart.apply_line_discount(index, percent)?;
        self.publish_cart().await
    }

    pub async fn apply_global_discount(
        &mut self,
        amount: Money,
        source: impl Into<String>,
    ) -> EngineResult<()> {
        self.cart.apply_global_discount(amount, source)?;
        self.publish_cart().await
    }

    /// Current totals, pending tip included.
    pub fn totals(&self) -> EngineResult<Totals> {
        compute_totals(&self.cart.snapshot(), &self.pricing, self.pending_tip)
            .map_err(|e| CoreError::from(e).into())
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Abandons the sale: the display exits any checkout screen, the cart
    /// clears, and the register returns to idle. Only valid before a card
    /// charge has been requested.
    pub async fn cancel_sale(&mut self) -> EngineResult<()> {
        self.machine.cancel()?;
        self.channel.publish_now(DisplaySnapshot::cancelled()).await?;
        self.cart.clear();
        self.pending_tip = Money::zero();
        self.customer_name = None;
        self.machine.reset()?;
        self.channel.publish(DisplaySnapshot::idle()).await?;
        info!(register = %self.register_id, "sale cancelled");
        Ok(())
    }

    /// Runs a full checkout: tip solicitation (when enabled), then the
    /// settlement pipeline, then display/cart cleanup.
    pub async fn checkout(&mut self, mut request: CheckoutRequest) -> EngineResult<CheckoutOutcome> {
        if self.cart.is_empty() {
            return Err(CoreError::from(ValidationError::Required {
                field: "cart items",
            })
            .into());
        }

        let snapshot = self.cart.snapshot();
        let phase = self.machine.begin_checkout(self.tips.enabled)?;

        if phase == CheckoutPhase::AwaitingTip {
            let base_totals = compute_totals(&snapshot, &self.pricing, Money::zero())
                .map_err(CoreError::from)?;
            let base = DisplaySnapshot::from_cart(
                &snapshot,
                &base_totals,
                &self.pricing,
                self.customer_name.clone(),
            );
            let suggestions = tip_suggestions(&base_totals, &self.tips);
            let prompt = DisplaySnapshot::awaiting_tip(base, &suggestions);

            // No skip line attached = the prompt runs its full window.
            let skip_rx = request
                .tip_skip
                .take()
                .unwrap_or_else(|| mpsc::channel(1).1);

            match self.tip_prompt.solicit(&self.channel, prompt, skip_rx).await? {
                TipOutcome::Skipped => {
                    self.machine.skip_tip()?;
                    self.publish_cart_now().await?;
                    return Ok(CheckoutOutcome::TipCancelled);
                }
                outcome => {
                    // Selected carries the amount; TimedOut resolves to a
                    // zero tip by policy.
                    self.pending_tip = outcome.tip();
                    self.machine.tip_selected()?;
                    self.machine.begin_settling()?;
                }
            }
        }

        let totals = compute_totals(&snapshot, &self.pricing, self.pending_tip)
            .map_err(CoreError::from)?;
        let settling_base = DisplaySnapshot::from_cart(
            &snapshot,
            &totals,
            &self.pricing,
            self.customer_name.clone(),
        );
        self.channel
            .publish_now(DisplaySnapshot::settling(settling_base))
            .await?;

        let result = self
            .settlement
            .settle(SettlementRequest {
                cart: snapshot,
                totals,
                method: request.method,
                cash_tendered: request.cash_tendered,
                split: request.split,
                shift_id: self.shift_id.clone(),
            })
            .await;

        match result {
            Ok(outcome) => {
                self.machine.settled()?;
                self.channel
                    .publish_now(DisplaySnapshot::completed(outcome.transaction.total()))
                    .await?;

                self.cart.clear();
                self.pending_tip = Money::zero();
                self.customer_name = None;
                self.machine.reset()?;
                self.channel.publish(DisplaySnapshot::idle()).await?;

                Ok(CheckoutOutcome::Settled(outcome))
            }
            Err(e) => {
                // Cart (and any selected tip) preserved for a retry.
                self.machine.settlement_failed()?;
                self.publish_cart_now().await?;
                Err(e)
            }
        }
    }

    // =========================================================================
    // Internal
    // =========================================================================

    /// Debounced cart publication after a mutation.
    async fn publish_cart(&mut self) -> EngineResult<()> {
        self.machine.cart_changed(self.cart.is_empty());
        let snapshot = self.cart.snapshot();
        let totals =
            compute_totals(&snapshot, &self.pricing, Money::zero()).map_err(CoreError::from)?;
        let display = DisplaySnapshot::from_cart(
            &snapshot,
            &totals,
            &self.pricing,
            self.customer_name.clone(),
        );
        self.channel.publish(display).await?;
        Ok(())
    }

    /// Immediate cart publication - used where the write must also lift
    /// the channel's checkout suppression (tip skip, settlement failure).
    async fn publish_cart_now(&mut self) -> EngineResult<()> {
        let snapshot = self.cart.snapshot();
        let totals =
            compute_totals(&snapshot, &self.pricing, Money::zero()).map_err(CoreError::from)?;
        let display = DisplaySnapshot::from_cart(
            &snapshot,
            &totals,
            &self.pricing,
            self.customer_name.clone(),
        );
        self.channel.publish_now(display).await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

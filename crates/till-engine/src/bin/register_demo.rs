//! # Register Demo
//!
//! Scripted end-to-end run against the in-memory collaborators: open a
//! shift, ring a cart, let a simulated customer display pick a tip, settle
//! a card sale and a split sale, close the drawer, print the report.
//!
//! ## Usage
//! ```bash
//! cargo run -p till-engine --bin register-demo
//!
//! # With verbose tracing
//! RUST_LOG=debug cargo run -p till-engine --bin register-demo
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use till_core::{
    CardApproval, CardSurcharge, CatalogItem, CheckoutPhase, DenominationCount, ItemKind, Money,
    PricingConfig, PricingModel, Rate, TipConfig,
};
use till_engine::{
    CheckoutOutcome, CheckoutRequest, EngineResult, MemoryShiftStore, MemoryTransactionRecorder,
    PaymentTerminal, Register, Settlement, ShiftManager, TerminalError,
};
use till_sync::{DisplaySnapshot, DisplayStore, MemoryDisplayStore, TipPrompt};

const REGISTER_ID: &str = "demo-register";

/// Terminal stand-in that approves everything.
struct DemoTerminal;

#[async_trait]
impl PaymentTerminal for DemoTerminal {
    async fn charge(&self, amount: Money) -> Result<CardApproval, TerminalError> {
        info!(amount = %amount, "terminal: charge requested");
        tokio::time::sleep(Duration::from_millis(200)).await;
        Ok(CardApproval {
            gateway_tx_id: "demo-gw-0001".into(),
            auth_code: "OK4711".into(),
            card_last4: "4242".into(),
            card_brand: "visa".into(),
        })
    }
}

/// Plays the customer display: waits for the tip screen, picks a tip.
fn spawn_customer_display(store: Arc<MemoryDisplayStore>, tip: Money) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_millis(250)).await;
            if let Ok(Some(doc)) = store.get(REGISTER_ID).await {
                if doc.snapshot.status == CheckoutPhase::AwaitingTip {
                    info!(tip = %tip, "customer display: tip chosen");
                    let _ = store
                        .put_if_seq(
                            REGISTER_ID,
                            doc.seq,
                            DisplaySnapshot::tip_chosen(doc.snapshot, tip),
                        )
                        .await;
                    break;
                }
            }
        }
    });
}

#[tokio::main]
async fn main() -> EngineResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    // Dual pricing: 8% tax on everything, 4% card surcharge.
    let pricing = PricingConfig {
        tax_rate: Rate::from_bps(800),
        tax_services: true,
        tax_products: true,
        pricing_model: PricingModel::DualPricing,
        card_surcharge: CardSurcharge::Percentage(Rate::from_bps(400)),
    };

    let display_store = Arc::new(MemoryDisplayStore::new());
    let recorder = Arc::new(MemoryTransactionRecorder::new());
    let shifts = ShiftManager::new(Arc::new(MemoryShiftStore::new()), REGISTER_ID);
    let settlement = Settlement::new(Arc::new(DemoTerminal), recorder.clone(), shifts.clone());

    let mut register = Register::new(
        REGISTER_ID,
        pricing,
        TipConfig::default(),
        display_store.clone(),
        settlement,
        shifts,
    )
    .with_tip_prompt(
        TipPrompt::new(display_store.clone(), REGISTER_ID)
            .with_timing(Duration::from_millis(500), 20),
    );

    // ---- Open the drawer with a $100 float -------------------------------
    let float = DenominationCount {
        twenties: 3,
        tens: 2,
        fives: 2,
        ones: 10,
        ..DenominationCount::empty()
    };
    register.open_shift("demo-employee", &float).await?;

    // ---- Sale 1: card with a customer tip --------------------------------
    register
        .add_item(
            &CatalogItem {
                id: "svc-cut".into(),
                name: "Haircut".into(),
                price_cents: 2000,
            },
            ItemKind::Service,
        )
        .await?;
    register.apply_line_discount(0, 10).await?;
    register
        .apply_global_discount(Money::from_cents(200), "coupon")
        .await?;

    let totals = register.totals()?;
    info!(
        subtotal = %totals.subtotal(),
        tax = %totals.tax(),
        cash = %totals.total_cash(),
        card = %totals.total_card(),
        "sale 1 priced"
    );

    spawn_customer_display(display_store.clone(), Money::from_cents(300));

    match register.checkout(CheckoutRequest::card()).await? {
        CheckoutOutcome::Settled(outcome) => {
            let tx = &outcome.transaction;
            info!(
                receipt = %tx.receipt_number,
                total = %tx.total(),
                tip = %Money::from_cents(tx.tip_cents),
                "sale 1 settled on card"
            );
        }
        CheckoutOutcome::TipCancelled => unreachable!("demo display always answers"),
    }

    // ---- Sale 2: split tender, customer declines the tip -----------------
    register
        .add_item(
            &CatalogItem {
                id: "prd-pomade".into(),
                name: "Pomade".into(),
                price_cents: 1500,
            },
            ItemKind::Product,
        )
        .await?;
    register
        .add_item(
            &CatalogItem {
                id: "prd-shampoo".into(),
                name: "Shampoo".into(),
                price_cents: 1200,
            },
            ItemKind::Product,
        )
        .await?;

    spawn_customer_display(display_store.clone(), Money::zero());

    let totals = register.totals()?;
    let due = totals.total_card(); // split validates against the card total
    let cash_half = Money::from_cents(1000);
    let card_half = due - cash_half;

    match register
        .checkout(CheckoutRequest::split(cash_half, card_half, cash_half))
        .await?
    {
        CheckoutOutcome::Settled(outcome) => {
            let tx = &outcome.transaction;
            info!(
                receipt = %tx.receipt_number,
                cash = %tx.cash(),
                card = %Money::from_cents(tx.card_cents),
                change = %outcome.change,
                "sale 2 settled split"
            );
        }
        CheckoutOutcome::TipCancelled => unreachable!("demo display always answers"),
    }

    // ---- Close the drawer ------------------------------------------------
    // Sale 1 was pure card; sale 2 added $10.00 cash on top of the float.
    let closing_count = count_from_cents(float.total().cents() + 1000);
    let report = register.close_shift(&closing_count).await?;

    let recorded = recorder.count().await;
    info!(
        expected = %report.expected(),
        variance = %report.variance(),
        outcome = ?report.outcome,
        recorded = recorded,
        "drawer closed"
    );

    Ok(())
}

/// Builds a denomination count worth exactly `cents` (demo convenience).
fn count_from_cents(cents: i64) -> DenominationCount {
    fn take(remaining: &mut i64, unit: i64) -> u32 {
        let n = (*remaining / unit) as u32;
        *remaining %= unit;
        n
    }

    let mut remaining = cents;
    DenominationCount {
        hundreds: take(&mut remaining, 10_000),
        fifties: take(&mut remaining, 5_000),
        twenties: take(&mut remaining, 2_000),
        tens: take(&mut remaining, 1_000),
        fives: take(&mut remaining, 500),
        ones: take(&mut remaining, 100),
        quarters: take(&mut remaining, 25),
        dimes: take(&mut remaining, 10),
        nickels: take(&mut remaining, 5),
        pennies: take(&mut remaining, 1),
    }
}

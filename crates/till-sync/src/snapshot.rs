//! # Display Snapshot
//!
//! The document the customer display renders. This is a WIRE CONTRACT: the
//! display frontend is generated against these types (ts-rs), and the
//! register and display only ever communicate through them.
//!
//! ## Document Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  DisplayDocument                                                        │
//! │  ├── seq: monotonic sequence number (CAS token, staleness check)       │
//! │  ├── updated_at                                                         │
//! │  └── snapshot: DisplaySnapshot                                          │
//! │       ├── status: IDLE | ACTIVE | AWAITING_TIP | ...                   │
//! │       ├── items[]: name, qty, cash/card line prices                    │
//! │       ├── subtotal / tax / total (+ cash & card totals)                │
//! │       ├── dual_pricing flag, customer_name                             │
//! │       ├── tip_prompt: suggestions published by the register            │
//! │       └── tip_selected / tip_cents: written back BY THE DISPLAY        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The tip fields flow the other way: during `AWAITING_TIP` the display
//! writes a new document with `status = TIP_SELECTED` and the chosen
//! amount, and the register's poll loop picks it up.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use till_core::{
    card_price, CartSnapshot, CheckoutPhase, Money, PricingConfig, PricingModel, Totals,
};

// =============================================================================
// Display Line
// =============================================================================

/// One cart line as the customer sees it.
///
/// Under dual pricing both line prices travel so the display can show the
/// cash/card pair; otherwise they are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DisplayLine {
    pub name: String,
    pub quantity: i64,

    /// Line total at the cash price.
    pub cash_price_cents: i64,

    /// Line total at the card price (equals cash unless dual pricing).
    pub card_price_cents: i64,
}

// =============================================================================
// Tip Prompt Info
// =============================================================================

/// What the display needs to render the tip screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TipPromptInfo {
    /// Concrete suggested amounts, in display order.
    pub suggestion_cents: Vec<i64>,

    /// The pre-tip cash total the tip is added to.
    pub base_total_cents: i64,
}

// =============================================================================
// Display Snapshot
// =============================================================================

/// The full state of the customer display at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySnapshot {
    pub status: CheckoutPhase,

    pub items: Vec<DisplayLine>,

    /// Subtotal after the global discount.
    pub subtotal_cents: i64,
    pub tax_cents: i64,

    /// Headline total (cash-priced).
    pub total_cents: i64,

    /// Cash/card totals for the dual-pricing footer.
    pub cash_total_cents: i64,
    pub card_total_cents: i64,

    /// Whether the display should render the cash/card price pair.
    pub dual_pricing: bool,

    pub customer_name: Option<String>,

    /// Present while the tip screen should be shown.
    pub tip_prompt: Option<TipPromptInfo>,

    /// Set by the DISPLAY when the customer picks a tip (zero included).
    pub tip_selected: bool,

    /// The chosen tip, set by the display alongside `tip_selected`.
    pub tip_cents: Option<i64>,
}

impl DisplaySnapshot {
    /// The welcome screen: empty cart, nothing due.
    pub fn idle() -> Self {
        DisplaySnapshot {
            status: CheckoutPhase::Idle,
            items: Vec::new(),
            subtotal_cents: 0,
            tax_cents: 0,
            total_cents: 0,
            cash_total_cents: 0,
            card_total_cents: 0,
            dual_pricing: false,
            customer_name: None,
            tip_prompt: None,
            tip_selected: false,
            tip_cents: None,
        }
    }

    /// Mirrors a live cart onto the display.
    ///
    /// An empty cart collapses to the idle screen so a cancel/void always
    /// leaves the display in a clean state.
    pub fn from_cart(
        cart: &CartSnapshot,
        totals: &Totals,
        config: &PricingConfig,
        customer_name: Option<String>,
    ) -> Self {
        if cart.is_empty() {
            return DisplaySnapshot::idle();
        }

        let dual_pricing = config.pricing_model == PricingModel::DualPricing;
        let items = cart
            .items
            .iter()
            .map(|line| {
                let cash = line.line_total();
                DisplayLine {
                    name: line.name.clone(),
                    quantity: line.quantity,
                    cash_price_cents: cash.cents(),
                    card_price_cents: card_price(config, cash).cents(),
                }
            })
            .collect();

        DisplaySnapshot {
            status: CheckoutPhase::Active,
            items,
            subtotal_cents: totals.discounted_subtotal().cents(),
            tax_cents: totals.tax_cents,
            total_cents: totals.total_cash_cents,
            cash_total_cents: totals.total_cash_cents,
            card_total_cents: totals.total_card_cents,
            dual_pricing,
            customer_name,
            tip_prompt: None,
            tip_selected: false,
            tip_cents: None,
        }
    }

    /// The tip screen: published when checkout enters `AWAITING_TIP`.
    pub fn awaiting_tip(base: DisplaySnapshot, suggestions: &[Money]) -> Self {
        DisplaySnapshot {
            status: CheckoutPhase::AwaitingTip,
            tip_prompt: Some(TipPromptInfo {
                suggestion_cents: suggestions.iter().map(Money::cents).collect(),
                base_total_cents: base.cash_total_cents,
            }),
            tip_selected: false,
            tip_cents: None,
            ..base
        }
    }

    /// The processing screen while the settlement pipeline runs.
    pub fn settling(base: DisplaySnapshot) -> Self {
        DisplaySnapshot {
            status: CheckoutPhase::Settling,
            tip_prompt: None,
            ..base
        }
    }

    /// The thank-you screen with the amount actually collected.
    pub fn completed(total: Money) -> Self {
        DisplaySnapshot {
            status: CheckoutPhase::Completed,
            total_cents: total.cents(),
            cash_total_cents: total.cents(),
            card_total_cents: total.cents(),
            ..DisplaySnapshot::idle()
        }
    }

    /// Published when the operator abandons the sale, so the display exits
    /// any processing/tip screen before returning to idle.
    pub fn cancelled() -> Self {
        DisplaySnapshot {
            status: CheckoutPhase::Cancelled,
            ..DisplaySnapshot::idle()
        }
    }

    /// What the display itself writes back when the customer picks a tip.
    /// Zero is a valid, explicit choice.
    pub fn tip_chosen(base: DisplaySnapshot, tip: Money) -> Self {
        DisplaySnapshot {
            status: CheckoutPhase::TipSelected,
            tip_selected: true,
            tip_cents: Some(tip.cents()),
            tip_prompt: None,
            ..base
        }
    }
}

// =============================================================================
// Display Document
// =============================================================================

/// A versioned snapshot as stored in the display store.
///
/// `seq` increases by one on every successful write. Writers pass the
/// sequence they last saw (compare-and-set); readers drop any document
/// older than the highest sequence they have rendered. This is what lets a
/// reconnecting display detect stale local state instead of trusting
/// last-write-wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DisplayDocument {
    pub seq: u64,
    pub snapshot: DisplaySnapshot,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use till_core::{
        compute_totals, CardSurcharge, Cart, CatalogItem, ItemKind, Rate,
    };

    fn dual_config() -> PricingConfig {
        PricingConfig {
            tax_rate: Rate::from_bps(800),
            tax_services: true,
            tax_products: true,
            pricing_model: PricingModel::DualPricing,
            card_surcharge: CardSurcharge::Percentage(Rate::from_bps(400)),
        }
    }

    fn sample_cart() -> Cart {
        let mut cart = Cart::new();
        cart.add_item(
            &CatalogItem {
                id: "cut".into(),
                name: "Haircut".into(),
                price_cents: 2000,
            },
            ItemKind::Service,
        )
        .unwrap();
        cart
    }

    #[test]
    fn test_empty_cart_collapses_to_idle() {
        let cart = Cart::new().snapshot();
        let totals = Totals::zero();
        let snap = DisplaySnapshot::from_cart(&cart, &totals, &dual_config(), None);
        assert_eq!(snap, DisplaySnapshot::idle());
    }

    #[test]
    fn test_from_cart_carries_dual_prices() {
        let cart = sample_cart();
        let snapshot = cart.snapshot();
        let config = dual_config();
        let totals = compute_totals(&snapshot, &config, Money::zero()).unwrap();

        let snap = DisplaySnapshot::from_cart(&snapshot, &totals, &config, Some("Ada".into()));
        assert_eq!(snap.status, CheckoutPhase::Active);
        assert!(snap.dual_pricing);
        assert_eq!(snap.customer_name.as_deref(), Some("Ada"));

        let line = &snap.items[0];
        assert_eq!(line.cash_price_cents, 2000);
        // $20.00 + 4% = $20.80
        assert_eq!(line.card_price_cents, 2080);
        assert!(snap.card_total_cents >= snap.cash_total_cents);
    }

    #[test]
    fn test_awaiting_tip_sets_prompt() {
        let cart = sample_cart();
        let snapshot = cart.snapshot();
        let config = dual_config();
        let totals = compute_totals(&snapshot, &config, Money::zero()).unwrap();
        let base = DisplaySnapshot::from_cart(&snapshot, &totals, &config, None);

        let suggestions = vec![Money::from_cents(300), Money::from_cents(400)];
        let snap = DisplaySnapshot::awaiting_tip(base, &suggestions);

        assert_eq!(snap.status, CheckoutPhase::AwaitingTip);
        let prompt = snap.tip_prompt.unwrap();
        assert_eq!(prompt.suggestion_cents, vec![300, 400]);
        assert!(!snap.tip_selected);
    }

    #[test]
    fn test_tip_chosen_zero_is_explicit() {
        let snap = DisplaySnapshot::tip_chosen(DisplaySnapshot::idle(), Money::zero());
        assert_eq!(snap.status, CheckoutPhase::TipSelected);
        assert!(snap.tip_selected);
        assert_eq!(snap.tip_cents, Some(0));
    }

    #[test]
    fn test_wire_format_is_camel_case_screaming_status() {
        let json = serde_json::to_value(DisplaySnapshot::idle()).unwrap();
        assert_eq!(json["status"], "IDLE");
        assert!(json.get("subtotalCents").is_some());
        assert!(json.get("tipSelected").is_some());
    }
}

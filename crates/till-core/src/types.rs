//! # Domain Types
//!
//! Core domain types used throughout Till.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │ PricingConfig   │   │   Transaction   │   │  CardApproval   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  tax_rate       │   │  id (UUID)      │   │  gateway_tx_id  │       │
//! │  │  tax_services   │   │  items snapshot │   │  auth_code      │       │
//! │  │  pricing_model  │   │  totals + tip   │   │  card_last4     │       │
//! │  │  card_surcharge │   │  method/amounts │   │  card_brand     │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │   ItemKind      │   │ PaymentMethod   │   │ CheckoutPhase   │       │
//! │  │  Service        │   │  Cash           │   │  Idle … Settled │       │
//! │  │  Product        │   │  Card / Split   │   │  (see §below)   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! A `Transaction` freezes the line items, totals, and card metadata at the
//! moment of settlement. It is never mutated afterward; refunds and voids
//! are separate records that reference it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, Rate};
use crate::DEFAULT_TAX_RATE_BPS;

// =============================================================================
// Item Kind
// =============================================================================

/// Whether a line item is a service (e.g., a haircut) or a physical product.
///
/// The distinction matters for tax: many jurisdictions tax products but not
/// services, controlled per-business by [`PricingConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    Service,
    Product,
}

// =============================================================================
// Pricing Configuration
// =============================================================================

/// Pricing model for the business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PricingModel {
    /// One price regardless of tender.
    Standard,
    /// Card transactions carry a surcharge; cash gets the listed price.
    DualPricing,
}

impl Default for PricingModel {
    fn default() -> Self {
        PricingModel::Standard
    }
}

/// The card surcharge applied under [`PricingModel::DualPricing`].
///
/// Percentage surcharges are a rate on the cash total; flat surcharges add
/// a fixed amount per transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CardSurcharge {
    Percentage(Rate),
    Flat(Money),
}

impl CardSurcharge {
    /// Applies the surcharge to a cash-priced total.
    pub fn apply(&self, cash_total: Money) -> Money {
        match self {
            CardSurcharge::Percentage(rate) => cash_total + cash_total.apply_rate(*rate),
            CardSurcharge::Flat(amount) => cash_total + *amount,
        }
    }

    /// A surcharge with no effect.
    pub const fn none() -> Self {
        CardSurcharge::Percentage(Rate::from_bps(0))
    }
}

/// Per-business pricing settings.
///
/// Loaded once per register session from the configuration provider and
/// held immutable for the duration of a checkout, so the totals a customer
/// saw cannot drift mid-payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingConfig {
    /// Sales tax rate in basis points.
    pub tax_rate: Rate,

    /// Whether services are taxable.
    pub tax_services: bool,

    /// Whether products are taxable.
    pub tax_products: bool,

    /// Standard or dual pricing.
    pub pricing_model: PricingModel,

    /// Card surcharge (only applied under dual pricing).
    pub card_surcharge: CardSurcharge,
}

impl PricingConfig {
    /// Returns true when `kind` is taxable under this configuration.
    pub fn is_taxable(&self, kind: ItemKind) -> bool {
        match kind {
            ItemKind::Service => self.tax_services,
            ItemKind::Product => self.tax_products,
        }
    }
}

/// The fallback used when the configuration provider is unreachable:
/// products taxed at the default rate, standard pricing, no surcharge.
impl Default for PricingConfig {
    fn default() -> Self {
        PricingConfig {
            tax_rate: Rate::from_bps(DEFAULT_TAX_RATE_BPS),
            tax_services: false,
            tax_products: true,
            pricing_model: PricingModel::Standard,
            card_surcharge: CardSurcharge::none(),
        }
    }
}

// =============================================================================
// Tip Configuration
// =============================================================================

/// How tip suggestions are expressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TipKind {
    /// Suggestions are whole percentages of the discounted subtotal.
    Percent,
    /// Suggestions are whole dollar amounts.
    Dollar,
}

/// Tip prompt settings for the customer display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TipConfig {
    /// Whether the tip step runs at all during checkout.
    pub enabled: bool,

    /// Percent-of-subtotal or flat-dollar suggestions.
    pub kind: TipKind,

    /// Ordered suggestion values (percent points or whole dollars per `kind`).
    pub suggestions: Vec<u32>,
}

impl Default for TipConfig {
    fn default() -> Self {
        TipConfig {
            enabled: true,
            kind: TipKind::Percent,
            suggestions: vec![15, 20, 25],
        }
    }
}

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale was (or will be) tendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Physical cash payment.
    Cash,
    /// Card payment on the external terminal.
    Card,
    /// Part cash, part card.
    Split,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Cash => write!(f, "cash"),
            PaymentMethod::Card => write!(f, "card"),
            PaymentMethod::Split => write!(f, "split"),
        }
    }
}

// =============================================================================
// Checkout Phase
// =============================================================================

/// The checkout lifecycle of a register session.
///
/// ## Transitions
/// ```text
/// Idle ──cart non-empty──► Active ──checkout, tipping on──► AwaitingTip
///   ▲                        │  ▲                               │
///   │                        │  └──────operator skips tip───────┤
///   │     checkout,          │                                  │
///   │     tipping off        ▼                  customer picks  ▼
///   │                     Settling ◄───────────────────── TipSelected
///   │                      │    │
///   │        success       │    │ failure (cart preserved)
///   └──────── Completed ◄──┘    └──► Active
/// ```
///
/// Serialized SCREAMING_SNAKE_CASE because this enum is the wire contract
/// the customer display renders against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckoutPhase {
    /// Nothing rung up; display shows the welcome screen.
    Idle,
    /// Cart has items; display mirrors the cart.
    Active,
    /// Tip prompt published; waiting on the customer display.
    AwaitingTip,
    /// Customer chose a tip (zero counts as an explicit choice).
    TipSelected,
    /// Payment pipeline running; display shows "processing".
    Settling,
    /// Sale recorded; display thanks the customer.
    Completed,
    /// Operator abandoned the sale.
    Cancelled,
}

impl Default for CheckoutPhase {
    fn default() -> Self {
        CheckoutPhase::Idle
    }
}

// =============================================================================
// Catalog Boundary
// =============================================================================

/// The minimal catalog shape the cart needs to ring an item.
///
/// The catalog itself (editing, categories, stock) lives behind the catalog
/// provider; the cart only snapshots these fields at add time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// Catalog identifier (UUID).
    pub id: String,

    /// Display name shown to the operator and on the customer display.
    pub name: String,

    /// List price in cents at the time of lookup.
    pub price_cents: i64,
}

// =============================================================================
// Card Approval
// =============================================================================

/// What the payment terminal returns on a successful charge.
///
/// Kept verbatim on the transaction record: if the recorder submission
/// later fails, this is the only evidence a charge was captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CardApproval {
    /// Gateway-side transaction id.
    pub gateway_tx_id: String,

    /// Issuer authorization code.
    pub auth_code: String,

    /// Last four digits of the card number.
    pub card_last4: String,

    /// Card brand ("visa", "mastercard", ...).
    pub card_brand: String,
}

// =============================================================================
// Transaction
// =============================================================================

/// A line item frozen onto a transaction at settlement time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TransactionItem {
    /// Catalog id of the item sold.
    pub catalog_id: String,

    pub kind: ItemKind,

    /// Name at time of sale (frozen).
    pub name: String,

    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,

    pub quantity: i64,

    /// Line discount in basis points at time of sale.
    pub line_discount_bps: u32,

    /// Line total after the line discount.
    pub line_total_cents: i64,
}

/// An immutable settlement record.
///
/// ## Identity
/// `id` is generated client-side *before* the first recorder submission and
/// reused verbatim on every retry — it is the idempotency key that makes
/// retry-after-persistence-failure safe against double-recording.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Client-generated UUID; doubles as the recorder idempotency key.
    pub id: String,

    /// Human-readable receipt number.
    pub receipt_number: String,

    /// Line items frozen at settlement.
    pub items: Vec<TransactionItem>,

    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub tip_cents: i64,

    /// Grand total actually collected (tender-priced, tip included).
    pub total_cents: i64,

    pub method: PaymentMethod,

    /// Cash portion collected (zero for pure card sales).
    pub cash_cents: i64,

    /// Card portion collected (zero for pure cash sales).
    pub card_cents: i64,

    /// Change returned to the customer.
    pub change_cents: i64,

    /// Terminal approval metadata, present when a card was charged.
    pub card: Option<CardApproval>,

    /// Drawer session the cash portion was attributed to.
    pub shift_id: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Returns the cash portion as Money.
    #[inline]
    pub fn cash(&self) -> Money {
        Money::from_cents(self.cash_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surcharge_percentage() {
        let surcharge = CardSurcharge::Percentage(Rate::from_bps(400));
        // $17.28 + 4% = $17.97
        assert_eq!(surcharge.apply(Money::from_cents(1728)).cents(), 1797);
    }

    #[test]
    fn test_surcharge_flat() {
        let surcharge = CardSurcharge::Flat(Money::from_cents(50));
        assert_eq!(surcharge.apply(Money::from_cents(1728)).cents(), 1778);
    }

    #[test]
    fn test_surcharge_none_is_identity() {
        let total = Money::from_cents(1728);
        assert_eq!(CardSurcharge::none().apply(total), total);
    }

    #[test]
    fn test_default_config_uses_fallback_rate() {
        let config = PricingConfig::default();
        assert_eq!(config.tax_rate.bps(), DEFAULT_TAX_RATE_BPS);
        assert!(config.tax_products);
        assert!(!config.tax_services);
        assert_eq!(config.pricing_model, PricingModel::Standard);
    }

    #[test]
    fn test_is_taxable_per_kind() {
        let config = PricingConfig {
            tax_services: false,
            tax_products: true,
            ..PricingConfig::default()
        };
        assert!(!config.is_taxable(ItemKind::Service));
        assert!(config.is_taxable(ItemKind::Product));
    }

    #[test]
    fn test_checkout_phase_wire_format() {
        let json = serde_json::to_string(&CheckoutPhase::AwaitingTip).unwrap();
        assert_eq!(json, "\"AWAITING_TIP\"");
        let json = serde_json::to_string(&CheckoutPhase::TipSelected).unwrap();
        assert_eq!(json, "\"TIP_SELECTED\"");
    }
}

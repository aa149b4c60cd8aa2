//! # Pricing Calculator
//!
//! Turns a cart snapshot + pricing configuration + tip into a [`Totals`].
//! Pure: identical inputs always produce bit-identical outputs.
//!
//! ## Calculation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Totals Pipeline                                   │
//! │                                                                         │
//! │  1. subtotal            = Σ line_total                                 │
//! │  2. discounted subtotal = max(0, subtotal − global discount)           │
//! │  3. taxable base        = Σ line_total of taxable lines                │
//! │     taxable discount    = discount × taxable base / subtotal           │
//! │     (the discount is spread PROPORTIONALLY so a mixed cart's           │
//! │      discount is not wholly absorbed by one side)                      │
//! │  4. tax                 = max(0, taxable − taxable discount) × rate    │
//! │  5. total_cash          = discounted subtotal + tax                    │
//! │  6. total_card          = surcharge(total_cash)   [dual pricing only] │
//! │  7. with-tip variants:  cash + tip, surcharge(cash + tip)             │
//! │     The surcharge applies ONCE to the tip-inclusive cash total —      │
//! │     never tip-then-surcharge-then-tip.                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Worked Example
//! One $20.00 service with a 10% line discount, $2.00 global discount,
//! 8% tax on services, dual pricing with a 4% surcharge:
//! subtotal $18.00 → discounted $16.00 → tax $1.28 → cash $17.28 →
//! card $17.97.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::CartSnapshot;
use crate::error::ValidationError;
use crate::money::{Money, Rate};
use crate::types::{PricingConfig, PricingModel, TipConfig, TipKind};

// =============================================================================
// Totals
// =============================================================================

/// The derived amounts for one checkout. Never stored; recomputed on every
/// read from the current snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// Sum of line totals, before the global discount.
    pub subtotal_cents: i64,

    /// The global discount as applied (raw amount, not clamped).
    pub discount_cents: i64,

    pub tax_cents: i64,
    pub tip_cents: i64,

    /// Amount due when paying cash (no tip).
    pub total_cash_cents: i64,

    /// Amount due when paying card (no tip); equals cash unless dual pricing.
    pub total_card_cents: i64,

    /// Cash total with the tip added.
    pub total_cash_with_tip_cents: i64,

    /// Card total with the tip added, surcharged once.
    pub total_card_with_tip_cents: i64,
}

impl Totals {
    /// All-zero totals (the empty cart).
    pub const fn zero() -> Self {
        Totals {
            subtotal_cents: 0,
            discount_cents: 0,
            tax_cents: 0,
            tip_cents: 0,
            total_cash_cents: 0,
            total_card_cents: 0,
            total_cash_with_tip_cents: 0,
            total_card_with_tip_cents: 0,
        }
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn tax(&self) -> Money {
        Money::from_cents(self.tax_cents)
    }

    #[inline]
    pub fn tip(&self) -> Money {
        Money::from_cents(self.tip_cents)
    }

    #[inline]
    pub fn total_cash(&self) -> Money {
        Money::from_cents(self.total_cash_cents)
    }

    #[inline]
    pub fn total_card(&self) -> Money {
        Money::from_cents(self.total_card_cents)
    }

    #[inline]
    pub fn total_cash_with_tip(&self) -> Money {
        Money::from_cents(self.total_cash_with_tip_cents)
    }

    #[inline]
    pub fn total_card_with_tip(&self) -> Money {
        Money::from_cents(self.total_card_with_tip_cents)
    }

    /// Subtotal after the global discount (floored at zero).
    pub fn discounted_subtotal(&self) -> Money {
        self.subtotal().sub_to_zero(self.discount())
    }
}

// =============================================================================
// Calculator
// =============================================================================

/// Computes totals for a snapshot under a configuration and tip amount.
///
/// ## Edge Cases
/// - Empty cart → all totals zero, no tax, tip ignored
/// - Global discount larger than the subtotal → clamps to zero effect
/// - Negative unit price, discount, or tip → `InvalidAmount`. Rejecting
///   instead of coercing to zero keeps an upstream bug from silently
///   producing a drawer that doesn't reconcile.
pub fn compute_totals(
    snapshot: &CartSnapshot,
    config: &PricingConfig,
    tip: Money,
) -> Result<Totals, ValidationError> {
    if tip.is_negative() {
        return Err(ValidationError::InvalidAmount {
            field: "tip",
            amount: tip,
        });
    }
    if snapshot.discount_cents < 0 {
        return Err(ValidationError::InvalidAmount {
            field: "global discount",
            amount: snapshot.discount(),
        });
    }
    for line in &snapshot.items {
        if line.unit_price_cents < 0 {
            return Err(ValidationError::InvalidAmount {
                field: "unit price",
                amount: line.unit_price(),
            });
        }
        if line.quantity < 1 {
            return Err(ValidationError::OutOfRange {
                field: "quantity",
                min: 1,
                max: crate::MAX_ITEM_QUANTITY,
            });
        }
    }

    if snapshot.is_empty() {
        return Ok(Totals::zero());
    }

    let subtotal = snapshot.subtotal();
    let discount = snapshot.discount();
    let discounted_subtotal = subtotal.sub_to_zero(discount);

    // Taxable base: only the lines whose kind is taxable under this config,
    // with the global discount allocated proportionally before taxing.
    let taxable_base: Money = snapshot
        .items
        .iter()
        .filter(|l| config.is_taxable(l.kind))
        .map(|l| l.line_total())
        .sum();
    let taxable_discount = discount.allocate(taxable_base, subtotal);
    let tax = taxable_base
        .sub_to_zero(taxable_discount)
        .apply_rate(config.tax_rate);

    let total_cash = discounted_subtotal + tax;
    let total_card = card_price(config, total_cash);

    let total_cash_with_tip = total_cash + tip;
    let total_card_with_tip = card_price(config, total_cash_with_tip);

    Ok(Totals {
        subtotal_cents: subtotal.cents(),
        discount_cents: discount.cents(),
        tax_cents: tax.cents(),
        tip_cents: tip.cents(),
        total_cash_cents: total_cash.cents(),
        total_card_cents: total_card.cents(),
        total_cash_with_tip_cents: total_cash_with_tip.cents(),
        total_card_with_tip_cents: total_card_with_tip.cents(),
    })
}

/// Card price for a cash-priced amount: surcharged under dual pricing,
/// identical otherwise.
pub fn card_price(config: &PricingConfig, cash_amount: Money) -> Money {
    match config.pricing_model {
        PricingModel::Standard => cash_amount,
        PricingModel::DualPricing => config.card_surcharge.apply(cash_amount),
    }
}

// =============================================================================
// Tip Suggestions
// =============================================================================

/// Resolves the configured tip suggestions into concrete amounts for the
/// customer display.
///
/// Percent suggestions are taken against the discounted subtotal (tipping
/// on tax would inflate the suggestion); dollar suggestions pass through.
pub fn tip_suggestions(totals: &Totals, config: &TipConfig) -> Vec<Money> {
    let base = totals.discounted_subtotal();
    config
        .suggestions
        .iter()
        .map(|&value| match config.kind {
            TipKind::Percent => base.apply_rate(Rate::from_percent(value)),
            TipKind::Dollar => Money::from_cents(value as i64 * 100),
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

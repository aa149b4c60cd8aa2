//! # Cart Module
//!
//! The in-memory cart: an ordered collection of line items plus one global
//! discount, mutated only through the operations below.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Cart Operations                                   │
//! │                                                                         │
//! │  Operator Action          Operation               Effect                │
//! │  ───────────────          ─────────               ──────                │
//! │  Tap catalog tile ──────► add_item() ───────────► merge or append      │
//! │  Change quantity ───────► set_quantity() ───────► clamp to >= 1        │
//! │  Line discount % ───────► apply_line_discount() ► per-line bps         │
//! │  Coupon/loyalty ────────► apply_global_discount() global amount        │
//! │  Remove row ────────────► remove_item() ────────► drop by index        │
//! │  Void sale ─────────────► clear() ──────────────► empty cart           │
//! │                                                                         │
//! │  Every mutation bumps `revision` and the next snapshot() reflects it.  │
//! │  The snapshot is what the calculator and the display channel consume.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Index Errors Are Programmer Errors
//! The index-based operations panic on an out-of-range index. A UI can only
//! produce indices it was just handed in a snapshot; anything else is a bug
//! in the caller, not a recoverable runtime condition.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{CatalogItem, ItemKind};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Line Item
// =============================================================================

/// A line in the cart.
///
/// ## Price Freezing
/// `unit_price_cents` is captured when the item is added. If the catalog
/// price changes afterward, this line keeps the price the customer saw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
    /// Catalog id (lines with the same id merge on add).
    pub id: String,

    pub kind: ItemKind,

    /// Name at time of adding (frozen).
    pub name: String,

    /// Price in cents at time of adding (frozen).
    pub unit_price_cents: i64,

    /// Quantity, always >= 1. Removal is an explicit separate operation.
    pub quantity: i64,

    /// Per-line discount in basis points (0..=10000).
    pub line_discount_bps: u32,
}

impl LineItem {
    /// Creates a line from a catalog item with quantity 1.
    fn from_catalog(item: &CatalogItem, kind: ItemKind) -> Self {
        LineItem {
            id: item.id.clone(),
            kind,
            name: item.name.clone(),
            unit_price_cents: item.price_cents,
            quantity: 1,
            line_discount_bps: 0,
        }
    }

    /// Returns the unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// Line total: `unit_price × quantity × (1 − discount)`.
    pub fn line_total(&self) -> Money {
        self.unit_price()
            .multiply_quantity(self.quantity)
            .discount_bps(self.line_discount_bps)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The cart for one register session.
///
/// ## Invariants
/// - Items keep insertion order (display-relevant)
/// - Lines are unique by catalog id (adding the same item merges quantity)
/// - Quantity is always >= 1 (set_quantity clamps; removal is explicit)
/// - `discount_cents >= 0`; a discount larger than the subtotal clamps to
///   zero effect at calculation time, never here
#[derive(Debug, Clone, Default)]
pub struct Cart {
    items: Vec<LineItem>,
    discount_cents: i64,
    discount_source: Option<String>,
    revision: u64,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart::default()
    }

    /// Adds a catalog item, merging quantity if the id is already rung.
    pub fn add_item(&mut self, item: &CatalogItem, kind: ItemKind) -> CoreResult<()> {
        if item.price_cents < 0 {
            return Err(ValidationError::InvalidAmount {
                field: "unit price",
                amount: Money::from_cents(item.price_cents),
            }
            .into());
        }

        if let Some(line) = self.items.iter_mut().find(|l| l.id == item.id) {
            let new_qty = line.quantity + 1;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            line.quantity = new_qty;
            self.revision += 1;
            return Ok(());
        }

        if self.items.len() >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            });
        }

        self.items.push(LineItem::from_catalog(item, kind));
        self.revision += 1;
        Ok(())
    }

    /// Removes the line at `index` and returns it.
    ///
    /// # Panics
    /// Panics if `index` is out of range (programmer error).
    pub fn remove_item(&mut self, index: usize) -> LineItem {
        let line = self.items.remove(index);
        self.revision += 1;
        line
    }

    /// Sets the quantity of the line at `index`, clamped into
    /// `1..=MAX_ITEM_QUANTITY`.
    ///
    /// Zero and negative inputs clamp to 1: dropping a line is an explicit
    /// `remove_item`, never a side effect of a quantity edit.
    ///
    /// # Panics
    /// Panics if `index` is out of range (programmer error).
    pub fn set_quantity(&mut self, index: usize, quantity: i64) {
        let line = &mut self.items[index];
        line.quantity = quantity.clamp(1, MAX_ITEM_QUANTITY);
        self.revision += 1;
    }

    /// Applies a percentage discount (0..=100) to the line at `index`.
    ///
    /// # Panics
    /// Panics if `index` is out of range (programmer error).
    pub fn apply_line_discount(&mut self, index: usize, percent: u32) -> CoreResult<()> {
        if percent > 100 {
            return Err(ValidationError::OutOfRange {
                field: "line discount percent",
                min: 0,
                max: 100,
            }
            .into());
        }
        self.items[index].line_discount_bps = percent * 100;
        self.revision += 1;
        Ok(())
    }

    /// Applies a global discount amount from an external source (coupon,
    /// loyalty, manager override). Replaces any previous global discount.
    pub fn apply_global_discount(
        &mut self,
        amount: Money,
        source: impl Into<String>,
    ) -> CoreResult<()> {
        if amount.is_negative() {
            return Err(ValidationError::InvalidAmount {
                field: "global discount",
                amount,
            }
            .into());
        }
        self.discount_cents = amount.cents();
        self.discount_source = Some(source.into());
        self.revision += 1;
        Ok(())
    }

    /// Clears all items and the global discount.
    pub fn clear(&mut self) {
        self.items.clear();
        self.discount_cents = 0;
        self.discount_source = None;
        self.revision += 1;
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of unique lines.
    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Sum of line totals (before the global discount).
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(|l| l.line_total()).sum()
    }

    /// Current global discount amount.
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    /// Produces an immutable snapshot for the calculator and display sync.
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
            discount_cents: self.discount_cents,
            discount_source: self.discount_source.clone(),
            revision: self.revision,
        }
    }
}

// =============================================================================
// Cart Snapshot
// =============================================================================

/// An immutable copy of the cart produced by every mutation.
///
/// The calculator computes totals from a snapshot (never the live cart),
/// and the settlement pipeline freezes the snapshot it validated onto the
/// transaction record — so what was priced is exactly what was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub items: Vec<LineItem>,

    /// Global discount in cents.
    pub discount_cents: i64,

    /// Where the global discount came from (coupon code, loyalty, ...).
    pub discount_source: Option<String>,

    /// Monotonic mutation counter, used to tell snapshots apart.
    pub revision: u64,
}

impl CartSnapshot {
    /// Sum of line totals (before the global discount).
    pub fn subtotal(&self) -> Money {
        self.items.iter().map(|l| l.line_total()).sum()
    }

    /// Global discount amount.
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    /// Checks if the snapshot has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// An empty snapshot (the cleared-cart payload).
    pub fn empty() -> Self {
        CartSnapshot {
            items: Vec::new(),
            discount_cents: 0,
            discount_source: None,
            revision: 0,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

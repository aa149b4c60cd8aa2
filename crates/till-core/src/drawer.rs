//! # Cash Drawer Session
//!
//! The lifecycle math of one cash drawer: open with a counted float,
//! accumulate cash sales (and drops to the safe), close with a counted
//! drawer and a frozen variance report.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Drawer Session Lifecycle                          │
//! │                                                                         │
//! │  open(float count)                                                      │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  ┌──────────┐   record_cash_sale(amount)  ── every settled cash sale   │
//! │  │   OPEN   │   record_drop(amount)       ── cash moved to the safe    │
//! │  └────┬─────┘                                                           │
//! │       │ close(closing count)                                            │
//! │       ▼                                                                 │
//! │  ┌──────────┐   expected = float + cash sales − drops                  │
//! │  │  CLOSED  │   variance = counted − expected                          │
//! │  └──────────┘   outcome  = SHORT | OVER | BALANCED                     │
//! │                                                                         │
//! │  The report is built ONCE at close and the session's figures freeze.   │
//! │  Whatever was printed for the employee stays true even if a stray      │
//! │  sale is later (erroneously) attributed to the same session id.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Anti-Theft Note
//! The expected amount is exposed only on the final report, never while the
//! employee is counting. Showing the target mid-count would let a short
//! drawer be "counted" to match. That policy lives in the UI layer; this
//! type simply has no accessor for the expected amount on an open session.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::denominations::DenominationCount;
use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;

// =============================================================================
// Status & Variance Outcome
// =============================================================================

/// Whether a drawer session is still accepting sales.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShiftStatus {
    Open,
    Closed,
}

/// Classification of the closing variance.
///
/// Exact in integer cents: any shortfall is SHORT, any excess is OVER, only
/// a to-the-penny match is BALANCED.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VarianceOutcome {
    Short,
    Over,
    Balanced,
}

impl VarianceOutcome {
    /// Classifies a counted-minus-expected variance.
    pub fn classify(variance: Money) -> Self {
        if variance.is_negative() {
            VarianceOutcome::Short
        } else if variance.is_positive() {
            VarianceOutcome::Over
        } else {
            VarianceOutcome::Balanced
        }
    }
}

// =============================================================================
// Drawer Session
// =============================================================================

/// One cash drawer session (a "shift"), owned by exactly one employee.
///
/// Pure data + math: id generation, clock reads, and persistence live in
/// the engine's shift manager. At most one OPEN session exists per register
/// (enforced by the shift store's open precondition).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DrawerSession {
    /// Session id (UUID).
    pub id: String,

    pub employee_id: String,

    /// Register this drawer belongs to.
    pub register_id: String,

    /// Counted float at open.
    pub starting_cash_cents: i64,

    /// Cash sales accumulated since open. Only ever incremented by settled
    /// cash (or cash-portion-of-split) sales.
    pub cash_sales_cents: i64,

    /// Cash moved out of the drawer to the safe since open.
    pub drops_cents: i64,

    pub status: ShiftStatus,

    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,

    #[ts(as = "Option<String>")]
    pub closed_at: Option<DateTime<Utc>>,
}

impl DrawerSession {
    /// Builds a freshly opened session from a verified float count.
    ///
    /// Rejects an empty count: a zero float almost always means the count
    /// was skipped, which would make the closing variance meaningless.
    pub fn open(
        id: impl Into<String>,
        employee_id: impl Into<String>,
        register_id: impl Into<String>,
        float: &DenominationCount,
        opened_at: DateTime<Utc>,
    ) -> CoreResult<Self> {
        if float.is_empty() {
            return Err(CoreError::EmptyFloat);
        }
        Ok(DrawerSession {
            id: id.into(),
            employee_id: employee_id.into(),
            register_id: register_id.into(),
            starting_cash_cents: float.total().cents(),
            cash_sales_cents: 0,
            drops_cents: 0,
            status: ShiftStatus::Open,
            opened_at,
            closed_at: None,
        })
    }

    /// Adds a settled cash amount to the running counter.
    pub fn record_cash_sale(&mut self, amount: Money) -> CoreResult<()> {
        self.ensure_open()?;
        if !amount.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "cash sale amount",
            }
            .into());
        }
        self.cash_sales_cents += amount.cents();
        Ok(())
    }

    /// Records cash moved from the drawer to the safe.
    pub fn record_drop(&mut self, amount: Money) -> CoreResult<()> {
        self.ensure_open()?;
        if !amount.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "drop amount",
            }
            .into());
        }
        self.drops_cents += amount.cents();
        Ok(())
    }

    /// Closes the session against a closing count, freezing the report.
    ///
    /// Consumes the open session and returns the closed session plus the
    /// one-and-only [`ShiftReport`]. The expected amount becomes visible
    /// here for the first time.
    pub fn close(
        mut self,
        counted: &DenominationCount,
        closed_at: DateTime<Utc>,
    ) -> CoreResult<(Self, ShiftReport)> {
        self.ensure_open()?;

        let expected = self.expected_cash();
        let counted_total = counted.total();
        let variance = counted_total - expected;

        self.status = ShiftStatus::Closed;
        self.closed_at = Some(closed_at);

        let report = ShiftReport {
            shift_id: self.id.clone(),
            employee_id: self.employee_id.clone(),
            starting_cash_cents: self.starting_cash_cents,
            cash_sales_cents: self.cash_sales_cents,
            drops_cents: self.drops_cents,
            expected_cents: expected.cents(),
            counted_cents: counted_total.cents(),
            variance_cents: variance.cents(),
            outcome: VarianceOutcome::classify(variance),
            opened_at: self.opened_at,
            closed_at,
        };

        Ok((self, report))
    }

    /// Checks if the session is still open.
    pub fn is_open(&self) -> bool {
        self.status == ShiftStatus::Open
    }

    fn ensure_open(&self) -> CoreResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(CoreError::ShiftClosed(self.id.clone()))
        }
    }

    /// What the drawer should hold right now. Private on purpose — see the
    /// anti-theft note in the module docs.
    fn expected_cash(&self) -> Money {
        Money::from_cents(self.starting_cash_cents + self.cash_sales_cents - self.drops_cents)
    }
}

// =============================================================================
// Shift Report
// =============================================================================

/// The immutable close-of-shift report.
///
/// Generated exactly once, at close, from the session's frozen figures.
/// It is deliberately not recomputable: the printed report and this record
/// must agree forever.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ShiftReport {
    pub shift_id: String,
    pub employee_id: String,
    pub starting_cash_cents: i64,
    pub cash_sales_cents: i64,
    pub drops_cents: i64,
    pub expected_cents: i64,
    pub counted_cents: i64,
    pub variance_cents: i64,
    pub outcome: VarianceOutcome,
    #[ts(as = "String")]
    pub opened_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub closed_at: DateTime<Utc>,
}

impl ShiftReport {
    #[inline]
    pub fn variance(&self) -> Money {
        Money::from_cents(self.variance_cents)
    }

    #[inline]
    pub fn expected(&self) -> Money {
        Money::from_cents(self.expected_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

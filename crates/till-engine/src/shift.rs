//! # Shift Manager
//!
//! Owns the lifecycle of a register's cash drawer against the shift store.
//! Sessions are EXPLICIT handles: the manager hands out a session id at
//! open, settlement passes it back with each cash sale, close consumes it.
//! No ambient "current shift" global - tests run multiple registers side
//! by side without stepping on each other.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  open(employee, float count)                                            │
//! │    ├── rejects a zero count                                             │
//! │    └── atomic against the store: one OPEN session per register          │
//! │                                                                         │
//! │  record_cash_sale(session, amount)   called by settlement per cash sale │
//! │  record_drop(session, amount)        cash moved to the safe             │
//! │                                                                         │
//! │  close(session, closing count)                                          │
//! │    └── expected/variance computed and FROZEN into the report; the      │
//! │        expected figure is first revealed here, after the count         │
//! │        (the anti-theft policy - see till-core::drawer)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use till_core::{DenominationCount, DrawerSession, Money, ShiftReport};

use crate::error::{EngineResult, ShiftStoreError};

// =============================================================================
// Shift Store Trait
// =============================================================================

/// Persistence seam for drawer sessions.
#[async_trait]
pub trait ShiftStore: Send + Sync {
    /// Persists a newly opened session, atomically failing with
    /// [`ShiftStoreError::AlreadyOpen`] when the register already has an
    /// open one. The atomicity lives HERE (compare-and-swap or a
    /// transaction in real backends), not in caller-side locking.
    async fn create_open(&self, session: &DrawerSession) -> Result<(), ShiftStoreError>;

    /// Loads a session by id.
    async fn load(&self, session_id: &str) -> Result<DrawerSession, ShiftStoreError>;

    /// Persists updated counters or the closed state.
    async fn update(&self, session: &DrawerSession) -> Result<(), ShiftStoreError>;
}

// =============================================================================
// In-Memory Shift Store
// =============================================================================

/// Reference store; the single write lock makes `create_open` atomic.
#[derive(Debug, Default)]
pub struct MemoryShiftStore {
    sessions: RwLock<HashMap<String, DrawerSession>>,
}

impl MemoryShiftStore {
    pub fn new() -> Self {
        MemoryShiftStore::default()
    }
}

#[async_trait]
impl ShiftStore for MemoryShiftStore {
    async fn create_open(&self, session: &DrawerSession) -> Result<(), ShiftStoreError> {
        let mut sessions = self.sessions.write().await;
        let register_busy = sessions
            .values()
            .any(|s| s.register_id == session.register_id && s.is_open());
        if register_busy {
            return Err(ShiftStoreError::AlreadyOpen(session.register_id.clone()));
        }
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<DrawerSession, ShiftStoreError> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| ShiftStoreError::NotFound(session_id.to_string()))
    }

    async fn update(&self, session: &DrawerSession) -> Result<(), ShiftStoreError> {
        let mut sessions = self.sessions.write().await;
        if !sessions.contains_key(&session.id) {
            return Err(ShiftStoreError::NotFound(session.id.clone()));
        }
        sessions.insert(session.id.clone(), session.clone());
        Ok(())
    }
}

// =============================================================================
// Shift Manager
// =============================================================================

/// Drawer-session manager for one register.
#[derive(Clone)]
pub struct ShiftManager {
    store: Arc<dyn ShiftStore>,
    register_id: String,
}

impl ShiftManager {
    pub fn new(store: Arc<dyn ShiftStore>, register_id: impl Into<String>) -> Self {
        ShiftManager {
            store,
            register_id: register_id.into(),
        }
    }

    /// Opens a drawer session from a verified float count.
    pub async fn open(
        &self,
        employee_id: &str,
        float: &DenominationCount,
    ) -> EngineResult<DrawerSession> {
        let session = DrawerSession::open(
            Uuid::new_v4().to_string(),
            employee_id,
            self.register_id.clone(),
            float,
            Utc::now(),
        )?;
        self.store.create_open(&session).await?;

        info!(
            shift_id = %session.id,
            register = %self.register_id,
            employee = %employee_id,
            float = %float.total(),
            "shift opened"
        );
        Ok(session)
    }

    /// Adds a settled cash amount to the session's running counter.
    pub async fn record_cash_sale(&self, session_id: &str, amount: Money) -> EngineResult<()> {
        let mut session = self.store.load(session_id).await?;
        session.record_cash_sale(amount)?;
        self.store.update(&session).await?;

        info!(
            shift_id = %session_id,
            amount = %amount,
            running_total = %Money::from_cents(session.cash_sales_cents),
            "cash sale recorded on shift"
        );
        Ok(())
    }

    /// Records cash moved from the drawer to the safe.
    pub async fn record_drop(&self, session_id: &str, amount: Money) -> EngineResult<()> {
        let mut session = self.store.load(session_id).await?;
        session.record_drop(amount)?;
        self.store.update(&session).await?;

        info!(shift_id = %session_id, amount = %amount, "cash drop recorded");
        Ok(())
    }

    /// Closes the session against a closing count and returns the frozen
    /// report.
    pub async fn close(
        &self,
        session_id: &str,
        counted: &DenominationCount,
    ) -> EngineResult<ShiftReport> {
        let session = self.store.load(session_id).await?;
        let (closed, report) = session.close(counted, Utc::now())?;
        self.store.update(&closed).await?;

        info!(
            shift_id = %session_id,
            expected = %report.expected(),
            counted = %counted.total(),
            variance = %report.variance(),
            outcome = ?report.outcome,
            "shift closed"
        );
        Ok(report)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use till_core::VarianceOutcome;

    fn float_of(ones: u32) -> DenominationCount {
        DenominationCount {
            ones,
            ..DenominationCount::empty()
        }
    }

    fn manager() -> ShiftManager {
        ShiftManager::new(Arc::new(MemoryShiftStore::new()), "reg-1")
    }

    #[tokio::test]
    async fn test_open_rejects_second_open_on_same_register() {
        let manager = manager();
        manager.open("emp-1", &float_of(100)).await.unwrap();

        let err = manager.open("emp-2", &float_of(100)).await.unwrap_err();
        assert!(matches!(err, EngineError::ShiftAlreadyOpen(_)));
    }

    #[tokio::test]
    async fn test_open_rejects_zero_float() {
        let err = manager()
            .open("emp-1", &DenominationCount::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Core(_)));
    }

    #[tokio::test]
    async fn test_two_registers_do_not_interfere() {
        let store = Arc::new(MemoryShiftStore::new());
        let reg_a = ShiftManager::new(store.clone(), "reg-a");
        let reg_b = ShiftManager::new(store.clone(), "reg-b");

        let a = reg_a.open("emp-1", &float_of(100)).await.unwrap();
        let b = reg_b.open("emp-2", &float_of(50)).await.unwrap();

        reg_a
            .record_cash_sale(&a.id, Money::from_cents(1000))
            .await
            .unwrap();

        // Register B's drawer is untouched by A's sale
        let report_b = reg_b.close(&b.id, &float_of(50)).await.unwrap();
        assert_eq!(report_b.cash_sales_cents, 0);
        assert_eq!(report_b.outcome, VarianceOutcome::Balanced);
    }

    #[tokio::test]
    async fn test_full_lifecycle_with_sales_and_drop() {
        let manager = manager();
        let session = manager.open("emp-1", &float_of(100)).await.unwrap();

        manager
            .record_cash_sale(&session.id, Money::from_cents(2500))
            .await
            .unwrap();
        manager
            .record_cash_sale(&session.id, Money::from_cents(1500))
            .await
            .unwrap();
        manager
            .record_drop(&session.id, Money::from_cents(2000))
            .await
            .unwrap();

        // expected = 10000 + 4000 − 2000 = 12000; count $119.00 → short $1
        let report = manager.close(&session.id, &float_of(119)).await.unwrap();
        assert_eq!(report.expected_cents, 12_000);
        assert_eq!(report.variance_cents, -100);
        assert_eq!(report.outcome, VarianceOutcome::Short);

        // A new shift can open on the register once the old one is closed
        assert!(manager.open("emp-1", &float_of(80)).await.is_ok());
    }

    #[tokio::test]
    async fn test_operations_on_unknown_session_fail() {
        let manager = manager();
        assert!(matches!(
            manager
                .record_cash_sale("nope", Money::from_cents(100))
                .await
                .unwrap_err(),
            EngineError::ShiftNotFound(_)
        ));
        assert!(manager.close("nope", &float_of(1)).await.is_err());
    }
}

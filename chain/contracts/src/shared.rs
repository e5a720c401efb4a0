//! Shared delegate handle
//!
//! The delegate is a single authoritative ledger; concurrent services reach
//! it through one `RwLock`. Writers serialize, readers run in parallel, and
//! a poisoned lock is recovered rather than propagated since the ledger's
//! invariants hold after every public method returns.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::delegate::TradeDelegate;

/// Cloneable handle to one delegate instance.
#[derive(Debug, Clone)]
pub struct SharedDelegate {
    inner: Arc<RwLock<TradeDelegate>>,
}

impl SharedDelegate {
    pub fn new(delegate: TradeDelegate) -> Self {
        Self {
            inner: Arc::new(RwLock::new(delegate)),
        }
    }

    pub fn read(&self) -> RwLockReadGuard<'_, TradeDelegate> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn write(&self) -> RwLockWriteGuard<'_, TradeDelegate> {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

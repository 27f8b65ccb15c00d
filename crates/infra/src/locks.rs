//! Per-key serialization of stock writers.
//!
//! Every mutating operation runs while holding the exclusive lock for the
//! (tenant, product, warehouse) key it touches, the in-process equivalent of
//! `SELECT ... FOR UPDATE` on the stock row. Transfers hold both keys,
//! acquired in a fixed order so opposite-direction transfers cannot deadlock.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use orderdesk_core::{InventoryError, InventoryResult, ProductId, TenantId, WarehouseId};

/// Identity of one lockable stock row.
pub type StockKey = (TenantId, ProductId, WarehouseId);

#[derive(Debug, Default)]
pub struct StockLockManager {
    locks: Mutex<HashMap<StockKey, Arc<Mutex<()>>>>,
}

impl StockLockManager {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, key: StockKey) -> InventoryResult<Arc<Mutex<()>>> {
        let mut locks = self
            .locks
            .lock()
            .map_err(|_| InventoryError::concurrency("stock lock table poisoned"))?;
        Ok(locks.entry(key).or_default().clone())
    }

    /// Run `f` while holding the exclusive lock for `key`.
    pub fn with_lock<T>(
        &self,
        key: StockKey,
        f: impl FnOnce() -> InventoryResult<T>,
    ) -> InventoryResult<T> {
        let handle = self.handle(key)?;
        let _guard = handle
            .lock()
            .map_err(|_| InventoryError::concurrency("stock row lock poisoned"))?;
        f()
    }

    /// Run `f` while holding both keys' locks.
    ///
    /// Acquisition order is fixed (ascending warehouse id) regardless of which
    /// key is source and which is destination.
    pub fn with_pair<T>(
        &self,
        a: StockKey,
        b: StockKey,
        f: impl FnOnce() -> InventoryResult<T>,
    ) -> InventoryResult<T> {
        if a == b {
            return self.with_lock(a, f);
        }

        let (first, second) = if a <= b { (a, b) } else { (b, a) };
        let first_handle = self.handle(first)?;
        let second_handle = self.handle(second)?;

        let _first_guard = first_handle
            .lock()
            .map_err(|_| InventoryError::concurrency("stock row lock poisoned"))?;
        let _second_guard = second_handle
            .lock()
            .map_err(|_| InventoryError::concurrency("stock row lock poisoned"))?;
        f()
    }
}

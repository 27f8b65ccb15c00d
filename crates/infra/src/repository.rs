//! Repository traits and tenant-isolated in-memory implementations.
//!
//! Reads degrade to empty results on a poisoned lock; writes surface
//! `ConcurrencyConflict` so callers can decide (the ledger treats a failed
//! alert write as best-effort, a failed stock write as fatal).

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use orderdesk_core::{
    AlertId, InventoryError, InventoryResult, ProductId, TenantId, WarehouseId,
};
use orderdesk_inventory::{AlertType, InventoryMovement, StockAlert, StockItem, Warehouse};

/// Warehouse records, with per-tenant code uniqueness and the
/// exactly-one-default invariant enforced under a single write lock.
pub trait WarehouseStore: Send + Sync {
    fn get(&self, tenant_id: TenantId, id: WarehouseId) -> Option<Warehouse>;
    fn find_by_code(&self, tenant_id: TenantId, code: &str) -> Option<Warehouse>;
    fn default_for(&self, tenant_id: TenantId) -> Option<Warehouse>;
    fn list(&self, tenant_id: TenantId) -> Vec<Warehouse>;
    /// Insert a new warehouse; if it is flagged default, the previous default
    /// is unset in the same critical section.
    fn insert(&self, warehouse: Warehouse) -> InventoryResult<Warehouse>;
    /// Atomically move the default flag to `id`.
    fn set_default(&self, tenant_id: TenantId, id: WarehouseId) -> InventoryResult<Warehouse>;
}

/// Materialized stock state per (tenant, product, warehouse).
pub trait StockItemStore: Send + Sync {
    fn get(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Option<StockItem>;
    fn upsert(&self, item: StockItem) -> InventoryResult<()>;
    fn list(&self, tenant_id: TenantId) -> Vec<StockItem>;
}

/// Append-only movement ledger. Rows are never updated or deleted.
pub trait MovementStore: Send + Sync {
    fn append(&self, movement: InventoryMovement) -> InventoryResult<()>;
    fn list(&self, tenant_id: TenantId) -> Vec<InventoryMovement>;
}

/// Stock alerts, queried by their loose (product, warehouse, type) key.
pub trait AlertStore: Send + Sync {
    fn unresolved(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        alert_type: AlertType,
    ) -> Option<StockAlert>;
    /// Insert a raised alert. At most one unresolved alert exists per
    /// (tenant, product, warehouse, alert_type); inserting a second unresolved
    /// alert for a key that already has one is a no-op, so concurrent raisers
    /// cannot duplicate it.
    fn insert(&self, alert: StockAlert) -> InventoryResult<()>;
    fn update(&self, alert: StockAlert) -> InventoryResult<()>;
    fn list_unresolved(&self, tenant_id: TenantId) -> Vec<StockAlert>;
}

impl<S> WarehouseStore for Arc<S>
where
    S: WarehouseStore + ?Sized,
{
    fn get(&self, tenant_id: TenantId, id: WarehouseId) -> Option<Warehouse> {
        (**self).get(tenant_id, id)
    }

    fn find_by_code(&self, tenant_id: TenantId, code: &str) -> Option<Warehouse> {
        (**self).find_by_code(tenant_id, code)
    }

    fn default_for(&self, tenant_id: TenantId) -> Option<Warehouse> {
        (**self).default_for(tenant_id)
    }

    fn list(&self, tenant_id: TenantId) -> Vec<Warehouse> {
        (**self).list(tenant_id)
    }

    fn insert(&self, warehouse: Warehouse) -> InventoryResult<Warehouse> {
        (**self).insert(warehouse)
    }

    fn set_default(&self, tenant_id: TenantId, id: WarehouseId) -> InventoryResult<Warehouse> {
        (**self).set_default(tenant_id, id)
    }
}

impl<S> StockItemStore for Arc<S>
where
    S: StockItemStore + ?Sized,
{
    fn get(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Option<StockItem> {
        (**self).get(tenant_id, product_id, warehouse_id)
    }

    fn upsert(&self, item: StockItem) -> InventoryResult<()> {
        (**self).upsert(item)
    }

    fn list(&self, tenant_id: TenantId) -> Vec<StockItem> {
        (**self).list(tenant_id)
    }
}

impl<S> MovementStore for Arc<S>
where
    S: MovementStore + ?Sized,
{
    fn append(&self, movement: InventoryMovement) -> InventoryResult<()> {
        (**self).append(movement)
    }

    fn list(&self, tenant_id: TenantId) -> Vec<InventoryMovement> {
        (**self).list(tenant_id)
    }
}

impl<S> AlertStore for Arc<S>
where
    S: AlertStore + ?Sized,
{
    fn unresolved(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        alert_type: AlertType,
    ) -> Option<StockAlert> {
        (**self).unresolved(tenant_id, product_id, warehouse_id, alert_type)
    }

    fn insert(&self, alert: StockAlert) -> InventoryResult<()> {
        (**self).insert(alert)
    }

    fn update(&self, alert: StockAlert) -> InventoryResult<()> {
        (**self).update(alert)
    }

    fn list_unresolved(&self, tenant_id: TenantId) -> Vec<StockAlert> {
        (**self).list_unresolved(tenant_id)
    }
}

/// In-memory warehouse store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryWarehouseStore {
    inner: RwLock<HashMap<(TenantId, WarehouseId), Warehouse>>,
}

impl InMemoryWarehouseStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WarehouseStore for InMemoryWarehouseStore {
    fn get(&self, tenant_id: TenantId, id: WarehouseId) -> Option<Warehouse> {
        let map = self.inner.read().ok()?;
        map.get(&(tenant_id, id)).cloned()
    }

    fn find_by_code(&self, tenant_id: TenantId, code: &str) -> Option<Warehouse> {
        let map = self.inner.read().ok()?;
        map.values()
            .find(|w| w.tenant_id == tenant_id && w.code == code)
            .cloned()
    }

    fn default_for(&self, tenant_id: TenantId) -> Option<Warehouse> {
        let map = self.inner.read().ok()?;
        map.values()
            .find(|w| w.tenant_id == tenant_id && w.is_default)
            .cloned()
    }

    fn list(&self, tenant_id: TenantId) -> Vec<Warehouse> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        let mut warehouses: Vec<_> = map
            .values()
            .filter(|w| w.tenant_id == tenant_id)
            .cloned()
            .collect();
        warehouses.sort_by(|a, b| a.id.cmp(&b.id));
        warehouses
    }

    fn insert(&self, warehouse: Warehouse) -> InventoryResult<Warehouse> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| InventoryError::concurrency("warehouse store lock poisoned"))?;

        let duplicate = map
            .values()
            .any(|w| w.tenant_id == warehouse.tenant_id && w.code == warehouse.code);
        if duplicate {
            return Err(InventoryError::conflict(format!(
                "warehouse code '{}' already exists for this tenant",
                warehouse.code
            )));
        }

        if warehouse.is_default {
            for existing in map.values_mut() {
                if existing.tenant_id == warehouse.tenant_id {
                    existing.is_default = false;
                }
            }
        }

        map.insert((warehouse.tenant_id, warehouse.id), warehouse.clone());
        Ok(warehouse)
    }

    fn set_default(&self, tenant_id: TenantId, id: WarehouseId) -> InventoryResult<Warehouse> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| InventoryError::concurrency("warehouse store lock poisoned"))?;

        if !map.contains_key(&(tenant_id, id)) {
            return Err(InventoryError::not_found(format!(
                "warehouse {id} for this tenant"
            )));
        }

        for ((t, _), warehouse) in map.iter_mut() {
            if *t == tenant_id {
                warehouse.is_default = warehouse.id == id;
            }
        }

        map.get(&(tenant_id, id))
            .cloned()
            .ok_or_else(|| InventoryError::not_found(format!("warehouse {id}")))
    }
}

/// In-memory stock state store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryStockItemStore {
    inner: RwLock<HashMap<(TenantId, ProductId, WarehouseId), StockItem>>,
}

impl InMemoryStockItemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StockItemStore for InMemoryStockItemStore {
    fn get(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Option<StockItem> {
        let map = self.inner.read().ok()?;
        map.get(&(tenant_id, product_id, warehouse_id)).cloned()
    }

    fn upsert(&self, item: StockItem) -> InventoryResult<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| InventoryError::concurrency("stock item store lock poisoned"))?;
        map.insert((item.tenant_id, item.product_id, item.warehouse_id), item);
        Ok(())
    }

    fn list(&self, tenant_id: TenantId) -> Vec<StockItem> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        let mut items: Vec<_> = map
            .values()
            .filter(|i| i.tenant_id == tenant_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| {
            (a.product_id, a.warehouse_id).cmp(&(b.product_id, b.warehouse_id))
        });
        items
    }
}

/// In-memory append-only movement ledger for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryMovementStore {
    inner: RwLock<Vec<InventoryMovement>>,
}

impl InMemoryMovementStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MovementStore for InMemoryMovementStore {
    fn append(&self, movement: InventoryMovement) -> InventoryResult<()> {
        let mut rows = self
            .inner
            .write()
            .map_err(|_| InventoryError::concurrency("movement store lock poisoned"))?;
        rows.push(movement);
        Ok(())
    }

    fn list(&self, tenant_id: TenantId) -> Vec<InventoryMovement> {
        let rows = match self.inner.read() {
            Ok(r) => r,
            Err(_) => return vec![],
        };
        rows.iter()
            .filter(|m| m.tenant_id == tenant_id)
            .cloned()
            .collect()
    }
}

/// In-memory alert store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryAlertStore {
    inner: RwLock<HashMap<(TenantId, AlertId), StockAlert>>,
}

impl InMemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AlertStore for InMemoryAlertStore {
    fn unresolved(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        alert_type: AlertType,
    ) -> Option<StockAlert> {
        let map = self.inner.read().ok()?;
        map.values()
            .find(|a| {
                a.tenant_id == tenant_id
                    && a.product_id == product_id
                    && a.warehouse_id == warehouse_id
                    && a.alert_type == alert_type
                    && !a.is_resolved
            })
            .cloned()
    }

    fn insert(&self, alert: StockAlert) -> InventoryResult<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| InventoryError::concurrency("alert store lock poisoned"))?;

        // Uniqueness check and insert share the write lock; the first raiser
        // wins and later duplicates are dropped.
        if !alert.is_resolved {
            let already_raised = map.values().any(|a| {
                a.tenant_id == alert.tenant_id
                    && a.product_id == alert.product_id
                    && a.warehouse_id == alert.warehouse_id
                    && a.alert_type == alert.alert_type
                    && !a.is_resolved
            });
            if already_raised {
                return Ok(());
            }
        }

        map.insert((alert.tenant_id, alert.id), alert);
        Ok(())
    }

    fn update(&self, alert: StockAlert) -> InventoryResult<()> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| InventoryError::concurrency("alert store lock poisoned"))?;
        let key = (alert.tenant_id, alert.id);
        if !map.contains_key(&key) {
            return Err(InventoryError::not_found(format!("alert {}", alert.id)));
        }
        map.insert(key, alert);
        Ok(())
    }

    fn list_unresolved(&self, tenant_id: TenantId) -> Vec<StockAlert> {
        let map = match self.inner.read() {
            Ok(m) => m,
            Err(_) => return vec![],
        };
        let mut alerts: Vec<_> = map
            .values()
            .filter(|a| a.tenant_id == tenant_id && !a.is_resolved)
            .cloned()
            .collect();
        alerts.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        alerts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use orderdesk_inventory::WarehouseSpec;

    fn warehouse(tenant_id: TenantId, code: &str, is_default: bool) -> Warehouse {
        let mut spec = WarehouseSpec::new(format!("Warehouse {code}"), code);
        spec.is_default = is_default;
        Warehouse::new(WarehouseId::new(), tenant_id, spec, Utc::now()).unwrap()
    }

    #[test]
    fn duplicate_code_is_rejected_per_tenant() {
        let store = InMemoryWarehouseStore::new();
        let tenant = TenantId::new();

        store.insert(warehouse(tenant, "MAIN", true)).unwrap();
        let err = store.insert(warehouse(tenant, "MAIN", false)).unwrap_err();
        assert!(matches!(err, InventoryError::Conflict(_)));

        // Same code under a different tenant is fine.
        store
            .insert(warehouse(TenantId::new(), "MAIN", true))
            .unwrap();
    }

    #[test]
    fn inserting_a_default_unsets_the_previous_one() {
        let store = InMemoryWarehouseStore::new();
        let tenant = TenantId::new();

        let first = store.insert(warehouse(tenant, "A", true)).unwrap();
        let second = store.insert(warehouse(tenant, "B", true)).unwrap();

        assert!(!store.get(tenant, first.id).unwrap().is_default);
        assert!(store.get(tenant, second.id).unwrap().is_default);

        let defaults: Vec<_> = store
            .list(tenant)
            .into_iter()
            .filter(|w| w.is_default)
            .collect();
        assert_eq!(defaults.len(), 1);
    }

    #[test]
    fn set_default_requires_tenant_ownership() {
        let store = InMemoryWarehouseStore::new();
        let tenant = TenantId::new();
        let other = TenantId::new();

        let wh = store.insert(warehouse(tenant, "A", true)).unwrap();
        let err = store.set_default(other, wh.id).unwrap_err();
        assert!(matches!(err, InventoryError::NotFound(_)));
    }

    #[test]
    fn duplicate_unresolved_alert_is_dropped() {
        use orderdesk_inventory::{AlertType, StockAlert, StockItem};

        let store = InMemoryAlertStore::new();
        let tenant = TenantId::new();
        let mut item = StockItem::empty(tenant, ProductId::new(), WarehouseId::new(), Utc::now());
        item.min_stock = rust_decimal::Decimal::from(10);

        store
            .insert(StockAlert::raise(&item, AlertType::LowStock, Utc::now()))
            .unwrap();
        store
            .insert(StockAlert::raise(&item, AlertType::LowStock, Utc::now()))
            .unwrap();
        assert_eq!(store.list_unresolved(tenant).len(), 1);

        // Once the first is resolved a fresh alert may be raised again.
        let mut resolved = store
            .unresolved(tenant, item.product_id, item.warehouse_id, AlertType::LowStock)
            .unwrap();
        resolved.mark_as_resolved(Utc::now());
        store.update(resolved).unwrap();

        store
            .insert(StockAlert::raise(&item, AlertType::LowStock, Utc::now()))
            .unwrap();
        assert_eq!(store.list_unresolved(tenant).len(), 1);
    }

    #[test]
    fn unresolved_alert_lookup_filters_by_key_and_state() {
        use orderdesk_inventory::{AlertType, StockAlert, StockItem};

        let store = InMemoryAlertStore::new();
        let tenant = TenantId::new();
        let mut item = StockItem::empty(tenant, ProductId::new(), WarehouseId::new(), Utc::now());
        item.min_stock = rust_decimal::Decimal::from(10);

        let alert = StockAlert::raise(&item, AlertType::LowStock, Utc::now());
        store.insert(alert.clone()).unwrap();

        assert!(store
            .unresolved(tenant, item.product_id, item.warehouse_id, AlertType::LowStock)
            .is_some());
        assert!(store
            .unresolved(tenant, item.product_id, item.warehouse_id, AlertType::Overstock)
            .is_none());

        let mut resolved = alert;
        resolved.mark_as_resolved(Utc::now());
        store.update(resolved).unwrap();
        assert!(store
            .unresolved(tenant, item.product_id, item.warehouse_id, AlertType::LowStock)
            .is_none());
        assert!(store.list_unresolved(tenant).is_empty());
    }
}

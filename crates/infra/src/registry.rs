//! Warehouse lifecycle and the exactly-one-default invariant.

use chrono::Utc;

use orderdesk_core::{InventoryError, InventoryResult, TenantId, WarehouseId};
use orderdesk_inventory::{Warehouse, WarehouseSpec};

use crate::repository::WarehouseStore;

/// Name and code used when a tenant touches inventory before creating any
/// warehouse of their own.
const DEFAULT_WAREHOUSE_NAME: &str = "Main Warehouse";
const DEFAULT_WAREHOUSE_CODE: &str = "MAIN";

pub struct WarehouseRegistry<W> {
    warehouses: W,
}

impl<W> WarehouseRegistry<W>
where
    W: WarehouseStore,
{
    pub fn new(warehouses: W) -> Self {
        Self { warehouses }
    }

    /// Create a warehouse for the tenant.
    ///
    /// The first warehouse a tenant creates becomes the default whether or
    /// not the spec asks for it; a later default displaces the previous one.
    pub fn create_warehouse(
        &self,
        tenant_id: TenantId,
        mut spec: WarehouseSpec,
    ) -> InventoryResult<Warehouse> {
        spec.is_default = spec.is_default || self.warehouses.default_for(tenant_id).is_none();

        let warehouse = Warehouse::new(WarehouseId::new(), tenant_id, spec, Utc::now())?;
        let warehouse = self.warehouses.insert(warehouse)?;

        tracing::info!(
            tenant_id = %tenant_id,
            warehouse_id = %warehouse.id,
            code = %warehouse.code,
            is_default = warehouse.is_default,
            "warehouse created"
        );
        Ok(warehouse)
    }

    /// Move the default flag to `id`, atomically unsetting the old default.
    pub fn set_default(&self, tenant_id: TenantId, id: WarehouseId) -> InventoryResult<Warehouse> {
        let warehouse = self.warehouses.set_default(tenant_id, id)?;
        tracing::info!(
            tenant_id = %tenant_id,
            warehouse_id = %id,
            "default warehouse changed"
        );
        Ok(warehouse)
    }

    /// Return the tenant's default warehouse, creating `Main Warehouse` /
    /// `MAIN` on first use.
    pub fn ensure_default(&self, tenant_id: TenantId) -> InventoryResult<Warehouse> {
        if let Some(existing) = self.warehouses.default_for(tenant_id) {
            return Ok(existing);
        }

        let mut spec = WarehouseSpec::new(DEFAULT_WAREHOUSE_NAME, DEFAULT_WAREHOUSE_CODE);
        spec.is_default = true;

        match self.create_warehouse(tenant_id, spec) {
            Ok(warehouse) => Ok(warehouse),
            // Lost a race with a concurrent creator; their warehouse wins.
            Err(InventoryError::Conflict(_)) => self
                .warehouses
                .default_for(tenant_id)
                .ok_or_else(|| InventoryError::not_found("default warehouse for this tenant")),
            Err(other) => Err(other),
        }
    }

    pub fn get(&self, tenant_id: TenantId, id: WarehouseId) -> InventoryResult<Warehouse> {
        self.warehouses
            .get(tenant_id, id)
            .ok_or_else(|| InventoryError::not_found(format!("warehouse {id} for this tenant")))
    }

    pub fn find_by_code(&self, tenant_id: TenantId, code: &str) -> Option<Warehouse> {
        self.warehouses.find_by_code(tenant_id, code)
    }

    pub fn list(&self, tenant_id: TenantId) -> Vec<Warehouse> {
        self.warehouses.list(tenant_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::repository::InMemoryWarehouseStore;

    fn registry() -> WarehouseRegistry<Arc<InMemoryWarehouseStore>> {
        WarehouseRegistry::new(Arc::new(InMemoryWarehouseStore::new()))
    }

    #[test]
    fn first_warehouse_becomes_default() {
        let registry = registry();
        let tenant = TenantId::new();

        let first = registry
            .create_warehouse(tenant, WarehouseSpec::new("North", "N1"))
            .unwrap();
        assert!(first.is_default);

        let second = registry
            .create_warehouse(tenant, WarehouseSpec::new("South", "S1"))
            .unwrap();
        assert!(!second.is_default);
    }

    #[test]
    fn set_default_swaps_the_flag() {
        let registry = registry();
        let tenant = TenantId::new();

        let first = registry
            .create_warehouse(tenant, WarehouseSpec::new("North", "N1"))
            .unwrap();
        let second = registry
            .create_warehouse(tenant, WarehouseSpec::new("South", "S1"))
            .unwrap();

        registry.set_default(tenant, second.id).unwrap();

        assert!(!registry.get(tenant, first.id).unwrap().is_default);
        assert!(registry.get(tenant, second.id).unwrap().is_default);

        let defaults = registry
            .list(tenant)
            .into_iter()
            .filter(|w| w.is_default)
            .count();
        assert_eq!(defaults, 1);
    }

    #[test]
    fn ensure_default_is_idempotent() {
        let registry = registry();
        let tenant = TenantId::new();

        let created = registry.ensure_default(tenant).unwrap();
        assert_eq!(created.name, "Main Warehouse");
        assert_eq!(created.code, "MAIN");
        assert!(created.is_default);

        let again = registry.ensure_default(tenant).unwrap();
        assert_eq!(again.id, created.id);
        assert_eq!(registry.list(tenant).len(), 1);
    }

    #[test]
    fn tenants_do_not_see_each_other() {
        let registry = registry();
        let tenant = TenantId::new();
        let other = TenantId::new();

        let wh = registry
            .create_warehouse(tenant, WarehouseSpec::new("North", "N1"))
            .unwrap();

        assert!(matches!(
            registry.get(other, wh.id).unwrap_err(),
            InventoryError::NotFound(_)
        ));
        assert!(registry.list(other).is_empty());
        assert!(registry.find_by_code(other, "N1").is_none());
    }

    #[test]
    fn duplicate_code_surfaces_conflict() {
        let registry = registry();
        let tenant = TenantId::new();

        registry
            .create_warehouse(tenant, WarehouseSpec::new("North", "N1"))
            .unwrap();
        let err = registry
            .create_warehouse(tenant, WarehouseSpec::new("North again", "N1"))
            .unwrap_err();
        assert!(matches!(err, InventoryError::Conflict(_)));
    }
}

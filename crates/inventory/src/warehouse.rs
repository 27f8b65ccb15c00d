use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use orderdesk_core::{InventoryError, InventoryResult, TenantId, WarehouseId};

/// Caller-supplied fields for creating a warehouse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarehouseSpec {
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub is_default: bool,
}

impl WarehouseSpec {
    pub fn new(name: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            code: code.into(),
            address: None,
            is_default: false,
        }
    }
}

/// A named stock location owned by a tenant.
///
/// Exactly one warehouse per tenant carries `is_default = true`; the registry
/// enforces the swap atomically. Warehouses are never hard-deleted while stock
/// records reference them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Warehouse {
    pub id: WarehouseId,
    pub tenant_id: TenantId,
    pub name: String,
    pub code: String,
    pub address: Option<String>,
    pub is_active: bool,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl Warehouse {
    pub fn new(
        id: WarehouseId,
        tenant_id: TenantId,
        spec: WarehouseSpec,
        created_at: DateTime<Utc>,
    ) -> InventoryResult<Self> {
        if spec.name.trim().is_empty() {
            return Err(InventoryError::validation("warehouse name cannot be empty"));
        }
        if spec.code.trim().is_empty() {
            return Err(InventoryError::validation("warehouse code cannot be empty"));
        }

        Ok(Self {
            id,
            tenant_id,
            name: spec.name,
            code: spec.code,
            address: spec.address,
            is_active: true,
            is_default: spec.is_default,
            created_at,
        })
    }
}

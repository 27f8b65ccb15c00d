use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderdesk_core::{
    InventoryError, InventoryResult, MovementId, ProductId, TenantId, UserId, WarehouseId,
};

/// Kind of stock-changing event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    In,
    Out,
    Adjustment,
    Transfer,
}

/// What triggered a movement (kept for audit joins, not navigated live).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    Order,
    PurchaseOrder,
    Manual,
    Return,
}

/// Reference back to the originating document, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementReference {
    pub reference_type: ReferenceType,
    pub reference_id: Option<uuid::Uuid>,
}

impl MovementReference {
    pub fn manual() -> Self {
        Self {
            reference_type: ReferenceType::Manual,
            reference_id: None,
        }
    }

    pub fn order(id: uuid::Uuid) -> Self {
        Self {
            reference_type: ReferenceType::Order,
            reference_id: Some(id),
        }
    }

    pub fn purchase_order(id: uuid::Uuid) -> Self {
        Self {
            reference_type: ReferenceType::PurchaseOrder,
            reference_id: Some(id),
        }
    }
}

/// A movement as requested by a collaborator, before it is applied and
/// recorded. For adjustments `quantity` is the absolute target, for every
/// other type it is a positive delta.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovementDraft {
    pub movement_type: MovementType,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub destination_warehouse_id: Option<WarehouseId>,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub reference: MovementReference,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub actor_id: UserId,
}

impl MovementDraft {
    pub fn inbound(
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: Decimal,
        unit_cost: Option<Decimal>,
        reference: MovementReference,
        actor_id: UserId,
    ) -> Self {
        Self {
            movement_type: MovementType::In,
            product_id,
            warehouse_id,
            destination_warehouse_id: None,
            quantity,
            unit_cost,
            reference,
            reason: None,
            notes: None,
            batch_number: None,
            expiry_date: None,
            actor_id,
        }
    }

    pub fn outbound(
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: Decimal,
        reference: MovementReference,
        actor_id: UserId,
    ) -> Self {
        Self {
            movement_type: MovementType::Out,
            product_id,
            warehouse_id,
            destination_warehouse_id: None,
            quantity,
            unit_cost: None,
            reference,
            reason: None,
            notes: None,
            batch_number: None,
            expiry_date: None,
            actor_id,
        }
    }

    pub fn adjustment(
        product_id: ProductId,
        warehouse_id: WarehouseId,
        target_quantity: Decimal,
        actor_id: UserId,
    ) -> Self {
        Self {
            movement_type: MovementType::Adjustment,
            product_id,
            warehouse_id,
            destination_warehouse_id: None,
            quantity: target_quantity,
            unit_cost: None,
            reference: MovementReference::manual(),
            reason: None,
            notes: None,
            batch_number: None,
            expiry_date: None,
            actor_id,
        }
    }

    pub fn transfer(
        product_id: ProductId,
        source_warehouse_id: WarehouseId,
        destination_warehouse_id: WarehouseId,
        quantity: Decimal,
        actor_id: UserId,
    ) -> Self {
        Self {
            movement_type: MovementType::Transfer,
            product_id,
            warehouse_id: source_warehouse_id,
            destination_warehouse_id: Some(destination_warehouse_id),
            quantity,
            unit_cost: None,
            reference: MovementReference::manual(),
            reason: None,
            notes: None,
            batch_number: None,
            expiry_date: None,
            actor_id,
        }
    }

    /// Structural validation, performed before any state is touched.
    pub fn validate(&self) -> InventoryResult<()> {
        // An adjustment's quantity is an absolute target, so zero is a valid
        // write-off; every other type carries a positive delta.
        if self.movement_type == MovementType::Adjustment {
            if self.quantity < Decimal::ZERO {
                return Err(InventoryError::invalid_quantity(format!(
                    "adjustment target cannot be negative, got {}",
                    self.quantity
                )));
            }
        } else if self.quantity <= Decimal::ZERO {
            return Err(InventoryError::invalid_quantity(format!(
                "movement quantity must be positive, got {}",
                self.quantity
            )));
        }

        if let Some(cost) = self.unit_cost {
            if cost < Decimal::ZERO {
                return Err(InventoryError::validation(format!(
                    "unit cost cannot be negative, got {cost}"
                )));
            }
        }

        match self.movement_type {
            MovementType::Transfer => {
                let destination = self.destination_warehouse_id.ok_or_else(|| {
                    InventoryError::validation("transfer requires destination_warehouse_id")
                })?;
                if destination == self.warehouse_id {
                    return Err(InventoryError::validation(
                        "transfer destination must differ from source warehouse",
                    ));
                }
            }
            _ => {
                if self.destination_warehouse_id.is_some() {
                    return Err(InventoryError::validation(
                        "destination_warehouse_id is only valid for transfers",
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Immutable ledger row: one stock-changing event, with the source item's
/// quantity snapshotted before and after. Never updated or deleted; the
/// materialized `StockItem` must always equal the replay of these rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryMovement {
    pub id: MovementId,
    pub tenant_id: TenantId,
    pub movement_type: MovementType,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub destination_warehouse_id: Option<WarehouseId>,
    pub quantity: Decimal,
    pub unit_cost: Option<Decimal>,
    pub stock_before: Decimal,
    pub stock_after: Decimal,
    pub reference: MovementReference,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub actor_id: UserId,
    pub created_at: DateTime<Utc>,
}

impl InventoryMovement {
    /// Seal an applied draft into its ledger row.
    pub fn record(
        id: MovementId,
        tenant_id: TenantId,
        draft: MovementDraft,
        stock_before: Decimal,
        stock_after: Decimal,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            tenant_id,
            movement_type: draft.movement_type,
            product_id: draft.product_id,
            warehouse_id: draft.warehouse_id,
            destination_warehouse_id: draft.destination_warehouse_id,
            quantity: draft.quantity,
            unit_cost: draft.unit_cost,
            stock_before,
            stock_after,
            reference: draft.reference,
            reason: draft.reason,
            notes: draft.notes,
            batch_number: draft.batch_number,
            expiry_date: draft.expiry_date,
            actor_id: draft.actor_id,
            created_at,
        }
    }

    /// Contribution of this row to `warehouse_id`'s quantity during replay.
    ///
    /// Transfers debit the source and credit the destination from the same
    /// row; adjustments contribute the recorded before/after delta.
    pub fn delta_for(&self, warehouse_id: WarehouseId) -> Decimal {
        let is_source = self.warehouse_id == warehouse_id;
        match self.movement_type {
            MovementType::In => {
                if is_source {
                    self.quantity
                } else {
                    Decimal::ZERO
                }
            }
            MovementType::Out => {
                if is_source {
                    -self.quantity
                } else {
                    Decimal::ZERO
                }
            }
            MovementType::Adjustment => {
                if is_source {
                    self.stock_after - self.stock_before
                } else {
                    Decimal::ZERO
                }
            }
            MovementType::Transfer => {
                if is_source {
                    -self.quantity
                } else if self.destination_warehouse_id == Some(warehouse_id) {
                    self.quantity
                } else {
                    Decimal::ZERO
                }
            }
        }
    }
}

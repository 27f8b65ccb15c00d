//! The movement ledger and reservation manager.
//!
//! `InventoryLedger` is the single entry point through which stock state is
//! mutated: reservations for the order lifecycle, and movements (in, out,
//! adjustment, transfer) for everything physical. Every operation validates
//! first, then mutates under the per-key lock, then appends the immutable
//! ledger row; alert evaluation runs after the critical section and never
//! unwinds a committed movement.

use chrono::Utc;
use rust_decimal::Decimal;

use orderdesk_core::{
    InventoryError, InventoryResult, MovementId, ProductId, TenantId, WarehouseId,
};
use orderdesk_inventory::{
    severity, should_raise, AlertType, InventoryMovement, MovementDraft, MovementType, StockAlert,
    StockItem,
};

use crate::locks::StockLockManager;
use crate::repository::{AlertStore, MovementStore, StockItemStore, WarehouseStore};

pub struct InventoryLedger<W, S, M, A> {
    warehouses: W,
    items: S,
    movements: M,
    alerts: A,
    locks: StockLockManager,
}

impl<W, S, M, A> InventoryLedger<W, S, M, A>
where
    W: WarehouseStore,
    S: StockItemStore,
    M: MovementStore,
    A: AlertStore,
{
    pub fn new(warehouses: W, items: S, movements: M, alerts: A) -> Self {
        Self {
            warehouses,
            items,
            movements,
            alerts,
            locks: StockLockManager::new(),
        }
    }

    /// Current stock state for a key, if any movement or reservation has
    /// touched it.
    pub fn stock_item(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Option<StockItem> {
        self.items.get(tenant_id, product_id, warehouse_id)
    }

    /// Derived read: quantity minus reservations, zero for untouched keys.
    pub fn available_quantity(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Decimal {
        self.items
            .get(tenant_id, product_id, warehouse_id)
            .map(|i| i.available_quantity())
            .unwrap_or(Decimal::ZERO)
    }

    /// Soft-hold `quantity` units against an in-flight order.
    ///
    /// Lazily creates the stock record (with zero quantity) so the
    /// availability check still runs; no ledger row is written since a
    /// reservation is not a physical movement.
    pub fn reserve(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: Decimal,
    ) -> InventoryResult<StockItem> {
        self.require_warehouse(tenant_id, warehouse_id)?;

        let item = self.locks.with_lock((tenant_id, product_id, warehouse_id), || {
            let now = Utc::now();
            let mut item = self.load_or_create(tenant_id, product_id, warehouse_id, now);
            item.reserve(quantity, now)?;
            self.items.upsert(item.clone())?;
            Ok(item)
        })?;

        tracing::info!(
            tenant_id = %tenant_id,
            product_id = %product_id,
            warehouse_id = %warehouse_id,
            quantity = %quantity,
            reserved_quantity = %item.reserved_quantity,
            "stock reserved"
        );
        Ok(item)
    }

    /// Release a reservation, clamped at zero.
    ///
    /// Over-release is tolerated (cancellation flows may call this more than
    /// once) but logged as a caller error.
    pub fn release(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        quantity: Decimal,
    ) -> InventoryResult<StockItem> {
        self.require_warehouse(tenant_id, warehouse_id)?;

        let (item, released) =
            self.locks.with_lock((tenant_id, product_id, warehouse_id), || {
                let now = Utc::now();
                let mut item = self.load_or_create(tenant_id, product_id, warehouse_id, now);
                let released = item.release(quantity, now)?;
                self.items.upsert(item.clone())?;
                Ok((item, released))
            })?;

        if released < quantity {
            tracing::warn!(
                tenant_id = %tenant_id,
                product_id = %product_id,
                warehouse_id = %warehouse_id,
                requested = %quantity,
                released = %released,
                "release exceeded reserved quantity; clamped at zero"
            );
        }
        Ok(item)
    }

    /// Validate and apply one movement atomically, append its ledger row, and
    /// re-evaluate alerts for the touched stock record(s).
    ///
    /// All failures are raised before any mutation; a rejected movement leaves
    /// no ledger row and no state change.
    pub fn apply_movement(
        &self,
        tenant_id: TenantId,
        draft: MovementDraft,
    ) -> InventoryResult<InventoryMovement> {
        draft.validate()?;
        self.require_warehouse(tenant_id, draft.warehouse_id)?;
        if let Some(destination) = draft.destination_warehouse_id {
            self.require_warehouse(tenant_id, destination)?;
        }

        let (movement, touched) = match draft.movement_type {
            MovementType::Transfer => self.apply_transfer(tenant_id, draft)?,
            _ => self.apply_single(tenant_id, draft)?,
        };

        for item in &touched {
            self.evaluate_alerts(item);
        }

        tracing::info!(
            tenant_id = %tenant_id,
            movement_id = %movement.id,
            movement_type = ?movement.movement_type,
            product_id = %movement.product_id,
            warehouse_id = %movement.warehouse_id,
            quantity = %movement.quantity,
            stock_before = %movement.stock_before,
            stock_after = %movement.stock_after,
            "movement applied"
        );
        Ok(movement)
    }

    fn apply_single(
        &self,
        tenant_id: TenantId,
        draft: MovementDraft,
    ) -> InventoryResult<(InventoryMovement, Vec<StockItem>)> {
        let key = (tenant_id, draft.product_id, draft.warehouse_id);
        self.locks.with_lock(key, || {
            let now = Utc::now();
            let mut item =
                self.load_or_create(tenant_id, draft.product_id, draft.warehouse_id, now);
            let stock_before = item.quantity;

            match draft.movement_type {
                MovementType::In => item.receive(draft.quantity, draft.unit_cost, now)?,
                MovementType::Out => item.issue(draft.quantity, now)?,
                MovementType::Adjustment => {
                    item.adjust_to(draft.quantity, now)?;
                    if item.quantity < item.reserved_quantity {
                        tracing::warn!(
                            tenant_id = %tenant_id,
                            product_id = %item.product_id,
                            warehouse_id = %item.warehouse_id,
                            quantity = %item.quantity,
                            reserved_quantity = %item.reserved_quantity,
                            "adjustment set quantity below reserved quantity"
                        );
                    }
                }
                MovementType::Transfer => {
                    return Err(InventoryError::validation(
                        "transfer movements must lock both stock rows",
                    ));
                }
            }

            let stock_after = item.quantity;
            self.items.upsert(item.clone())?;

            let movement = InventoryMovement::record(
                MovementId::new(),
                tenant_id,
                draft,
                stock_before,
                stock_after,
                now,
            );
            self.movements.append(movement.clone())?;
            Ok((movement, vec![item]))
        })
    }

    fn apply_transfer(
        &self,
        tenant_id: TenantId,
        draft: MovementDraft,
    ) -> InventoryResult<(InventoryMovement, Vec<StockItem>)> {
        let destination = draft.destination_warehouse_id.ok_or_else(|| {
            InventoryError::validation("transfer requires destination_warehouse_id")
        })?;
        let source_key = (tenant_id, draft.product_id, draft.warehouse_id);
        let destination_key = (tenant_id, draft.product_id, destination);

        self.locks.with_pair(source_key, destination_key, || {
            let now = Utc::now();
            let mut source =
                self.load_or_create(tenant_id, draft.product_id, draft.warehouse_id, now);
            let stock_before = source.quantity;
            source.issue(draft.quantity, now)?;

            let mut target = self.load_or_create(tenant_id, draft.product_id, destination, now);
            target.receive(draft.quantity, None, now)?;

            let stock_after = source.quantity;
            self.items.upsert(source.clone())?;
            self.items.upsert(target.clone())?;

            let movement = InventoryMovement::record(
                MovementId::new(),
                tenant_id,
                draft,
                stock_before,
                stock_after,
                now,
            );
            self.movements.append(movement.clone())?;
            Ok((movement, vec![source, target]))
        })
    }

    /// Raise or resolve alerts for the item's post-movement state.
    ///
    /// Best-effort: a failed alert write is logged and swallowed so it can
    /// never unwind the movement that triggered it.
    fn evaluate_alerts(&self, item: &StockItem) {
        let now = Utc::now();
        for alert_type in AlertType::ALL {
            let unresolved = self.alerts.unresolved(
                item.tenant_id,
                item.product_id,
                item.warehouse_id,
                alert_type,
            );

            let outcome = if should_raise(item, alert_type) {
                match unresolved {
                    // Already raised; the store also drops duplicate inserts.
                    Some(_) => Ok(()),
                    None => {
                        tracing::info!(
                            tenant_id = %item.tenant_id,
                            product_id = %item.product_id,
                            warehouse_id = %item.warehouse_id,
                            alert_type = ?alert_type,
                            severity = ?severity(item),
                            "stock alert raised"
                        );
                        self.alerts.insert(StockAlert::raise(item, alert_type, now))
                    }
                }
            } else {
                match unresolved {
                    Some(mut alert) => {
                        alert.mark_as_resolved(now);
                        self.alerts.update(alert)
                    }
                    None => Ok(()),
                }
            };

            if let Err(error) = outcome {
                tracing::warn!(
                    tenant_id = %item.tenant_id,
                    product_id = %item.product_id,
                    warehouse_id = %item.warehouse_id,
                    alert_type = ?alert_type,
                    %error,
                    "alert evaluation failed; movement is unaffected"
                );
            }
        }
    }

    fn require_warehouse(
        &self,
        tenant_id: TenantId,
        warehouse_id: WarehouseId,
    ) -> InventoryResult<()> {
        if self.warehouses.get(tenant_id, warehouse_id).is_none() {
            return Err(InventoryError::not_found(format!(
                "warehouse {warehouse_id} for this tenant"
            )));
        }
        Ok(())
    }

    fn load_or_create(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        now: chrono::DateTime<Utc>,
    ) -> StockItem {
        self.items
            .get(tenant_id, product_id, warehouse_id)
            .unwrap_or_else(|| StockItem::empty(tenant_id, product_id, warehouse_id, now))
    }
}

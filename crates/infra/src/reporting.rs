//! Read-side queries over the movement ledger and materialized stock.
//!
//! Everything here is derived from the stores; nothing mutates. The replay
//! helpers exist so tests and audits can check the materialized quantities
//! against the ledger they are supposed to equal.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderdesk_core::{ProductId, TenantId, WarehouseId};
use orderdesk_inventory::{InventoryMovement, ReferenceType, StockAlert, StockItem};

use crate::repository::{AlertStore, MovementStore, StockItemStore};

/// Filter for movement history. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MovementQuery {
    pub product_id: Option<ProductId>,
    pub warehouse_id: Option<WarehouseId>,
    pub reference_type: Option<ReferenceType>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

impl MovementQuery {
    pub fn for_product(product_id: ProductId) -> Self {
        Self {
            product_id: Some(product_id),
            ..Self::default()
        }
    }

    pub fn for_warehouse(warehouse_id: WarehouseId) -> Self {
        Self {
            warehouse_id: Some(warehouse_id),
            ..Self::default()
        }
    }

    /// A warehouse filter matches rows that touch the warehouse on either
    /// side, so transfer history shows up for both ends.
    pub fn matches(&self, movement: &InventoryMovement) -> bool {
        if let Some(product_id) = self.product_id {
            if movement.product_id != product_id {
                return false;
            }
        }
        if let Some(warehouse_id) = self.warehouse_id {
            let touches = movement.warehouse_id == warehouse_id
                || movement.destination_warehouse_id == Some(warehouse_id);
            if !touches {
                return false;
            }
        }
        if let Some(reference_type) = self.reference_type {
            if movement.reference.reference_type != reference_type {
                return false;
            }
        }
        if let Some(from) = self.from {
            if movement.created_at < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if movement.created_at > to {
                return false;
            }
        }
        true
    }
}

/// One line of a stock valuation report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockValuation {
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub quantity: Decimal,
    pub average_cost: Decimal,
    pub total_value: Decimal,
}

impl StockValuation {
    fn from_item(item: &StockItem) -> Self {
        Self {
            product_id: item.product_id,
            warehouse_id: item.warehouse_id,
            quantity: item.quantity,
            average_cost: item.average_cost,
            total_value: item.quantity * item.average_cost,
        }
    }
}

pub struct InventoryReports<S, M, A> {
    items: S,
    movements: M,
    alerts: A,
}

impl<S, M, A> InventoryReports<S, M, A>
where
    S: StockItemStore,
    M: MovementStore,
    A: AlertStore,
{
    pub fn new(items: S, movements: M, alerts: A) -> Self {
        Self {
            items,
            movements,
            alerts,
        }
    }

    /// Ledger rows matching `query`, oldest first.
    pub fn movement_history(
        &self,
        tenant_id: TenantId,
        query: &MovementQuery,
    ) -> Vec<InventoryMovement> {
        let mut rows: Vec<_> = self
            .movements
            .list(tenant_id)
            .into_iter()
            .filter(|m| query.matches(m))
            .collect();
        rows.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        rows
    }

    /// Per-row valuation at weighted average cost, optionally limited to one
    /// warehouse. Zero-quantity rows are skipped.
    pub fn valuation(
        &self,
        tenant_id: TenantId,
        warehouse_id: Option<WarehouseId>,
    ) -> Vec<StockValuation> {
        self.items
            .list(tenant_id)
            .iter()
            .filter(|i| warehouse_id.is_none_or(|w| i.warehouse_id == w))
            .filter(|i| i.quantity != Decimal::ZERO)
            .map(StockValuation::from_item)
            .collect()
    }

    pub fn total_valuation(&self, tenant_id: TenantId, warehouse_id: Option<WarehouseId>) -> Decimal {
        self.valuation(tenant_id, warehouse_id)
            .iter()
            .map(|v| v.total_value)
            .sum()
    }

    /// Stock records at or below their effective reorder point.
    pub fn low_stock_items(&self, tenant_id: TenantId) -> Vec<StockItem> {
        self.items
            .list(tenant_id)
            .into_iter()
            .filter(|i| i.needs_reorder())
            .collect()
    }

    pub fn unresolved_alerts(&self, tenant_id: TenantId) -> Vec<StockAlert> {
        self.alerts.list_unresolved(tenant_id)
    }

    pub fn active_alert_count(&self, tenant_id: TenantId) -> usize {
        self.alerts.list_unresolved(tenant_id).len()
    }

    /// Quantity for a key derived purely from the ledger.
    pub fn replayed_quantity(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> Decimal {
        self.movements
            .list(tenant_id)
            .iter()
            .filter(|m| m.product_id == product_id)
            .map(|m| m.delta_for(warehouse_id))
            .sum()
    }

    /// Audit check: does the materialized quantity equal the ledger replay?
    pub fn replay_matches(
        &self,
        tenant_id: TenantId,
        product_id: ProductId,
        warehouse_id: WarehouseId,
    ) -> bool {
        let materialized = self
            .items
            .get(tenant_id, product_id, warehouse_id)
            .map(|i| i.quantity)
            .unwrap_or(Decimal::ZERO);
        materialized == self.replayed_quantity(tenant_id, product_id, warehouse_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::Utc;
    use orderdesk_core::{MovementId, UserId};
    use orderdesk_inventory::{MovementDraft, MovementReference};

    use crate::repository::{InMemoryAlertStore, InMemoryMovementStore, InMemoryStockItemStore};

    type Reports = InventoryReports<
        Arc<InMemoryStockItemStore>,
        Arc<InMemoryMovementStore>,
        Arc<InMemoryAlertStore>,
    >;

    fn reports() -> (Reports, Arc<InMemoryStockItemStore>, Arc<InMemoryMovementStore>) {
        let items = Arc::new(InMemoryStockItemStore::new());
        let movements = Arc::new(InMemoryMovementStore::new());
        let alerts = Arc::new(InMemoryAlertStore::new());
        (
            InventoryReports::new(items.clone(), movements.clone(), alerts),
            items,
            movements,
        )
    }

    fn record_inbound(
        movements: &InMemoryMovementStore,
        tenant: TenantId,
        product: ProductId,
        warehouse: WarehouseId,
        quantity: i64,
        before: i64,
    ) {
        let draft = MovementDraft::inbound(
            product,
            warehouse,
            Decimal::from(quantity),
            None,
            MovementReference::manual(),
            UserId::new(),
        );
        let row = InventoryMovement::record(
            MovementId::new(),
            tenant,
            draft,
            Decimal::from(before),
            Decimal::from(before + quantity),
            Utc::now(),
        );
        movements.append(row).unwrap();
    }

    #[test]
    fn warehouse_filter_matches_both_ends_of_a_transfer() {
        let source = WarehouseId::new();
        let destination = WarehouseId::new();
        let draft = MovementDraft::transfer(
            ProductId::new(),
            source,
            destination,
            Decimal::from(5),
            UserId::new(),
        );
        let row = InventoryMovement::record(
            MovementId::new(),
            TenantId::new(),
            draft,
            Decimal::from(10),
            Decimal::from(5),
            Utc::now(),
        );

        assert!(MovementQuery::for_warehouse(source).matches(&row));
        assert!(MovementQuery::for_warehouse(destination).matches(&row));
        assert!(!MovementQuery::for_warehouse(WarehouseId::new()).matches(&row));
    }

    #[test]
    fn history_is_ordered_and_filtered() {
        let (reports, _items, movements) = reports();
        let tenant = TenantId::new();
        let product = ProductId::new();
        let other_product = ProductId::new();
        let warehouse = WarehouseId::new();

        record_inbound(&movements, tenant, product, warehouse, 10, 0);
        record_inbound(&movements, tenant, other_product, warehouse, 3, 0);
        record_inbound(&movements, tenant, product, warehouse, 5, 10);

        let history = reports.movement_history(tenant, &MovementQuery::for_product(product));
        assert_eq!(history.len(), 2);
        assert!(history[0].created_at <= history[1].created_at);
        assert_eq!(history[0].stock_before, Decimal::ZERO);
        assert_eq!(history[1].stock_before, Decimal::from(10));
    }

    #[test]
    fn valuation_multiplies_quantity_by_average_cost() {
        let (reports, items, _movements) = reports();
        let tenant = TenantId::new();
        let warehouse = WarehouseId::new();

        let mut stocked = StockItem::empty(tenant, ProductId::new(), warehouse, Utc::now());
        stocked.quantity = Decimal::from(10);
        stocked.average_cost = Decimal::new(250, 2);
        items.upsert(stocked).unwrap();

        let empty = StockItem::empty(tenant, ProductId::new(), warehouse, Utc::now());
        items.upsert(empty).unwrap();

        let lines = reports.valuation(tenant, None);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].total_value, Decimal::new(2500, 2));
        assert_eq!(reports.total_valuation(tenant, None), Decimal::new(2500, 2));
        assert_eq!(
            reports.total_valuation(tenant, Some(WarehouseId::new())),
            Decimal::ZERO
        );
    }

    #[test]
    fn low_stock_report_uses_effective_reorder_point() {
        let (reports, items, _movements) = reports();
        let tenant = TenantId::new();
        let warehouse = WarehouseId::new();

        let mut low = StockItem::empty(tenant, ProductId::new(), warehouse, Utc::now());
        low.quantity = Decimal::from(5);
        low.reorder_point = Some(Decimal::from(8));
        items.upsert(low.clone()).unwrap();

        let mut healthy = StockItem::empty(tenant, ProductId::new(), warehouse, Utc::now());
        healthy.quantity = Decimal::from(50);
        healthy.reorder_point = Some(Decimal::from(8));
        items.upsert(healthy).unwrap();

        let flagged = reports.low_stock_items(tenant);
        assert_eq!(flagged.len(), 1);
        assert_eq!(flagged[0].product_id, low.product_id);
    }

    #[test]
    fn replay_detects_a_tampered_materialized_quantity() {
        let (reports, items, movements) = reports();
        let tenant = TenantId::new();
        let product = ProductId::new();
        let warehouse = WarehouseId::new();

        record_inbound(&movements, tenant, product, warehouse, 10, 0);
        let mut item = StockItem::empty(tenant, product, warehouse, Utc::now());
        item.quantity = Decimal::from(10);
        items.upsert(item.clone()).unwrap();
        assert!(reports.replay_matches(tenant, product, warehouse));

        item.quantity = Decimal::from(11);
        items.upsert(item).unwrap();
        assert!(!reports.replay_matches(tenant, product, warehouse));
    }
}

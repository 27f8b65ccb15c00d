//! Low-stock / overstock alert model and evaluation rules.
//!
//! Alerts are derived, best-effort side effects of committed movements. They
//! never block or reverse the movement that triggered them.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderdesk_core::{AlertId, ProductId, TenantId, WarehouseId};

use crate::stock_item::StockItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
    LowStock,
    Overstock,
}

impl AlertType {
    pub const ALL: [AlertType; 2] = [AlertType::LowStock, AlertType::Overstock];
}

/// How urgent the stock position is after a movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockSeverity {
    None,
    Warning,
    Critical,
}

/// Severity of the current stock position: critical when nothing is left,
/// warning when below the reorder threshold.
pub fn severity(item: &StockItem) -> StockSeverity {
    if item.quantity == Decimal::ZERO {
        StockSeverity::Critical
    } else if item.needs_reorder() {
        StockSeverity::Warning
    } else {
        StockSeverity::None
    }
}

/// Whether `item` is currently in the alerting condition for `alert_type`.
pub fn should_raise(item: &StockItem, alert_type: AlertType) -> bool {
    match alert_type {
        AlertType::LowStock => item.needs_reorder(),
        AlertType::Overstock => item.is_overstocked(),
    }
}

/// One raised alert. At most one unresolved alert exists per
/// (tenant, product, warehouse, alert_type) at a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAlert {
    pub id: AlertId,
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,
    pub alert_type: AlertType,
    pub threshold_value: Decimal,
    pub current_value: Decimal,
    pub message: String,
    pub is_read: bool,
    pub is_resolved: bool,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl StockAlert {
    /// Build the alert for `item`'s current condition.
    ///
    /// Callers check `should_raise` first; for `Overstock` a missing
    /// `max_stock` falls back to a zero threshold (the condition can then
    /// never have been true).
    pub fn raise(item: &StockItem, alert_type: AlertType, now: DateTime<Utc>) -> Self {
        let (threshold_value, message) = match alert_type {
            AlertType::LowStock => (
                item.effective_reorder_point(),
                format!(
                    "low stock for product {} in warehouse {}",
                    item.product_id, item.warehouse_id
                ),
            ),
            AlertType::Overstock => (
                item.max_stock.unwrap_or(Decimal::ZERO),
                format!(
                    "overstock for product {} in warehouse {}",
                    item.product_id, item.warehouse_id
                ),
            ),
        };

        Self {
            id: AlertId::new(),
            tenant_id: item.tenant_id,
            product_id: item.product_id,
            warehouse_id: item.warehouse_id,
            alert_type,
            threshold_value,
            current_value: item.quantity,
            message,
            is_read: false,
            is_resolved: false,
            created_at: now,
            read_at: None,
            resolved_at: None,
        }
    }

    pub fn mark_as_read(&mut self, now: DateTime<Utc>) {
        self.is_read = true;
        self.read_at = Some(now);
    }

    pub fn mark_as_resolved(&mut self, now: DateTime<Utc>) {
        self.is_resolved = true;
        self.resolved_at = Some(now);
    }
}

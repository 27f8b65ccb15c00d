//! Inventory domain module.
//!
//! This crate contains the business rules for the stock ledger, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage):
//! warehouses, per-warehouse stock state, immutable movements, weighted-average
//! costing and stock alerts.

pub mod alert;
pub mod cost;
pub mod movement;
pub mod stock_item;
pub mod warehouse;

pub use alert::{severity, should_raise, AlertType, StockAlert, StockSeverity};
pub use cost::weighted_average;
pub use movement::{
    InventoryMovement, MovementDraft, MovementReference, MovementType, ReferenceType,
};
pub use stock_item::StockItem;
pub use warehouse::{Warehouse, WarehouseSpec};

//! `orderdesk-infra`: storage and orchestration for the inventory engine.
//!
//! The domain crates stay pure; this crate supplies the repositories
//! (trait + in-memory implementations), the per-key lock manager that
//! serializes writers, and the services collaborators call:
//! [`InventoryLedger`], [`WarehouseRegistry`] and [`InventoryReports`].

pub mod ledger;
pub mod locks;
pub mod registry;
pub mod reporting;
pub mod repository;


pub use ledger::InventoryLedger;
pub use locks::{StockKey, StockLockManager};
pub use registry::WarehouseRegistry;
pub use reporting::{InventoryReports, MovementQuery, StockValuation};
pub use repository::{
    AlertStore, InMemoryAlertStore, InMemoryMovementStore, InMemoryStockItemStore,
    InMemoryWarehouseStore, MovementStore, StockItemStore, WarehouseStore,
};

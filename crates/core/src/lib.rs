//! `orderdesk-core`: foundation building blocks for the inventory engine.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::{InventoryError, InventoryResult};
pub use id::{AlertId, MovementId, ProductId, TenantId, UserId, WarehouseId};

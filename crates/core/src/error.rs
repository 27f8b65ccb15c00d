//! Domain error model.

use rust_decimal::Decimal;
use thiserror::Error;

/// Result type used across the inventory domain.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures. Infrastructure
/// concerns (IO, serialization) belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InventoryError {
    /// A reservation or outbound movement asked for more stock than is available.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock {
        requested: Decimal,
        available: Decimal,
    },

    /// A quantity was zero, negative, or otherwise unusable.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested warehouse/stock record was not found (or belongs to another tenant).
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness rule was violated (e.g. duplicate warehouse code).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Per-key serialization failed (e.g. a poisoned lock from a panicked writer).
    #[error("concurrency conflict: {0}")]
    ConcurrencyConflict(String),
}

impl InventoryError {
    pub fn insufficient_stock(requested: Decimal, available: Decimal) -> Self {
        Self::InsufficientStock {
            requested,
            available,
        }
    }

    pub fn invalid_quantity(msg: impl Into<String>) -> Self {
        Self::InvalidQuantity(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn concurrency(msg: impl Into<String>) -> Self {
        Self::ConcurrencyConflict(msg.into())
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use orderdesk_core::{InventoryError, InventoryResult, ProductId, TenantId, WarehouseId};

use crate::cost::weighted_average;

/// Materialized stock state for one product in one warehouse.
///
/// Keyed uniquely by (tenant, product, warehouse). Created lazily on the first
/// movement or reservation touching the key; mutated only through the ledger
/// or the reservation operations; never deleted (retained for audit).
///
/// Invariants: `quantity >= 0` and `0 <= reserved_quantity <= quantity`.
/// `available_quantity` is derived, never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockItem {
    pub tenant_id: TenantId,
    pub product_id: ProductId,
    pub warehouse_id: WarehouseId,

    pub quantity: Decimal,
    pub reserved_quantity: Decimal,

    pub min_stock: Decimal,
    pub max_stock: Option<Decimal>,
    pub reorder_point: Option<Decimal>,

    pub average_cost: Decimal,
    pub last_cost: Decimal,

    pub last_movement_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StockItem {
    /// Empty record for lazy creation: zero stock, zero thresholds.
    pub fn empty(
        tenant_id: TenantId,
        product_id: ProductId,
        warehouse_id: WarehouseId,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            tenant_id,
            product_id,
            warehouse_id,
            quantity: Decimal::ZERO,
            reserved_quantity: Decimal::ZERO,
            min_stock: Decimal::ZERO,
            max_stock: None,
            reorder_point: None,
            average_cost: Decimal::ZERO,
            last_cost: Decimal::ZERO,
            last_movement_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Quantity not held by any reservation.
    pub fn available_quantity(&self) -> Decimal {
        self.quantity - self.reserved_quantity
    }

    /// The threshold low-stock alerts fire against: `reorder_point` when set,
    /// `min_stock` otherwise.
    pub fn effective_reorder_point(&self) -> Decimal {
        self.reorder_point.unwrap_or(self.min_stock)
    }

    pub fn needs_reorder(&self) -> bool {
        self.available_quantity() <= self.effective_reorder_point()
    }

    pub fn is_overstocked(&self) -> bool {
        match self.max_stock {
            Some(max) => self.quantity > max,
            None => false,
        }
    }

    /// Soft-hold `quantity` units for an in-flight order.
    ///
    /// Reservations are not physical movements and leave no ledger trace.
    pub fn reserve(&mut self, quantity: Decimal, now: DateTime<Utc>) -> InventoryResult<()> {
        if quantity <= Decimal::ZERO {
            return Err(InventoryError::invalid_quantity(format!(
                "reservation quantity must be positive, got {quantity}"
            )));
        }

        let available = self.available_quantity();
        if quantity > available {
            return Err(InventoryError::insufficient_stock(quantity, available));
        }

        self.reserved_quantity += quantity;
        self.updated_at = now;
        Ok(())
    }

    /// Release a reservation, clamped at zero.
    ///
    /// Returns the quantity actually released. Over-release is tolerated so
    /// order-cancellation flows stay idempotent; the caller is expected to log
    /// the shortfall as a caller error rather than fail.
    pub fn release(&mut self, quantity: Decimal, now: DateTime<Utc>) -> InventoryResult<Decimal> {
        if quantity <= Decimal::ZERO {
            return Err(InventoryError::invalid_quantity(format!(
                "release quantity must be positive, got {quantity}"
            )));
        }

        let released = quantity.min(self.reserved_quantity);
        self.reserved_quantity -= released;
        self.updated_at = now;
        Ok(released)
    }

    /// Inbound receipt: add stock and re-blend the average cost when a unit
    /// cost is given. `last_cost` always tracks the most recent purchase price.
    pub fn receive(
        &mut self,
        quantity: Decimal,
        unit_cost: Option<Decimal>,
        now: DateTime<Utc>,
    ) -> InventoryResult<()> {
        if quantity <= Decimal::ZERO {
            return Err(InventoryError::invalid_quantity(format!(
                "inbound quantity must be positive, got {quantity}"
            )));
        }

        if let Some(cost) = unit_cost {
            self.average_cost = weighted_average(self.quantity, self.average_cost, quantity, cost);
            self.last_cost = cost;
        }
        self.quantity += quantity;
        self.touch(now);
        Ok(())
    }

    /// Outbound issue: remove stock, validated against availability computed
    /// before this movement. No cost recompute on the way out.
    pub fn issue(&mut self, quantity: Decimal, now: DateTime<Utc>) -> InventoryResult<()> {
        if quantity <= Decimal::ZERO {
            return Err(InventoryError::invalid_quantity(format!(
                "outbound quantity must be positive, got {quantity}"
            )));
        }

        let available = self.available_quantity();
        if quantity > available {
            return Err(InventoryError::insufficient_stock(quantity, available));
        }

        self.quantity -= quantity;
        self.touch(now);
        Ok(())
    }

    /// Stock-take adjustment: set quantity to an absolute target.
    ///
    /// Reservations are intentionally left untouched, even when the target
    /// drops below `reserved_quantity`; the ledger logs that condition for
    /// follow-up instead of guessing which order holds to drop.
    pub fn adjust_to(&mut self, target: Decimal, now: DateTime<Utc>) -> InventoryResult<()> {
        if target < Decimal::ZERO {
            return Err(InventoryError::invalid_quantity(format!(
                "adjustment target cannot be negative, got {target}"
            )));
        }

        self.quantity = target;
        self.touch(now);
        Ok(())
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.last_movement_at = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn test_item() -> StockItem {
        StockItem::empty(TenantId::new(), ProductId::new(), WarehouseId::new(), Utc::now())
    }

    fn stocked_item(quantity: i64) -> StockItem {
        let mut item = test_item();
        item.quantity = Decimal::from(quantity);
        item
    }

    #[test]
    fn reserve_then_release_restores_availability() {
        let mut item = stocked_item(100);
        let before = item.available_quantity();

        item.reserve(Decimal::from(30), Utc::now()).unwrap();
        assert_eq!(item.available_quantity(), Decimal::from(70));
        assert_eq!(item.quantity, Decimal::from(100));

        let released = item.release(Decimal::from(30), Utc::now()).unwrap();
        assert_eq!(released, Decimal::from(30));
        assert_eq!(item.available_quantity(), before);
    }

    #[test]
    fn reserve_beyond_availability_is_rejected_without_mutation() {
        let mut item = stocked_item(10);
        item.reserve(Decimal::from(4), Utc::now()).unwrap();

        let err = item.reserve(Decimal::from(7), Utc::now()).unwrap_err();
        assert_eq!(
            err,
            InventoryError::insufficient_stock(Decimal::from(7), Decimal::from(6))
        );
        assert_eq!(item.reserved_quantity, Decimal::from(4));
        assert_eq!(item.quantity, Decimal::from(10));
    }

    #[test]
    fn over_release_clamps_at_zero() {
        let mut item = stocked_item(10);
        item.reserve(Decimal::from(5), Utc::now()).unwrap();

        let released = item.release(Decimal::from(8), Utc::now()).unwrap();
        assert_eq!(released, Decimal::from(5));
        assert_eq!(item.reserved_quantity, Decimal::ZERO);
    }

    #[test]
    fn zero_quantity_operations_are_rejected() {
        let mut item = stocked_item(10);
        let now = Utc::now();

        assert!(matches!(
            item.reserve(Decimal::ZERO, now),
            Err(InventoryError::InvalidQuantity(_))
        ));
        assert!(matches!(
            item.release(Decimal::ZERO, now),
            Err(InventoryError::InvalidQuantity(_))
        ));
        assert!(matches!(
            item.receive(Decimal::ZERO, None, now),
            Err(InventoryError::InvalidQuantity(_))
        ));
        assert!(matches!(
            item.issue(Decimal::from(-1), now),
            Err(InventoryError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn receive_blends_weighted_average_cost() {
        let mut item = test_item();
        let now = Utc::now();

        item.receive(Decimal::from(10), Some(Decimal::new(200, 2)), now)
            .unwrap();
        assert_eq!(item.average_cost, Decimal::new(200, 2));
        assert_eq!(item.last_cost, Decimal::new(200, 2));

        item.receive(Decimal::from(10), Some(Decimal::new(400, 2)), now)
            .unwrap();
        assert_eq!(item.average_cost, Decimal::new(300, 2));
        assert_eq!(item.last_cost, Decimal::new(400, 2));
        assert_eq!(item.quantity, Decimal::from(20));
    }

    #[test]
    fn receive_without_cost_leaves_cost_basis_alone() {
        let mut item = stocked_item(5);
        item.average_cost = Decimal::new(150, 2);
        item.last_cost = Decimal::new(175, 2);

        item.receive(Decimal::from(5), None, Utc::now()).unwrap();
        assert_eq!(item.quantity, Decimal::from(10));
        assert_eq!(item.average_cost, Decimal::new(150, 2));
        assert_eq!(item.last_cost, Decimal::new(175, 2));
    }

    #[test]
    fn issue_respects_reservations() {
        let mut item = stocked_item(10);
        item.reserve(Decimal::from(6), Utc::now()).unwrap();

        // Only 4 available even though 10 are physically present.
        let err = item.issue(Decimal::from(5), Utc::now()).unwrap_err();
        assert_eq!(
            err,
            InventoryError::insufficient_stock(Decimal::from(5), Decimal::from(4))
        );

        item.issue(Decimal::from(4), Utc::now()).unwrap();
        assert_eq!(item.quantity, Decimal::from(6));
    }

    #[test]
    fn adjust_to_sets_absolute_quantity_and_keeps_reservations() {
        let mut item = stocked_item(50);
        item.reserve(Decimal::from(20), Utc::now()).unwrap();

        item.adjust_to(Decimal::from(5), Utc::now()).unwrap();
        assert_eq!(item.quantity, Decimal::from(5));
        // Reservations are deliberately not reconciled here.
        assert_eq!(item.reserved_quantity, Decimal::from(20));
    }

    #[test]
    fn reorder_point_falls_back_to_min_stock() {
        let mut item = stocked_item(15);
        item.min_stock = Decimal::from(10);
        assert_eq!(item.effective_reorder_point(), Decimal::from(10));
        assert!(!item.needs_reorder());

        item.reorder_point = Some(Decimal::from(20));
        assert_eq!(item.effective_reorder_point(), Decimal::from(20));
        assert!(item.needs_reorder());
    }

    #[test]
    fn overstock_requires_max_stock() {
        let mut item = stocked_item(100);
        assert!(!item.is_overstocked());

        item.max_stock = Some(Decimal::from(80));
        assert!(item.is_overstocked());

        item.max_stock = Some(Decimal::from(100));
        assert!(!item.is_overstocked());
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: for any sequence of reserve/release attempts, the
        /// reservation invariant `0 <= reserved <= quantity` holds and
        /// available quantity is exactly `quantity - reserved`.
        #[test]
        fn reservation_invariant_holds(
            stock in 0i64..10_000,
            ops in prop::collection::vec((prop::bool::ANY, 1i64..5_000), 0..32),
        ) {
            let mut item = stocked_item(stock);
            let now = Utc::now();

            for (is_reserve, qty) in ops {
                let qty = Decimal::from(qty);
                if is_reserve {
                    // May fail with InsufficientStock; state must stay valid either way.
                    let _ = item.reserve(qty, now);
                } else {
                    item.release(qty, now).unwrap();
                }

                prop_assert!(item.reserved_quantity >= Decimal::ZERO);
                prop_assert!(item.reserved_quantity <= item.quantity);
                prop_assert_eq!(
                    item.available_quantity(),
                    item.quantity - item.reserved_quantity
                );
            }
        }
    }
}

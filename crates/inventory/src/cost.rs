//! Weighted-average cost recomputation (Cost Engine).

use rust_decimal::Decimal;

/// Blend the existing cost basis with an inbound receipt.
///
/// Returns the new average cost after receiving `quantity_in` units at
/// `unit_cost`, given `quantity_before` units already held at `average_before`.
/// When nothing was held before, the incoming cost becomes the average
/// directly (no blend against a zero denominator).
pub fn weighted_average(
    quantity_before: Decimal,
    average_before: Decimal,
    quantity_in: Decimal,
    unit_cost: Decimal,
) -> Decimal {
    let total_quantity = quantity_before + quantity_in;
    if quantity_before <= Decimal::ZERO || total_quantity <= Decimal::ZERO {
        return unit_cost;
    }

    let held_value = quantity_before * average_before;
    let incoming_value = quantity_in * unit_cost;
    (held_value + incoming_value) / total_quantity
}

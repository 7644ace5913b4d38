//! Pricing calculator.
//!
//! Totals are summed exactly and rounded once to two decimal places, so the
//! result does not depend on line order.

use crate::error::DomainError;
use crate::value_objects::{Money, Quantity};

/// A priced line: what one unit costs and how many units there are.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceLine {
    pub unit_price: Money,
    pub quantity: Quantity,
}

impl PriceLine {
    pub fn new(unit_price: Money, quantity: Quantity) -> Self {
        Self {
            unit_price,
            quantity,
        }
    }

    /// Unrounded `unit_price * quantity`, or `None` on overflow.
    pub fn subtotal(&self) -> Option<Money> {
        self.unit_price.checked_multiply(self.quantity.get())
    }
}

/// Picks the price a line is charged at.
///
/// A discounted price wins over the list price; with neither the line is free.
pub fn effective_price(list_price: Option<Money>, discounted_price: Option<Money>) -> Money {
    discounted_price.or(list_price).unwrap_or_default()
}

/// Sums `unit_price * quantity` over all lines, rounded to two places.
///
/// An empty input totals `0.00`. Fails with [`DomainError::AmountOutOfRange`]
/// when the arithmetic overflows or the rounded total is not storable.
pub fn compute_total<I>(lines: I) -> Result<Money, DomainError>
where
    I: IntoIterator<Item = PriceLine>,
{
    let mut total = Money::zero();
    for line in lines {
        total = line
            .subtotal()
            .and_then(|subtotal| total.checked_add(subtotal))
            .ok_or(DomainError::AmountOutOfRange)?;
    }

    let total = total.rounded();
    if !total.is_storable() {
        return Err(DomainError::AmountOutOfRange);
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qty(n: i64) -> Quantity {
        Quantity::new(n).unwrap()
    }

    fn money(s: &str) -> Money {
        s.parse().unwrap()
    }

    #[test]
    fn empty_total_is_zero() {
        assert_eq!(compute_total([]).unwrap().to_string(), "0.00");
    }

    #[test]
    fn list_price_times_quantity() {
        let total = compute_total([PriceLine::new(money("10.00"), qty(3))]).unwrap();
        assert_eq!(total.to_string(), "30.00");
    }

    #[test]
    fn discount_wins_over_list_price() {
        let unit = effective_price(Some(money("10.00")), Some(money("8.50")));
        let total = compute_total([PriceLine::new(unit, qty(3))]).unwrap();
        assert_eq!(total.to_string(), "25.50");
    }

    #[test]
    fn missing_prices_are_free() {
        assert!(effective_price(None, None).is_zero());
        assert_eq!(effective_price(None, Some(money("2"))), money("2"));
    }

    #[test]
    fn total_is_order_independent() {
        let lines = vec![
            PriceLine::new(money("0.333"), qty(7)),
            PriceLine::new(money("19.99"), qty(2)),
            PriceLine::new(money("0.005"), qty(1)),
            PriceLine::new(money("5.10"), qty(13)),
        ];

        let forward = compute_total(lines.clone());
        let mut reversed = lines.clone();
        reversed.reverse();
        let mut rotated = lines;
        rotated.rotate_left(2);

        assert_eq!(forward, compute_total(reversed));
        assert_eq!(forward, compute_total(rotated));
        assert!(forward.is_ok());
    }

    #[test]
    fn rounding_happens_once_on_the_sum() {
        // Each line alone rounds down to 0.00; the exact sum rounds to 0.01.
        let lines = [
            PriceLine::new(money("0.004"), qty(1)),
            PriceLine::new(money("0.004"), qty(1)),
        ];
        assert_eq!(compute_total(lines).unwrap().to_string(), "0.01");
    }

    #[test]
    fn overflowing_line_is_out_of_range() {
        let lines = [PriceLine::new(money("10000000000000000000000"), qty(100_000_000))];
        assert_eq!(compute_total(lines), Err(DomainError::AmountOutOfRange));
    }

    #[test]
    fn overflowing_sum_is_out_of_range() {
        let big = money("70000000000000000000000000000");
        let lines = [PriceLine::new(big, qty(1)), PriceLine::new(big, qty(1))];
        assert_eq!(compute_total(lines), Err(DomainError::AmountOutOfRange));
    }

    #[test]
    fn total_above_storable_limit_is_out_of_range() {
        let lines = [PriceLine::new(Money::largest(), qty(2))];
        assert_eq!(compute_total(lines), Err(DomainError::AmountOutOfRange));
    }

    #[test]
    fn total_at_storable_limit_is_accepted() {
        let lines = [
            PriceLine::new(money("9999999999.98"), qty(1)),
            PriceLine::new(money("0.01"), qty(1)),
        ];
        assert_eq!(compute_total(lines), Ok(Money::largest()));
    }
}

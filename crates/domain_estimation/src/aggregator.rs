//! Aggregation of line items into estimate totals

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, Money, MoneyError, Rate};

use crate::error::EstimationError;
use crate::line_item::LineItem;

/// Aggregate totals over all line items of an estimation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimateTotals {
    pub parts_cost: Money,
    pub labor_cost: Money,
    pub paint_cost: Money,
    pub labor_hours: Decimal,
    /// `(parts + labor + paint) * markup_percentage / 100`, rounded to the currency
    pub markup: Money,
    pub markup_percentage: Decimal,
    pub total_cost: Money,
}

impl EstimateTotals {
    /// Sums the line items and applies the markup
    ///
    /// An empty slice yields all-zero totals.
    pub fn aggregate(
        items: &[LineItem],
        markup_percentage: Decimal,
        currency: Currency,
    ) -> Result<Self, EstimationError> {
        let parts_cost = Money::sum(items.iter().map(|i| &i.parts_cost), currency)?;
        let labor_cost = Money::sum(items.iter().map(|i| &i.labor_cost), currency)?;
        let paint_cost = Money::sum(items.iter().map(|i| &i.paint_cost), currency)?;
        let labor_hours = items
            .iter()
            .try_fold(Decimal::ZERO, |acc, i| acc.checked_add(i.labor_hours))
            .ok_or(MoneyError::Overflow("labor hours"))?;

        let subtotal = parts_cost.checked_add(&labor_cost)?.checked_add(&paint_cost)?;
        let markup = Rate::from_percentage(markup_percentage)
            .apply(&subtotal)?
            .round_to_currency();
        let total_cost = subtotal.checked_add(&markup)?;

        Ok(Self {
            parts_cost,
            labor_cost,
            paint_cost,
            labor_hours,
            markup,
            markup_percentage,
            total_cost,
        })
    }

    /// Parts, labor and paint before markup
    pub fn subtotal(&self) -> Money {
        self.parts_cost + self.labor_cost + self.paint_cost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::damage::{DamageType, Severity};
    use rust_decimal_macros::dec;

    fn item(parts: Decimal, hours: Decimal, rate: Decimal, paint: Decimal) -> LineItem {
        let parts_cost = Money::new(parts, Currency::USD);
        let labor_cost = Money::new(hours * rate, Currency::USD);
        let paint_cost = Money::new(paint, Currency::USD);
        LineItem {
            damage_type: DamageType::DamagedBumper,
            severity: Severity::Moderate,
            affected_part: None,
            parts_cost,
            labor_hours: hours,
            labor_cost,
            paint_cost,
            subtotal: parts_cost + labor_cost + paint_cost,
        }
    }

    #[test]
    fn test_single_item_markup() {
        let items = vec![item(dec!(400), dec!(3.0), dec!(75), dec!(400))];
        let totals = EstimateTotals::aggregate(&items, dec!(20), Currency::USD).unwrap();

        assert_eq!(totals.subtotal().amount(), dec!(1025));
        assert_eq!(totals.markup.amount(), dec!(205));
        assert_eq!(totals.total_cost.amount(), dec!(1230));
        assert_eq!(totals.labor_hours, dec!(3.0));
    }

    #[test]
    fn test_empty_items_are_all_zero() {
        let totals = EstimateTotals::aggregate(&[], dec!(20), Currency::USD).unwrap();

        assert!(totals.parts_cost.is_zero());
        assert!(totals.labor_cost.is_zero());
        assert!(totals.paint_cost.is_zero());
        assert!(totals.markup.is_zero());
        assert!(totals.total_cost.is_zero());
        assert_eq!(totals.labor_hours, Decimal::ZERO);
    }

    #[test]
    fn test_markup_is_rounded_to_cents() {
        let items = vec![item(dec!(10.01), dec!(0), dec!(75), dec!(0))];
        let totals = EstimateTotals::aggregate(&items, dec!(15), Currency::USD).unwrap();

        // 10.01 * 0.15 = 1.5015
        assert_eq!(totals.markup.amount(), dec!(1.50));
        assert_eq!(totals.total_cost.amount(), dec!(11.51));
    }

    #[test]
    fn test_mixed_currency_items_rejected() {
        let mut eur = item(dec!(100), dec!(1), dec!(75), dec!(0));
        eur.parts_cost = Money::new(dec!(100), Currency::EUR);
        let result = EstimateTotals::aggregate(&[eur], dec!(20), Currency::USD);
        assert!(matches!(result, Err(EstimationError::Financial(_))));
    }
}

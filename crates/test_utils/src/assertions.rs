//! Custom Test Assertions
//!
//! Assertion helpers for estimation types that give more meaningful failure
//! messages than a bare `assert_eq!`.

use core_kernel::Money;
use domain_estimation::{Estimation, LineItem};
use rust_decimal::Decimal;

/// Asserts that two Money values are approximately equal within a tolerance
///
/// # Panics
///
/// Panics if the currencies don't match or the amounts differ by more than tolerance
pub fn assert_money_approx_eq(actual: &Money, expected: &Money, tolerance: Decimal) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );

    let diff = (actual.amount() - expected.amount()).abs();
    assert!(
        diff <= tolerance,
        "Money amounts differ by more than tolerance: actual={}, expected={}, diff={}, tolerance={}",
        actual.amount(),
        expected.amount(),
        diff,
        tolerance
    );
}

/// Asserts that a Money value is zero
pub fn assert_money_zero(money: &Money) {
    assert!(money.is_zero(), "Expected zero money, got {}", money);
}

/// Asserts that a Money value has the given amount
pub fn assert_amount(money: &Money, expected: Decimal) {
    assert_eq!(
        money.amount(),
        expected,
        "Expected amount {}, got {}",
        expected,
        money
    );
}

/// Asserts that money values sum to a total
pub fn assert_money_sum_equals(parts: &[Money], total: &Money) {
    let sum = Money::sum(parts, total.currency()).expect("Currency mismatch in sum");
    assert_eq!(
        sum.amount(),
        total.amount(),
        "Sum of parts ({}) doesn't equal total ({})",
        sum.amount(),
        total.amount()
    );
}

/// Asserts that every arithmetic relationship of an estimation holds
///
/// Checks each line item subtotal, labor cost against the labor rate, the
/// aggregate component sums, the markup and the total.
pub fn assert_estimation_invariants(estimation: &Estimation) {
    if let Err(violation) = estimation.verify_invariants() {
        panic!("Estimation {} violates invariant: {}", estimation.id(), violation);
    }

    let items = estimation.line_items();
    assert_money_sum_equals(&collect(items, |i| i.parts_cost), &estimation.parts_cost());
    assert_money_sum_equals(&collect(items, |i| i.labor_cost), &estimation.labor_cost());
    assert_money_sum_equals(&collect(items, |i| i.paint_cost), &estimation.paint_cost());

    let hours: Decimal = items.iter().map(|i| i.labor_hours).sum();
    assert_eq!(
        hours,
        estimation.estimated_labor_hours(),
        "Labor hours of line items ({}) don't match estimation ({})",
        hours,
        estimation.estimated_labor_hours()
    );
}

/// Asserts that no line item carries a paint cost
pub fn assert_no_paint(estimation: &Estimation) {
    for item in estimation.line_items() {
        assert!(
            item.paint_cost.is_zero(),
            "Line item {}/{} has paint cost {}",
            item.damage_type,
            item.severity,
            item.paint_cost
        );
    }
    assert_money_zero(&estimation.paint_cost());
}

fn collect(items: &[LineItem], field: impl Fn(&LineItem) -> Money) -> Vec<Money> {
    items.iter().map(field).collect()
}

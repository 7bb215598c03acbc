//! Property-Based Test Generators
//!
//! Proptest strategies for detections, damages and overrides that respect
//! the engine's input ranges.

use core_kernel::DetectionId;
use domain_estimation::{BoundingBox, DamageInstance, DamageType, Detection, Severity};
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for generating any damage type
pub fn damage_type_strategy() -> impl Strategy<Value = DamageType> {
    proptest::sample::select(DamageType::ALL.to_vec())
}

/// Strategy for generating any severity
pub fn severity_strategy() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Minor),
        Just(Severity::Moderate),
        Just(Severity::Severe),
    ]
}

/// Strategy for generating confidence scores in `[0, 1]`
pub fn confidence_strategy() -> impl Strategy<Value = f64> {
    (0u32..=1000u32).prop_map(|n| n as f64 / 1000.0)
}

/// Strategy for generating normalized bounding boxes that stay on the image
pub fn bbox_strategy() -> impl Strategy<Value = BoundingBox> {
    (0u32..=100u32, 0u32..=100u32)
        .prop_flat_map(|(x, y)| (Just(x), Just(y), 0u32..=(100 - x), 0u32..=(100 - y)))
        .prop_map(|(x, y, w, h)| BoundingBox {
            x: x as f64 / 100.0,
            y: y as f64 / 100.0,
            width: w as f64 / 100.0,
            height: h as f64 / 100.0,
        })
}

/// Strategy for generating damages, with or without a detector severity
pub fn damage_strategy() -> impl Strategy<Value = DamageInstance> {
    (
        damage_type_strategy(),
        proptest::option::of(severity_strategy()),
        confidence_strategy(),
        bbox_strategy(),
    )
        .prop_map(|(damage_type, severity, confidence, bbox)| DamageInstance {
            id: Default::default(),
            damage_type,
            severity,
            confidence,
            bbox,
            affected_part: None,
        })
}

/// Strategy for generating detections with up to `max_damages` damages
pub fn detection_strategy(max_damages: usize) -> impl Strategy<Value = Detection> {
    proptest::collection::vec(damage_strategy(), 0..=max_damages)
        .prop_map(|damages| Detection::new(DetectionId::new(), damages))
}

/// Strategy for generating valid labor rates (0.01 to 500.00)
pub fn labor_rate_strategy() -> impl Strategy<Value = Decimal> {
    (1i64..=50_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy for generating valid markup percentages (0% to 100%)
pub fn markup_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..=10_000i64).prop_map(|n| Decimal::new(n, 2))
}

/// Strategy for generating a labor rate and a positive scaling factor
pub fn scaled_labor_rate_strategy() -> impl Strategy<Value = (Decimal, Decimal)> {
    (labor_rate_strategy(), 1i64..=10i64).prop_map(|(rate, k)| (rate, Decimal::from(k)))
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn generated_boxes_are_valid(bbox in bbox_strategy()) {
            prop_assert!(bbox.validate().is_ok());
            prop_assert!(bbox.x + bbox.width <= 1.0 + 1e-9);
        }

        #[test]
        fn generated_damages_are_valid(damage in damage_strategy()) {
            prop_assert!(damage.validate().is_ok());
        }

        #[test]
        fn markup_is_within_bounds(markup in markup_strategy()) {
            prop_assert!(markup >= Decimal::ZERO);
            prop_assert!(markup <= Decimal::ONE_HUNDRED);
        }

        #[test]
        fn labor_rate_is_positive(rate in labor_rate_strategy()) {
            prop_assert!(rate > Decimal::ZERO);
        }
    }
}

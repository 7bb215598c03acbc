//! Pre-built Test Fixtures
//!
//! Ready-to-use values for the estimation test suite. The damages here match
//! the worked examples used throughout the tests: a moderate bumper priced
//! at $1,025 before markup and a minor dent priced at $87.50.

use core_kernel::{Currency, DetectionId, Money};
use domain_estimation::{
    BoundingBox, CostRule, CostRuleTable, DamageInstance, DamageType, Detection,
    EstimationDefaults, OverrideResolver, Severity, SeverityClassifier,
};
use rust_decimal_macros::dec;
use uuid::Uuid;

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// The default labor rate
    pub fn usd_labor_rate() -> Money {
        Money::new(dec!(75.00), Currency::USD)
    }

    pub fn usd_zero() -> Money {
        Money::zero(Currency::USD)
    }

    /// A EUR amount for currency mismatch tests
    pub fn eur_100() -> Money {
        Money::new(dec!(100.00), Currency::EUR)
    }
}

/// Fixture for bounding boxes of known area
pub struct BoxFixtures;

impl BoxFixtures {
    /// Area 0.01
    pub fn small() -> BoundingBox {
        BoundingBox { x: 0.40, y: 0.40, width: 0.10, height: 0.10 }
    }

    /// Area 0.09
    pub fn medium() -> BoundingBox {
        BoundingBox { x: 0.10, y: 0.50, width: 0.30, height: 0.30 }
    }

    /// Area 0.25
    pub fn large() -> BoundingBox {
        BoundingBox { x: 0.00, y: 0.25, width: 0.50, height: 0.50 }
    }
}

/// Fixture for damage instances
pub struct DamageFixtures;

impl DamageFixtures {
    /// Moderate bumper damage: parts 400, 3.0h, paint 400 in the standard table
    pub fn moderate_bumper() -> DamageInstance {
        DamageInstance {
            id: Default::default(),
            damage_type: DamageType::DamagedBumper,
            severity: Some(Severity::Moderate),
            confidence: 0.91,
            bbox: BoxFixtures::medium(),
            affected_part: Some("bumper".to_string()),
        }
    }

    /// Minor dent: parts 50, 0.5h, no paint in the standard table
    pub fn minor_dent() -> DamageInstance {
        DamageInstance {
            id: Default::default(),
            damage_type: DamageType::DentOrScratch,
            severity: Some(Severity::Minor),
            confidence: 0.74,
            bbox: BoxFixtures::small(),
            affected_part: None,
        }
    }

    /// A damage without a detector severity, classified from its box
    pub fn unclassified(damage_type: DamageType, bbox: BoundingBox) -> DamageInstance {
        DamageInstance {
            id: Default::default(),
            damage_type,
            severity: None,
            confidence: 0.85,
            bbox,
            affected_part: None,
        }
    }
}

/// Fixture for detections
pub struct DetectionFixtures;

impl DetectionFixtures {
    /// One moderate bumper damage
    pub fn single_bumper() -> Detection {
        Detection::new(DetectionId::new(), vec![DamageFixtures::moderate_bumper()])
    }

    /// A moderate bumper and a minor dent
    pub fn bumper_and_dent() -> Detection {
        Detection::new(
            DetectionId::new(),
            vec![DamageFixtures::moderate_bumper(), DamageFixtures::minor_dent()],
        )
    }

    /// A detection with no damages
    pub fn empty() -> Detection {
        Detection::new(DetectionId::new(), Vec::new())
    }
}

/// Fixture for engine configuration
pub struct EngineFixtures;

impl EngineFixtures {
    pub fn standard_table() -> CostRuleTable {
        CostRuleTable::standard(Currency::USD)
    }

    /// A table that only prices moderate bumpers
    pub fn bumper_only_table() -> CostRuleTable {
        CostRuleTable::builder(Currency::USD)
            .rule(
                DamageType::DamagedBumper,
                Severity::Moderate,
                CostRule {
                    parts_cost: Money::new(dec!(400), Currency::USD),
                    labor_hours: dec!(3.0),
                    paint_cost: Money::new(dec!(400), Currency::USD),
                },
            )
            .build()
    }

    pub fn classifier() -> SeverityClassifier {
        SeverityClassifier::default()
    }

    pub fn resolver() -> OverrideResolver {
        OverrideResolver::new(EstimationDefaults::default())
            .expect("default estimation settings are valid")
    }
}

/// Fixture for identifiers with stable values
pub struct IdFixtures;

impl IdFixtures {
    pub fn detection_id() -> DetectionId {
        DetectionId::from_uuid(Uuid::from_u128(0x0190_8c7e_0000_7000_8000_0000_0000_0001))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixture_boxes_are_valid() {
        for bbox in [BoxFixtures::small(), BoxFixtures::medium(), BoxFixtures::large()] {
            assert!(bbox.validate().is_ok());
        }
    }

    #[test]
    fn fixture_damages_are_priced_by_standard_table() {
        let table = EngineFixtures::standard_table();
        for damage in DetectionFixtures::bumper_and_dent().damages {
            let severity = damage.severity.expect("fixtures carry a severity");
            assert!(table.lookup(damage.damage_type, severity).is_ok());
        }
    }
}

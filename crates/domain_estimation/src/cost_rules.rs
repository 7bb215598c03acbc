//! Cost rule table
//!
//! The table maps every `(DamageType, Severity)` pair to the base costs of
//! repairing it. It is loaded once when the process starts, wrapped in an
//! `Arc`, and never mutated afterwards; lookups therefore need no locking.
//!
//! A missing entry is a configuration defect. `lookup` reports it as
//! `CostRuleMissing` rather than substituting a generic rule.
//!
//! # File format
//!
//! ```json
//! {
//!   "damaged_bumper": {
//!     "minor":    { "parts": 100, "labor_hours": 2.0, "paint": 200 },
//!     "moderate": { "parts": 400, "labor_hours": 3.0, "paint": 400 }
//!   }
//! }
//! ```

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use tracing::info;

use core_kernel::{Currency, Money};

use crate::damage::{DamageType, Severity};
use crate::error::EstimationError;

/// Base costs for repairing one damage of a given type and severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostRule {
    pub parts_cost: Money,
    pub labor_hours: Decimal,
    pub paint_cost: Money,
}

impl CostRule {
    /// Creates a rule, rejecting negative costs or hours
    ///
    /// Hours are kept to four decimal places like money amounts.
    pub fn new(
        parts_cost: Money,
        labor_hours: Decimal,
        paint_cost: Money,
    ) -> Result<Self, EstimationError> {
        if parts_cost.is_negative() || paint_cost.is_negative() || labor_hours < Decimal::ZERO {
            return Err(EstimationError::CostTableLoad(format!(
                "cost rule values must be non-negative (parts={}, labor_hours={}, paint={})",
                parts_cost.amount(),
                labor_hours,
                paint_cost.amount()
            )));
        }
        Ok(Self {
            parts_cost,
            labor_hours: labor_hours.round_dp(4),
            paint_cost,
        })
    }
}

/// One entry as it appears in a cost table file
#[derive(Debug, Deserialize)]
struct CostRuleEntry {
    parts: Decimal,
    labor_hours: Decimal,
    paint: Decimal,
}

/// Immutable mapping from `(DamageType, Severity)` to `CostRule`
#[derive(Debug, Clone, PartialEq)]
pub struct CostRuleTable {
    currency: Currency,
    rules: HashMap<(DamageType, Severity), CostRule>,
}

impl CostRuleTable {
    /// Starts building a table in the given currency
    pub fn builder(currency: Currency) -> CostRuleTableBuilder {
        CostRuleTableBuilder {
            currency,
            rules: HashMap::new(),
        }
    }

    /// Looks up the rule for a damage type and severity
    ///
    /// # Errors
    ///
    /// Returns `CostRuleMissing` when the table has no entry for the pair
    pub fn lookup(
        &self,
        damage_type: DamageType,
        severity: Severity,
    ) -> Result<&CostRule, EstimationError> {
        self.rules
            .get(&(damage_type, severity))
            .ok_or(EstimationError::CostRuleMissing {
                damage_type,
                severity,
            })
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Iterates over all rules in a stable order
    pub fn iter(&self) -> impl Iterator<Item = ((DamageType, Severity), &CostRule)> {
        let ordered: BTreeMap<_, _> = self.rules.iter().map(|(k, v)| (*k, v)).collect();
        ordered.into_iter()
    }

    /// Parses a cost table from its JSON representation
    ///
    /// Unknown damage types or severities in the document are rejected.
    pub fn from_json_str(json: &str, currency: Currency) -> Result<Self, EstimationError> {
        let raw: BTreeMap<String, BTreeMap<String, CostRuleEntry>> = serde_json::from_str(json)
            .map_err(|e| EstimationError::CostTableLoad(e.to_string()))?;

        let mut builder = Self::builder(currency);
        for (type_key, by_severity) in raw {
            let damage_type: DamageType = type_key
                .parse()
                .map_err(|e: EstimationError| EstimationError::CostTableLoad(e.to_string()))?;
            for (severity_key, entry) in by_severity {
                let severity: Severity = severity_key
                    .parse()
                    .map_err(|e: EstimationError| EstimationError::CostTableLoad(e.to_string()))?;
                builder = builder.rule(
                    damage_type,
                    severity,
                    CostRule::new(
                        Money::new(entry.parts, currency),
                        entry.labor_hours,
                        Money::new(entry.paint, currency),
                    )?,
                );
            }
        }

        Ok(builder.build())
    }

    /// Loads a cost table from a JSON file
    pub fn from_path(path: impl AsRef<Path>, currency: Currency) -> Result<Self, EstimationError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            EstimationError::CostTableLoad(format!("{}: {}", path.display(), e))
        })?;
        let table = Self::from_json_str(&contents, currency)?;
        info!(path = %path.display(), rules = table.len(), "Loaded cost table");
        Ok(table)
    }

    /// The built-in table covering all 33 damage/severity pairs
    pub fn standard(currency: Currency) -> Self {
        use DamageType::*;

        // (type, [minor, moderate, severe] as (parts, labor_hours, paint))
        let entries: [(DamageType, [(Decimal, Decimal, Decimal); 3]); 11] = [
            (DamagedHeadLight, [(dec!(150), dec!(0.5), dec!(0)), (dec!(250), dec!(1.0), dec!(0)), (dec!(400), dec!(1.5), dec!(0))]),
            (DamagedHood, [(dec!(100), dec!(1.5), dec!(150)), (dec!(300), dec!(3.0), dec!(300)), (dec!(700), dec!(5.0), dec!(500))]),
            (DamagedTrunk, [(dec!(100), dec!(1.5), dec!(150)), (dec!(300), dec!(3.0), dec!(300)), (dec!(650), dec!(5.0), dec!(500))]),
            (DamagedWindow, [(dec!(150), dec!(1.0), dec!(0)), (dec!(250), dec!(1.5), dec!(0)), (dec!(400), dec!(2.0), dec!(0))]),
            (DamagedWindscreen, [(dec!(300), dec!(2.0), dec!(0)), (dec!(500), dec!(3.0), dec!(0)), (dec!(800), dec!(4.0), dec!(0))]),
            (DamagedBumper, [(dec!(100), dec!(2.0), dec!(200)), (dec!(400), dec!(3.0), dec!(400)), (dec!(600), dec!(6.0), dec!(600))]),
            (DamagedDoor, [(dec!(150), dec!(2.0), dec!(200)), (dec!(350), dec!(4.0), dec!(350)), (dec!(800), dec!(6.0), dec!(500))]),
            (DamagedFender, [(dec!(100), dec!(1.5), dec!(150)), (dec!(250), dec!(3.0), dec!(300)), (dec!(500), dec!(5.0), dec!(450))]),
            (DamagedMirrorGlass, [(dec!(100), dec!(0.5), dec!(0)), (dec!(200), dec!(1.0), dec!(50)), (dec!(350), dec!(1.5), dec!(100))]),
            (DentOrScratch, [(dec!(50), dec!(0.5), dec!(0)), (dec!(100), dec!(2.0), dec!(250)), (dec!(250), dec!(4.0), dec!(400))]),
            (MissingGrille, [(dec!(80), dec!(0.5), dec!(0)), (dec!(150), dec!(1.0), dec!(0)), (dec!(300), dec!(1.5), dec!(50))]),
        ];

        let mut builder = Self::builder(currency);
        for (damage_type, costs) in entries {
            for (severity, (parts, hours, paint)) in Severity::ALL.into_iter().zip(costs) {
                builder = builder.rule(
                    damage_type,
                    severity,
                    CostRule {
                        parts_cost: Money::new(parts, currency),
                        labor_hours: hours,
                        paint_cost: Money::new(paint, currency),
                    },
                );
            }
        }
        builder.build()
    }
}

/// Builder for a `CostRuleTable`; the table itself has no mutators
#[derive(Debug)]
pub struct CostRuleTableBuilder {
    currency: Currency,
    rules: HashMap<(DamageType, Severity), CostRule>,
}

impl CostRuleTableBuilder {
    /// Adds or replaces the rule for a pair
    pub fn rule(mut self, damage_type: DamageType, severity: Severity, rule: CostRule) -> Self {
        self.rules.insert((damage_type, severity), rule);
        self
    }

    pub fn build(self) -> CostRuleTable {
        CostRuleTable {
            currency: self.currency,
            rules: self.rules,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_table_is_complete() {
        let table = CostRuleTable::standard(Currency::USD);
        assert_eq!(table.len(), 33);
        for damage_type in DamageType::ALL {
            for severity in Severity::ALL {
                assert!(table.lookup(damage_type, severity).is_ok());
            }
        }
    }

    #[test]
    fn test_standard_bumper_rule() {
        let table = CostRuleTable::standard(Currency::USD);
        let rule = table.lookup(DamageType::DamagedBumper, Severity::Moderate).unwrap();
        assert_eq!(rule.parts_cost.amount(), dec!(400));
        assert_eq!(rule.labor_hours, dec!(3.0));
        assert_eq!(rule.paint_cost.amount(), dec!(400));
    }

    #[test]
    fn test_missing_rule_is_an_error() {
        let table = CostRuleTable::builder(Currency::USD).build();
        let result = table.lookup(DamageType::DamagedDoor, Severity::Severe);
        assert!(matches!(
            result,
            Err(EstimationError::CostRuleMissing {
                damage_type: DamageType::DamagedDoor,
                severity: Severity::Severe,
            })
        ));
    }

    #[test]
    fn test_from_json_str() {
        let json = r#"{
            "damaged_bumper": {
                "moderate": { "parts": 400, "labor_hours": 3.0, "paint": 400 }
            },
            "dent_or_scratch": {
                "minor": { "parts": 50, "labor_hours": 0.5, "paint": 0 }
            }
        }"#;
        let table = CostRuleTable::from_json_str(json, Currency::EUR).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table.currency(), Currency::EUR);
        let rule = table.lookup(DamageType::DentOrScratch, Severity::Minor).unwrap();
        assert_eq!(rule.labor_hours, dec!(0.5));
        assert_eq!(rule.parts_cost.currency(), Currency::EUR);
        assert!(table.lookup(DamageType::DentOrScratch, Severity::Severe).is_err());
    }

    #[test]
    fn test_from_json_rejects_unknown_keys() {
        let unknown_type = r#"{ "flat_tire": { "minor": { "parts": 1, "labor_hours": 1, "paint": 1 } } }"#;
        assert!(matches!(
            CostRuleTable::from_json_str(unknown_type, Currency::USD),
            Err(EstimationError::CostTableLoad(_))
        ));

        let unknown_severity = r#"{ "damaged_door": { "extreme": { "parts": 1, "labor_hours": 1, "paint": 1 } } }"#;
        assert!(matches!(
            CostRuleTable::from_json_str(unknown_severity, Currency::USD),
            Err(EstimationError::CostTableLoad(_))
        ));
    }

    #[test]
    fn test_from_json_rejects_negative_values() {
        let json = r#"{ "damaged_door": { "minor": { "parts": -1, "labor_hours": 1, "paint": 1 } } }"#;
        assert!(CostRuleTable::from_json_str(json, Currency::USD).is_err());
    }

    #[test]
    fn test_from_json_keeps_hours_to_four_places() {
        let json = r#"{ "damaged_door": { "minor": { "parts": 100, "labor_hours": "1.234567", "paint": 0 } } }"#;
        let table = CostRuleTable::from_json_str(json, Currency::USD).unwrap();
        let rule = table.lookup(DamageType::DamagedDoor, Severity::Minor).unwrap();
        assert_eq!(rule.labor_hours, dec!(1.2346));
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = CostRuleTable::from_path("/nonexistent/damage_costs.json", Currency::USD);
        assert!(matches!(result, Err(EstimationError::CostTableLoad(_))));
    }

    #[test]
    fn test_iter_is_ordered() {
        let table = CostRuleTable::standard(Currency::USD);
        let keys: Vec<_> = table.iter().map(|(k, _)| k).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}

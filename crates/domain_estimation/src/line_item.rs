//! Per-damage cost breakdown

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{Money, MoneyError};

use crate::cost_rules::CostRule;
use crate::damage::{DamageInstance, DamageType, Severity};

/// Cost breakdown for one damage instance within an estimation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub damage_type: DamageType,
    pub severity: Severity,
    pub affected_part: Option<String>,
    pub parts_cost: Money,
    pub labor_hours: Decimal,
    pub labor_cost: Money,
    /// Zero when the request excludes paint
    pub paint_cost: Money,
    pub subtotal: Money,
}

impl LineItem {
    /// Computes the line item for a damage whose severity is already resolved
    ///
    /// `labor_cost = labor_hours * labor_rate` and
    /// `subtotal = parts_cost + labor_cost + paint_cost`.
    pub fn calculate(
        damage: &DamageInstance,
        severity: Severity,
        rule: &CostRule,
        labor_rate: Money,
        include_paint: bool,
    ) -> Result<Self, MoneyError> {
        let parts_cost = rule.parts_cost;
        let labor_cost = labor_rate.multiply(rule.labor_hours)?;
        let paint_cost = if include_paint {
            rule.paint_cost
        } else {
            Money::zero(rule.paint_cost.currency())
        };
        let subtotal = parts_cost.checked_add(&labor_cost)?.checked_add(&paint_cost)?;

        Ok(Self {
            damage_type: damage.damage_type,
            severity,
            affected_part: damage.part(),
            parts_cost,
            labor_hours: rule.labor_hours,
            labor_cost,
            paint_cost,
            subtotal,
        })
    }
}

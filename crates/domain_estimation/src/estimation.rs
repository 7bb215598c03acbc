//! Estimation records
//!
//! An `Estimation` is built once and never modified. Estimating the same
//! detection again produces a new record with its own identifier, so the
//! storage collaborator keeps a history rather than a single mutable slot.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use core_kernel::{DetectionId, EstimationId, Money};

use crate::aggregator::EstimateTotals;
use crate::damage::{Detection, Severity};
use crate::error::EstimationError;
use crate::line_item::LineItem;

/// An itemized repair-cost estimate for one detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Estimation {
    id: EstimationId,
    detection_id: DetectionId,
    parts_cost: Money,
    labor_cost: Money,
    paint_cost: Money,
    markup: Money,
    markup_percentage: Decimal,
    labor_rate: Money,
    estimated_labor_hours: Decimal,
    total_cost: Money,
    line_items: Vec<LineItem>,
    created_at: DateTime<Utc>,
}

impl Estimation {
    pub fn id(&self) -> EstimationId {
        self.id
    }

    pub fn detection_id(&self) -> DetectionId {
        self.detection_id
    }

    pub fn parts_cost(&self) -> Money {
        self.parts_cost
    }

    pub fn labor_cost(&self) -> Money {
        self.labor_cost
    }

    pub fn paint_cost(&self) -> Money {
        self.paint_cost
    }

    pub fn markup(&self) -> Money {
        self.markup
    }

    pub fn markup_percentage(&self) -> Decimal {
        self.markup_percentage
    }

    pub fn labor_rate(&self) -> Money {
        self.labor_rate
    }

    pub fn estimated_labor_hours(&self) -> Decimal {
        self.estimated_labor_hours
    }

    pub fn total_cost(&self) -> Money {
        self.total_cost
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Checks the arithmetic relationships between line items and totals
    ///
    /// Returns a description of the first relationship that does not hold.
    pub fn verify_invariants(&self) -> Result<(), String> {
        for (index, item) in self.line_items.iter().enumerate() {
            let expected_subtotal = item
                .parts_cost
                .checked_add(&item.labor_cost)
                .and_then(|m| m.checked_add(&item.paint_cost))
                .map_err(|e| format!("line item {}: {}", index, e))?;
            if item.subtotal != expected_subtotal {
                return Err(format!(
                    "line item {}: subtotal {} != parts + labor + paint {}",
                    index, item.subtotal, expected_subtotal
                ));
            }
            let expected_labor = self
                .labor_rate
                .multiply(item.labor_hours)
                .map_err(|e| format!("line item {}: {}", index, e))?;
            if item.labor_cost != expected_labor {
                return Err(format!(
                    "line item {}: labor cost {} != hours * rate {}",
                    index, item.labor_cost, expected_labor
                ));
            }
        }

        let subtotal = self
            .parts_cost
            .checked_add(&self.labor_cost)
            .and_then(|m| m.checked_add(&self.paint_cost))
            .map_err(|e| e.to_string())?;
        let expected_markup = subtotal
            .multiply(self.markup_percentage / Decimal::ONE_HUNDRED)
            .map_err(|e| e.to_string())?
            .round_to_currency();
        if self.markup != expected_markup {
            return Err(format!(
                "markup {} != subtotal * percentage {}",
                self.markup, expected_markup
            ));
        }

        let items_total = self
            .line_items
            .iter()
            .try_fold(Money::zero(self.total_cost.currency()), |acc, i| acc.checked_add(&i.subtotal))
            .map_err(|e| e.to_string())?;
        if Ok(self.total_cost) != items_total.checked_add(&self.markup) {
            return Err(format!(
                "total {} != sum of subtotals {} + markup {}",
                self.total_cost, items_total, self.markup
            ));
        }
        Ok(())
    }
}

/// Assembles an `Estimation` from aggregate totals and request metadata
#[derive(Debug, Clone)]
pub struct EstimationBuilder {
    id: EstimationId,
    detection_id: DetectionId,
    labor_rate: Option<Money>,
    totals: Option<EstimateTotals>,
    line_items: Vec<LineItem>,
    created_at: Option<DateTime<Utc>>,
}

impl EstimationBuilder {
    pub fn new(detection_id: DetectionId) -> Self {
        Self {
            id: EstimationId::new_v7(),
            detection_id,
            labor_rate: None,
            totals: None,
            line_items: Vec::new(),
            created_at: None,
        }
    }

    /// Uses an existing identifier, e.g. when reloading from storage
    pub fn id(mut self, id: EstimationId) -> Self {
        self.id = id;
        self
    }

    pub fn labor_rate(mut self, labor_rate: Money) -> Self {
        self.labor_rate = Some(labor_rate);
        self
    }

    pub fn totals(mut self, totals: EstimateTotals) -> Self {
        self.totals = Some(totals);
        self
    }

    pub fn line_items(mut self, line_items: Vec<LineItem>) -> Self {
        self.line_items = line_items;
        self
    }

    /// Overrides the creation timestamp (defaults to now)
    pub fn created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn build(self) -> Result<Estimation, EstimationError> {
        let labor_rate = self
            .labor_rate
            .ok_or(EstimationError::IncompleteEstimation("labor_rate"))?;
        let totals = self
            .totals
            .ok_or(EstimationError::IncompleteEstimation("totals"))?;

        Ok(Estimation {
            id: self.id,
            detection_id: self.detection_id,
            parts_cost: totals.parts_cost,
            labor_cost: totals.labor_cost,
            paint_cost: totals.paint_cost,
            markup: totals.markup,
            markup_percentage: totals.markup_percentage,
            labor_rate,
            estimated_labor_hours: totals.labor_hours,
            total_cost: totals.total_cost,
            line_items: self.line_items,
            created_at: self.created_at.unwrap_or_else(Utc::now),
        })
    }
}

/// Quick overview of a detection and its latest estimate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimationSummary {
    pub detection_id: DetectionId,
    pub total_damages: usize,
    /// Total of the latest estimation, zero when none exists
    pub total_cost: Money,
    pub severity_breakdown: BTreeMap<Severity, usize>,
    pub estimated_repair_time: String,
}

/// Counts damages per resolved severity; all three buckets are always present
pub fn severity_breakdown<I>(severities: I) -> BTreeMap<Severity, usize>
where
    I: IntoIterator<Item = Severity>,
{
    let mut breakdown: BTreeMap<Severity, usize> =
        Severity::ALL.into_iter().map(|s| (s, 0)).collect();
    for severity in severities {
        *breakdown.entry(severity).or_insert(0) += 1;
    }
    breakdown
}

/// Human-readable repair duration for a number of labor hours
pub fn estimate_repair_time(total_hours: Decimal) -> String {
    if total_hours <= Decimal::from(8) {
        "1 day".to_string()
    } else if total_hours <= Decimal::from(16) {
        "2-3 days".to_string()
    } else if total_hours <= Decimal::from(40) {
        "1 week".to_string()
    } else {
        let weeks = (total_hours / Decimal::from(40)).floor() + Decimal::ONE;
        format!("{} weeks", weeks)
    }
}

impl EstimationSummary {
    /// Summarizes a detection given its already-resolved severities
    pub fn new(
        detection: &Detection,
        severities: impl IntoIterator<Item = Severity>,
        latest: Option<&Estimation>,
        currency: core_kernel::Currency,
    ) -> Self {
        let labor_hours = latest
            .map(|e| e.estimated_labor_hours())
            .unwrap_or(Decimal::ZERO);
        Self {
            detection_id: detection.id,
            total_damages: detection.total_damages(),
            total_cost: latest
                .map(|e| e.total_cost())
                .unwrap_or_else(|| Money::zero(currency)),
            severity_breakdown: severity_breakdown(severities),
            estimated_repair_time: estimate_repair_time(labor_hours),
        }
    }
}

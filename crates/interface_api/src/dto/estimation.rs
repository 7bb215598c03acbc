//! Estimation DTOs
//!
//! Amounts are rounded to the currency's minor unit on the way out; the
//! stored estimation keeps its full precision.
//!
//! Each field is rounded on its own. `total_cost` is the stored total
//! rounded, not a sum of rounded parts, so it may differ by a minor unit
//! from the rounded line item subtotals plus `markup`.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use core_kernel::{DetectionId, Money};
use domain_estimation::{Estimation, EstimationRequest, EstimationSummary, LineItem};

fn amount(money: Money) -> Decimal {
    money.round_to_currency().amount()
}

#[derive(Debug, Deserialize)]
pub struct CreateEstimationRequest {
    pub detection_id: Uuid,
    pub include_paint: Option<bool>,
    pub labor_rate_override: Option<Decimal>,
    pub markup_override: Option<Decimal>,
}

impl From<CreateEstimationRequest> for EstimationRequest {
    fn from(dto: CreateEstimationRequest) -> Self {
        let mut request = EstimationRequest::new(DetectionId::from(dto.detection_id))
            .include_paint(dto.include_paint.unwrap_or(true));
        if let Some(rate) = dto.labor_rate_override {
            request = request.labor_rate(rate);
        }
        if let Some(markup) = dto.markup_override {
            request = request.markup(markup);
        }
        request
    }
}

#[derive(Debug, Serialize)]
pub struct LineItemResponse {
    pub damage_type: String,
    pub severity: String,
    pub affected_part: Option<String>,
    pub parts_cost: Decimal,
    pub labor_hours: Decimal,
    pub labor_cost: Decimal,
    pub paint_cost: Decimal,
    pub subtotal: Decimal,
}

impl From<&LineItem> for LineItemResponse {
    fn from(item: &LineItem) -> Self {
        Self {
            damage_type: item.damage_type.to_string(),
            severity: item.severity.to_string(),
            affected_part: item.affected_part.clone(),
            parts_cost: amount(item.parts_cost),
            labor_hours: item.labor_hours,
            labor_cost: amount(item.labor_cost),
            paint_cost: amount(item.paint_cost),
            subtotal: amount(item.subtotal),
        }
    }
}

/// An estimation with every amount rounded independently to the currency
#[derive(Debug, Serialize)]
pub struct EstimationResponse {
    pub id: Uuid,
    pub detection_id: Uuid,
    pub currency: String,
    pub parts_cost: Decimal,
    pub labor_cost: Decimal,
    pub paint_cost: Decimal,
    pub markup: Decimal,
    pub markup_percentage: Decimal,
    pub labor_rate: Decimal,
    pub estimated_labor_hours: Decimal,
    /// The authoritative total: the stored full-precision total, rounded once
    pub total_cost: Decimal,
    pub line_items: Vec<LineItemResponse>,
    pub created_at: DateTime<Utc>,
}

impl From<&Estimation> for EstimationResponse {
    fn from(estimation: &Estimation) -> Self {
        Self {
            id: *estimation.id().as_uuid(),
            detection_id: *estimation.detection_id().as_uuid(),
            currency: estimation.total_cost().currency().code().to_string(),
            parts_cost: amount(estimation.parts_cost()),
            labor_cost: amount(estimation.labor_cost()),
            paint_cost: amount(estimation.paint_cost()),
            markup: amount(estimation.markup()),
            markup_percentage: estimation.markup_percentage(),
            labor_rate: amount(estimation.labor_rate()),
            estimated_labor_hours: estimation.estimated_labor_hours(),
            total_cost: amount(estimation.total_cost()),
            line_items: estimation.line_items().iter().map(LineItemResponse::from).collect(),
            created_at: estimation.created_at(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub detection_id: Uuid,
    pub total_damages: usize,
    pub currency: String,
    pub total_cost: Decimal,
    pub severity_breakdown: BTreeMap<String, usize>,
    pub estimated_repair_time: String,
}

impl From<EstimationSummary> for SummaryResponse {
    fn from(summary: EstimationSummary) -> Self {
        Self {
            detection_id: *summary.detection_id.as_uuid(),
            total_damages: summary.total_damages,
            currency: summary.total_cost.currency().code().to_string(),
            total_cost: amount(summary.total_cost),
            severity_breakdown: summary
                .severity_breakdown
                .into_iter()
                .map(|(severity, count)| (severity.to_string(), count))
                .collect(),
            estimated_repair_time: summary.estimated_repair_time,
        }
    }
}

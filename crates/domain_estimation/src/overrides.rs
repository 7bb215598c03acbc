//! Override resolution
//!
//! Callers may override the labor rate and the markup percentage for a
//! single estimation. An explicit override wins over the system default;
//! out-of-range values are rejected with `InvalidOverride` before any cost
//! is computed, never clamped.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, DetectionId, Money};

use crate::error::EstimationError;

/// A request to estimate repair costs for one detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationRequest {
    pub detection_id: DetectionId,
    /// Applies to every line item of the request
    pub include_paint: bool,
    /// Labor rate per hour, in the engine currency
    pub labor_rate_override: Option<Decimal>,
    /// Markup as a percentage, e.g. `20` for 20%
    pub markup_override: Option<Decimal>,
}

impl EstimationRequest {
    /// Creates a request with paint included and no overrides
    pub fn new(detection_id: DetectionId) -> Self {
        Self {
            detection_id,
            include_paint: true,
            labor_rate_override: None,
            markup_override: None,
        }
    }

    pub fn include_paint(mut self, include_paint: bool) -> Self {
        self.include_paint = include_paint;
        self
    }

    pub fn labor_rate(mut self, rate: Decimal) -> Self {
        self.labor_rate_override = Some(rate);
        self
    }

    pub fn markup(mut self, percentage: Decimal) -> Self {
        self.markup_override = Some(percentage);
        self
    }
}

/// System defaults consumed at startup
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EstimationDefaults {
    pub labor_rate: Decimal,
    pub markup_percentage: Decimal,
    pub currency: Currency,
}

impl Default for EstimationDefaults {
    fn default() -> Self {
        Self {
            labor_rate: dec!(75.00),
            markup_percentage: dec!(20.0),
            currency: Currency::USD,
        }
    }
}

/// Labor rate and markup percentage in effect for one estimation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedOverrides {
    pub labor_rate: Money,
    pub markup_percentage: Decimal,
}

/// Merges request overrides with the system defaults
#[derive(Debug, Clone, Copy)]
pub struct OverrideResolver {
    defaults: EstimationDefaults,
}

impl OverrideResolver {
    /// Creates a resolver; the defaults must satisfy the same rules as overrides
    pub fn new(defaults: EstimationDefaults) -> Result<Self, EstimationError> {
        Ok(Self {
            defaults: EstimationDefaults {
                labor_rate: validate_labor_rate("labor_rate", defaults.labor_rate)?,
                markup_percentage: validate_markup("markup_percentage", defaults.markup_percentage)?,
                currency: defaults.currency,
            },
        })
    }

    pub fn defaults(&self) -> &EstimationDefaults {
        &self.defaults
    }

    /// Resolves the effective labor rate and markup for a request
    ///
    /// # Errors
    ///
    /// `InvalidOverride` naming `labor_rate_override` (must be > 0) or
    /// `markup_override` (must be within `[0, 100]`). Both are rounded to
    /// four decimal places first.
    pub fn resolve(&self, request: &EstimationRequest) -> Result<ResolvedOverrides, EstimationError> {
        let labor_rate = match request.labor_rate_override {
            Some(rate) => validate_labor_rate("labor_rate_override", rate)?,
            None => self.defaults.labor_rate,
        };
        let markup_percentage = match request.markup_override {
            Some(markup) => validate_markup("markup_override", markup)?,
            None => self.defaults.markup_percentage,
        };

        Ok(ResolvedOverrides {
            labor_rate: Money::new(labor_rate, self.defaults.currency),
            markup_percentage,
        })
    }
}

/// Decimal places kept for rates and percentages, matching stored amounts
const SCALE: u32 = 4;

fn validate_labor_rate(field: &str, rate: Decimal) -> Result<Decimal, EstimationError> {
    let rate = rate.round_dp(SCALE);
    if rate <= Decimal::ZERO {
        return Err(EstimationError::invalid_override(field, rate));
    }
    Ok(rate)
}

fn validate_markup(field: &str, markup: Decimal) -> Result<Decimal, EstimationError> {
    let markup = markup.round_dp(SCALE);
    if markup < Decimal::ZERO || markup > dec!(100) {
        return Err(EstimationError::invalid_override(field, markup));
    }
    Ok(markup)
}

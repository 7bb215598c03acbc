//! Damage-to-Cost Estimation Domain
//!
//! This crate turns the damage instances of a vehicle detection into an
//! itemized repair-cost estimate.
//!
//! # Pipeline
//!
//! ```text
//! Detection -> severity -> cost rule -> line item -> totals + markup -> Estimation
//! ```
//!
//! Every step except the two port calls is synchronous and pure. The cost
//! table is loaded once at startup and shared read-only.

pub mod damage;
pub mod severity;
pub mod cost_rules;
pub mod overrides;
pub mod line_item;
pub mod aggregator;
pub mod estimation;
pub mod ports;
pub mod service;
pub mod error;

pub use damage::{BoundingBox, DamageInstance, DamageType, Detection, Severity};
pub use severity::{SeverityClassifier, SeverityThresholds, ThresholdPair};
pub use cost_rules::{CostRule, CostRuleTable, CostRuleTableBuilder};
pub use overrides::{EstimationDefaults, EstimationRequest, OverrideResolver, ResolvedOverrides};
pub use line_item::LineItem;
pub use aggregator::EstimateTotals;
pub use estimation::{Estimation, EstimationBuilder, EstimationSummary};
pub use ports::{DetectionPort, EstimationPort};
pub use service::EstimationService;
pub use error::EstimationError;

#[cfg(any(test, feature = "mock"))]
pub use ports::mock::{MockDetectionPort, MockEstimationPort};

//! Estimation service
//!
//! `EstimationService` is the single entry point of the engine. It pulls a
//! detection through the `DetectionPort`, prices every damage against the
//! shared cost table, and records the result through the `EstimationPort`.

use std::sync::Arc;
use tracing::{debug, info, warn};

use core_kernel::{DetectionId, MoneyError, OperationMetadata, PortError};

use crate::aggregator::EstimateTotals;
use crate::cost_rules::CostRuleTable;
use crate::damage::Detection;
use crate::error::EstimationError;
use crate::estimation::{Estimation, EstimationBuilder, EstimationSummary};
use crate::line_item::LineItem;
use crate::overrides::{EstimationRequest, OverrideResolver};
use crate::ports::{DetectionPort, EstimationPort};
use crate::severity::SeverityClassifier;

/// Orchestrates classification, pricing, aggregation and persistence
pub struct EstimationService {
    detections: Arc<dyn DetectionPort>,
    estimations: Arc<dyn EstimationPort>,
    rules: Arc<CostRuleTable>,
    classifier: SeverityClassifier,
    resolver: OverrideResolver,
}

impl EstimationService {
    /// Creates the service
    ///
    /// # Errors
    ///
    /// Returns `Financial` if the cost table and the default labor rate are
    /// in different currencies
    pub fn new(
        detections: Arc<dyn DetectionPort>,
        estimations: Arc<dyn EstimationPort>,
        rules: Arc<CostRuleTable>,
        classifier: SeverityClassifier,
        resolver: OverrideResolver,
    ) -> Result<Self, EstimationError> {
        let engine_currency = resolver.defaults().currency;
        if rules.currency() != engine_currency {
            return Err(MoneyError::CurrencyMismatch(
                rules.currency().to_string(),
                engine_currency.to_string(),
            )
            .into());
        }

        Ok(Self {
            detections,
            estimations,
            rules,
            classifier,
            resolver,
        })
    }

    pub fn cost_table(&self) -> &CostRuleTable {
        &self.rules
    }

    pub fn detection_port(&self) -> &Arc<dyn DetectionPort> {
        &self.detections
    }

    pub fn estimation_port(&self) -> &Arc<dyn EstimationPort> {
        &self.estimations
    }

    /// Estimates repair costs for a detection and records the result
    ///
    /// Overrides are validated before anything is computed, and nothing is
    /// recorded unless every damage could be priced.
    ///
    /// # Errors
    ///
    /// - `InvalidOverride` for an out-of-range labor rate or markup, checked
    ///   before the detection is loaded
    /// - `DetectionNotFound` if the detection does not exist
    /// - `Financial` if an amount exceeds the decimal range
    /// - `CostRuleMissing` if the table has no rule for a detected pair
    /// - `PersistenceFailure` if the estimation could not be recorded
    pub async fn estimate(&self, request: EstimationRequest) -> Result<Estimation, EstimationError> {
        let resolved = self.resolver.resolve(&request)?;
        let metadata = Self::metadata("estimate", request.detection_id);
        let detection = self.load_detection(request.detection_id, metadata.clone()).await?;

        let line_items = detection
            .damages
            .iter()
            .map(|damage| -> Result<LineItem, EstimationError> {
                let severity = self.classifier.resolve(damage);
                let rule = self.rules.lookup(damage.damage_type, severity)?;
                Ok(LineItem::calculate(
                    damage,
                    severity,
                    rule,
                    resolved.labor_rate,
                    request.include_paint,
                )?)
            })
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|e| warn!(detection_id = %detection.id, error = %e, "Estimation aborted"))?;

        let totals = EstimateTotals::aggregate(
            &line_items,
            resolved.markup_percentage,
            self.rules.currency(),
        )?;

        let estimation = EstimationBuilder::new(detection.id)
            .labor_rate(resolved.labor_rate)
            .totals(totals)
            .line_items(line_items)
            .build()?;

        self.estimations
            .save_estimation(&estimation, metadata)
            .await
            .map_err(EstimationError::PersistenceFailure)?;

        info!(
            detection_id = %estimation.detection_id(),
            estimation_id = %estimation.id(),
            line_items = estimation.line_items().len(),
            total_cost = %estimation.total_cost(),
            "Estimation recorded"
        );

        Ok(estimation)
    }

    /// Gets the latest estimation recorded for a detection
    pub async fn get_estimation(&self, detection_id: DetectionId) -> Result<Estimation, EstimationError> {
        self.estimations
            .latest_for_detection(detection_id, Self::metadata("get_estimation", detection_id))
            .await
            .map_err(EstimationError::Port)?
            .ok_or(EstimationError::EstimationNotFound(detection_id))
    }

    /// Gets every estimation recorded for a detection, newest first
    ///
    /// An empty history is not an error.
    pub async fn get_estimation_history(
        &self,
        detection_id: DetectionId,
    ) -> Result<Vec<Estimation>, EstimationError> {
        let history = self
            .estimations
            .history_for_detection(detection_id, Self::metadata("get_estimation_history", detection_id))
            .await
            .map_err(EstimationError::Port)?;
        debug!(detection_id = %detection_id, count = history.len(), "Loaded estimation history");
        Ok(history)
    }

    /// Summarizes a detection and its latest estimation
    pub async fn get_summary(&self, detection_id: DetectionId) -> Result<EstimationSummary, EstimationError> {
        let metadata = Self::metadata("get_summary", detection_id);
        let detection = self.load_detection(detection_id, metadata.clone()).await?;
        let latest = self
            .estimations
            .latest_for_detection(detection_id, metadata)
            .await
            .map_err(EstimationError::Port)?;

        let severities = detection.damages.iter().map(|d| self.classifier.resolve(d));
        Ok(EstimationSummary::new(
            &detection,
            severities,
            latest.as_ref(),
            self.rules.currency(),
        ))
    }

    async fn load_detection(
        &self,
        id: DetectionId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Detection, EstimationError> {
        self.detections
            .get_detection(id, metadata)
            .await
            .map_err(|e| match e {
                PortError::NotFound { .. } => EstimationError::DetectionNotFound(id),
                other => EstimationError::Port(other),
            })
    }

    fn metadata(operation: &str, detection_id: DetectionId) -> Option<OperationMetadata> {
        Some(
            OperationMetadata::default()
                .with_context("operation", operation)
                .with_context("detection_id", detection_id.to_string()),
        )
    }
}

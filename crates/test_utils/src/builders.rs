//! Test Data Builders
//!
//! Builder patterns for constructing detections, damages and requests with
//! sensible defaults. Tests set only the fields they care about.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use core_kernel::DetectionId;
use domain_estimation::{
    BoundingBox, CostRuleTable, DamageInstance, DamageType, Detection, EstimationRequest,
    EstimationService, MockDetectionPort, MockEstimationPort, OverrideResolver, Severity,
    SeverityClassifier,
};
use rust_decimal::Decimal;

use crate::fixtures::{BoxFixtures, EngineFixtures};

/// Builder for a single damage instance
pub struct TestDamageBuilder {
    damage_type: DamageType,
    severity: Option<Severity>,
    confidence: f64,
    bbox: BoundingBox,
    affected_part: Option<String>,
}

impl Default for TestDamageBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDamageBuilder {
    /// A moderate bumper damage with a medium box
    pub fn new() -> Self {
        Self {
            damage_type: DamageType::DamagedBumper,
            severity: Some(Severity::Moderate),
            confidence: 0.9,
            bbox: BoxFixtures::medium(),
            affected_part: None,
        }
    }

    pub fn with_type(mut self, damage_type: DamageType) -> Self {
        self.damage_type = damage_type;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Leaves the severity to the classifier
    pub fn unclassified(mut self) -> Self {
        self.severity = None;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_bbox(mut self, bbox: BoundingBox) -> Self {
        self.bbox = bbox;
        self
    }

    pub fn with_affected_part(mut self, part: impl Into<String>) -> Self {
        self.affected_part = Some(part.into());
        self
    }

    pub fn build(self) -> DamageInstance {
        DamageInstance {
            id: Default::default(),
            damage_type: self.damage_type,
            severity: self.severity,
            confidence: self.confidence,
            bbox: self.bbox,
            affected_part: self.affected_part,
        }
    }
}

/// Builder for a detection record
pub struct TestDetectionBuilder {
    id: DetectionId,
    damages: Vec<DamageInstance>,
    created_at: Option<DateTime<Utc>>,
}

impl Default for TestDetectionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestDetectionBuilder {
    /// An empty detection with a fresh id
    pub fn new() -> Self {
        Self {
            id: DetectionId::new(),
            damages: Vec::new(),
            created_at: None,
        }
    }

    pub fn with_id(mut self, id: DetectionId) -> Self {
        self.id = id;
        self
    }

    pub fn with_damage(mut self, damage: DamageInstance) -> Self {
        self.damages.push(damage);
        self
    }

    pub fn with_damages(mut self, damages: impl IntoIterator<Item = DamageInstance>) -> Self {
        self.damages.extend(damages);
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn build(self) -> Detection {
        let mut detection = Detection::new(self.id, self.damages);
        if let Some(created_at) = self.created_at {
            detection.created_at = created_at;
        }
        detection
    }
}

/// Builder for an estimation request
pub struct TestEstimationRequestBuilder {
    request: EstimationRequest,
}

impl TestEstimationRequestBuilder {
    pub fn new(detection_id: DetectionId) -> Self {
        Self {
            request: EstimationRequest::new(detection_id),
        }
    }

    pub fn without_paint(mut self) -> Self {
        self.request.include_paint = false;
        self
    }

    pub fn with_labor_rate(mut self, rate: Decimal) -> Self {
        self.request.labor_rate_override = Some(rate);
        self
    }

    pub fn with_markup(mut self, percentage: Decimal) -> Self {
        self.request.markup_override = Some(percentage);
        self
    }

    pub fn build(self) -> EstimationRequest {
        self.request
    }
}

/// An `EstimationService` wired to in-memory ports
///
/// The ports are exposed so tests can seed detections and inspect or break
/// the estimation store.
pub struct TestEngine {
    pub service: Arc<EstimationService>,
    pub detections: Arc<MockDetectionPort>,
    pub estimations: Arc<MockEstimationPort>,
}

/// Builder for a `TestEngine`
pub struct TestEngineBuilder {
    detections: Vec<Detection>,
    table: CostRuleTable,
    classifier: SeverityClassifier,
    resolver: OverrideResolver,
}

impl Default for TestEngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestEngineBuilder {
    /// Standard cost table, default thresholds and defaults, no detections
    pub fn new() -> Self {
        Self {
            detections: Vec::new(),
            table: EngineFixtures::standard_table(),
            classifier: EngineFixtures::classifier(),
            resolver: EngineFixtures::resolver(),
        }
    }

    pub fn with_detection(mut self, detection: Detection) -> Self {
        self.detections.push(detection);
        self
    }

    pub fn with_table(mut self, table: CostRuleTable) -> Self {
        self.table = table;
        self
    }

    pub fn with_classifier(mut self, classifier: SeverityClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_resolver(mut self, resolver: OverrideResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub async fn build(self) -> TestEngine {
        let detections = Arc::new(MockDetectionPort::with_detections(self.detections).await);
        let estimations = Arc::new(MockEstimationPort::new());
        let service = EstimationService::new(
            detections.clone(),
            estimations.clone(),
            Arc::new(self.table),
            self.classifier,
            self.resolver,
        )
        .expect("test engine currencies match");

        TestEngine {
            service: Arc::new(service),
            detections,
            estimations,
        }
    }
}

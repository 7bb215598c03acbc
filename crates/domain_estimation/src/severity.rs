//! Severity classification
//!
//! Detections that arrive without a severity are bucketed from two detector
//! outputs: the confidence score and the fraction of the image covered by
//! the bounding box. Each output is banded against its own ordered threshold
//! pair, and the lower of the two bands wins, so a large box the detector is
//! unsure about is not escalated to `severe`.
//!
//! Lower bounds are inclusive: a value exactly at the `moderate` threshold is
//! `moderate`.

use serde::{Deserialize, Serialize};

use crate::damage::{BoundingBox, DamageInstance, Severity};
use crate::error::EstimationError;

/// Ordered pair of band boundaries for one detector output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdPair {
    /// Smallest value classified as `moderate`
    pub moderate: f64,
    /// Smallest value classified as `severe`
    pub severe: f64,
}

impl ThresholdPair {
    pub fn new(moderate: f64, severe: f64) -> Result<Self, EstimationError> {
        let pair = Self { moderate, severe };
        pair.validate("threshold")?;
        Ok(pair)
    }

    fn validate(&self, name: &str) -> Result<(), EstimationError> {
        if !(0.0..=1.0).contains(&self.moderate) || !(0.0..=1.0).contains(&self.severe) {
            return Err(EstimationError::InvalidThresholds(format!(
                "{} bounds must be within [0, 1], got moderate={} severe={}",
                name, self.moderate, self.severe
            )));
        }
        if self.moderate > self.severe {
            return Err(EstimationError::InvalidThresholds(format!(
                "{} moderate bound {} exceeds severe bound {}",
                name, self.moderate, self.severe
            )));
        }
        Ok(())
    }

    /// Buckets a value, lower bounds inclusive
    pub fn band(&self, value: f64) -> Severity {
        if value >= self.severe {
            Severity::Severe
        } else if value >= self.moderate {
            Severity::Moderate
        } else {
            Severity::Minor
        }
    }
}

/// Per-deployment thresholds for the classifier
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityThresholds {
    pub confidence: ThresholdPair,
    pub area: ThresholdPair,
}

impl Default for SeverityThresholds {
    /// Area bands at 5% and 15% of the image; confidence does not cap the result
    fn default() -> Self {
        Self {
            confidence: ThresholdPair {
                moderate: 0.0,
                severe: 0.0,
            },
            area: ThresholdPair {
                moderate: 0.05,
                severe: 0.15,
            },
        }
    }
}

impl SeverityThresholds {
    pub fn validate(&self) -> Result<(), EstimationError> {
        self.confidence.validate("confidence")?;
        self.area.validate("area")
    }
}

/// Resolves the severity of each damage instance
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SeverityClassifier {
    thresholds: SeverityThresholds,
}

impl SeverityClassifier {
    /// Creates a classifier after validating the thresholds
    pub fn new(thresholds: SeverityThresholds) -> Result<Self, EstimationError> {
        thresholds.validate()?;
        Ok(Self { thresholds })
    }

    pub fn thresholds(&self) -> &SeverityThresholds {
        &self.thresholds
    }

    /// Classifies from detector outputs alone
    pub fn classify(&self, confidence: f64, bbox: &BoundingBox) -> Severity {
        let by_area = self.thresholds.area.band(bbox.area());
        let by_confidence = self.thresholds.confidence.band(confidence);
        by_area.min(by_confidence)
    }

    /// Returns the detector's severity when present, otherwise classifies
    pub fn resolve(&self, damage: &DamageInstance) -> Severity {
        match damage.severity {
            Some(severity) => severity,
            None => self.classify(damage.confidence, &damage.bbox),
        }
    }
}

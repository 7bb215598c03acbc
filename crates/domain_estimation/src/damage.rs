//! Detected damage model
//!
//! Damage types and severities are closed enumerations. Strings coming from
//! the detector or from configuration files are parsed here and anything
//! outside the fixed sets is rejected instead of being carried along.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use core_kernel::{DamageId, DetectionId};

use crate::error::EstimationError;

/// The 11 damage categories the detector can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    DamagedHeadLight,
    DamagedHood,
    DamagedTrunk,
    DamagedWindow,
    DamagedWindscreen,
    DamagedBumper,
    DamagedDoor,
    DamagedFender,
    DamagedMirrorGlass,
    DentOrScratch,
    MissingGrille,
}

impl DamageType {
    /// Every damage type, in detector class order
    pub const ALL: [DamageType; 11] = [
        DamageType::DamagedHeadLight,
        DamageType::DamagedHood,
        DamageType::DamagedTrunk,
        DamageType::DamagedWindow,
        DamageType::DamagedWindscreen,
        DamageType::DamagedBumper,
        DamageType::DamagedDoor,
        DamageType::DamagedFender,
        DamageType::DamagedMirrorGlass,
        DamageType::DentOrScratch,
        DamageType::MissingGrille,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DamageType::DamagedHeadLight => "damaged_head_light",
            DamageType::DamagedHood => "damaged_hood",
            DamageType::DamagedTrunk => "damaged_trunk",
            DamageType::DamagedWindow => "damaged_window",
            DamageType::DamagedWindscreen => "damaged_windscreen",
            DamageType::DamagedBumper => "damaged_bumper",
            DamageType::DamagedDoor => "damaged_door",
            DamageType::DamagedFender => "damaged_fender",
            DamageType::DamagedMirrorGlass => "damaged_mirror_glass",
            DamageType::DentOrScratch => "dent_or_scratch",
            DamageType::MissingGrille => "missing_grille",
        }
    }

    /// The vehicle part this damage type implies, if any
    ///
    /// Dents and scratches can appear on any panel, so they carry no default.
    pub fn default_part(&self) -> Option<&'static str> {
        match self {
            DamageType::DamagedHeadLight => Some("headlight"),
            DamageType::DamagedHood => Some("hood"),
            DamageType::DamagedTrunk => Some("trunk"),
            DamageType::DamagedWindow => Some("window"),
            DamageType::DamagedWindscreen => Some("windscreen"),
            DamageType::DamagedBumper => Some("bumper"),
            DamageType::DamagedDoor => Some("door"),
            DamageType::DamagedFender => Some("fender"),
            DamageType::DamagedMirrorGlass => Some("mirror"),
            DamageType::DentOrScratch => None,
            DamageType::MissingGrille => Some("grille"),
        }
    }
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DamageType {
    type Err = EstimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        DamageType::ALL
            .into_iter()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| EstimationError::InvalidDamageType(s.to_string()))
    }
}

/// Ordinal damage extent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
}

impl Severity {
    pub const ALL: [Severity; 3] = [Severity::Minor, Severity::Moderate, Severity::Severe];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minor => "minor",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = EstimationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "minor" => Ok(Severity::Minor),
            "moderate" => Ok(Severity::Moderate),
            "severe" => Ok(Severity::Severe),
            _ => Err(EstimationError::InvalidSeverity(s.to_string())),
        }
    }
}

/// Bounding box normalized to the image dimensions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    /// Creates a bounding box, rejecting coordinates outside `[0, 1]`
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Result<Self, EstimationError> {
        let bbox = Self { x, y, width, height };
        bbox.validate()?;
        Ok(bbox)
    }

    /// Fraction of the image covered by the box
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    pub fn validate(&self) -> Result<(), EstimationError> {
        for (name, value) in [
            ("x", self.x),
            ("y", self.y),
            ("width", self.width),
            ("height", self.height),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(EstimationError::InvalidDamageInstance(format!(
                    "bounding box {} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

/// One detected area of vehicle damage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageInstance {
    pub id: DamageId,
    pub damage_type: DamageType,
    /// Severity reported by the detector; absent when it must be classified
    pub severity: Option<Severity>,
    pub confidence: f64,
    pub bbox: BoundingBox,
    pub affected_part: Option<String>,
}

impl DamageInstance {
    /// Creates a damage instance without a severity
    ///
    /// # Errors
    ///
    /// Returns `InvalidDamageInstance` if the confidence or any bounding-box
    /// coordinate falls outside `[0, 1]`
    pub fn new(
        damage_type: DamageType,
        confidence: f64,
        bbox: BoundingBox,
    ) -> Result<Self, EstimationError> {
        let instance = Self {
            id: DamageId::new(),
            damage_type,
            severity: None,
            confidence,
            bbox,
            affected_part: None,
        };
        instance.validate()?;
        Ok(instance)
    }

    /// Attaches the detector's severity
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_affected_part(mut self, part: impl Into<String>) -> Self {
        self.affected_part = Some(part.into());
        self
    }

    pub fn with_id(mut self, id: DamageId) -> Self {
        self.id = id;
        self
    }

    /// Checks confidence and bounding-box ranges
    pub fn validate(&self) -> Result<(), EstimationError> {
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(EstimationError::InvalidDamageInstance(format!(
                "confidence must be within [0, 1], got {}",
                self.confidence
            )));
        }
        self.bbox.validate()
    }

    /// The labelled part, falling back to the part implied by the damage type
    pub fn part(&self) -> Option<String> {
        self.affected_part
            .clone()
            .or_else(|| self.damage_type.default_part().map(str::to_string))
    }
}

/// A detection record as handed over by the detection collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub id: DetectionId,
    pub damages: Vec<DamageInstance>,
    pub created_at: DateTime<Utc>,
}

impl Detection {
    pub fn new(id: DetectionId, damages: Vec<DamageInstance>) -> Self {
        Self {
            id,
            damages,
            created_at: Utc::now(),
        }
    }

    pub fn total_damages(&self) -> usize {
        self.damages.len()
    }
}

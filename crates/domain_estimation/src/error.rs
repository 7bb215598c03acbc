//! Estimation domain errors
//!
//! Every failure path of the engine returns one of these variants; none of
//! them is fatal to the process and none is retried inside the engine.

use thiserror::Error;

use core_kernel::{DetectionId, MoneyError, PortError};

use crate::damage::{DamageType, Severity};

/// Errors that can occur while estimating repair costs
#[derive(Debug, Error)]
pub enum EstimationError {
    /// The detection collaborator has no record for this identifier
    #[error("Detection not found: {0}")]
    DetectionNotFound(DetectionId),

    /// No estimation has been recorded for this detection yet
    #[error("No estimation recorded for detection {0}")]
    EstimationNotFound(DetectionId),

    /// A labor rate or markup override is out of range
    #[error("Invalid override for {field}: {value}")]
    InvalidOverride { field: String, value: String },

    /// The cost table has no entry for a detected (type, severity) pair
    #[error("No cost rule configured for {damage_type}/{severity}")]
    CostRuleMissing {
        damage_type: DamageType,
        severity: Severity,
    },

    /// The storage collaborator failed to record the estimation
    #[error("Failed to persist estimation: {0}")]
    PersistenceFailure(#[source] PortError),

    #[error("Unknown damage type: {0}")]
    InvalidDamageType(String),

    #[error("Unknown severity: {0}")]
    InvalidSeverity(String),

    #[error("Invalid damage instance: {0}")]
    InvalidDamageInstance(String),

    #[error("Invalid severity thresholds: {0}")]
    InvalidThresholds(String),

    #[error("Estimation is missing {0}")]
    IncompleteEstimation(&'static str),

    #[error("Failed to load cost table: {0}")]
    CostTableLoad(String),

    #[error("Financial error: {0}")]
    Financial(#[from] MoneyError),

    /// Any other collaborator failure while reading
    #[error("Storage error: {0}")]
    Port(#[source] PortError),
}

impl EstimationError {
    /// Creates an invalid override error naming the field and value
    pub fn invalid_override(field: impl Into<String>, value: impl std::fmt::Display) -> Self {
        EstimationError::InvalidOverride {
            field: field.into(),
            value: value.to_string(),
        }
    }

    /// Returns true for errors the caller should see as "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EstimationError::DetectionNotFound(_) | EstimationError::EstimationNotFound(_)
        )
    }

    /// Returns true for errors caused by caller input rather than configuration or storage
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            EstimationError::InvalidOverride { .. }
                | EstimationError::InvalidDamageType(_)
                | EstimationError::InvalidSeverity(_)
                | EstimationError::InvalidDamageInstance(_)
                | EstimationError::Financial(MoneyError::Overflow(_))
        )
    }
}

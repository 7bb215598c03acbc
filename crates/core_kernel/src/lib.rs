//! Core Kernel - Foundational types shared by the estimation workspace
//!
//! - Money types with precise decimal arithmetic
//! - Strongly-typed identifiers for detections and estimations
//! - Port infrastructure for the storage collaborators

pub mod money;
pub mod identifiers;
pub mod ports;

pub use money::{Money, Currency, MoneyError, Rate};
pub use identifiers::{DetectionId, DamageId, EstimationId};
pub use ports::{
    PortError, DomainPort, HealthCheckable, HealthCheckResult, AdapterHealth,
    OperationMetadata,
};

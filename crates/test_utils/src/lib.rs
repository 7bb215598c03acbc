//! Test Utilities Crate
//!
//! Shared test infrastructure for the estimation engine test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built damages, detections and engine settings
//! - `builders`: Builders for test data and a mock-backed `TestEngine`
//! - `database`: PostgreSQL testcontainer management
//! - `assertions`: Assertion helpers for money and estimations
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod database;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use database::*;
pub use assertions::*;
pub use generators::*;

//! Domain Adapters
//!
//! Implementations of the estimation domain ports backed by PostgreSQL.
//! Each adapter uses a repository for SQL and maps rows to domain values.

pub mod estimation;

pub use estimation::{PostgresDetectionAdapter, PostgresEstimationAdapter};

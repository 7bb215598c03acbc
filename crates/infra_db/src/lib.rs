//! Infrastructure Database Layer
//!
//! PostgreSQL persistence for the estimation engine using SQLx.
//!
//! # Tables
//!
//! - `detection_records` / `detected_damages`: written by the detection
//!   pipeline, read by the engine
//! - `cost_estimations`: one row per estimation, line items stored as JSONB
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::{create_pool, run_migrations, DatabaseConfig};
//! use infra_db::adapters::PostgresEstimationAdapter;
//!
//! let pool = create_pool(DatabaseConfig::new("postgres://localhost/estimation")).await?;
//! run_migrations(&pool).await?;
//! let estimations = PostgresEstimationAdapter::new(pool);
//! ```

pub mod pool;
pub mod error;
pub mod repositories;
pub mod adapters;

pub use pool::{DatabasePool, create_pool, run_migrations, DatabaseConfig};
pub use error::DatabaseError;
pub use adapters::{PostgresDetectionAdapter, PostgresEstimationAdapter};

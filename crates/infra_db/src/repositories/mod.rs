//! Repository implementations
//!
//! Repositories own the SQL and speak in row types only. Mapping rows to
//! domain types happens in the port adapters.
//!
//! Queries are built at runtime with `sqlx::query_as` and `FromRow`, so the
//! crate compiles without a live database.

pub mod detection;
pub mod estimation;

pub use detection::DetectionRepository;
pub use estimation::EstimationRepository;

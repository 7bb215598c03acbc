//! Estimation Domain Ports
//!
//! The engine reads detection records and writes estimation records through
//! these traits. The production adapters live in `infra_db`; the in-memory
//! adapters in [`mock`] back the unit and service tests.
//!
//! # Usage
//!
//! ```rust,ignore
//! use domain_estimation::ports::{DetectionPort, EstimationPort};
//! use std::sync::Arc;
//!
//! let detections: Arc<dyn DetectionPort> = Arc::new(PostgresDetectionAdapter::new(pool.clone()));
//! let estimations: Arc<dyn EstimationPort> = Arc::new(PostgresEstimationAdapter::new(pool));
//! ```

use async_trait::async_trait;

use core_kernel::{DetectionId, DomainPort, HealthCheckable, OperationMetadata, PortError};

use crate::damage::Detection;
use crate::estimation::Estimation;

/// Read access to detection records
#[async_trait]
pub trait DetectionPort: DomainPort + HealthCheckable {
    /// Gets a detection with all of its damage instances
    ///
    /// Returns `PortError::NotFound` when no record exists.
    async fn get_detection(
        &self,
        id: DetectionId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Detection, PortError>;
}

/// Storage for estimation records
///
/// Records are append-only: every estimation is stored under its own id.
#[async_trait]
pub trait EstimationPort: DomainPort + HealthCheckable {
    /// Records a new estimation
    async fn save_estimation(
        &self,
        estimation: &Estimation,
        metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError>;

    /// Gets the most recently created estimation for a detection
    async fn latest_for_detection(
        &self,
        detection_id: DetectionId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Option<Estimation>, PortError>;

    /// Gets every estimation for a detection, newest first
    async fn history_for_detection(
        &self,
        detection_id: DetectionId,
        metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Estimation>, PortError>;
}

/// In-memory port implementations for tests
#[cfg(any(test, feature = "mock"))]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use tokio::sync::RwLock;

    use core_kernel::{AdapterHealth, HealthCheckResult};

    /// In-memory detection store
    #[derive(Debug, Default)]
    pub struct MockDetectionPort {
        detections: Arc<RwLock<HashMap<DetectionId, Detection>>>,
    }

    impl MockDetectionPort {
        pub fn new() -> Self {
            Self::default()
        }

        /// Pre-populates with detections for testing
        pub async fn with_detections(detections: Vec<Detection>) -> Self {
            let port = Self::new();
            for detection in detections {
                port.insert(detection).await;
            }
            port
        }

        pub async fn insert(&self, detection: Detection) {
            self.detections.write().await.insert(detection.id, detection);
        }
    }

    impl DomainPort for MockDetectionPort {}

    #[async_trait]
    impl HealthCheckable for MockDetectionPort {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult::new("mock-detection-port", AdapterHealth::Healthy, 0)
                .with_message("Mock adapter always healthy")
        }
    }

    #[async_trait]
    impl DetectionPort for MockDetectionPort {
        async fn get_detection(
            &self,
            id: DetectionId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Detection, PortError> {
            self.detections
                .read()
                .await
                .get(&id)
                .cloned()
                .ok_or_else(|| PortError::not_found("Detection", id))
        }
    }

    /// In-memory estimation store
    ///
    /// `fail_writes` makes every subsequent save fail with a connection error.
    #[derive(Debug, Default)]
    pub struct MockEstimationPort {
        estimations: Arc<RwLock<Vec<Estimation>>>,
        fail_writes: AtomicBool,
    }

    impl MockEstimationPort {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_writes(&self, fail: bool) {
            self.fail_writes.store(fail, Ordering::SeqCst);
        }

        /// Number of stored estimations across all detections
        pub async fn count(&self) -> usize {
            self.estimations.read().await.len()
        }
    }

    impl DomainPort for MockEstimationPort {}

    #[async_trait]
    impl HealthCheckable for MockEstimationPort {
        async fn health_check(&self) -> HealthCheckResult {
            if self.fail_writes.load(Ordering::SeqCst) {
                HealthCheckResult::new("mock-estimation-port", AdapterHealth::Degraded, 0)
                    .with_message("Writes are failing")
            } else {
                HealthCheckResult::new("mock-estimation-port", AdapterHealth::Healthy, 0)
            }
        }
    }

    #[async_trait]
    impl EstimationPort for MockEstimationPort {
        async fn save_estimation(
            &self,
            estimation: &Estimation,
            _metadata: Option<OperationMetadata>,
        ) -> Result<(), PortError> {
            if self.fail_writes.load(Ordering::SeqCst) {
                return Err(PortError::connection("estimation store unavailable"));
            }
            let mut estimations = self.estimations.write().await;
            if estimations.iter().any(|e| e.id() == estimation.id()) {
                return Err(PortError::Conflict {
                    message: format!("Estimation {} already exists", estimation.id()),
                });
            }
            estimations.push(estimation.clone());
            Ok(())
        }

        async fn latest_for_detection(
            &self,
            detection_id: DetectionId,
            metadata: Option<OperationMetadata>,
        ) -> Result<Option<Estimation>, PortError> {
            let history = self.history_for_detection(detection_id, metadata).await?;
            Ok(history.into_iter().next())
        }

        async fn history_for_detection(
            &self,
            detection_id: DetectionId,
            _metadata: Option<OperationMetadata>,
        ) -> Result<Vec<Estimation>, PortError> {
            let estimations = self.estimations.read().await;
            // Insertion order breaks timestamp ties, later wins
            let mut history: Vec<(usize, Estimation)> = estimations
                .iter()
                .enumerate()
                .filter(|(_, e)| e.detection_id() == detection_id)
                .map(|(i, e)| (i, e.clone()))
                .collect();
            history.sort_by(|(ia, a), (ib, b)| {
                b.created_at().cmp(&a.created_at()).then(ib.cmp(ia))
            });
            Ok(history.into_iter().map(|(_, e)| e).collect())
        }
    }
}

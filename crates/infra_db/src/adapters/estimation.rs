//! PostgreSQL Estimation Adapters
//!
//! `PostgresDetectionAdapter` and `PostgresEstimationAdapter` implement the
//! estimation domain ports on top of the repositories. They translate rows
//! into domain values and `DatabaseError` into `PortError`.
//!
//! # Example
//!
//! ```rust,ignore
//! use infra_db::adapters::{PostgresDetectionAdapter, PostgresEstimationAdapter};
//! use domain_estimation::{DetectionPort, EstimationPort};
//! use std::sync::Arc;
//!
//! let detections: Arc<dyn DetectionPort> = Arc::new(PostgresDetectionAdapter::new(pool.clone()));
//! let estimations: Arc<dyn EstimationPort> = Arc::new(PostgresEstimationAdapter::new(pool));
//! ```

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, Currency, DamageId, DetectionId, DomainPort, EstimationId, HealthCheckResult,
    HealthCheckable, Money, OperationMetadata, PortError,
};
use domain_estimation::{
    BoundingBox, DamageInstance, DamageType, Detection, DetectionPort, EstimateTotals, Estimation,
    EstimationBuilder, EstimationPort, LineItem, Severity,
};

use crate::repositories::detection::{DamageRow, DetectionRepository};
use crate::repositories::estimation::{EstimationRepository, EstimationRow, NewEstimation};

/// Runs `SELECT 1` against the pool and reports the outcome
async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();
    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    match result {
        Ok(_) => HealthCheckResult::new(adapter_id, AdapterHealth::Healthy, latency_ms),
        Err(e) => HealthCheckResult::new(adapter_id, AdapterHealth::Unhealthy, latency_ms)
            .with_message(format!("Database error: {}", e)),
    }
}

/// PostgreSQL-backed implementation of `DetectionPort`
#[derive(Debug, Clone)]
pub struct PostgresDetectionAdapter {
    repository: DetectionRepository,
    pool: PgPool,
}

impl PostgresDetectionAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: DetectionRepository::new(pool.clone()),
            pool,
        }
    }

    /// The underlying repository, for seeding detections
    pub fn repository(&self) -> &DetectionRepository {
        &self.repository
    }
}

impl DomainPort for PostgresDetectionAdapter {}

#[async_trait]
impl HealthCheckable for PostgresDetectionAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-detection-adapter").await
    }
}

#[async_trait]
impl DetectionPort for PostgresDetectionAdapter {
    #[instrument(skip(self, _metadata), fields(detection_id = %id))]
    async fn get_detection(
        &self,
        id: DetectionId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Detection, PortError> {
        let record = self
            .repository
            .get_by_id(*id.as_uuid())
            .await
            .map_err(|e| if e.is_not_found() {
                PortError::not_found("Detection", id)
            } else {
                PortError::from(e)
            })?;
        let damages = self.repository.damages_for(record.id).await?;
        debug!(damages = damages.len(), "Loaded detection");

        Ok(Detection {
            id,
            damages: damages
                .into_iter()
                .map(row_to_damage)
                .collect::<Result<Vec<_>, _>>()?,
            created_at: record.created_at,
        })
    }
}

/// PostgreSQL-backed implementation of `EstimationPort`
#[derive(Debug, Clone)]
pub struct PostgresEstimationAdapter {
    repository: EstimationRepository,
    pool: PgPool,
}

impl PostgresEstimationAdapter {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: EstimationRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn repository(&self) -> &EstimationRepository {
        &self.repository
    }
}

impl DomainPort for PostgresEstimationAdapter {}

#[async_trait]
impl HealthCheckable for PostgresEstimationAdapter {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-estimation-adapter").await
    }
}

#[async_trait]
impl EstimationPort for PostgresEstimationAdapter {
    #[instrument(
        skip(self, estimation, _metadata),
        fields(estimation_id = %estimation.id(), detection_id = %estimation.detection_id())
    )]
    async fn save_estimation(
        &self,
        estimation: &Estimation,
        _metadata: Option<OperationMetadata>,
    ) -> Result<(), PortError> {
        let row = estimation_to_row(estimation)?;
        self.repository.insert(&row).await?;
        debug!("Estimation saved");
        Ok(())
    }

    #[instrument(skip(self, _metadata), fields(detection_id = %detection_id))]
    async fn latest_for_detection(
        &self,
        detection_id: DetectionId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Option<Estimation>, PortError> {
        self.repository
            .latest_for_detection(*detection_id.as_uuid())
            .await?
            .map(row_to_estimation)
            .transpose()
    }

    #[instrument(skip(self, _metadata), fields(detection_id = %detection_id))]
    async fn history_for_detection(
        &self,
        detection_id: DetectionId,
        _metadata: Option<OperationMetadata>,
    ) -> Result<Vec<Estimation>, PortError> {
        self.repository
            .history_for_detection(*detection_id.as_uuid())
            .await?
            .into_iter()
            .map(row_to_estimation)
            .collect()
    }
}

fn row_to_damage(row: DamageRow) -> Result<DamageInstance, PortError> {
    let damage_type: DamageType = row
        .damage_type
        .parse()
        .map_err(|e: domain_estimation::EstimationError| PortError::transformation(e.to_string()))?;
    let severity = row
        .severity
        .as_deref()
        .map(str::parse::<Severity>)
        .transpose()
        .map_err(|e| PortError::transformation(e.to_string()))?;

    let damage = DamageInstance {
        id: DamageId::from(row.id),
        damage_type,
        severity,
        confidence: row.confidence,
        bbox: BoundingBox {
            x: row.bbox_x,
            y: row.bbox_y,
            width: row.bbox_width,
            height: row.bbox_height,
        },
        affected_part: row.affected_part,
    };
    damage
        .validate()
        .map_err(|e| PortError::transformation(format!("damage {}: {}", row.id, e)))?;
    Ok(damage)
}

fn estimation_to_row(estimation: &Estimation) -> Result<NewEstimation, PortError> {
    let line_items = serde_json::to_value(estimation.line_items())
        .map_err(|e| PortError::transformation(e.to_string()))?;

    Ok(NewEstimation {
        id: *estimation.id().as_uuid(),
        detection_record_id: *estimation.detection_id().as_uuid(),
        currency: estimation.total_cost().currency().code().to_string(),
        parts_cost: estimation.parts_cost().amount(),
        labor_cost: estimation.labor_cost().amount(),
        paint_cost: estimation.paint_cost().amount(),
        markup: estimation.markup().amount(),
        markup_percentage: estimation.markup_percentage(),
        labor_rate: estimation.labor_rate().amount(),
        estimated_labor_hours: estimation.estimated_labor_hours(),
        total_cost: estimation.total_cost().amount(),
        line_items,
        created_at: estimation.created_at(),
    })
}

fn row_to_estimation(row: EstimationRow) -> Result<Estimation, PortError> {
    let currency: Currency = row
        .currency
        .trim()
        .parse()
        .map_err(|e: core_kernel::MoneyError| PortError::transformation(e.to_string()))?;
    let line_items: Vec<LineItem> = serde_json::from_value(row.line_items.0)
        .map_err(|e| PortError::transformation(format!("estimation {}: {}", row.id, e)))?;
    let money = |amount| Money::new(amount, currency);

    EstimationBuilder::new(DetectionId::from(row.detection_record_id))
        .id(EstimationId::from(row.id))
        .created_at(row.created_at)
        .labor_rate(money(row.labor_rate))
        .totals(EstimateTotals {
            parts_cost: money(row.parts_cost),
            labor_cost: money(row.labor_cost),
            paint_cost: money(row.paint_cost),
            labor_hours: row.estimated_labor_hours,
            markup: money(row.markup),
            markup_percentage: row.markup_percentage,
            total_cost: money(row.total_cost),
        })
        .line_items(line_items)
        .build()
        .map_err(|e| PortError::transformation(e.to_string()))
}

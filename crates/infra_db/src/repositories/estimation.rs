//! Estimation repository implementation
//!
//! Estimations are append-only. Each call to `insert` adds a row; the latest
//! row for a detection is the current estimate and earlier rows form its
//! history.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

const SELECT_ESTIMATION: &str = r#"
    SELECT
        id,
        detection_record_id,
        currency,
        parts_cost,
        labor_cost,
        paint_cost,
        markup,
        markup_percentage,
        labor_rate,
        estimated_labor_hours,
        total_cost,
        line_items,
        created_at
    FROM cost_estimations
"#;

/// Repository for cost estimation records
#[derive(Debug, Clone)]
pub struct EstimationRepository {
    pool: PgPool,
}

impl EstimationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts a new estimation row
    pub async fn insert(&self, estimation: &NewEstimation) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO cost_estimations (
                id, detection_record_id, currency,
                parts_cost, labor_cost, paint_cost, markup, markup_percentage,
                labor_rate, estimated_labor_hours, total_cost, line_items, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(estimation.id)
        .bind(estimation.detection_record_id)
        .bind(&estimation.currency)
        .bind(estimation.parts_cost)
        .bind(estimation.labor_cost)
        .bind(estimation.paint_cost)
        .bind(estimation.markup)
        .bind(estimation.markup_percentage)
        .bind(estimation.labor_rate)
        .bind(estimation.estimated_labor_hours)
        .bind(estimation.total_cost)
        .bind(Json(&estimation.line_items))
        .bind(estimation.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Retrieves the most recent estimation for a detection
    pub async fn latest_for_detection(
        &self,
        detection_id: Uuid,
    ) -> Result<Option<EstimationRow>, DatabaseError> {
        let query = format!(
            "{} WHERE detection_record_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1",
            SELECT_ESTIMATION
        );
        let row = sqlx::query_as::<_, EstimationRow>(&query)
            .bind(detection_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row)
    }

    /// Retrieves all estimations for a detection, newest first
    pub async fn history_for_detection(
        &self,
        detection_id: Uuid,
    ) -> Result<Vec<EstimationRow>, DatabaseError> {
        let query = format!(
            "{} WHERE detection_record_id = $1 ORDER BY created_at DESC, id DESC",
            SELECT_ESTIMATION
        );
        let rows = sqlx::query_as::<_, EstimationRow>(&query)
            .bind(detection_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Counts the estimations recorded for a detection
    pub async fn count_for_detection(&self, detection_id: Uuid) -> Result<i64, DatabaseError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM cost_estimations WHERE detection_record_id = $1",
        )
        .bind(detection_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

/// Database row for a cost estimation
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EstimationRow {
    pub id: Uuid,
    pub detection_record_id: Uuid,
    pub currency: String,
    pub parts_cost: Decimal,
    pub labor_cost: Decimal,
    pub paint_cost: Decimal,
    pub markup: Decimal,
    pub markup_percentage: Decimal,
    pub labor_rate: Decimal,
    pub estimated_labor_hours: Decimal,
    pub total_cost: Decimal,
    pub line_items: Json<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Data for inserting a cost estimation
#[derive(Debug, Clone)]
pub struct NewEstimation {
    pub id: Uuid,
    pub detection_record_id: Uuid,
    pub currency: String,
    pub parts_cost: Decimal,
    pub labor_cost: Decimal,
    pub paint_cost: Decimal,
    pub markup: Decimal,
    pub markup_percentage: Decimal,
    pub labor_rate: Decimal,
    pub estimated_labor_hours: Decimal,
    pub total_cost: Decimal,
    pub line_items: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

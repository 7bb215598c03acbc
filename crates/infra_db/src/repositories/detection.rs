//! Detection repository implementation
//!
//! Detection records are written by the detection pipeline; the estimation
//! engine only reads them. `insert` exists for seeding and tests.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Repository for detection records and their damages
#[derive(Debug, Clone)]
pub struct DetectionRepository {
    pool: PgPool,
}

impl DetectionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Retrieves a detection record by its identifier
    ///
    /// Returns `NotFound` when no record exists.
    pub async fn get_by_id(&self, detection_id: Uuid) -> Result<DetectionRow, DatabaseError> {
        sqlx::query_as::<_, DetectionRow>(
            r#"
            SELECT id, image_path, original_filename, model_version, created_at
            FROM detection_records
            WHERE id = $1
            "#,
        )
        .bind(detection_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Detection", detection_id))
    }

    /// Retrieves the damages of a detection in detector order
    pub async fn damages_for(&self, detection_id: Uuid) -> Result<Vec<DamageRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, DamageRow>(
            r#"
            SELECT
                id,
                detection_record_id,
                damage_type,
                severity,
                confidence,
                bbox_x,
                bbox_y,
                bbox_width,
                bbox_height,
                affected_part,
                position
            FROM detected_damages
            WHERE detection_record_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(detection_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Inserts a detection and its damages in one transaction
    pub async fn insert(
        &self,
        detection: &NewDetection,
        damages: &[NewDamage],
    ) -> Result<(), DatabaseError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO detection_records (id, image_path, original_filename, model_version, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(detection.id)
        .bind(&detection.image_path)
        .bind(&detection.original_filename)
        .bind(&detection.model_version)
        .bind(detection.created_at)
        .execute(&mut *tx)
        .await?;

        for (position, damage) in damages.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO detected_damages (
                    id, detection_record_id, damage_type, severity, confidence,
                    bbox_x, bbox_y, bbox_width, bbox_height, affected_part, position
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(damage.id)
            .bind(detection.id)
            .bind(&damage.damage_type)
            .bind(&damage.severity)
            .bind(damage.confidence)
            .bind(damage.bbox_x)
            .bind(damage.bbox_y)
            .bind(damage.bbox_width)
            .bind(damage.bbox_height)
            .bind(&damage.affected_part)
            .bind(position as i32)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::TransactionFailed(e.to_string()))?;
        Ok(())
    }
}

/// Database row for a detection record
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DetectionRow {
    pub id: Uuid,
    pub image_path: Option<String>,
    pub original_filename: Option<String>,
    pub model_version: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Database row for one detected damage
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DamageRow {
    pub id: Uuid,
    pub detection_record_id: Uuid,
    pub damage_type: String,
    pub severity: Option<String>,
    pub confidence: f64,
    pub bbox_x: f64,
    pub bbox_y: f64,
    pub bbox_width: f64,
    pub bbox_height: f64,
    pub affected_part: Option<String>,
    pub position: i32,
}

/// Data for inserting a detection record
#[derive(Debug, Clone)]
pub struct NewDetection {
    pub id: Uuid,
    pub image_path: Option<String>,
    pub original_filename: Option<String>,
    pub model_version: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Data for inserting a detected damage
#[derive(Debug, Clone)]
pub struct NewDamage {
    pub id: Uuid,
    pub damage_type: String,
    pub severity: Option<String>,
    pub confidence: f64,
    pub bbox_x: f64,
    pub bbox_y: f64,
    pub bbox_width: f64,
    pub bbox_height: f64,
    pub affected_part: Option<String>,
}

//! Estimation handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use tracing::debug;

use core_kernel::DetectionId;
use domain_estimation::EstimationRequest;

use crate::dto::estimation::*;
use crate::{error::ApiError, AppState};

fn parse_detection_id(raw: &str) -> Result<DetectionId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid detection id: {}", raw)))
}

/// Estimates repair costs for a detection and records the result
pub async fn create_estimation(
    State(state): State<AppState>,
    Json(request): Json<CreateEstimationRequest>,
) -> Result<(StatusCode, Json<EstimationResponse>), ApiError> {
    let estimation = state
        .service
        .estimate(EstimationRequest::from(request))
        .await?;

    Ok((StatusCode::CREATED, Json(EstimationResponse::from(&estimation))))
}

/// Gets the latest estimation for a detection
pub async fn get_estimation(
    State(state): State<AppState>,
    Path(detection_id): Path<String>,
) -> Result<Json<EstimationResponse>, ApiError> {
    let detection_id = parse_detection_id(&detection_id)?;
    let estimation = state.service.get_estimation(detection_id).await?;
    Ok(Json(EstimationResponse::from(&estimation)))
}

/// Lists every estimation for a detection, newest first
pub async fn get_estimation_history(
    State(state): State<AppState>,
    Path(detection_id): Path<String>,
) -> Result<Json<Vec<EstimationResponse>>, ApiError> {
    let detection_id = parse_detection_id(&detection_id)?;
    let history = state.service.get_estimation_history(detection_id).await?;
    debug!(detection_id = %detection_id, count = history.len(), "Returning estimation history");
    Ok(Json(history.iter().map(EstimationResponse::from).collect()))
}

/// Summarizes a detection and its latest estimation
pub async fn get_summary(
    State(state): State<AppState>,
    Path(detection_id): Path<String>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let detection_id = parse_detection_id(&detection_id)?;
    let summary = state.service.get_summary(detection_id).await?;
    Ok(Json(SummaryResponse::from(summary)))
}

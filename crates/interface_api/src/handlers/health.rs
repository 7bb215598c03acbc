//! Health check handlers

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use core_kernel::{AdapterHealth, HealthCheckResult, HealthCheckable};

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub version: String,
    pub checks: Vec<HealthCheckResult>,
}

/// Health check endpoint
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Readiness check (asks both engine ports)
///
/// Answers 503 when any port is unhealthy. A degraded port still counts as
/// ready.
pub async fn readiness_check(
    State(state): State<AppState>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let (detections, estimations) = tokio::join!(
        state.service.detection_port().health_check(),
        state.service.estimation_port().health_check(),
    );
    let checks = vec![detections, estimations];

    let (code, status) = if checks.iter().any(|c| c.status == AdapterHealth::Unhealthy) {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    } else if checks.iter().all(HealthCheckResult::is_healthy) {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::OK, "degraded")
    };

    (
        code,
        Json(ReadinessResponse {
            status: status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            checks,
        }),
    )
}

//! HTTP API Layer
//!
//! This crate exposes the damage-to-cost estimation engine over REST using
//! Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Thin request handlers delegating to `EstimationService`
//! - **Middleware**: Tracing, request ids, audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{build_estimation_service, create_router, AppState};
//!
//! let service = build_estimation_service(&config.engine, detections, estimations)?;
//! let app = create_router(AppState::new(service, config));
//! axum::serve(listener, app).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use domain_estimation::{DetectionPort, EstimationError, EstimationPort, EstimationService};

use crate::config::{ApiConfig, EngineConfig};
use crate::handlers::{estimation, health};
use crate::middleware::audit_middleware;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<EstimationService>,
    pub config: ApiConfig,
}

impl AppState {
    pub fn new(service: Arc<EstimationService>, config: ApiConfig) -> Self {
        Self { service, config }
    }
}

/// Wires an `EstimationService` from engine settings and the two ports
///
/// # Errors
///
/// Fails when the cost table cannot be loaded, the thresholds are
/// inconsistent, or the configured currency is unknown.
pub fn build_estimation_service(
    engine: &EngineConfig,
    detections: Arc<dyn DetectionPort>,
    estimations: Arc<dyn EstimationPort>,
) -> Result<Arc<EstimationService>, EstimationError> {
    let service = EstimationService::new(
        detections,
        estimations,
        Arc::new(engine.cost_table()?),
        engine.classifier()?,
        engine.resolver()?,
    )?;
    Ok(Arc::new(service))
}

/// Creates the main API router
///
/// # Returns
///
/// Configured Axum router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let estimation_routes = Router::new()
        .route("/", post(estimation::create_estimation))
        .route("/detection/:detection_id", get(estimation::get_estimation))
        .route(
            "/detection/:detection_id/history",
            get(estimation::get_estimation_history),
        )
        .route("/summary/:detection_id", get(estimation::get_summary));

    let api_routes = Router::new()
        .nest("/estimations", estimation_routes)
        .layer(axum_middleware::from_fn(audit_middleware));

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                ),
        )
        .with_state(state)
}

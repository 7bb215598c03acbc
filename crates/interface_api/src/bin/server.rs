//! Damage Cost Engine - API Server Binary
//!
//! Starts the HTTP API server for the estimation engine.
//!
//! # Usage
//!
//! ```bash
//! # Run with default configuration
//! cargo run --bin estimation-api
//!
//! # Run with environment variables
//! API_PORT=8080 API_DATABASE_URL=postgres://... API_ENGINE__LABOR_RATE=90 cargo run --bin estimation-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_DATABASE_URL` - PostgreSQL connection string
//! * `API_MAX_CONNECTIONS` - Pool size (default: 10)
//! * `API_LOG_LEVEL` - Log level: trace, debug, info, warn, error (default: info)
//! * `API_ENGINE__LABOR_RATE` - Default labor rate per hour (default: 75.00)
//! * `API_ENGINE__MARKUP_PERCENTAGE` - Default markup percentage (default: 20)
//! * `API_ENGINE__CURRENCY` - ISO currency code (default: USD)
//! * `API_ENGINE__COST_TABLE_PATH` - JSON cost table; built-in table when unset
//! * `API_ENGINE__AREA_MODERATE`, `API_ENGINE__AREA_SEVERE`,
//!   `API_ENGINE__CONFIDENCE_MODERATE`, `API_ENGINE__CONFIDENCE_SEVERE` -
//!   severity thresholds

use std::net::SocketAddr;
use std::sync::Arc;

use infra_db::{create_pool, run_migrations, DatabaseConfig, PostgresDetectionAdapter, PostgresEstimationAdapter};
use interface_api::{build_estimation_service, config::ApiConfig, create_router, AppState};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Main entry point for the API server.
///
/// # Errors
///
/// Returns an error if:
/// - Any `API_*` variable is malformed
/// - Database connection or migrations fail
/// - The engine settings are invalid (cost table, thresholds, currency)
/// - Server fails to bind to the configured address
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let config = ApiConfig::from_env()?;

    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        currency = %config.engine.currency,
        "Starting estimation API server"
    );

    let pool = create_pool(
        DatabaseConfig::new(&config.database_url).max_connections(config.max_connections),
    )
    .await?;
    run_migrations(&pool).await?;

    let service = build_estimation_service(
        &config.engine,
        Arc::new(PostgresDetectionAdapter::new(pool.clone())),
        Arc::new(PostgresEstimationAdapter::new(pool)),
    )?;
    tracing::info!(rules = service.cost_table().len(), "Estimation engine ready");

    let addr: SocketAddr = config.server_addr().parse()?;
    let app = create_router(AppState::new(service, config));

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Initializes the tracing subscriber for structured logging.
fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for Ctrl+C or SIGTERM so in-flight requests can finish.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}

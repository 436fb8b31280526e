use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use campuswatch_api::app::{create_app, AppState};
use campuswatch_api::config::{Config, StorageBackend};
use campuswatch_api::jobs::{JobScheduler, OverdueEscalationJob, PoolMetricsJob};
use campuswatch_api::middleware::{init_metrics, logging::init_logging};
use domain::services::{
    ComplaintLifecycleEngine, ComplaintStore, InMemoryComplaintStore, LoggingNotificationService,
    SystemClock,
};
use persistence::{ComplaintRepository, FsBlobStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;

    init_logging(&config.logging)?;
    init_metrics()?;

    info!("Starting CampusWatch API v{}", env!("CARGO_PKG_VERSION"));

    let (store, pool) = match config.storage.backend {
        StorageBackend::Postgres => {
            let pool = persistence::db::create_pool(&(&config.database).into())
                .await
                .context("failed to connect to database")?;
            persistence::db::run_migrations(&pool).await?;
            let store: Arc<dyn ComplaintStore> = Arc::new(ComplaintRepository::new(pool.clone()));
            (store, Some(pool))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory complaint store; data is lost on restart");
            let store: Arc<dyn ComplaintStore> = Arc::new(InMemoryComplaintStore::new());
            (store, None)
        }
    };

    let engine = ComplaintLifecycleEngine::new(
        store,
        Arc::new(LoggingNotificationService),
        Arc::new(SystemClock),
    );
    let blobs = Arc::new(FsBlobStore::new(&config.uploads.dir));

    let mut scheduler = JobScheduler::new();
    if config.jobs.overdue_scan_minutes > 0 {
        scheduler.register(OverdueEscalationJob::new(
            engine.clone(),
            config.jobs.overdue_scan_minutes,
        ));
    }
    if let Some(pool) = &pool {
        scheduler.register(PoolMetricsJob::new(pool.clone()));
    }
    scheduler.start();

    let addr = config.socket_addr().context("invalid server address")?;
    let state = AppState::new(config, engine, blobs, pool)?;
    let app = create_app(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;
    info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
    }
}

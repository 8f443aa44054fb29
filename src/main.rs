//! Reportal Server: capacity lifecycle manager
//!
//! Main entry point that wires all crates together and starts the server.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use reportal_api::AppState;
use reportal_capacity::adapter::{ArmCapacityAdapter, TokenCache};
use reportal_capacity::{CapacityController, ControllerOptions};
use reportal_core::config::{AppConfig, DatabaseProvider};
use reportal_core::error::AppError;
use reportal_database::memory::{MemoryActivityStore, MemoryCapacityConfigStore};
use reportal_database::repositories::{ActivityRepository, CapacityConfigRepository};
use reportal_database::{ActivityStore, CapacityConfigStore, DatabasePool};
use reportal_worker::{CronScheduler, ReconciliationJob};

#[tokio::main]
async fn main() {
    let config = match load_configuration() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Load configuration from files and environment
fn load_configuration() -> Result<AppConfig, AppError> {
    let env = std::env::var("REPORTAL_ENV").unwrap_or_else(|_| "development".to_string());

    let config = AppConfig::load(&env)?;
    config.validate()?;
    Ok(config)
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Reportal v{}", env!("CARGO_PKG_VERSION"));
    let config = Arc::new(config);

    // ── Step 1: Stores ───────────────────────────────────────────
    let (db_pool, activity_store, config_store): (
        Option<DatabasePool>,
        Arc<dyn ActivityStore>,
        Arc<dyn CapacityConfigStore>,
    ) = match config.database.provider {
        DatabaseProvider::Postgres => {
            let db_pool = DatabasePool::connect(&config.database).await?;
            let activity = Arc::new(ActivityRepository::new(db_pool.pool().clone()));
            let settings = Arc::new(CapacityConfigRepository::new(db_pool.pool().clone()));
            (Some(db_pool), activity, settings)
        }
        DatabaseProvider::Memory => {
            tracing::warn!("Using in-memory stores; heartbeats and settings are not persisted");
            (
                None,
                Arc::new(MemoryActivityStore::new()),
                Arc::new(MemoryCapacityConfigStore::new()),
            )
        }
    };

    // ── Step 2: Capacity adapter ─────────────────────────────────
    let tokens = TokenCache::from_config(&config.azure, config.capacity.request_timeout())?;
    let adapter = Arc::new(ArmCapacityAdapter::new(&config.capacity, Arc::new(tokens))?);
    tracing::info!(
        endpoint = %config.capacity.management_endpoint,
        "Capacity adapter initialized"
    );

    // ── Step 3: Shutdown channel ─────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // ── Step 4: Capacity controller ──────────────────────────────
    let options = ControllerOptions::from_config(&config)?;
    let controller = CapacityController::new(
        Arc::clone(&config_store),
        Arc::clone(&activity_store),
        adapter,
        options,
    );
    let (capacity, controller_task) =
        controller.spawn(config.capacity.event_buffer, shutdown_rx.clone());

    // ── Step 5: Reconciliation worker ────────────────────────────
    let scheduler = if config.worker.enabled {
        let job = Arc::new(ReconciliationJob::new(
            Arc::clone(&activity_store),
            capacity.clone(),
            config.activity.active_window(),
        ));
        job.startup_recovery().await;

        let scheduler = CronScheduler::new().await?;
        scheduler
            .register(job, &config.worker.reconcile_cron)
            .await?;
        scheduler.start().await?;
        Some(scheduler)
    } else {
        tracing::info!("Reconciliation worker disabled on this instance");
        None
    };

    // ── Step 6: Build and start HTTP server ──────────────────────
    let app_state = AppState {
        config: Arc::clone(&config),
        activity_store,
        config_store,
        capacity,
    };
    let app = reportal_api::build_router(app_state);

    let addr = config.server.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Reportal server listening on {}", addr);

    // ── Step 7: Graceful shutdown ────────────────────────────────
    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    // ── Step 8: Wait for background tasks ───────────────────────
    tracing::info!("Waiting for background tasks to complete...");

    if let Some(scheduler) = scheduler {
        if let Err(e) = scheduler.shutdown().await {
            tracing::warn!("Scheduler shutdown failed: {}", e);
        }
    }

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    if tokio::time::timeout(grace, controller_task).await.is_err() {
        tracing::warn!("Capacity controller did not stop within {:?}", grace);
    }

    if let Some(db_pool) = db_pool {
        db_pool.close().await;
    }

    tracing::info!("Reportal server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

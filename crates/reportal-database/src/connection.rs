//! Postgres pool for the heartbeat and capacity tables.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use reportal_core::config::DatabaseConfig;
use reportal_core::error::{AppError, ErrorKind};

/// Owned sqlx pool, migrated before any store is built on it.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Open the pool described by `config` and bring the schema up to date.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        info!(
            url = %redact_credentials(&config.url),
            max_connections = config.max_connections,
            "Connecting to heartbeat database"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, format!("Database unreachable: {e}"), e)
            })?;

        let db = Self { pool };
        db.migrate().await?;
        Ok(db)
    }

    /// Apply the embedded `migrations/` directory.
    async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, format!("Migration failed: {e}"), e)
            })?;
        info!("Capacity schema is current");
        Ok(())
    }

    /// Borrow the pool for repository construction.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close all connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Drop everything between the scheme and `@` so credentials never reach logs.
fn redact_credentials(url: &str) -> String {
    match (url.split_once("://"), url.rsplit_once('@')) {
        (Some((scheme, _)), Some((_, host))) => format!("{scheme}://***@{host}"),
        _ => url.to_string(),
    }
}

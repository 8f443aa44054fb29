//! Capacity settings and schedule repository implementation.

use async_trait::async_trait;
use sqlx::PgPool;

use reportal_core::error::{AppError, ErrorKind};
use reportal_core::result::AppResult;
use reportal_entity::capacity::CapacitySettings;
use reportal_entity::schedule::ScheduleWindow;

use crate::store::{CapacityConfigStore, check_schedule};

const SETTINGS_COLUMNS: &str =
    "capacity_type, capacity_name, resource_group, subscription_id, auto_managed_capacity, updated_at";

/// Repository for the capacity settings singleton and the schedule table.
#[derive(Debug, Clone)]
pub struct CapacityConfigRepository {
    pool: PgPool,
}

impl CapacityConfigRepository {
    /// Create a new capacity configuration repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CapacityConfigStore for CapacityConfigRepository {
    async fn get_settings(&self) -> AppResult<Option<CapacitySettings>> {
        sqlx::query_as::<_, CapacitySettings>(&format!(
            "SELECT {SETTINGS_COLUMNS} FROM capacity_settings WHERE id = 1"
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to load capacity settings", e)
        })
    }

    async fn get_schedule(&self) -> AppResult<Vec<ScheduleWindow>> {
        sqlx::query_as::<_, ScheduleWindow>(
            "SELECT day_of_week, start_hour, start_minute, end_hour, end_minute \
             FROM capacity_schedule ORDER BY day_of_week, start_hour, start_minute",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load schedule", e))
    }

    async fn upsert_settings(&self, settings: &CapacitySettings) -> AppResult<CapacitySettings> {
        sqlx::query_as::<_, CapacitySettings>(&format!(
            "INSERT INTO capacity_settings \
             (id, capacity_type, capacity_name, resource_group, subscription_id, auto_managed_capacity, updated_at) \
             VALUES (1, $1, $2, $3, $4, $5, NOW()) \
             ON CONFLICT (id) DO UPDATE SET \
             capacity_type = EXCLUDED.capacity_type, capacity_name = EXCLUDED.capacity_name, \
             resource_group = EXCLUDED.resource_group, subscription_id = EXCLUDED.subscription_id, \
             auto_managed_capacity = EXCLUDED.auto_managed_capacity, updated_at = NOW() \
             RETURNING {SETTINGS_COLUMNS}"
        ))
        .bind(settings.capacity_type)
        .bind(&settings.capacity_name)
        .bind(&settings.resource_group)
        .bind(&settings.subscription_id)
        .bind(settings.auto_managed_capacity)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to save capacity settings", e)
        })
    }

    async fn replace_schedule(&self, windows: &[ScheduleWindow]) -> AppResult<()> {
        check_schedule(windows)?;

        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        sqlx::query("DELETE FROM capacity_schedule")
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to clear schedule", e)
            })?;

        for window in windows {
            sqlx::query(
                "INSERT INTO capacity_schedule \
                 (day_of_week, start_hour, start_minute, end_hour, end_minute) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(window.day_of_week)
            .bind(window.start_hour)
            .bind(window.start_minute)
            .bind(window.end_hour)
            .bind(window.end_minute)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to insert schedule row", e)
            })?;
        }

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit schedule", e)
        })?;

        tracing::info!(rows = windows.len(), "Capacity schedule replaced");
        Ok(())
    }
}

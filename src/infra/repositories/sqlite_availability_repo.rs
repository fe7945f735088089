use crate::domain::models::availability::{AvailabilityOverride, AvailabilityRule};
use crate::domain::ports::AvailabilityRepository;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::SqlitePool;

pub struct SqliteAvailabilityRepo {
    pool: SqlitePool,
}

impl SqliteAvailabilityRepo {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AvailabilityRepository for SqliteAvailabilityRepo {
    async fn create_rule(&self, rule: &AvailabilityRule) -> Result<AvailabilityRule, AppError> {
        sqlx::query_as::<_, AvailabilityRule>(
            "INSERT INTO availability_rules (id, trainer_id, day_of_week, start_minute, end_minute, created_at)
             VALUES (?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&rule.id)
        .bind(&rule.trainer_id)
        .bind(rule.day_of_week)
        .bind(rule.start_minute)
        .bind(rule.end_minute)
        .bind(rule.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    async fn list_rules(&self, trainer_id: &str) -> Result<Vec<AvailabilityRule>, AppError> {
        sqlx::query_as::<_, AvailabilityRule>(
            "SELECT * FROM availability_rules WHERE trainer_id = ?
             ORDER BY day_of_week ASC, start_minute ASC",
        )
        .bind(trainer_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    async fn delete_rule(&self, trainer_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM availability_rules WHERE trainer_id = ? AND id = ?")
            .bind(trainer_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Availability rule not found".into()));
        }
        Ok(())
    }

    async fn create_override(
        &self,
        override_entity: &AvailabilityOverride,
    ) -> Result<AvailabilityOverride, AppError> {
        sqlx::query_as::<_, AvailabilityOverride>(
            "INSERT INTO availability_overrides
                 (id, trainer_id, block_type, start_date, end_date, start_minute, end_minute, reason, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             RETURNING *",
        )
        .bind(&override_entity.id)
        .bind(&override_entity.trainer_id)
        .bind(override_entity.block_type.as_str())
        .bind(override_entity.start_date)
        .bind(override_entity.end_date)
        .bind(override_entity.start_minute)
        .bind(override_entity.end_minute)
        .bind(&override_entity.reason)
        .bind(override_entity.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    async fn list_overrides_in_range(
        &self,
        trainer_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AvailabilityOverride>, AppError> {
        sqlx::query_as::<_, AvailabilityOverride>(
            "SELECT * FROM availability_overrides
             WHERE trainer_id = ? AND start_date <= ? AND COALESCE(end_date, start_date) >= ?
             ORDER BY start_date ASC",
        )
        .bind(trainer_id)
        .bind(end)
        .bind(start)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    async fn delete_override(&self, trainer_id: &str, id: &str) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM availability_overrides WHERE trainer_id = ? AND id = ?")
            .bind(trainer_id)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Availability override not found".into()));
        }
        Ok(())
    }
}

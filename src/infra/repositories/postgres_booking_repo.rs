use crate::domain::models::booking::{Booking, BookingStatus};
use crate::domain::models::ledger::LedgerReason;
use crate::domain::ports::BookingRepository;
use crate::error::AppError;
use crate::infra::repositories::postgres_ledger_repo::apply_settlement;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

pub struct PostgresBookingRepo {
    pool: PgPool,
}

impl PostgresBookingRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn status_list(statuses: &[BookingStatus]) -> String {
    statuses
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ")
}

// 23P01 = exclusion constraint violation (bookings_no_active_overlap).
fn is_exclusion_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.code().unwrap_or_default() == "23P01")
        .unwrap_or(false)
}

#[async_trait]
impl BookingRepository for PostgresBookingRepo {
    async fn insert_if_slot_free(&self, booking: &Booking) -> Result<Booking, AppError> {
        // The overlap guard lives in the schema: the gist exclusion
        // constraint rejects any insert overlapping an active booking.
        let result = sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (id, studio_id, trainer_id, client_id, service_id, start_at, end_at,
                                   credits_required, status, hold_expires_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING *",
        )
        .bind(&booking.id)
        .bind(&booking.studio_id)
        .bind(&booking.trainer_id)
        .bind(&booking.client_id)
        .bind(&booking.service_id)
        .bind(booking.start_at)
        .bind(booking.end_at)
        .bind(booking.credits_required)
        .bind(booking.status.as_str())
        .bind(booking.hold_expires_at)
        .bind(booking.created_at)
        .bind(booking.updated_at)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(e) if is_exclusion_violation(&e) => Err(AppError::SlotConflict {
                trainer_id: booking.trainer_id.clone(),
            }),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    async fn find_by_id(&self, studio_id: &str, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE studio_id = $1 AND id = $2")
            .bind(studio_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn list_for_trainer_between(
        &self,
        trainer_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE trainer_id = $1 AND start_at < $2 AND end_at > $3
             ORDER BY start_at ASC",
        )
        .bind(trainer_id)
        .bind(end)
        .bind(start)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }

    async fn list_active_overlapping(
        &self,
        trainer_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>, AppError> {
        let sql = format!(
            "SELECT * FROM bookings
             WHERE trainer_id = $1 AND status IN ({}) AND start_at < $2 AND end_at > $3
             ORDER BY start_at ASC",
            status_list(&BookingStatus::ACTIVE)
        );
        sqlx::query_as::<_, Booking>(&sql)
            .bind(trainer_id)
            .bind(end)
            .bind(start)
            .fetch_all(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn transition(
        &self,
        studio_id: &str,
        id: &str,
        from: &[BookingStatus],
        to: BookingStatus,
    ) -> Result<Option<Booking>, AppError> {
        let sql = format!(
            "UPDATE bookings SET status = $1, hold_expires_at = NULL, updated_at = $2
             WHERE studio_id = $3 AND id = $4 AND status IN ({})
             RETURNING *",
            status_list(from)
        );
        sqlx::query_as::<_, Booking>(&sql)
            .bind(to.as_str())
            .bind(Utc::now())
            .bind(studio_id)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::Database)
    }

    async fn complete_with_debit(&self, booking: &Booking) -> Result<Option<Booking>, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;

        let sql = format!(
            "UPDATE bookings SET status = $1, hold_expires_at = NULL, updated_at = $2
             WHERE studio_id = $3 AND id = $4 AND status IN ({})
             RETURNING *",
            status_list(&[BookingStatus::CheckedIn, BookingStatus::Confirmed])
        );
        let completed = sqlx::query_as::<_, Booking>(&sql)
            .bind(BookingStatus::Completed.as_str())
            .bind(Utc::now())
            .bind(&booking.studio_id)
            .bind(&booking.id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(AppError::Database)?;

        let Some(completed) = completed else {
            tx.rollback().await.map_err(AppError::Database)?;
            return Ok(None);
        };

        match apply_settlement(
            &mut *tx,
            &completed.client_id,
            &completed.id,
            completed.credits_required,
            LedgerReason::DebitOnComplete,
        )
        .await
        {
            Ok(_) => {}
            Err(AppError::AlreadySettled { .. }) => {}
            Err(e) => {
                tx.rollback().await.map_err(AppError::Database)?;
                return Err(e);
            }
        }

        tx.commit().await.map_err(AppError::Database)?;
        Ok(Some(completed))
    }

    async fn find_expired_holds(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Booking>, AppError> {
        sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings
             WHERE status = $1 AND hold_expires_at IS NOT NULL AND hold_expires_at < $2
             ORDER BY hold_expires_at ASC
             LIMIT $3",
        )
        .bind(BookingStatus::SoftHold.as_str())
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }
}

use crate::domain::models::booking::{Booking, BookingStatus};
use crate::domain::ports::BookingRepository;
use crate::error::AppError;
use crate::infra::repositories::sqlite_ledger_repo::apply_settlement;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::models::ledger::LedgerReason;

pub struct SqliteBookingRepo {
    pool: SqlitePool,
}

impl SqliteBookingRepo {
    pub fn new(pool: SqlitePool) -> Self {
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

#[async_trait]
impl BookingRepository for SqliteBookingRepo {
    async fn insert_if_slot_free(&self, booking: &Booking) -> Result<Booking, AppError> {
        // Guard and insert are one statement; SQLite's single-writer model
        // makes the overlap check and the write atomic.
        let sql = format!(
            "INSERT INTO bookings (id, studio_id, trainer_id, client_id, service_id, start_at, end_at,
                                   credits_required, status, hold_expires_at, created_at, updated_at)
             SELECT ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?
             WHERE NOT EXISTS (
                 SELECT 1 FROM bookings
                 WHERE trainer_id = ? AND status IN ({}) AND start_at < ? AND end_at > ?
             )",
            status_list(&BookingStatus::ACTIVE)
        );

        let result = sqlx::query(&sql)
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
            .bind(&booking.trainer_id)
            .bind(booking.end_at)
            .bind(booking.start_at)
            .execute(&self.pool)
            .await
            .map_err(AppError::Database)?;

        if result.rows_affected() == 0 {
            return Err(AppError::SlotConflict {
                trainer_id: booking.trainer_id.clone(),
            });
        }
        Ok(booking.clone())
    }

    async fn find_by_id(&self, studio_id: &str, id: &str) -> Result<Option<Booking>, AppError> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE studio_id = ? AND id = ?")
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
            "SELECT * FROM bookings WHERE trainer_id = ? AND start_at < ? AND end_at > ?
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
             WHERE trainer_id = ? AND status IN ({}) AND start_at < ? AND end_at > ?
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
            "UPDATE bookings SET status = ?, hold_expires_at = NULL, updated_at = ?
             WHERE studio_id = ? AND id = ? AND status IN ({})
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
            "UPDATE bookings SET status = ?, hold_expires_at = NULL, updated_at = ?
             WHERE studio_id = ? AND id = ? AND status IN ({})
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
            // A debit left behind by an earlier attempt; the completion
            // still stands and the balance stays untouched.
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
             WHERE status = ? AND hold_expires_at IS NOT NULL AND hold_expires_at < ?
             ORDER BY hold_expires_at ASC
             LIMIT ?",
        )
        .bind(BookingStatus::SoftHold.as_str())
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }
}

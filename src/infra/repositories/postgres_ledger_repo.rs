use crate::domain::models::credits::Credits;
use crate::domain::models::ledger::{LedgerEntry, LedgerReason};
use crate::domain::ports::LedgerRepository;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{PgConnection, PgPool, Row};
use uuid::Uuid;

pub struct PostgresLedgerRepo {
    pool: PgPool,
}

impl PostgresLedgerRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Same contract as the SQLite variant: idempotency check, balance
/// mutation, and entry insert in one open transaction.
pub(crate) async fn apply_settlement(
    conn: &mut PgConnection,
    client_id: &str,
    booking_id: &str,
    amount: Credits,
    reason: LedgerReason,
) -> Result<Credits, AppError> {
    let existing = sqlx::query("SELECT 1 FROM ledger_entries WHERE booking_id = $1 AND reason = $2")
        .bind(booking_id)
        .bind(reason.as_str())
        .fetch_optional(&mut *conn)
        .await
        .map_err(AppError::Database)?;
    if existing.is_some() {
        return Err(AppError::AlreadySettled {
            booking_id: booking_id.to_string(),
        });
    }

    let delta = match reason {
        LedgerReason::DebitOnComplete => -amount,
        _ => amount,
    };

    ensure_balance_row(&mut *conn, client_id).await?;

    if delta.is_negative() {
        let updated = sqlx::query(
            "UPDATE credit_balances SET balance = balance + $1, updated_at = $2
             WHERE client_id = $3 AND balance + $1 >= 0",
        )
        .bind(delta)
        .bind(Utc::now())
        .bind(client_id)
        .execute(&mut *conn)
        .await
        .map_err(AppError::Database)?;

        if updated.rows_affected() == 0 {
            let available = current_balance(&mut *conn, client_id).await?;
            return Err(AppError::InsufficientCredits {
                client_id: client_id.to_string(),
                required: amount,
                available,
            });
        }
    } else {
        sqlx::query(
            "UPDATE credit_balances SET balance = balance + $1, updated_at = $2 WHERE client_id = $3",
        )
        .bind(delta)
        .bind(Utc::now())
        .bind(client_id)
        .execute(&mut *conn)
        .await
        .map_err(AppError::Database)?;
    }

    let entry = LedgerEntry::new(client_id.to_string(), Some(booking_id.to_string()), delta, reason);
    let inserted = sqlx::query(
        "INSERT INTO ledger_entries (id, client_id, booking_id, delta, reason, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(&entry.id)
    .bind(&entry.client_id)
    .bind(&entry.booking_id)
    .bind(entry.delta)
    .bind(entry.reason.as_str())
    .bind(entry.created_at)
    .execute(&mut *conn)
    .await;

    if let Err(e) = inserted {
        // 23505 = unique violation; a concurrent settlement won the race.
        if is_unique_violation(&e) {
            return Err(AppError::AlreadySettled {
                booking_id: booking_id.to_string(),
            });
        }
        return Err(AppError::Database(e));
    }

    current_balance(&mut *conn, client_id).await
}

pub(crate) async fn ensure_balance_row(
    conn: &mut PgConnection,
    client_id: &str,
) -> Result<(), AppError> {
    sqlx::query(
        "INSERT INTO credit_balances (client_id, balance, updated_at) VALUES ($1, 0, $2)
         ON CONFLICT (client_id) DO NOTHING",
    )
    .bind(client_id)
    .bind(Utc::now())
    .execute(conn)
    .await
    .map_err(AppError::Database)?;
    Ok(())
}

pub(crate) async fn current_balance(
    conn: &mut PgConnection,
    client_id: &str,
) -> Result<Credits, AppError> {
    let row = sqlx::query("SELECT balance FROM credit_balances WHERE client_id = $1")
        .bind(client_id)
        .fetch_optional(conn)
        .await
        .map_err(AppError::Database)?;
    Ok(row
        .map(|r| Credits::from_hundredths(r.get::<i64, _>("balance")))
        .unwrap_or(Credits::ZERO))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.code().unwrap_or_default() == "23505")
        .unwrap_or(false)
}

#[async_trait]
impl LedgerRepository for PostgresLedgerRepo {
    async fn debit(&self, client_id: &str, booking_id: &str, amount: Credits) -> Result<Credits, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let balance =
            apply_settlement(&mut *tx, client_id, booking_id, amount, LedgerReason::DebitOnComplete).await?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(balance)
    }

    async fn refund(&self, client_id: &str, booking_id: &str, amount: Credits) -> Result<Credits, AppError> {
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        let balance =
            apply_settlement(&mut *tx, client_id, booking_id, amount, LedgerReason::RefundOnCancel).await?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(balance)
    }

    async fn grant(&self, client_id: &str, amount: Credits) -> Result<Credits, AppError> {
        if amount <= Credits::ZERO {
            return Err(AppError::Validation("Grant amount must be positive".into()));
        }
        let mut tx = self.pool.begin().await.map_err(AppError::Database)?;
        ensure_balance_row(&mut *tx, client_id).await?;
        sqlx::query(
            "UPDATE credit_balances SET balance = balance + $1, updated_at = $2 WHERE client_id = $3",
        )
        .bind(amount)
        .bind(Utc::now())
        .bind(client_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;
        sqlx::query(
            "INSERT INTO ledger_entries (id, client_id, booking_id, delta, reason, created_at)
             VALUES ($1, $2, NULL, $3, $4, $5)",
        )
        .bind(Uuid::new_v4().to_string())
        .bind(client_id)
        .bind(amount)
        .bind(LedgerReason::Purchase.as_str())
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(AppError::Database)?;
        let balance = current_balance(&mut *tx, client_id).await?;
        tx.commit().await.map_err(AppError::Database)?;
        Ok(balance)
    }

    async fn balance(&self, client_id: &str) -> Result<Credits, AppError> {
        let mut conn = self.pool.acquire().await.map_err(AppError::Database)?;
        current_balance(&mut *conn, client_id).await
    }

    async fn entries(&self, client_id: &str) -> Result<Vec<LedgerEntry>, AppError> {
        sqlx::query_as::<_, LedgerEntry>(
            "SELECT * FROM ledger_entries WHERE client_id = $1 ORDER BY created_at ASC",
        )
        .bind(client_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::Database)
    }
}

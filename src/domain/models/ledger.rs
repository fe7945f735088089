use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::models::credits::Credits;

/// Why a ledger entry exists. Purchases top a balance up and carry no
/// booking; the two settlement reasons are unique per booking.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum LedgerReason {
    Purchase,
    DebitOnComplete,
    RefundOnCancel,
}

impl LedgerReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerReason::Purchase => "purchase",
            LedgerReason::DebitOnComplete => "debit-on-complete",
            LedgerReason::RefundOnCancel => "refund-on-cancel",
        }
    }
}

impl TryFrom<String> for LedgerReason {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "purchase" => Ok(LedgerReason::Purchase),
            "debit-on-complete" => Ok(LedgerReason::DebitOnComplete),
            "refund-on-cancel" => Ok(LedgerReason::RefundOnCancel),
            other => Err(format!("unknown ledger reason '{other}'")),
        }
    }
}

/// Append-only record of a single credit adjustment. Entries are the source
/// of truth for settlement idempotency; the per-client balance row is a
/// materialization updated in the same transaction.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct LedgerEntry {
    pub id: String,
    pub client_id: String,
    pub booking_id: Option<String>,
    pub delta: Credits,
    #[sqlx(try_from = "String")]
    pub reason: LedgerReason,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn new(client_id: String, booking_id: Option<String>, delta: Credits, reason: LedgerReason) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            client_id,
            booking_id,
            delta,
            reason,
            created_at: Utc::now(),
        }
    }
}

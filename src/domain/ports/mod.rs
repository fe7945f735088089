use crate::domain::models::{
    availability::{AvailabilityOverride, AvailabilityRule},
    booking::{Booking, BookingStatus},
    credits::Credits,
    ledger::LedgerEntry,
    service::ServiceOffering,
};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};

#[async_trait]
pub trait AvailabilityRepository: Send + Sync {
    async fn create_rule(&self, rule: &AvailabilityRule) -> Result<AvailabilityRule, AppError>;
    async fn list_rules(&self, trainer_id: &str) -> Result<Vec<AvailabilityRule>, AppError>;
    async fn delete_rule(&self, trainer_id: &str, id: &str) -> Result<(), AppError>;
    async fn create_override(
        &self,
        override_entity: &AvailabilityOverride,
    ) -> Result<AvailabilityOverride, AppError>;
    /// Overrides whose date span intersects `[start, end]`.
    async fn list_overrides_in_range(
        &self,
        trainer_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<AvailabilityOverride>, AppError>;
    async fn delete_override(&self, trainer_id: &str, id: &str) -> Result<(), AppError>;
}

#[async_trait]
pub trait BookingRepository: Send + Sync {
    /// Inserts the booking only if no active booking for the same trainer
    /// overlaps its `[start_at, end_at)` range. The guard is enforced by the
    /// store itself, so two racing requests yield one success and one
    /// `SlotConflict`.
    async fn insert_if_slot_free(&self, booking: &Booking) -> Result<Booking, AppError>;
    async fn find_by_id(&self, studio_id: &str, id: &str) -> Result<Option<Booking>, AppError>;
    async fn list_for_trainer_between(
        &self,
        trainer_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>, AppError>;
    /// Active bookings overlapping `[start, end)`; the date-scoped input to
    /// slot enumeration.
    async fn list_active_overlapping(
        &self,
        trainer_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<Booking>, AppError>;
    /// Compare-and-swap transition: the write is conditioned on the status
    /// still being one of `from`. `None` means the CAS found zero rows — the
    /// caller must re-read and decide. The hold expiry is cleared whenever
    /// the booking leaves `soft-hold`.
    async fn transition(
        &self,
        studio_id: &str,
        id: &str,
        from: &[BookingStatus],
        to: BookingStatus,
    ) -> Result<Option<Booking>, AppError>;
    /// The `complete` CAS and the ledger debit in one transaction, so
    /// completion and billing cannot diverge. `None` means the CAS missed;
    /// `InsufficientCredits` rolls the whole transaction back.
    async fn complete_with_debit(&self, booking: &Booking) -> Result<Option<Booking>, AppError>;
    async fn find_expired_holds(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<Booking>, AppError>;
}

#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Idempotent per booking: a second debit for the same booking returns
    /// `AlreadySettled` without touching the balance.
    async fn debit(&self, client_id: &str, booking_id: &str, amount: Credits) -> Result<Credits, AppError>;
    async fn refund(&self, client_id: &str, booking_id: &str, amount: Credits) -> Result<Credits, AppError>;
    async fn grant(&self, client_id: &str, amount: Credits) -> Result<Credits, AppError>;
    async fn balance(&self, client_id: &str) -> Result<Credits, AppError>;
    async fn entries(&self, client_id: &str) -> Result<Vec<LedgerEntry>, AppError>;
}

#[async_trait]
pub trait ServiceCatalog: Send + Sync {
    async fn get_service(&self, service_id: &str) -> Result<Option<ServiceOffering>, AppError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingNotification {
    Confirmed,
    Completed,
    Cancelled,
}

impl BookingNotification {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingNotification::Confirmed => "confirmed",
            BookingNotification::Completed => "completed",
            BookingNotification::Cancelled => "cancelled",
        }
    }
}

/// Best-effort delivery. Failures are logged by the caller and never roll
/// back a transition.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, kind: BookingNotification, booking: &Booking) -> Result<(), AppError>;
}

/// External payment collaborator. The engine never moves money; it only
/// consumes a cleared/not-cleared signal as a precondition for `confirm`.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn payment_cleared(&self, booking: &Booking) -> Result<bool, AppError>;
}

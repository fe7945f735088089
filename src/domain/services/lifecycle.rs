use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::models::booking::{Booking, BookingEvent, BookingStatus};
use crate::domain::models::credits::Credits;
use crate::domain::ports::{
    BookingNotification, BookingRepository, LedgerRepository, NotificationDispatcher, PaymentGateway,
};
use crate::error::AppError;

/// Owns the booking lifecycle: applies compare-and-swap transitions, runs
/// ledger settlement at the right edges, and fires best-effort
/// notifications. Handlers and the sweeper both go through this service so
/// every transition shares the same concurrency guard.
pub struct LifecycleService {
    booking_repo: Arc<dyn BookingRepository>,
    ledger_repo: Arc<dyn LedgerRepository>,
    notifier: Arc<dyn NotificationDispatcher>,
    payments: Arc<dyn PaymentGateway>,
}

impl LifecycleService {
    pub fn new(
        booking_repo: Arc<dyn BookingRepository>,
        ledger_repo: Arc<dyn LedgerRepository>,
        notifier: Arc<dyn NotificationDispatcher>,
        payments: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            booking_repo,
            ledger_repo,
            notifier,
            payments,
        }
    }

    pub async fn confirm(&self, studio_id: &str, booking_id: &str) -> Result<Booking, AppError> {
        let booking = self.fetch(studio_id, booking_id).await?;
        if booking.status == BookingStatus::Confirmed {
            return Ok(booking);
        }
        if !BookingEvent::Confirm.allowed_from(booking.status) {
            return Err(stale(&booking));
        }

        if !self.payments.payment_cleared(&booking).await? {
            return Err(AppError::Validation(
                "Payment has not cleared for this booking".into(),
            ));
        }

        let confirmed = self.apply(studio_id, booking_id, BookingEvent::Confirm).await?;
        self.notify(BookingNotification::Confirmed, &confirmed);
        Ok(confirmed)
    }

    pub async fn check_in(&self, studio_id: &str, booking_id: &str) -> Result<Booking, AppError> {
        let booking = self.fetch(studio_id, booking_id).await?;
        if booking.status == BookingStatus::CheckedIn {
            return Ok(booking);
        }
        self.apply(studio_id, booking_id, BookingEvent::CheckIn).await
    }

    /// Completion and billing are one atomic step: if the debit fails with
    /// `InsufficientCredits`, the booking keeps its pre-completion status and
    /// the shortfall is resolved out of band before retrying.
    pub async fn complete(&self, studio_id: &str, booking_id: &str) -> Result<Booking, AppError> {
        let booking = self.fetch(studio_id, booking_id).await?;
        if booking.status == BookingStatus::Completed {
            // Retried completion: the debit already happened exactly once.
            return Ok(booking);
        }
        if !BookingEvent::Complete.allowed_from(booking.status) {
            return Err(stale(&booking));
        }

        match self.booking_repo.complete_with_debit(&booking).await? {
            Some(completed) => {
                info!(
                    booking_id = %completed.id,
                    client_id = %completed.client_id,
                    credits = %completed.credits_required,
                    "booking completed and debited"
                );
                self.notify(BookingNotification::Completed, &completed);
                Ok(completed)
            }
            None => self.resolve_stale(studio_id, booking_id, BookingEvent::Complete).await,
        }
    }

    /// Cancellation never refunds by itself; whether credits flow back is a
    /// policy the caller evaluates and exercises through [`refund`].
    pub async fn cancel(&self, studio_id: &str, booking_id: &str) -> Result<Booking, AppError> {
        let booking = self.fetch(studio_id, booking_id).await?;
        if booking.status == BookingStatus::Cancelled {
            return Ok(booking);
        }
        let cancelled = self.apply(studio_id, booking_id, BookingEvent::Cancel).await?;
        self.notify(BookingNotification::Cancelled, &cancelled);
        Ok(cancelled)
    }

    pub async fn no_show(&self, studio_id: &str, booking_id: &str) -> Result<Booking, AppError> {
        let booking = self.fetch(studio_id, booking_id).await?;
        if booking.status == BookingStatus::NoShow {
            return Ok(booking);
        }
        self.apply(studio_id, booking_id, BookingEvent::NoShow).await
    }

    /// Staff-invoked refund of a settled booking. Idempotent: replaying it
    /// returns the unchanged balance.
    pub async fn refund(&self, studio_id: &str, booking_id: &str) -> Result<Credits, AppError> {
        let booking = self.fetch(studio_id, booking_id).await?;
        if !matches!(booking.status, BookingStatus::Cancelled | BookingStatus::NoShow) {
            return Err(AppError::Validation(
                "Only cancelled or no-show bookings can be refunded".into(),
            ));
        }

        match self
            .ledger_repo
            .refund(&booking.client_id, &booking.id, booking.credits_required)
            .await
        {
            Ok(balance) => Ok(balance),
            Err(AppError::AlreadySettled { .. }) => self.ledger_repo.balance(&booking.client_id).await,
            Err(e) => Err(e),
        }
    }

    /// Sweeper entry point: reclaims one expired soft-hold. Returns false
    /// when another process already moved the booking on — a benign no-op,
    /// the CAS itself is the concurrency guard.
    pub async fn expire(&self, booking: &Booking) -> Result<bool, AppError> {
        let released = self
            .booking_repo
            .transition(
                &booking.studio_id,
                &booking.id,
                BookingEvent::Expire.legal_from(),
                BookingEvent::Expire.target(),
            )
            .await?;

        match released {
            Some(cancelled) => {
                info!(booking_id = %cancelled.id, trainer_id = %cancelled.trainer_id, "expired soft-hold released");
                self.notify(BookingNotification::Cancelled, &cancelled);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn fetch(&self, studio_id: &str, booking_id: &str) -> Result<Booking, AppError> {
        self.booking_repo
            .find_by_id(studio_id, booking_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {booking_id} not found")))
    }

    async fn apply(
        &self,
        studio_id: &str,
        booking_id: &str,
        event: BookingEvent,
    ) -> Result<Booking, AppError> {
        let result = self
            .booking_repo
            .transition(studio_id, booking_id, event.legal_from(), event.target())
            .await?;

        match result {
            Some(updated) => Ok(updated),
            None => self.resolve_stale(studio_id, booking_id, event).await,
        }
    }

    /// A CAS that affected zero rows means the status changed underneath us.
    /// Re-read and decide rather than retrying blindly: reaching the target
    /// some other way is success, anything else is a stale-intent error.
    async fn resolve_stale(
        &self,
        studio_id: &str,
        booking_id: &str,
        event: BookingEvent,
    ) -> Result<Booking, AppError> {
        let current = self.fetch(studio_id, booking_id).await?;
        if current.status == event.target() {
            Ok(current)
        } else {
            Err(stale(&current))
        }
    }

    fn notify(&self, kind: BookingNotification, booking: &Booking) {
        let notifier = self.notifier.clone();
        let booking = booking.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.dispatch(kind, &booking).await {
                warn!(booking_id = %booking.id, kind = kind.as_str(), "notification dispatch failed: {e}");
            }
        });
    }
}

fn stale(booking: &Booking) -> AppError {
    AppError::InvalidTransition {
        booking_id: booking.id.clone(),
        status: booking.status,
    }
}

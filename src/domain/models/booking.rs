use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::domain::models::credits::Credits;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    SoftHold,
    Confirmed,
    CheckedIn,
    Completed,
    Cancelled,
    NoShow,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::SoftHold => "soft-hold",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::CheckedIn => "checked-in",
            BookingStatus::Completed => "completed",
            BookingStatus::Cancelled => "cancelled",
            BookingStatus::NoShow => "no-show",
        }
    }

    /// Statuses that hold the trainer's slot and therefore participate in
    /// overlap checks.
    pub const ACTIVE: [BookingStatus; 3] = [
        BookingStatus::SoftHold,
        BookingStatus::Confirmed,
        BookingStatus::CheckedIn,
    ];

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BookingStatus::Completed | BookingStatus::Cancelled | BookingStatus::NoShow
        )
    }
}

impl TryFrom<String> for BookingStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "soft-hold" => Ok(BookingStatus::SoftHold),
            "confirmed" => Ok(BookingStatus::Confirmed),
            "checked-in" => Ok(BookingStatus::CheckedIn),
            "completed" => Ok(BookingStatus::Completed),
            "cancelled" => Ok(BookingStatus::Cancelled),
            "no-show" => Ok(BookingStatus::NoShow),
            other => Err(format!("unknown booking status '{other}'")),
        }
    }
}

/// Lifecycle events a caller can apply to an existing booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingEvent {
    Confirm,
    Expire,
    CheckIn,
    Complete,
    Cancel,
    NoShow,
}

impl BookingEvent {
    /// Legal source statuses for this event. Everything else is an
    /// `InvalidTransition`; terminal states accept no event at all.
    pub fn legal_from(&self) -> &'static [BookingStatus] {
        match self {
            BookingEvent::Confirm => &[BookingStatus::SoftHold],
            BookingEvent::Expire => &[BookingStatus::SoftHold],
            BookingEvent::CheckIn => &[BookingStatus::SoftHold, BookingStatus::Confirmed],
            BookingEvent::Complete => &[BookingStatus::CheckedIn, BookingStatus::Confirmed],
            BookingEvent::Cancel => &[
                BookingStatus::SoftHold,
                BookingStatus::Confirmed,
                BookingStatus::CheckedIn,
            ],
            BookingEvent::NoShow => &[
                BookingStatus::SoftHold,
                BookingStatus::Confirmed,
                BookingStatus::CheckedIn,
            ],
        }
    }

    pub fn target(&self) -> BookingStatus {
        match self {
            BookingEvent::Confirm => BookingStatus::Confirmed,
            BookingEvent::Expire => BookingStatus::Cancelled,
            BookingEvent::CheckIn => BookingStatus::CheckedIn,
            BookingEvent::Complete => BookingStatus::Completed,
            BookingEvent::Cancel => BookingStatus::Cancelled,
            BookingEvent::NoShow => BookingStatus::NoShow,
        }
    }

    pub fn allowed_from(&self, status: BookingStatus) -> bool {
        self.legal_from().contains(&status)
    }
}

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct Booking {
    pub id: String,
    pub studio_id: String,
    pub trainer_id: String,
    pub client_id: String,
    pub service_id: String,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub credits_required: Credits,
    #[sqlx(try_from = "String")]
    pub status: BookingStatus,
    pub hold_expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct NewBookingParams {
    pub studio_id: String,
    pub trainer_id: String,
    pub client_id: String,
    pub service_id: String,
    pub start: DateTime<Utc>,
    pub duration_minutes: i32,
    pub credits_required: Credits,
    /// Self-booked requests enter as a soft-hold with an expiry; a
    /// trainer-confirmed booking starts out confirmed.
    pub self_book: bool,
    pub hold_window: Duration,
}

impl Booking {
    pub fn new(params: NewBookingParams) -> Self {
        let now = Utc::now();
        let (status, hold_expires_at) = if params.self_book {
            (BookingStatus::SoftHold, Some(now + params.hold_window))
        } else {
            (BookingStatus::Confirmed, None)
        };

        Self {
            id: Uuid::new_v4().to_string(),
            studio_id: params.studio_id,
            trainer_id: params.trainer_id,
            client_id: params.client_id,
            service_id: params.service_id,
            start_at: params.start,
            end_at: params.start + Duration::minutes(params.duration_minutes as i64),
            credits_required: params.credits_required,
            status,
            hold_expires_at,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end_at - self.start_at).num_minutes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_EVENTS: [BookingEvent; 6] = [
        BookingEvent::Confirm,
        BookingEvent::Expire,
        BookingEvent::CheckIn,
        BookingEvent::Complete,
        BookingEvent::Cancel,
        BookingEvent::NoShow,
    ];

    #[test]
    fn terminal_states_accept_no_event() {
        for status in [
            BookingStatus::Completed,
            BookingStatus::Cancelled,
            BookingStatus::NoShow,
        ] {
            for event in ALL_EVENTS {
                assert!(!event.allowed_from(status), "{status:?} must reject {event:?}");
            }
        }
    }

    #[test]
    fn confirm_only_from_soft_hold() {
        assert!(BookingEvent::Confirm.allowed_from(BookingStatus::SoftHold));
        assert!(!BookingEvent::Confirm.allowed_from(BookingStatus::Confirmed));
        assert!(!BookingEvent::Confirm.allowed_from(BookingStatus::CheckedIn));
    }

    #[test]
    fn complete_requires_confirmed_or_checked_in() {
        assert!(BookingEvent::Complete.allowed_from(BookingStatus::Confirmed));
        assert!(BookingEvent::Complete.allowed_from(BookingStatus::CheckedIn));
        assert!(!BookingEvent::Complete.allowed_from(BookingStatus::SoftHold));
    }

    #[test]
    fn self_book_sets_hold_expiry() {
        let booking = Booking::new(NewBookingParams {
            studio_id: "s1".into(),
            trainer_id: "t1".into(),
            client_id: "c1".into(),
            service_id: "svc".into(),
            start: Utc::now(),
            duration_minutes: 60,
            credits_required: Credits::from_hundredths(100),
            self_book: true,
            hold_window: Duration::minutes(15),
        });
        assert_eq!(booking.status, BookingStatus::SoftHold);
        assert!(booking.hold_expires_at.is_some());
        assert_eq!(booking.duration_minutes(), 60);
    }

    #[test]
    fn trainer_confirmed_booking_has_no_hold() {
        let booking = Booking::new(NewBookingParams {
            studio_id: "s1".into(),
            trainer_id: "t1".into(),
            client_id: "c1".into(),
            service_id: "svc".into(),
            start: Utc::now(),
            duration_minutes: 30,
            credits_required: Credits::from_hundredths(50),
            self_book: false,
            hold_window: Duration::minutes(15),
        });
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert!(booking.hold_expires_at.is_none());
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::models::booking::Booking;
use crate::domain::models::credits::Credits;

#[derive(Serialize)]
pub struct SlotsResponse {
    pub trainer_id: String,
    pub date: String,
    pub service_id: String,
    pub duration_minutes: i32,
    pub slots: Vec<SlotView>,
}

#[derive(Serialize)]
pub struct SlotView {
    pub start_minute: u16,
    pub start: DateTime<Utc>,
}

#[derive(Serialize)]
pub struct BalanceResponse {
    pub client_id: String,
    pub balance: Credits,
}

#[derive(Serialize)]
pub struct CancelBookingResponse {
    #[serde(flatten)]
    pub booking: Booking,
    /// Whether the cancellation happened before the penalty window opened.
    /// Refunds are never automatic; staff act on this flag via the refund
    /// endpoint.
    pub cancelled_before_penalty_window: bool,
}

#[derive(Serialize)]
pub struct RefundResponse {
    pub booking_id: String,
    pub balance: Credits,
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;

use crate::domain::models::availability::BlockType;
use crate::domain::models::credits::Credits;

#[derive(Deserialize)]
pub struct CreateRuleRequest {
    pub day_of_week: i32,
    pub start_minute: i32,
    pub end_minute: i32,
}

#[derive(Deserialize)]
pub struct CreateOverrideRequest {
    pub block_type: BlockType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_minute: Option<i32>,
    pub end_minute: Option<i32>,
    pub reason: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub trainer_id: String,
    pub client_id: String,
    pub service_id: String,
    pub start: DateTime<Utc>,
    /// Client self-service bookings enter as a soft-hold; staff-created
    /// bookings start out confirmed.
    #[serde(default = "default_self_book")]
    pub self_book: bool,
}

fn default_self_book() -> bool {
    true
}

#[derive(Deserialize)]
pub struct GrantCreditsRequest {
    pub amount: Credits,
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::error::AppError;

pub const MINUTES_PER_DAY: u16 = 1440;

/// One weekly recurring open window for a trainer. Day-of-week is
/// 0 = Monday .. 6 = Sunday. Validated at write time; the resolver
/// assumes rules are already well-formed.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct AvailabilityRule {
    pub id: String,
    pub trainer_id: String,
    pub day_of_week: i32,
    pub start_minute: i32,
    pub end_minute: i32,
    pub created_at: DateTime<Utc>,
}

impl AvailabilityRule {
    pub fn new(trainer_id: String, day_of_week: i32, start_minute: i32, end_minute: i32) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            trainer_id,
            day_of_week,
            start_minute,
            end_minute,
            created_at: Utc::now(),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !(0..=6).contains(&self.day_of_week) {
            return Err(AppError::Validation(
                "day_of_week must be 0 (Monday) to 6 (Sunday)".into(),
            ));
        }
        validate_minute_window(self.start_minute, self.end_minute)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BlockType {
    Available,
    Blocked,
}

impl BlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BlockType::Available => "available",
            BlockType::Blocked => "blocked",
        }
    }
}

impl TryFrom<String> for BlockType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "available" => Ok(BlockType::Available),
            "blocked" => Ok(BlockType::Blocked),
            other => Err(format!("unknown block type '{other}'")),
        }
    }
}

/// A one-off open or blocked range for a specific date (or date span when
/// `end_date` is set). Absent minute bounds cover the whole day.
#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct AvailabilityOverride {
    pub id: String,
    pub trainer_id: String,
    #[sqlx(try_from = "String")]
    pub block_type: BlockType,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_minute: Option<i32>,
    pub end_minute: Option<i32>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AvailabilityOverride {
    pub fn validate(&self) -> Result<(), AppError> {
        if let Some(end) = self.end_date {
            if end < self.start_date {
                return Err(AppError::Validation("end_date must not precede start_date".into()));
            }
        }
        match (self.start_minute, self.end_minute) {
            (None, None) => Ok(()),
            (Some(start), Some(end)) => validate_minute_window(start, end),
            _ => Err(AppError::Validation(
                "start_minute and end_minute must be provided together".into(),
            )),
        }
    }

    /// Inclusive date span this override applies to.
    pub fn covers(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date.unwrap_or(self.start_date)
    }

    /// Minute window within the day, defaulting to the full day.
    pub fn minute_window(&self) -> (u16, u16) {
        match (self.start_minute, self.end_minute) {
            (Some(start), Some(end)) => (start as u16, end as u16),
            _ => (0, MINUTES_PER_DAY),
        }
    }
}

fn validate_minute_window(start: i32, end: i32) -> Result<(), AppError> {
    if start < 0 || end > MINUTES_PER_DAY as i32 {
        return Err(AppError::Validation("minutes must fall within 0..=1440".into()));
    }
    if start >= end {
        return Err(AppError::Validation("start_minute must be before end_minute".into()));
    }
    Ok(())
}

/// A concrete open range for one trainer on one date. Computed on demand,
/// never persisted.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ResolvedInterval {
    pub trainer_id: String,
    pub date: NaiveDate,
    pub start_minute: u16,
    pub end_minute: u16,
}

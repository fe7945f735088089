use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::domain::models::availability::{AvailabilityOverride, AvailabilityRule};
use crate::domain::services::availability::{contained, resolve_day};
use crate::error::AppError;

/// The studio-local calendar date and minute-of-day for an instant.
pub fn local_parts(instant: DateTime<Utc>, tz: Tz) -> (NaiveDate, u16) {
    let local = instant.with_timezone(&tz);
    let minute = (local.hour() * 60 + local.minute()) as u16;
    (local.date_naive(), minute)
}

/// UTC bounds of a studio-local calendar date, for scoping per-date booking
/// queries. Falls back to fixed 24h arithmetic on DST-ambiguous midnights.
pub fn day_bounds_utc(date: NaiveDate, tz: Tz) -> (DateTime<Utc>, DateTime<Utc>) {
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    let start = tz
        .from_local_datetime(&midnight)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight));
    (start, start + Duration::days(1))
}

/// UTC instant for a minute-of-day on a studio-local date. Skipped local
/// times during a DST jump resolve to the earliest valid instant.
pub fn local_minute_to_utc(date: NaiveDate, minute: u16, tz: Tz) -> DateTime<Utc> {
    let naive = date.and_hms_opt(0, 0, 0).unwrap_or_default() + Duration::minutes(minute as i64);
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}

/// Verifies that `[start, start + duration)` lies fully inside a single
/// resolved open interval of the trainer's studio-local day. Overlap with
/// other bookings is not checked here; the store's conditional insert owns
/// that half of the race.
pub fn check_within_open_hours(
    rules: &[AvailabilityRule],
    overrides: &[AvailabilityOverride],
    tz: Tz,
    trainer_id: &str,
    start: DateTime<Utc>,
    duration_minutes: i64,
) -> Result<(), AppError> {
    let (date, start_minute) = local_parts(start, tz);
    let end_minute = start_minute as i64 + duration_minutes;

    // Sessions never span a local midnight.
    if duration_minutes <= 0 || end_minute > 1440 {
        return Err(AppError::SlotUnavailable {
            trainer_id: trainer_id.to_string(),
        });
    }

    let open = resolve_day(rules, overrides, date);
    if !contained(&open, start_minute, end_minute as u16) {
        return Err(AppError::SlotUnavailable {
            trainer_id: trainer_id.to_string(),
        });
    }
    Ok(())
}

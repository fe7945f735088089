use chrono_tz::Tz;
use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Wall-clock timezone for availability rules and overrides. Bookings
    /// are stored in UTC.
    pub studio_timezone: String,
    /// How long a self-booked soft-hold blocks the slot before the sweeper
    /// reclaims it.
    pub hold_window_minutes: i64,
    /// Cancellations at least this far ahead of the session start are
    /// outside the penalty window. The engine reports the flag; refund
    /// policy stays with the caller.
    pub cancellation_window_hours: i64,
    pub sweep_interval_secs: u64,
    pub sweep_page_size: i64,
    pub catalog_service_url: String,
    pub notify_service_url: String,
    pub notify_service_token: String,
    pub payment_service_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()
                .expect("PORT must be a number"),
            studio_timezone: env::var("STUDIO_TIMEZONE").unwrap_or_else(|_| "UTC".to_string()),
            hold_window_minutes: parse_env("HOLD_WINDOW_MINUTES", 15),
            cancellation_window_hours: parse_env("CANCELLATION_WINDOW_HOURS", 24),
            sweep_interval_secs: parse_env("SWEEP_INTERVAL_SECS", 30),
            sweep_page_size: parse_env("SWEEP_PAGE_SIZE", 100),
            catalog_service_url: env::var("CATALOG_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8100/api/v1".to_string()),
            notify_service_url: env::var("NOTIFY_SERVICE_URL")
                .unwrap_or_else(|_| "http://localhost:8200/api/v1/notify".to_string()),
            notify_service_token: env::var("NOTIFY_SERVICE_TOKEN")
                .unwrap_or_else(|_| "test-token-1".to_string()),
            payment_service_url: env::var("PAYMENT_SERVICE_URL").ok(),
        }
    }

    pub fn timezone(&self) -> Tz {
        self.studio_timezone.parse().unwrap_or(chrono_tz::UTC)
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

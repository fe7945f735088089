#![allow(dead_code)]

use studio_scheduler::{
    api::router::create_router,
    config::Config,
    domain::models::booking::Booking,
    domain::models::credits::Credits,
    domain::models::service::ServiceOffering,
    domain::ports::{BookingNotification, NotificationDispatcher, PaymentGateway, ServiceCatalog},
    domain::services::lifecycle::LifecycleService,
    error::AppError,
    infra::repositories::{
        sqlite_availability_repo::SqliteAvailabilityRepo, sqlite_booking_repo::SqliteBookingRepo,
        sqlite_ledger_repo::SqliteLedgerRepo,
    },
    state::AppState,
};

use async_trait::async_trait;
use chrono::Datelike;
use axum::{
    body::Body,
    http::{header, Request},
    response::Response,
    Router,
};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

/// Fixed in-memory catalog standing in for the external service registry.
pub struct StaticCatalog {
    services: HashMap<String, ServiceOffering>,
}

impl StaticCatalog {
    pub fn seeded() -> Self {
        let mut services = HashMap::new();
        services.insert(
            "personal-60".to_string(),
            ServiceOffering {
                id: "personal-60".to_string(),
                name: "Personal Training (60 min)".to_string(),
                duration_minutes: 60,
                credits_required: Credits::from_hundredths(100),
            },
        );
        services.insert(
            "express-30".to_string(),
            ServiceOffering {
                id: "express-30".to_string(),
                name: "Express Session (30 min)".to_string(),
                duration_minutes: 30,
                credits_required: Credits::from_hundredths(50),
            },
        );
        Self { services }
    }
}

#[async_trait]
impl ServiceCatalog for StaticCatalog {
    async fn get_service(&self, service_id: &str) -> Result<Option<ServiceOffering>, AppError> {
        Ok(self.services.get(service_id).cloned())
    }
}

pub struct MockNotificationDispatcher;

#[async_trait]
impl NotificationDispatcher for MockNotificationDispatcher {
    async fn dispatch(&self, _kind: BookingNotification, _booking: &Booking) -> Result<(), AppError> {
        Ok(())
    }
}

/// Payment collaborator whose answer tests can flip mid-scenario.
pub struct MockPaymentGateway {
    cleared: AtomicBool,
}

impl MockPaymentGateway {
    pub fn new() -> Self {
        Self {
            cleared: AtomicBool::new(true),
        }
    }

    pub fn set_cleared(&self, cleared: bool) {
        self.cleared.store(cleared, Ordering::SeqCst);
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn payment_cleared(&self, _booking: &Booking) -> Result<bool, AppError> {
        Ok(self.cleared.load(Ordering::SeqCst))
    }
}

pub struct TestApp {
    pub router: Router,
    pub pool: Pool<Sqlite>,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub payments: Arc<MockPaymentGateway>,
}

impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let connection_options = SqliteConnectOptions::from_str(&db_url)
            .unwrap()
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .connect_with(connection_options)
            .await
            .expect("Failed to connect to test db");

        sqlx::migrate!("./migrations/sqlite")
            .run(&pool)
            .await
            .expect("Failed to migrate test db");

        let config = Config {
            database_url: db_url.clone(),
            port: 0,
            studio_timezone: "UTC".to_string(),
            hold_window_minutes: 15,
            cancellation_window_hours: 24,
            sweep_interval_secs: 30,
            sweep_page_size: 100,
            catalog_service_url: "http://localhost".to_string(),
            notify_service_url: "http://localhost".to_string(),
            notify_service_token: "token".to_string(),
            payment_service_url: None,
        };

        let availability_repo = Arc::new(SqliteAvailabilityRepo::new(pool.clone()));
        let booking_repo = Arc::new(SqliteBookingRepo::new(pool.clone()));
        let ledger_repo = Arc::new(SqliteLedgerRepo::new(pool.clone()));
        let payments = Arc::new(MockPaymentGateway::new());
        let notifier = Arc::new(MockNotificationDispatcher);

        let lifecycle = Arc::new(LifecycleService::new(
            booking_repo.clone(),
            ledger_repo.clone(),
            notifier.clone(),
            payments.clone(),
        ));

        let state = Arc::new(AppState {
            config,
            availability_repo,
            booking_repo,
            ledger_repo,
            catalog: Arc::new(StaticCatalog::seeded()),
            lifecycle,
        });

        let router = create_router(state.clone());

        Self {
            router,
            pool,
            db_filename,
            state,
            payments,
        }
    }

    pub async fn post(&self, uri: &str, payload: Value) -> Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(payload.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response {
        self.router
            .clone()
            .oneshot(Request::builder().method("GET").uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn delete(&self, uri: &str) -> Response {
        self.router
            .clone()
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    /// Opens the given weekday window for a trainer via the API.
    pub async fn seed_rule(&self, trainer_id: &str, day_of_week: i32, start_minute: i32, end_minute: i32) {
        let res = self
            .post(
                &format!("/api/v1/studio-1/trainers/{trainer_id}/rules"),
                serde_json::json!({
                    "day_of_week": day_of_week,
                    "start_minute": start_minute,
                    "end_minute": end_minute
                }),
            )
            .await;
        assert!(res.status().is_success(), "seed_rule failed: {}", res.status());
    }

    pub async fn grant_credits(&self, client_id: &str, amount: &str) {
        let res = self
            .post(
                &format!("/api/v1/studio-1/clients/{client_id}/credits"),
                serde_json::json!({ "amount": amount }),
            )
            .await;
        assert!(res.status().is_success(), "grant_credits failed: {}", res.status());
    }
}

/// Next occurrence of `weekday` at least a week out, so bookings built on
/// it are always in the future.
pub fn upcoming(weekday: chrono::Weekday) -> chrono::NaiveDate {
    let mut date = chrono::Utc::now().date_naive() + chrono::Duration::days(7);
    while date.weekday() != weekday {
        date = date.succ_opt().unwrap();
    }
    date
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
    }
}

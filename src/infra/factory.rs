use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{ConnectOptions, PgPool, SqlitePool};
use tracing::info;
use tracing::log::LevelFilter;

use crate::config::Config;
use crate::domain::ports::PaymentGateway;
use crate::domain::services::lifecycle::LifecycleService;
use crate::infra::catalog::http_service_catalog::HttpServiceCatalog;
use crate::infra::notify::http_notification_service::HttpNotificationService;
use crate::infra::payment::http_payment_gateway::HttpPaymentGateway;
use crate::infra::payment::PermissivePaymentGateway;
use crate::infra::repositories::{
    postgres_availability_repo::PostgresAvailabilityRepo, postgres_booking_repo::PostgresBookingRepo,
    postgres_ledger_repo::PostgresLedgerRepo, sqlite_availability_repo::SqliteAvailabilityRepo,
    sqlite_booking_repo::SqliteBookingRepo, sqlite_ledger_repo::SqliteLedgerRepo,
};
use crate::state::AppState;

pub async fn bootstrap_state(config: &Config) -> AppState {
    let database_url = &config.database_url;

    let catalog = Arc::new(HttpServiceCatalog::new(config.catalog_service_url.clone()));
    let notifier = Arc::new(HttpNotificationService::new(
        config.notify_service_url.clone(),
        config.notify_service_token.clone(),
    ));
    let payments: Arc<dyn PaymentGateway> = match &config.payment_service_url {
        Some(url) => Arc::new(HttpPaymentGateway::new(url.clone())),
        None => Arc::new(PermissivePaymentGateway),
    };

    if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        info!("Initializing PostgreSQL connection...");

        let mut opts: PgConnectOptions = database_url.parse().expect("Invalid Postgres URL");
        opts = opts
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect_with(opts)
            .await
            .expect("Failed to connect to Postgres");

        run_postgres_migrations(&pool).await;

        let availability_repo = Arc::new(PostgresAvailabilityRepo::new(pool.clone()));
        let booking_repo = Arc::new(PostgresBookingRepo::new(pool.clone()));
        let ledger_repo = Arc::new(PostgresLedgerRepo::new(pool.clone()));
        let lifecycle = Arc::new(LifecycleService::new(
            booking_repo.clone(),
            ledger_repo.clone(),
            notifier,
            payments,
        ));

        AppState {
            config: config.clone(),
            availability_repo,
            booking_repo,
            ledger_repo,
            catalog,
            lifecycle,
        }
    } else {
        info!("Initializing SQLite connection with WAL Mode...");

        let opts = SqliteConnectOptions::from_str(database_url)
            .expect("Invalid SQLite connection string")
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5))
            .log_statements(LevelFilter::Debug)
            .log_slow_statements(LevelFilter::Warn, Duration::from_millis(500));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(opts)
            .await
            .expect("Failed to connect to SQLite");

        run_sqlite_migrations(&pool).await;

        let availability_repo = Arc::new(SqliteAvailabilityRepo::new(pool.clone()));
        let booking_repo = Arc::new(SqliteBookingRepo::new(pool.clone()));
        let ledger_repo = Arc::new(SqliteLedgerRepo::new(pool.clone()));
        let lifecycle = Arc::new(LifecycleService::new(
            booking_repo.clone(),
            ledger_repo.clone(),
            notifier,
            payments,
        ));

        AppState {
            config: config.clone(),
            availability_repo,
            booking_repo,
            ledger_repo,
            catalog,
            lifecycle,
        }
    }
}

async fn run_postgres_migrations(pool: &PgPool) {
    sqlx::migrate!("./migrations/postgres")
        .run(pool)
        .await
        .expect("Failed to run Postgres migrations");
}

async fn run_sqlite_migrations(pool: &SqlitePool) {
    sqlx::migrate!("./migrations/sqlite")
        .run(pool)
        .await
        .expect("Failed to run SQLite migrations");
}

use chrono::Utc;
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::error::AppError;
use crate::state::AppState;

/// Runs one sweep over expired soft-holds and returns how many bookings
/// were reclaimed. Each hold is expired individually so a single failure
/// does not abort the batch.
pub async fn run_sweep(state: &AppState) -> Result<usize, AppError> {
    let now = Utc::now();
    let expired = state
        .booking_repo
        .find_expired_holds(now, state.config.sweep_page_size)
        .await?;

    if expired.is_empty() {
        return Ok(0);
    }

    debug!(count = expired.len(), "Found expired soft-holds");

    let mut reclaimed = 0;
    for booking in &expired {
        match state.lifecycle.expire(booking).await {
            Ok(true) => reclaimed += 1,
            // Lost the race to a confirm or cancel. Nothing to do.
            Ok(false) => {}
            Err(e) => {
                error!(booking_id = %booking.id, error = %e, "Failed to expire soft-hold");
            }
        }
    }

    Ok(reclaimed)
}

/// Periodic sweeper loop. Stops cleanly when the stop signal flips,
/// finishing any in-flight sweep first.
pub async fn start_hold_sweeper(state: AppState, mut stop: watch::Receiver<bool>) {
    let interval = std::time::Duration::from_secs(state.config.sweep_interval_secs);
    info!(interval_secs = state.config.sweep_interval_secs, "Hold sweeper started");

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                match run_sweep(&state).await {
                    Ok(0) => {}
                    Ok(n) => info!(reclaimed = n, "Reclaimed expired soft-holds"),
                    Err(e) => error!(error = %e, "Hold sweep failed"),
                }
            }
            _ = stop.changed() => {
                if *stop.borrow() {
                    info!("Hold sweeper stopping");
                    break;
                }
            }
        }
    }
}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{Duration, NaiveDate, Timelike, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::CreateBookingRequest;
use crate::api::dtos::responses::{CancelBookingResponse, RefundResponse};
use crate::domain::models::booking::{Booking, NewBookingParams};
use crate::domain::services::conflict::{check_within_open_hours, day_bounds_utc, local_parts};
use crate::error::AppError;
use crate::state::AppState;

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Path(studio_id): Path<String>,
    Json(payload): Json<CreateBookingRequest>,
) -> Result<impl IntoResponse, AppError> {
    info!(
        "create_booking: trainer {} client {} service {} at {}",
        payload.trainer_id, payload.client_id, payload.service_id, payload.start
    );

    if payload.start < Utc::now() {
        return Err(AppError::Validation("Cannot book in the past".into()));
    }
    // Availability is resolved at minute granularity; a start with trailing
    // seconds would slip past the closing-time containment check.
    if payload.start.second() != 0 || payload.start.nanosecond() != 0 {
        return Err(AppError::Validation(
            "Start time must be aligned to a whole minute".into(),
        ));
    }

    let service = state
        .catalog
        .get_service(&payload.service_id)
        .await?
        .ok_or(AppError::NotFound("Service not found".into()))?;
    if service.duration_minutes <= 0 {
        return Err(AppError::Validation("Service has no positive duration".into()));
    }

    let tz = state.config.timezone();
    let (date, _) = local_parts(payload.start, tz);

    let rules = state.availability_repo.list_rules(&payload.trainer_id).await?;
    let overrides = state
        .availability_repo
        .list_overrides_in_range(&payload.trainer_id, date, date)
        .await?;

    check_within_open_hours(
        &rules,
        &overrides,
        tz,
        &payload.trainer_id,
        payload.start,
        service.duration_minutes as i64,
    )?;

    let booking = Booking::new(NewBookingParams {
        studio_id,
        trainer_id: payload.trainer_id,
        client_id: payload.client_id,
        service_id: service.id,
        start: payload.start,
        duration_minutes: service.duration_minutes,
        credits_required: service.credits_required,
        self_book: payload.self_book,
        hold_window: Duration::minutes(state.config.hold_window_minutes),
    });

    // The store rejects overlapping active bookings atomically; a racing
    // request gets SlotConflict here.
    let created = state.booking_repo.insert_if_slot_free(&booking).await?;
    info!(
        "Booking {} created as {} for trainer {}",
        created.id,
        created.status.as_str(),
        created.trainer_id
    );
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path((studio_id, booking_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state
        .booking_repo
        .find_by_id(&studio_id, &booking_id)
        .await?
        .ok_or(AppError::NotFound("Booking not found".into()))?;
    Ok(Json(booking))
}

/// A trainer's bookings for one studio-local day.
pub async fn list_trainer_bookings(
    State(state): State<Arc<AppState>>,
    Path((_, trainer_id)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let date_str = params.get("date").ok_or(AppError::Validation("date required".into()))?;
    let date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .map_err(|_| AppError::Validation("Invalid date (expected YYYY-MM-DD)".into()))?;

    let (start, end) = day_bounds_utc(date, state.config.timezone());
    let bookings = state
        .booking_repo
        .list_for_trainer_between(&trainer_id, start, end)
        .await?;
    Ok(Json(bookings))
}

pub async fn confirm_booking(
    State(state): State<Arc<AppState>>,
    Path((studio_id, booking_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.lifecycle.confirm(&studio_id, &booking_id).await?;
    info!("Booking {} confirmed", booking.id);
    Ok(Json(booking))
}

pub async fn check_in_booking(
    State(state): State<Arc<AppState>>,
    Path((studio_id, booking_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.lifecycle.check_in(&studio_id, &booking_id).await?;
    info!("Booking {} checked in", booking.id);
    Ok(Json(booking))
}

pub async fn complete_booking(
    State(state): State<Arc<AppState>>,
    Path((studio_id, booking_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.lifecycle.complete(&studio_id, &booking_id).await?;
    Ok(Json(booking))
}

pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path((studio_id, booking_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.lifecycle.cancel(&studio_id, &booking_id).await?;

    let window = Duration::hours(state.config.cancellation_window_hours);
    let cancelled_before_penalty_window = booking.start_at - Utc::now() >= window;

    info!(
        "Booking {} cancelled ({} penalty window)",
        booking.id,
        if cancelled_before_penalty_window { "before" } else { "inside" }
    );
    Ok(Json(CancelBookingResponse {
        booking,
        cancelled_before_penalty_window,
    }))
}

pub async fn no_show_booking(
    State(state): State<Arc<AppState>>,
    Path((studio_id, booking_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let booking = state.lifecycle.no_show(&studio_id, &booking_id).await?;
    info!("Booking {} marked no-show", booking.id);
    Ok(Json(booking))
}

pub async fn refund_booking(
    State(state): State<Arc<AppState>>,
    Path((studio_id, booking_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let balance = state.lifecycle.refund(&studio_id, &booking_id).await?;
    info!("Booking {} refunded", booking_id);
    Ok(Json(RefundResponse { booking_id, balance }))
}

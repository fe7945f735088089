use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::api::dtos::requests::{CreateOverrideRequest, CreateRuleRequest};
use crate::api::dtos::responses::{SlotView, SlotsResponse};
use crate::domain::models::availability::{AvailabilityOverride, AvailabilityRule};
use crate::domain::services::availability::{enumerate_slot_starts, resolve_day, resolve_range, MinuteSpan};
use crate::domain::services::conflict::{day_bounds_utc, local_parts, local_minute_to_utc};
use crate::error::AppError;
use crate::state::AppState;

pub async fn create_rule(
    State(state): State<Arc<AppState>>,
    Path((_, trainer_id)): Path<(String, String)>,
    Json(payload): Json<CreateRuleRequest>,
) -> Result<impl IntoResponse, AppError> {
    let rule = AvailabilityRule::new(
        trainer_id.clone(),
        payload.day_of_week,
        payload.start_minute,
        payload.end_minute,
    );
    rule.validate()?;

    let created = state.availability_repo.create_rule(&rule).await?;
    info!("Created availability rule {} for trainer {}", created.id, trainer_id);
    Ok(Json(created))
}

pub async fn list_rules(
    State(state): State<Arc<AppState>>,
    Path((_, trainer_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let rules = state.availability_repo.list_rules(&trainer_id).await?;
    Ok(Json(rules))
}

pub async fn delete_rule(
    State(state): State<Arc<AppState>>,
    Path((_, trainer_id, rule_id)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    state.availability_repo.delete_rule(&trainer_id, &rule_id).await?;
    info!("Deleted availability rule {} for trainer {}", rule_id, trainer_id);
    Ok(Json(serde_json::json!({"status": "deleted"})))
}

pub async fn create_override(
    State(state): State<Arc<AppState>>,
    Path((_, trainer_id)): Path<(String, String)>,
    Json(payload): Json<CreateOverrideRequest>,
) -> Result<impl IntoResponse, AppError> {
    let entity = AvailabilityOverride {
        id: Uuid::new_v4().to_string(),
        trainer_id: trainer_id.clone(),
        block_type: payload.block_type,
        start_date: payload.start_date,
        end_date: payload.end_date,
        start_minute: payload.start_minute,
        end_minute: payload.end_minute,
        reason: payload.reason,
        created_at: chrono::Utc::now(),
    };
    entity.validate()?;

    let created = state.availability_repo.create_override(&entity).await?;
    info!(
        "Created {} override {} for trainer {} on {}",
        created.block_type.as_str(),
        created.id,
        trainer_id,
        created.start_date
    );
    Ok(Json(created))
}

pub async fn list_overrides(
    State(state): State<Arc<AppState>>,
    Path((_, trainer_id)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let (start, end) = date_range(&params)?;
    let overrides = state
        .availability_repo
        .list_overrides_in_range(&trainer_id, start, end)
        .await?;
    Ok(Json(overrides))
}

pub async fn delete_override(
    State(state): State<Arc<AppState>>,
    Path((_, trainer_id, override_id)): Path<(String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    state.availability_repo.delete_override(&trainer_id, &override_id).await?;
    info!("Deleted availability override {} for trainer {}", override_id, trainer_id);
    Ok(Json(serde_json::json!({"status": "deleted"})))
}

/// Resolved open intervals for a trainer over an inclusive date range.
pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path((_, trainer_id)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let (start, end) = date_range(&params)?;

    let rules = state.availability_repo.list_rules(&trainer_id).await?;
    let overrides = state
        .availability_repo
        .list_overrides_in_range(&trainer_id, start, end)
        .await?;

    let intervals = resolve_range(&rules, &overrides, &trainer_id, start, end);
    Ok(Json(intervals))
}

/// Bookable start times for one trainer, date, and service: the resolved
/// open spans minus active bookings, stepped by the service duration.
pub async fn get_slots(
    State(state): State<Arc<AppState>>,
    Path((_, trainer_id)): Path<(String, String)>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let date = parse_date(&params, "date")?;
    let service_id = params
        .get("service_id")
        .ok_or(AppError::Validation("service_id required".into()))?;

    let service = state
        .catalog
        .get_service(service_id)
        .await?
        .ok_or(AppError::NotFound("Service not found".into()))?;
    if service.duration_minutes <= 0 {
        return Err(AppError::Validation("Service has no positive duration".into()));
    }

    let tz = state.config.timezone();
    let rules = state.availability_repo.list_rules(&trainer_id).await?;
    let overrides = state
        .availability_repo
        .list_overrides_in_range(&trainer_id, date, date)
        .await?;

    let open = resolve_day(&rules, &overrides, date);

    let (day_start, day_end) = day_bounds_utc(date, tz);
    let bookings = state
        .booking_repo
        .list_active_overlapping(&trainer_id, day_start, day_end)
        .await?;

    let busy: Vec<MinuteSpan> = bookings
        .iter()
        .map(|b| {
            let (start_date, start_minute) = local_parts(b.start_at, tz);
            let (end_date, end_minute) = local_parts(b.end_at, tz);
            // Clamp bookings spilling over from neighbouring days.
            let start = if start_date < date { 0 } else { start_minute };
            let end = if end_date > date { 1440 } else { end_minute };
            (start, end)
        })
        .collect();

    let starts = enumerate_slot_starts(&open, &busy, service.duration_minutes as u16);
    let slots = starts
        .into_iter()
        .map(|minute| SlotView {
            start_minute: minute,
            start: local_minute_to_utc(date, minute, tz),
        })
        .collect();

    Ok(Json(SlotsResponse {
        trainer_id,
        date: date.to_string(),
        service_id: service.id,
        duration_minutes: service.duration_minutes,
        slots,
    }))
}

fn date_range(params: &HashMap<String, String>) -> Result<(NaiveDate, NaiveDate), AppError> {
    let start = parse_date(params, "start")?;
    let end = parse_date(params, "end")?;
    if end < start {
        return Err(AppError::Validation("end must not precede start".into()));
    }
    Ok((start, end))
}

fn parse_date(params: &HashMap<String, String>, key: &str) -> Result<NaiveDate, AppError> {
    let raw = params
        .get(key)
        .ok_or_else(|| AppError::Validation(format!("{key} required")))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("Invalid {key} (expected YYYY-MM-DD)")))
}

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;
use tracing::info;

use crate::api::dtos::requests::GrantCreditsRequest;
use crate::api::dtos::responses::BalanceResponse;
use crate::error::AppError;
use crate::state::AppState;

pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Path((_, client_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let balance = state.ledger_repo.balance(&client_id).await?;
    Ok(Json(BalanceResponse { client_id, balance }))
}

pub async fn list_entries(
    State(state): State<Arc<AppState>>,
    Path((_, client_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let entries = state.ledger_repo.entries(&client_id).await?;
    Ok(Json(entries))
}

pub async fn grant_credits(
    State(state): State<Arc<AppState>>,
    Path((_, client_id)): Path<(String, String)>,
    Json(payload): Json<GrantCreditsRequest>,
) -> Result<impl IntoResponse, AppError> {
    let balance = state.ledger_repo.grant(&client_id, payload.amount).await?;
    info!("Granted {} credits to client {}", payload.amount, client_id);
    Ok(Json(BalanceResponse { client_id, balance }))
}

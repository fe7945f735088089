use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::domain::models::booking::BookingStatus;
use crate::domain::models::credits::Credits;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Requested time is outside the trainer's open hours")]
    SlotUnavailable { trainer_id: String },
    #[error("Requested time overlaps an existing booking")]
    SlotConflict { trainer_id: String },
    #[error("Transition not allowed from status '{}'", status.as_str())]
    InvalidTransition {
        booking_id: String,
        status: BookingStatus,
    },
    #[error("Client {client_id} has insufficient credits")]
    InsufficientCredits {
        client_id: String,
        required: Credits,
        available: Credits,
    },
    /// Not user-visible: call sites treat a replayed settlement as success.
    #[error("Booking already settled for this reason")]
    AlreadySettled { booking_id: String },
    #[error("Invalid input: {0}")]
    Validation(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) => "database",
            AppError::NotFound(_) => "not_found",
            AppError::SlotUnavailable { .. } => "slot_unavailable",
            AppError::SlotConflict { .. } => "slot_conflict",
            AppError::InvalidTransition { .. } => "invalid_transition",
            AppError::InsufficientCredits { .. } => "insufficient_credits",
            AppError::AlreadySettled { .. } => "already_settled",
            AppError::Validation(_) => "validation",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let (status, body) = match &self {
            AppError::Database(e) => {
                error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "kind": kind, "error": "Internal server error" }),
                )
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, json!({ "kind": kind, "error": msg })),
            AppError::SlotUnavailable { trainer_id } => (
                StatusCode::CONFLICT,
                json!({
                    "kind": kind,
                    "error": "Requested time is outside the trainer's open hours; re-query availability",
                    "trainer_id": trainer_id,
                }),
            ),
            AppError::SlotConflict { trainer_id } => (
                StatusCode::CONFLICT,
                json!({
                    "kind": kind,
                    "error": "Requested time overlaps an existing booking; re-query availability",
                    "trainer_id": trainer_id,
                }),
            ),
            AppError::InvalidTransition { booking_id, status } => (
                StatusCode::CONFLICT,
                json!({
                    "kind": kind,
                    "error": format!("Transition not allowed from status '{}'", status.as_str()),
                    "booking_id": booking_id,
                    "status": status.as_str(),
                }),
            ),
            AppError::InsufficientCredits {
                client_id,
                required,
                available,
            } => (
                StatusCode::PAYMENT_REQUIRED,
                json!({
                    "kind": kind,
                    "error": "Insufficient credits",
                    "client_id": client_id,
                    "required": required,
                    "available": available,
                }),
            ),
            // Callers are expected to convert replays into success before
            // this ever reaches the HTTP boundary.
            AppError::AlreadySettled { booking_id } => (
                StatusCode::CONFLICT,
                json!({ "kind": kind, "error": "Booking already settled", "booking_id": booking_id }),
            ),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, json!({ "kind": kind, "error": msg })),
            AppError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "kind": kind, "error": "Internal error" }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

use axum::{
    body::Body,
    extract::Request,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;

use crate::api::handlers::{availability, booking, health, ledger};
use crate::state::AppState;
use tower_http::{classify::ServerErrorsFailureClass, trace::TraceLayer};
use tracing::{error, info, info_span, Span};
use uuid::Uuid;

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health_check))

        // Trainer availability
        .route(
            "/api/v1/{studio_id}/trainers/{trainer_id}/rules",
            post(availability::create_rule).get(availability::list_rules),
        )
        .route(
            "/api/v1/{studio_id}/trainers/{trainer_id}/rules/{rule_id}",
            delete(availability::delete_rule),
        )
        .route(
            "/api/v1/{studio_id}/trainers/{trainer_id}/overrides",
            post(availability::create_override).get(availability::list_overrides),
        )
        .route(
            "/api/v1/{studio_id}/trainers/{trainer_id}/overrides/{override_id}",
            delete(availability::delete_override),
        )
        .route(
            "/api/v1/{studio_id}/trainers/{trainer_id}/availability",
            get(availability::get_availability),
        )
        .route(
            "/api/v1/{studio_id}/trainers/{trainer_id}/slots",
            get(availability::get_slots),
        )

        // Bookings
        .route("/api/v1/{studio_id}/bookings", post(booking::create_booking))
        .route("/api/v1/{studio_id}/bookings/{booking_id}", get(booking::get_booking))
        .route(
            "/api/v1/{studio_id}/trainers/{trainer_id}/bookings",
            get(booking::list_trainer_bookings),
        )

        // Lifecycle transitions
        .route("/api/v1/{studio_id}/bookings/{booking_id}/confirm", post(booking::confirm_booking))
        .route("/api/v1/{studio_id}/bookings/{booking_id}/check-in", post(booking::check_in_booking))
        .route("/api/v1/{studio_id}/bookings/{booking_id}/complete", post(booking::complete_booking))
        .route("/api/v1/{studio_id}/bookings/{booking_id}/cancel", post(booking::cancel_booking))
        .route("/api/v1/{studio_id}/bookings/{booking_id}/no-show", post(booking::no_show_booking))
        .route("/api/v1/{studio_id}/bookings/{booking_id}/refund", post(booking::refund_booking))

        // Client credit ledger
        .route("/api/v1/{studio_id}/clients/{client_id}/balance", get(ledger::get_balance))
        .route("/api/v1/{studio_id}/clients/{client_id}/ledger", get(ledger::list_entries))
        .route("/api/v1/{studio_id}/clients/{client_id}/credits", post(ledger::grant_credits))

        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<Body>| {
                    let request_id = Uuid::new_v4().to_string();
                    info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = ?request.method(),
                        uri = ?request.uri(),
                        version = ?request.version(),
                    )
                })
                .on_request(|request: &Request<Body>, _span: &Span| {
                    info!("started processing request: {} {}", request.method(), request.uri().path());
                })
                .on_response(|response: &axum::http::Response<Body>, latency: Duration, _span: &Span| {
                    info!(
                        status = response.status().as_u16(),
                        latency_ms = latency.as_millis(),
                        "finished processing request"
                    );
                })
                .on_failure(|error: ServerErrorsFailureClass, _latency: Duration, _span: &Span| {
                    error!("request failed: {:?}", error);
                }),
        )
        .with_state(state)
}

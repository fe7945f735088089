mod common;

use axum::http::StatusCode;
use chrono::Weekday;
use common::{upcoming, TestApp};
use serde_json::{json, Value};

async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Seeds hours and creates a soft-hold booking, returning its id.
async fn create_booking(app: &TestApp, client_id: &str) -> String {
    let monday = upcoming(Weekday::Mon);
    app.seed_rule("t1", 0, 540, 1020).await;

    let res = app
        .post(
            "/api/v1/studio-1/bookings",
            json!({
                "trainer_id": "t1",
                "client_id": client_id,
                "service_id": "personal-60",
                "start": format!("{monday}T10:00:00Z")
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    parse_body(res).await["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_full_lifecycle_debits_exactly_once() {
    let app = TestApp::new().await;
    app.grant_credits("c1", "3.00").await;
    let id = create_booking(&app, "c1").await;

    let res = app.post(&format!("/api/v1/studio-1/bookings/{id}/confirm"), json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["status"], "confirmed");

    let res = app.post(&format!("/api/v1/studio-1/bookings/{id}/check-in"), json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.post(&format!("/api/v1/studio-1/bookings/{id}/complete"), json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);
    let completed = parse_body(res).await;
    assert_eq!(completed["status"], "completed");
    // Leaving soft-hold cleared the expiry.
    assert!(completed["hold_expires_at"].is_null());

    let res = app.get("/api/v1/studio-1/clients/c1/balance").await;
    assert_eq!(parse_body(res).await["balance"], "2.00");

    // Replayed completion is a no-op success, not a second debit.
    let res = app.post(&format!("/api/v1/studio-1/bookings/{id}/complete"), json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.get("/api/v1/studio-1/clients/c1/balance").await;
    assert_eq!(parse_body(res).await["balance"], "2.00");

    let res = app.get("/api/v1/studio-1/clients/c1/ledger").await;
    let entries = parse_body(res).await;
    let debits: Vec<&Value> = entries
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["reason"] == "debit-on-complete")
        .collect();
    assert_eq!(debits.len(), 1);
    assert_eq!(debits[0]["delta"], "-1.00");
}

#[tokio::test]
async fn test_confirm_requires_cleared_payment() {
    let app = TestApp::new().await;
    let id = create_booking(&app, "c1").await;

    app.payments.set_cleared(false);
    let res = app.post(&format!("/api/v1/studio-1/bookings/{id}/confirm"), json!({})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    // Still a soft-hold; confirming works once payment clears.
    let res = app.get(&format!("/api/v1/studio-1/bookings/{id}")).await;
    assert_eq!(parse_body(res).await["status"], "soft-hold");

    app.payments.set_cleared(true);
    let res = app.post(&format!("/api/v1/studio-1/bookings/{id}/confirm"), json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_complete_with_insufficient_credits_keeps_status() {
    let app = TestApp::new().await;
    // No credits granted at all.
    let id = create_booking(&app, "c-broke").await;

    app.post(&format!("/api/v1/studio-1/bookings/{id}/confirm"), json!({})).await;
    app.post(&format!("/api/v1/studio-1/bookings/{id}/check-in"), json!({})).await;

    let res = app.post(&format!("/api/v1/studio-1/bookings/{id}/complete"), json!({})).await;
    assert_eq!(res.status(), StatusCode::PAYMENT_REQUIRED);
    let body = parse_body(res).await;
    assert_eq!(body["kind"], "insufficient_credits");
    assert_eq!(body["required"], "1.00");
    assert_eq!(body["available"], "0.00");

    // Completion rolled back with the failed debit.
    let res = app.get(&format!("/api/v1/studio-1/bookings/{id}")).await;
    assert_eq!(parse_body(res).await["status"], "checked-in");

    // Topping up unblocks the retry.
    app.grant_credits("c-broke", "1.00").await;
    let res = app.post(&format!("/api/v1/studio-1/bookings/{id}/complete"), json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.get("/api/v1/studio-1/clients/c-broke/balance").await;
    assert_eq!(parse_body(res).await["balance"], "0.00");
}

#[tokio::test]
async fn test_cancel_reports_penalty_window_and_is_idempotent() {
    let app = TestApp::new().await;
    let id = create_booking(&app, "c1").await;

    // The booking is at least a week out, well before the 24h penalty window.
    let res = app.post(&format!("/api/v1/studio-1/bookings/{id}/cancel"), json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    assert_eq!(body["status"], "cancelled");
    assert_eq!(body["cancelled_before_penalty_window"], true);

    // Replay returns the same terminal state.
    let res = app.post(&format!("/api/v1/studio-1/bookings/{id}/cancel"), json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["status"], "cancelled");
}

#[tokio::test]
async fn test_refund_after_cancel_is_idempotent() {
    let app = TestApp::new().await;
    app.grant_credits("c1", "2.00").await;
    let id = create_booking(&app, "c1").await;

    // Refund before cancellation is rejected.
    let res = app.post(&format!("/api/v1/studio-1/bookings/{id}/refund"), json!({})).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    app.post(&format!("/api/v1/studio-1/bookings/{id}/cancel"), json!({})).await;

    let res = app.post(&format!("/api/v1/studio-1/bookings/{id}/refund"), json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["balance"], "3.00");

    // A replayed refund does not double-credit.
    let res = app.post(&format!("/api/v1/studio-1/bookings/{id}/refund"), json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["balance"], "3.00");

    let res = app.get("/api/v1/studio-1/clients/c1/ledger").await;
    let entries = parse_body(res).await;
    let refunds = entries
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["reason"] == "refund-on-cancel")
        .count();
    assert_eq!(refunds, 1);
}

#[tokio::test]
async fn test_no_show_is_terminal() {
    let app = TestApp::new().await;
    let id = create_booking(&app, "c1").await;

    app.post(&format!("/api/v1/studio-1/bookings/{id}/confirm"), json!({})).await;

    let res = app.post(&format!("/api/v1/studio-1/bookings/{id}/no-show"), json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["status"], "no-show");

    // No event moves a no-show anywhere else.
    let res = app.post(&format!("/api/v1/studio-1/bookings/{id}/check-in"), json!({})).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let res = app.post(&format!("/api/v1/studio-1/bookings/{id}/complete"), json!({})).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let res = app.post(&format!("/api/v1/studio-1/bookings/{id}/confirm"), json!({})).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
    let body = parse_body(res).await;
    assert_eq!(body["kind"], "invalid_transition");
    assert_eq!(body["status"], "no-show");
}

#[tokio::test]
async fn test_cancelled_booking_rejects_completion() {
    let app = TestApp::new().await;
    app.grant_credits("c1", "1.00").await;
    let id = create_booking(&app, "c1").await;

    app.post(&format!("/api/v1/studio-1/bookings/{id}/cancel"), json!({})).await;

    let res = app.post(&format!("/api/v1/studio-1/bookings/{id}/complete"), json!({})).await;
    assert_eq!(res.status(), StatusCode::CONFLICT);

    // And no debit happened.
    let res = app.get("/api/v1/studio-1/clients/c1/balance").await;
    assert_eq!(parse_body(res).await["balance"], "1.00");
}

#[tokio::test]
async fn test_check_in_straight_from_soft_hold() {
    let app = TestApp::new().await;
    app.grant_credits("c1", "1.00").await;
    let id = create_booking(&app, "c1").await;

    // Walk-in with a pending hold: check-in without an explicit confirm.
    let res = app.post(&format!("/api/v1/studio-1/bookings/{id}/check-in"), json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(parse_body(res).await["status"], "checked-in");

    let res = app.post(&format!("/api/v1/studio-1/bookings/{id}/complete"), json!({})).await;
    assert_eq!(res.status(), StatusCode::OK);
}

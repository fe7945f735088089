mod common;

use axum::http::StatusCode;
use chrono::Weekday;
use common::{upcoming, TestApp};
use serde_json::{json, Value};

async fn parse_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_rule_crud_roundtrip() {
    let app = TestApp::new().await;

    // Mon 09:00-17:00
    let res = app
        .post(
            "/api/v1/studio-1/trainers/t1/rules",
            json!({ "day_of_week": 0, "start_minute": 540, "end_minute": 1020 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let created = parse_body(res).await;
    let rule_id = created["id"].as_str().unwrap().to_string();
    assert_eq!(created["trainer_id"], "t1");
    assert_eq!(created["day_of_week"], 0);

    let res = app.get("/api/v1/studio-1/trainers/t1/rules").await;
    let rules = parse_body(res).await;
    assert_eq!(rules.as_array().unwrap().len(), 1);

    let res = app.delete(&format!("/api/v1/studio-1/trainers/t1/rules/{rule_id}")).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app.get("/api/v1/studio-1/trainers/t1/rules").await;
    let rules = parse_body(res).await;
    assert!(rules.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_rule_validation_rejects_bad_input() {
    let app = TestApp::new().await;

    let res = app
        .post(
            "/api/v1/studio-1/trainers/t1/rules",
            json!({ "day_of_week": 7, "start_minute": 540, "end_minute": 1020 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .post(
            "/api/v1/studio-1/trainers/t1/rules",
            json!({ "day_of_week": 0, "start_minute": 600, "end_minute": 600 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = app
        .post(
            "/api/v1/studio-1/trainers/t1/rules",
            json!({ "day_of_week": 0, "start_minute": 540, "end_minute": 1500 }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body = parse_body(res).await;
    assert_eq!(body["kind"], "validation");
}

#[tokio::test]
async fn test_override_requires_paired_minutes() {
    let app = TestApp::new().await;
    let date = upcoming(Weekday::Mon);

    let res = app
        .post(
            "/api/v1/studio-1/trainers/t1/overrides",
            json!({
                "block_type": "blocked",
                "start_date": date.to_string(),
                "start_minute": 540
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deleting_missing_rule_is_404() {
    let app = TestApp::new().await;
    let res = app.delete("/api/v1/studio-1/trainers/t1/rules/nope").await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_availability_resolution_with_overrides() {
    let app = TestApp::new().await;
    let monday = upcoming(Weekday::Mon);

    // Mon 09:00-17:00 weekly.
    app.seed_rule("t1", 0, 540, 1020).await;

    // Block lunch 12:00-13:00 on that Monday.
    let res = app
        .post(
            "/api/v1/studio-1/trainers/t1/overrides",
            json!({
                "block_type": "blocked",
                "start_date": monday.to_string(),
                "start_minute": 720,
                "end_minute": 780,
                "reason": "lunch"
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = app
        .get(&format!(
            "/api/v1/studio-1/trainers/t1/availability?start={monday}&end={monday}"
        ))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let intervals = parse_body(res).await;
    let intervals = intervals.as_array().unwrap();

    assert_eq!(intervals.len(), 2);
    assert_eq!(intervals[0]["start_minute"], 540);
    assert_eq!(intervals[0]["end_minute"], 720);
    assert_eq!(intervals[1]["start_minute"], 780);
    assert_eq!(intervals[1]["end_minute"], 1020);
}

#[tokio::test]
async fn test_blocked_override_beats_available_override() {
    let app = TestApp::new().await;
    let saturday = upcoming(Weekday::Sat);

    // No weekly rule on Saturday; open 10:00-14:00 as a one-off.
    app.post(
        "/api/v1/studio-1/trainers/t1/overrides",
        json!({
            "block_type": "available",
            "start_date": saturday.to_string(),
            "start_minute": 600,
            "end_minute": 840
        }),
    )
    .await;

    // Block 11:00-12:00 inside the one-off window.
    app.post(
        "/api/v1/studio-1/trainers/t1/overrides",
        json!({
            "block_type": "blocked",
            "start_date": saturday.to_string(),
            "start_minute": 660,
            "end_minute": 720
        }),
    )
    .await;

    let res = app
        .get(&format!(
            "/api/v1/studio-1/trainers/t1/availability?start={saturday}&end={saturday}"
        ))
        .await;
    let intervals = parse_body(res).await;
    let intervals = intervals.as_array().unwrap();

    assert_eq!(intervals.len(), 2);
    assert_eq!(intervals[0]["start_minute"], 600);
    assert_eq!(intervals[0]["end_minute"], 660);
    assert_eq!(intervals[1]["start_minute"], 720);
    assert_eq!(intervals[1]["end_minute"], 840);
}

#[tokio::test]
async fn test_whole_day_block_empties_availability() {
    let app = TestApp::new().await;
    let monday = upcoming(Weekday::Mon);

    app.seed_rule("t1", 0, 540, 1020).await;

    // No minute bounds: the whole day is blocked.
    app.post(
        "/api/v1/studio-1/trainers/t1/overrides",
        json!({
            "block_type": "blocked",
            "start_date": monday.to_string(),
            "reason": "vacation"
        }),
    )
    .await;

    let res = app
        .get(&format!(
            "/api/v1/studio-1/trainers/t1/availability?start={monday}&end={monday}"
        ))
        .await;
    let intervals = parse_body(res).await;
    assert!(intervals.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_slots_exclude_booked_time() {
    let app = TestApp::new().await;
    let monday = upcoming(Weekday::Mon);

    // Mon 09:00-12:00, 60-minute service: slots at 09:00, 10:00, 11:00.
    app.seed_rule("t1", 0, 540, 720).await;

    let res = app
        .get(&format!(
            "/api/v1/studio-1/trainers/t1/slots?date={monday}&service_id=personal-60"
        ))
        .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = parse_body(res).await;
    let starts: Vec<i64> = body["slots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["start_minute"].as_i64().unwrap())
        .collect();
    assert_eq!(starts, vec![540, 600, 660]);

    // Book 10:00-11:00 and the middle slot disappears.
    let start = format!("{monday}T10:00:00Z");
    let res = app
        .post(
            "/api/v1/studio-1/bookings",
            json!({
                "trainer_id": "t1",
                "client_id": "c1",
                "service_id": "personal-60",
                "start": start
            }),
        )
        .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = app
        .get(&format!(
            "/api/v1/studio-1/trainers/t1/slots?date={monday}&service_id=personal-60"
        ))
        .await;
    let body = parse_body(res).await;
    let starts: Vec<i64> = body["slots"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["start_minute"].as_i64().unwrap())
        .collect();
    assert_eq!(starts, vec![540, 660]);
}

#[tokio::test]
async fn test_slots_unknown_service_is_404() {
    let app = TestApp::new().await;
    let monday = upcoming(Weekday::Mon);
    app.seed_rule("t1", 0, 540, 720).await;

    let res = app
        .get(&format!(
            "/api/v1/studio-1/trainers/t1/slots?date={monday}&service_id=ghost"
        ))
        .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

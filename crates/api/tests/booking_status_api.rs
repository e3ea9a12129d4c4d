//! Integration tests for the booking status endpoint and store eviction.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use common::{body_json, expect_json, get, post_json, test_context, test_context_with};
use mansei_store::TtlConfig;
use serde_json::json;

fn booking_payload(booking_id: &str) -> serde_json::Value {
    json!({
        "event_type": "booking.created",
        "booking": {
            "uid": booking_id,
            "startedAt": "2025-07-01T10:00:00+09:00",
            "endedAt": "2025-07-01T11:00:00+09:00",
            "timeZone": "Asia/Tokyo",
            "contact": { "name": "テスト花子", "email": "hanako@example.com" },
            "createdAt": "2025-06-30T09:00:00+09:00",
            "updatedAt": "2025-06-30T09:00:00+09:00"
        }
    })
}

#[tokio::test]
async fn missing_booking_is_success_false_with_200() {
    let ctx = test_context();

    let json = expect_json(
        get(&ctx.app, "/api/booking-status/est_nothing_here").await,
        StatusCode::OK,
    )
    .await;

    assert_eq!(json["success"], false);
    assert_eq!(json["message"], "No booking data found for this estimate ID");
}

#[tokio::test]
async fn stored_booking_is_returned_with_timestamp() {
    let ctx = test_context();
    post_json(
        &ctx.app,
        "/api/webhook/jicoo?estimate_id=est_1_status",
        &booking_payload("bk_s1"),
    )
    .await;

    let json = expect_json(get(&ctx.app, "/api/booking-status/est_1_status").await, StatusCode::OK).await;

    assert_eq!(json["success"], true);
    assert_eq!(json["bookingData"]["booking_id"], "bk_s1");
    assert_eq!(json["bookingData"]["attendee"]["email"], "hanako@example.com");
    assert!(json["timestamp"].is_string());
}

#[tokio::test]
async fn read_booking_survives_within_grace_window() {
    let ctx = test_context();
    post_json(
        &ctx.app,
        "/api/webhook/jicoo?estimate_id=est_2_grace",
        &booking_payload("bk_s2"),
    )
    .await;

    // Two consecutive reads both succeed — no delete-on-read.
    for _ in 0..2 {
        let json = body_json(get(&ctx.app, "/api/booking-status/est_2_grace").await).await;
        assert_eq!(json["success"], true);
    }
}

#[tokio::test]
async fn booking_is_evicted_after_grace_window_passes() {
    let short = TtlConfig {
        idle_ttl: Duration::from_secs(60),
        read_grace: Duration::from_millis(40),
    };
    let ctx = test_context_with(short, TtlConfig::default());
    post_json(
        &ctx.app,
        "/api/webhook/jicoo?estimate_id=est_3_evict",
        &booking_payload("bk_s3"),
    )
    .await;

    let first = body_json(get(&ctx.app, "/api/booking-status/est_3_evict").await).await;
    assert_eq!(first["success"], true);

    tokio::time::sleep(Duration::from_millis(60)).await;
    ctx.bookings.sweep().await;

    let second = body_json(get(&ctx.app, "/api/booking-status/est_3_evict").await).await;
    assert_eq!(second["success"], false);
}

#[tokio::test]
async fn idle_booking_is_evicted_without_any_read() {
    let short = TtlConfig {
        idle_ttl: Duration::from_millis(40),
        read_grace: Duration::from_secs(60),
    };
    let ctx = test_context_with(short, TtlConfig::default());
    post_json(
        &ctx.app,
        "/api/webhook/jicoo?estimate_id=est_4_idle",
        &booking_payload("bk_s4"),
    )
    .await;

    tokio::time::sleep(Duration::from_millis(60)).await;
    ctx.bookings.sweep().await;

    let json = body_json(get(&ctx.app, "/api/booking-status/est_4_idle").await).await;
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn debug_listing_summarizes_stored_events() {
    let ctx = test_context();
    post_json(
        &ctx.app,
        "/api/webhook/jicoo?estimate_id=est_5_list",
        &booking_payload("bk_s5"),
    )
    .await;

    let json = expect_json(get(&ctx.app, "/api/booking-data/list").await, StatusCode::OK).await;

    assert_eq!(json["success"], true);
    assert_eq!(json["count"], 1);
    assert_eq!(json["bookings"][0]["estimateId"], "est_5_list");
    assert_eq!(json["bookings"][0]["customerName"], "テスト花子");
    assert_eq!(json["bookings"][0]["customerEmail"], "hanako@example.com");
}

//! Scheduling-provider webhook ingestion.
//!
//! `POST /api/webhook/jicoo` accepts any of the historically observed
//! payload shapes, normalizes them, correlates the booking with a mirrored
//! quote via the `estimate_id` carried in the query string or body, stores
//! the event for the client poller, and attempts the confirmation emails.
//!
//! The provider retries on non-2xx, so the response policy is strict:
//! only a malformed payload earns a 400. A deliberately ignored event type
//! or a failed notification is still a 200 — the failure is reported in the
//! body and the logs instead.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use mansei_core::booking::{is_actionable, BookingEvent};
use mansei_core::normalize::{
    extract_estimate_id, extract_event_type, normalize, NormalizeError,
};
use mansei_core::quote::{QuoteStatus, ReservationData};

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Query parameters for the webhook endpoint.
#[derive(Debug, Deserialize)]
pub struct WebhookQuery {
    /// Correlation id embedded in the widget launch URL and echoed back by
    /// the provider.
    pub estimate_id: Option<String>,
}

/// `data` object of a processed-webhook response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookData {
    pub reservation_id: String,
    pub customer_name: String,
    pub customer_email: String,
    pub reservation_date: String,
    pub email_sent: bool,
    pub estimate_id: Option<String>,
    pub event_type: String,
}

/// Body returned for a recognized, actionable, processed event.
#[derive(Debug, Serialize)]
pub struct WebhookProcessed {
    pub success: bool,
    pub message: String,
    pub data: WebhookData,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/webhook/jicoo
pub async fn receive_jicoo(
    State(state): State<AppState>,
    Query(query): Query<WebhookQuery>,
    Json(body): Json<Value>,
) -> Response {
    process_webhook(&state, query.estimate_id, body).await
}

/// POST /api/webhook/test
///
/// Replays a canned legacy-shape booking through the live pipeline for
/// manual verification. A body that already looks like a webhook (has an
/// `event` or `event_type` key) is used as-is.
pub async fn receive_test(State(state): State<AppState>, Json(body): Json<Value>) -> Response {
    let replay = if extract_event_type(&body).is_some() {
        body
    } else {
        sample_legacy_event()
    };
    tracing::info!("Replaying test webhook payload");
    let estimate_id = extract_estimate_id(&replay);
    process_webhook(&state, estimate_id, replay).await
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

async fn process_webhook(
    state: &AppState,
    query_estimate_id: Option<String>,
    body: Value,
) -> Response {
    let normalized = match normalize(&body) {
        Ok(normalized) => normalized,
        Err(NormalizeError::UnrecognizedShape) => {
            tracing::warn!("Rejected webhook with unrecognized payload shape");
            return bad_request("Invalid webhook format");
        }
        Err(error) => {
            // The shape matched but a required field is unusable. If the
            // event type is one we deliberately ignore anyway, acknowledge
            // it so the provider does not retry.
            if let Some(event_type) = extract_event_type(&body) {
                if !is_actionable(&event_type) {
                    return not_processed(&event_type);
                }
            }
            tracing::warn!(error = %error, "Rejected webhook payload");
            return bad_request(&error.to_string());
        }
    };

    let event = normalized.event;
    tracing::info!(
        shape = normalized.shape,
        event_type = %event.event_type,
        booking_id = %event.booking_id,
        "Webhook payload recognized"
    );

    if !is_actionable(&event.event_type) {
        tracing::info!(event_type = %event.event_type, "Event received but not processed");
        return not_processed(&event.event_type);
    }

    let estimate_id = query_estimate_id
        .filter(|id| !id.is_empty())
        .or_else(|| extract_estimate_id(&body));

    // Correlate with the mirrored quote and store the event for the poller.
    // An unknown or absent estimate id is non-fatal: the booking is still
    // confirmed, just without a pre-computed price.
    let mut quote = None;
    match &estimate_id {
        Some(id) => {
            state.bookings.store(id, event.clone()).await;
            quote = state.quotes.peek(id).await;
            if quote.is_none() {
                tracing::warn!(estimate_id = %id, "No mirrored quote for estimate id");
            } else {
                state.quotes.attach_reservation(id, reservation_from(&event)).await;
            }
        }
        None => {
            tracing::info!("No estimate id supplied; booking cannot be correlated");
        }
    }

    // Skip an obviously redundant send when this quote was already
    // confirmed (provider retry after we answered 200).
    let email_sent = match &quote {
        Some(q) if q.status == QuoteStatus::EmailSent => {
            tracing::info!(estimate_id = ?estimate_id, "Confirmation already sent; skipping");
            true
        }
        _ => {
            let report = state.notifier.send_confirmation(quote.as_ref(), &event).await;
            if report.any_sent() {
                if let Some(id) = &estimate_id {
                    state.quotes.set_status(id, QuoteStatus::EmailSent).await;
                }
            }
            report.all_sent()
        }
    };

    let response = WebhookProcessed {
        success: true,
        message: "Webhook processed successfully".to_string(),
        data: WebhookData {
            reservation_id: event.booking_id.clone(),
            customer_name: event.attendee.name.clone(),
            customer_email: event.attendee.email.clone(),
            reservation_date: event.start_at.to_rfc3339(),
            email_sent,
            estimate_id,
            event_type: event.event_type.clone(),
        },
    };
    (StatusCode::OK, Json(response)).into_response()
}

fn reservation_from(event: &BookingEvent) -> ReservationData {
    ReservationData {
        date: Some(event.start_at.format("%Y/%m/%d").to_string()),
        time: Some(event.start_at.format("%H:%M").to_string()),
        booking_uid: Some(event.booking_id.clone()),
        completed_at: Some(Utc::now()),
    }
}

fn bad_request(error: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "success": false, "error": error })),
    )
        .into_response()
}

fn not_processed(event_type: &str) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "success": true,
            "message": "Event received but not processed",
            "event_type": event_type,
        })),
    )
        .into_response()
}

/// Canned legacy-shape payload for the test endpoint: a booking starting a
/// day from now.
fn sample_legacy_event() -> Value {
    let start = Utc::now() + chrono::Duration::hours(24);
    let end = start + chrono::Duration::hours(1);
    let now = Utc::now();
    json!({
        "event": "booking.created",
        "data": {
            "id": format!("test-reservation-{}", now.timestamp_millis()),
            "title": "エアコン取付工事",
            "start_time": start.to_rfc3339(),
            "end_time": end.to_rfc3339(),
            "timezone": "Asia/Tokyo",
            "attendees": [
                { "name": "テスト太郎", "email": "test@example.com", "status": "confirmed" }
            ],
            "host": { "name": "電化のマンセイ", "email": "info@d-mansei.co.jp" },
            "created_at": now.to_rfc3339(),
            "updated_at": now.to_rfc3339(),
        }
    })
}

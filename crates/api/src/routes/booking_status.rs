//! Booking status checks for the client-side poller.

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /api/booking-status/{estimate_id}
///
/// Returns the stored booking event for an estimate id, or an explicit
/// "not yet" body. Absence is a normal, expected response — the client
/// keeps polling — so both cases are 200.
///
/// Reading schedules the record's delayed delete; it is never removed on
/// the spot, so a retried read within the grace window still succeeds.
pub async fn get_booking_status(
    State(state): State<AppState>,
    Path(estimate_id): Path<String>,
) -> Json<Value> {
    match state.bookings.fetch(&estimate_id).await {
        Some(record) => {
            tracing::info!(%estimate_id, "Returning booking data");
            Json(json!({
                "success": true,
                "bookingData": record.event,
                "timestamp": record.received_at,
            }))
        }
        None => Json(json!({
            "success": false,
            "message": "No booking data found for this estimate ID",
        })),
    }
}

/// GET /api/booking-data/list
///
/// Debug listing of every live booking record: count plus a short summary
/// per entry.
pub async fn list_booking_data(State(state): State<AppState>) -> Json<Value> {
    let entries = state.bookings.list().await;
    let bookings: Vec<Value> = entries
        .iter()
        .map(|(estimate_id, record)| {
            json!({
                "estimateId": estimate_id,
                "timestamp": record.received_at,
                "customerName": record.event.attendee.name,
                "customerEmail": record.event.attendee.email,
                "startAt": record.event.start_at,
            })
        })
        .collect();

    Json(json!({
        "success": true,
        "count": bookings.len(),
        "bookings": bookings,
    }))
}

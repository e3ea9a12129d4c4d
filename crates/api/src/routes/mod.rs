pub mod booking_status;
pub mod estimate;
pub mod health;
pub mod webhook;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /webhook/jicoo                    provider booking notifications (POST)
/// /webhook/test                     replay a canned payload (POST)
/// /booking-status/{estimate_id}     poller status check (GET)
/// /booking-data/list                debug listing of stored events (GET)
/// /estimate                         mirror a finalized quote (POST)
/// /estimate/{id}                    fetch a mirrored quote (GET)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/webhook/jicoo", post(webhook::receive_jicoo))
        .route("/webhook/test", post(webhook::receive_test))
        .route(
            "/booking-status/{estimate_id}",
            get(booking_status::get_booking_status),
        )
        .route("/booking-data/list", get(booking_status::list_booking_data))
        .route("/estimate", post(estimate::submit_estimate))
        .route("/estimate/{id}", get(estimate::get_estimate))
}

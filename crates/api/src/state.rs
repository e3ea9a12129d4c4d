use std::sync::Arc;

use mansei_notify::NotificationSender;
use mansei_store::{BookingStore, QuoteMirror};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Booking events awaiting collection by the client poller.
    pub bookings: Arc<BookingStore>,
    /// Server-side mirror of submitted quotes, keyed by estimate id.
    pub quotes: Arc<QuoteMirror>,
    /// Confirmation email dispatch.
    pub notifier: Arc<NotificationSender>,
}

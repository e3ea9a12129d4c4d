//! Browser-session side of the booking pipeline, as a library.
//!
//! Builds the scheduling-widget launch URL that round-trips the estimate id
//! through the provider, and polls the server's status endpoint until the
//! matching booking event arrives.

pub mod poller;
pub mod widget;

pub use poller::{BookingPoller, BookingStatus, PollError, PollOutcome, PollerConfig};
pub use widget::{widget_url, DEFAULT_WIDGET_URL};

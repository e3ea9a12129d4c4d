//! Normalized scheduling-provider booking events.
//!
//! Whatever payload shape the provider sends (see [`crate::normalize`]),
//! ingestion reduces it to one [`BookingEvent`]. Timestamps keep the UTC
//! offset carried by the payload so downstream formatting renders the
//! booking in the visitor's own timezone rather than the server's.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Provider event names that trigger the confirmation pipeline. Everything
/// else that parses (updates, cancellations) is acknowledged but ignored.
pub const ACTIONABLE_EVENT_TYPES: [&str; 4] = [
    "booking.created",
    "booking_created",
    "appointment.booked",
    "guest_booked",
];

/// Whether an event of this type should be stored and confirmed by email.
pub fn is_actionable(event_type: &str) -> bool {
    ACTIONABLE_EVENT_TYPES.contains(&event_type)
}

// ---------------------------------------------------------------------------
// BookingEvent
// ---------------------------------------------------------------------------

/// The person who booked the slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attendee {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Cancellation metadata, present only on cancellation events.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cancellation {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_at: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancelled_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// A scheduling-provider notification, normalized from any supported
/// payload shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingEvent {
    /// Provider-side booking identifier.
    pub booking_id: String,
    /// Raw provider event name (`booking.created`, `guest_booked`, ...).
    pub event_type: String,
    pub start_at: DateTime<FixedOffset>,
    pub end_at: DateTime<FixedOffset>,
    /// IANA timezone name as sent by the provider.
    pub timezone: String,
    pub attendee: Attendee,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<FixedOffset>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cancellation: Option<Cancellation>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Webhook payload normalization.
//!
//! The scheduling provider has shipped several body shapes over the years
//! and none of them carries a reliable version field, so detection is
//! structural: an ordered chain of (predicate, normalizer) pairs is tried
//! until one matches. No match is an explicit [`NormalizeError::UnrecognizedShape`],
//! never a best-guess parse.
//!
//! Supported shapes, newest first:
//!
//! 1. `official-current` — `event_type` + `booking.contact`, camelCase
//!    timestamps (`startedAt` / `endedAt` / `timeZone`).
//! 2. `official-early` — `event_type` + `booking.attendee`, snake_case
//!    timestamps (`start_at` / `end_at` / `timezone`).
//! 3. `guest-booked` — `event: "guest_booked"` + `object.contact`.
//! 4. `legacy-test` — `event` + `data.attendees[]` with
//!    `start_time` / `end_time`.

use chrono::{DateTime, FixedOffset};
use serde_json::Value;

use crate::booking::{Attendee, BookingEvent, Cancellation};

/// Timezone assumed when a payload omits one. All of the provider's real
/// traffic for this service originates here.
const DEFAULT_TIMEZONE: &str = "Asia/Tokyo";

/// Attendee display name used when a payload omits one.
const FALLBACK_ATTENDEE_NAME: &str = "お客様";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NormalizeError {
    /// The body matched none of the known payload shapes.
    #[error("Invalid webhook format")]
    UnrecognizedShape,

    /// The shape matched but carried no attendee email address.
    #[error("No customer email found")]
    MissingEmail,

    #[error("Missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("Invalid timestamp in field: {field}")]
    InvalidTimestamp { field: &'static str },
}

// ---------------------------------------------------------------------------
// Detector chain
// ---------------------------------------------------------------------------

/// A webhook body reduced to the internal event shape, tagged with the name
/// of the detector that matched (for logging).
#[derive(Debug, Clone)]
pub struct NormalizedWebhook {
    pub event: BookingEvent,
    pub shape: &'static str,
}

struct ShapeDetector {
    name: &'static str,
    matches: fn(&Value) -> bool,
    normalize: fn(&Value) -> Result<BookingEvent, NormalizeError>,
}

const DETECTORS: [ShapeDetector; 4] = [
    ShapeDetector {
        name: "official-current",
        matches: matches_official_current,
        normalize: normalize_official_current,
    },
    ShapeDetector {
        name: "official-early",
        matches: matches_official_early,
        normalize: normalize_official_early,
    },
    ShapeDetector {
        name: "guest-booked",
        matches: matches_guest_booked,
        normalize: normalize_guest_booked,
    },
    ShapeDetector {
        name: "legacy-test",
        matches: matches_legacy_test,
        normalize: normalize_legacy_test,
    },
];

/// Run the detector chain over a webhook body.
pub fn normalize(body: &Value) -> Result<NormalizedWebhook, NormalizeError> {
    for detector in &DETECTORS {
        if (detector.matches)(body) {
            let event = (detector.normalize)(body)?;
            return Ok(NormalizedWebhook {
                event,
                shape: detector.name,
            });
        }
    }
    Err(NormalizeError::UnrecognizedShape)
}

/// Correlation id carried in the body itself (the query string variant is
/// the HTTP layer's concern).
pub fn extract_estimate_id(body: &Value) -> Option<String> {
    body.get("estimate_id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}

/// Provider event name, read without full normalization. Lets ingestion
/// acknowledge a deliberately ignored event type even when the rest of the
/// payload would not normalize (e.g. a cancellation with no email).
pub fn extract_event_type(body: &Value) -> Option<String> {
    str_field(body, "event_type")
        .or_else(|| str_field(body, "event"))
        .map(str::to_string)
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn required_timestamp(
    value: &Value,
    key: &'static str,
) -> Result<DateTime<FixedOffset>, NormalizeError> {
    let raw = str_field(value, key).ok_or(NormalizeError::MissingField { field: key })?;
    DateTime::parse_from_rfc3339(raw).map_err(|_| NormalizeError::InvalidTimestamp { field: key })
}

/// Optional timestamps are best-effort: absent or unparseable becomes `None`.
fn optional_timestamp(value: &Value, key: &str) -> Option<DateTime<FixedOffset>> {
    str_field(value, key).and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
}

fn attendee_from(value: &Value) -> Result<Attendee, NormalizeError> {
    let email = str_field(value, "email").ok_or(NormalizeError::MissingEmail)?;
    Ok(Attendee {
        name: str_field(value, "name")
            .unwrap_or(FALLBACK_ATTENDEE_NAME)
            .to_string(),
        email: email.to_string(),
        phone: str_field(value, "phone").map(str::to_string),
    })
}

// ---------------------------------------------------------------------------
// Shape: official-current
// ---------------------------------------------------------------------------

fn matches_official_current(body: &Value) -> bool {
    str_field(body, "event_type").is_some()
        && body
            .get("booking")
            .is_some_and(|b| b.get("contact").is_some_and(Value::is_object))
}

fn normalize_official_current(body: &Value) -> Result<BookingEvent, NormalizeError> {
    let event_type = str_field(body, "event_type").unwrap_or_default();
    let booking = &body["booking"];

    let cancellation = booking
        .get("cancelledAt")
        .or_else(|| booking.get("cancelledBy"))
        .map(|_| Cancellation {
            cancelled_at: optional_timestamp(booking, "cancelledAt"),
            cancelled_by: str_field(booking, "cancelledBy").map(str::to_string),
            reason: str_field(booking, "cancelReason").map(str::to_string),
        });

    Ok(BookingEvent {
        booking_id: str_field(booking, "uid")
            .ok_or(NormalizeError::MissingField { field: "uid" })?
            .to_string(),
        event_type: event_type.to_string(),
        start_at: required_timestamp(booking, "startedAt")?,
        end_at: required_timestamp(booking, "endedAt")?,
        timezone: str_field(booking, "timeZone")
            .unwrap_or(DEFAULT_TIMEZONE)
            .to_string(),
        attendee: attendee_from(&booking["contact"])?,
        created_at: optional_timestamp(booking, "createdAt"),
        updated_at: optional_timestamp(booking, "updatedAt"),
        cancellation,
    })
}

// ---------------------------------------------------------------------------
// Shape: official-early
// ---------------------------------------------------------------------------

fn matches_official_early(body: &Value) -> bool {
    str_field(body, "event_type").is_some()
        && body
            .get("booking")
            .is_some_and(|b| b.get("attendee").is_some_and(Value::is_object))
}

fn normalize_official_early(body: &Value) -> Result<BookingEvent, NormalizeError> {
    let event_type = str_field(body, "event_type").unwrap_or_default();
    let booking = &body["booking"];

    Ok(BookingEvent {
        booking_id: str_field(booking, "id")
            .ok_or(NormalizeError::MissingField { field: "id" })?
            .to_string(),
        event_type: event_type.to_string(),
        start_at: required_timestamp(booking, "start_at")?,
        end_at: required_timestamp(booking, "end_at")?,
        timezone: str_field(booking, "timezone")
            .unwrap_or(DEFAULT_TIMEZONE)
            .to_string(),
        attendee: attendee_from(&booking["attendee"])?,
        created_at: optional_timestamp(booking, "created_at"),
        updated_at: optional_timestamp(booking, "updated_at"),
        cancellation: None,
    })
}

// ---------------------------------------------------------------------------
// Shape: guest-booked
// ---------------------------------------------------------------------------

fn matches_guest_booked(body: &Value) -> bool {
    str_field(body, "event") == Some("guest_booked") && body.get("object").is_some_and(Value::is_object)
}

fn normalize_guest_booked(body: &Value) -> Result<BookingEvent, NormalizeError> {
    let object = &body["object"];

    Ok(BookingEvent {
        booking_id: str_field(object, "uid")
            .ok_or(NormalizeError::MissingField { field: "uid" })?
            .to_string(),
        event_type: "guest_booked".to_string(),
        start_at: required_timestamp(object, "startedAt")?,
        end_at: required_timestamp(object, "endedAt")?,
        timezone: str_field(object, "timeZone")
            .unwrap_or(DEFAULT_TIMEZONE)
            .to_string(),
        attendee: attendee_from(&object["contact"])?,
        created_at: optional_timestamp(object, "createdAt"),
        updated_at: optional_timestamp(object, "updatedAt"),
        cancellation: None,
    })
}

// ---------------------------------------------------------------------------
// Shape: legacy-test
// ---------------------------------------------------------------------------

fn matches_legacy_test(body: &Value) -> bool {
    str_field(body, "event").is_some() && body.get("data").is_some_and(Value::is_object)
}

fn normalize_legacy_test(body: &Value) -> Result<BookingEvent, NormalizeError> {
    let event_type = str_field(body, "event").unwrap_or_default();
    let data = &body["data"];

    let first_attendee = data
        .get("attendees")
        .and_then(Value::as_array)
        .and_then(|a| a.first())
        .ok_or(NormalizeError::MissingEmail)?;

    Ok(BookingEvent {
        booking_id: str_field(data, "id")
            .ok_or(NormalizeError::MissingField { field: "id" })?
            .to_string(),
        event_type: event_type.to_string(),
        start_at: required_timestamp(data, "start_time")?,
        end_at: required_timestamp(data, "end_time")?,
        timezone: str_field(data, "timezone")
            .unwrap_or(DEFAULT_TIMEZONE)
            .to_string(),
        attendee: attendee_from(first_attendee)?,
        created_at: optional_timestamp(data, "created_at"),
        updated_at: optional_timestamp(data, "updated_at"),
        cancellation: None,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn official_current_body() -> Value {
        json!({
            "event_type": "booking.created",
            "booking": {
                "uid": "bk_123",
                "eventTypeUid": "o-P4XTBDZeLW",
                "startedAt": "2025-07-01T10:00:00+09:00",
                "endedAt": "2025-07-01T11:00:00+09:00",
                "timeZone": "Asia/Tokyo",
                "status": "confirmed",
                "contact": {
                    "name": "テスト花子",
                    "email": "hanako@example.com",
                    "phone": "090-1234-5678"
                },
                "createdAt": "2025-06-30T09:00:00+09:00",
                "updatedAt": "2025-06-30T09:00:00+09:00"
            }
        })
    }

    // -- official-current --

    #[test]
    fn official_current_normalizes() {
        let normalized = normalize(&official_current_body()).unwrap();
        assert_eq!(normalized.shape, "official-current");

        let event = normalized.event;
        assert_eq!(event.booking_id, "bk_123");
        assert_eq!(event.event_type, "booking.created");
        assert_eq!(event.timezone, "Asia/Tokyo");
        assert_eq!(event.attendee.name, "テスト花子");
        assert_eq!(event.attendee.email, "hanako@example.com");
        assert_eq!(event.attendee.phone.as_deref(), Some("090-1234-5678"));
        assert_eq!(event.start_at.offset().local_minus_utc(), 9 * 3600);
        assert!(event.cancellation.is_none());
    }

    #[test]
    fn official_current_missing_email_is_rejected() {
        let mut body = official_current_body();
        body["booking"]["contact"]
            .as_object_mut()
            .unwrap()
            .remove("email");
        assert_matches!(normalize(&body), Err(NormalizeError::MissingEmail));
    }

    #[test]
    fn official_current_empty_email_is_rejected() {
        let mut body = official_current_body();
        body["booking"]["contact"]["email"] = json!("");
        assert_matches!(normalize(&body), Err(NormalizeError::MissingEmail));
    }

    #[test]
    fn official_current_bad_timestamp_is_rejected() {
        let mut body = official_current_body();
        body["booking"]["startedAt"] = json!("next tuesday");
        assert_matches!(
            normalize(&body),
            Err(NormalizeError::InvalidTimestamp { field: "startedAt" })
        );
    }

    #[test]
    fn cancellation_metadata_is_carried_through() {
        let mut body = official_current_body();
        body["event_type"] = json!("guest_cancelled");
        body["booking"]["cancelledAt"] = json!("2025-06-30T12:00:00+09:00");
        body["booking"]["cancelledBy"] = json!("guest");
        body["booking"]["cancelReason"] = json!("予定が変わったため");

        let event = normalize(&body).unwrap().event;
        let cancellation = event.cancellation.unwrap();
        assert_eq!(cancellation.cancelled_by.as_deref(), Some("guest"));
        assert_eq!(cancellation.reason.as_deref(), Some("予定が変わったため"));
        assert!(cancellation.cancelled_at.is_some());
    }

    // -- official-early --

    #[test]
    fn official_early_normalizes() {
        let body = json!({
            "event_type": "booking.created",
            "booking": {
                "id": "bk_early",
                "start_at": "2025-07-02T13:00:00+09:00",
                "end_at": "2025-07-02T14:00:00+09:00",
                "timezone": "Asia/Tokyo",
                "attendee": { "name": "テスト太郎", "email": "taro@example.com" },
                "created_at": "2025-07-01T08:00:00+09:00",
                "updated_at": "2025-07-01T08:00:00+09:00"
            }
        });
        let normalized = normalize(&body).unwrap();
        assert_eq!(normalized.shape, "official-early");
        assert_eq!(normalized.event.booking_id, "bk_early");
        assert_eq!(normalized.event.attendee.phone, None);
    }

    // -- guest-booked --

    #[test]
    fn guest_booked_normalizes() {
        let body = json!({
            "event": "guest_booked",
            "object": {
                "uid": "bk_guest",
                "startedAt": "2025-07-03T10:00:00+09:00",
                "endedAt": "2025-07-03T11:00:00+09:00",
                "timeZone": "Asia/Tokyo",
                "contact": { "name": "予約者", "email": "guest@example.com" },
                "createdAt": "2025-07-02T10:00:00+09:00",
                "updatedAt": "2025-07-02T10:00:00+09:00"
            }
        });
        let normalized = normalize(&body).unwrap();
        assert_eq!(normalized.shape, "guest-booked");
        assert_eq!(normalized.event.event_type, "guest_booked");
    }

    // -- legacy-test --

    #[test]
    fn legacy_test_normalizes_with_first_attendee() {
        let body = json!({
            "event": "booking.created",
            "data": {
                "id": "legacy_1",
                "title": "エアコン取付工事",
                "start_time": "2025-07-04T09:00:00+09:00",
                "end_time": "2025-07-04T10:00:00+09:00",
                "timezone": "Asia/Tokyo",
                "attendees": [
                    { "name": "一人目", "email": "first@example.com" },
                    { "name": "二人目", "email": "second@example.com" }
                ],
                "host": { "name": "電化のマンセイ", "email": "info@d-mansei.co.jp" },
                "created_at": "2025-07-03T09:00:00+09:00",
                "updated_at": "2025-07-03T09:00:00+09:00"
            }
        });
        let normalized = normalize(&body).unwrap();
        assert_eq!(normalized.shape, "legacy-test");
        assert_eq!(normalized.event.attendee.email, "first@example.com");
    }

    #[test]
    fn legacy_test_missing_name_falls_back() {
        let body = json!({
            "event": "booking.created",
            "data": {
                "id": "legacy_2",
                "start_time": "2025-07-04T09:00:00+09:00",
                "end_time": "2025-07-04T10:00:00+09:00",
                "timezone": "Asia/Tokyo",
                "attendees": [{ "email": "anon@example.com" }]
            }
        });
        let event = normalize(&body).unwrap().event;
        assert_eq!(event.attendee.name, "お客様");
        assert_eq!(event.timezone, "Asia/Tokyo");
    }

    #[test]
    fn legacy_test_empty_attendees_is_missing_email() {
        let body = json!({
            "event": "booking.created",
            "data": {
                "id": "legacy_3",
                "start_time": "2025-07-04T09:00:00+09:00",
                "end_time": "2025-07-04T10:00:00+09:00",
                "timezone": "Asia/Tokyo",
                "attendees": []
            }
        });
        assert_matches!(normalize(&body), Err(NormalizeError::MissingEmail));
    }

    // -- chain behaviour --

    #[test]
    fn unrecognized_shape_is_rejected_explicitly() {
        for body in [
            json!({}),
            json!({ "hello": "world" }),
            json!({ "event_type": "booking.created" }),
            json!({ "event_type": "booking.created", "booking": { "uid": "x" } }),
            json!([1, 2, 3]),
        ] {
            assert_matches!(normalize(&body), Err(NormalizeError::UnrecognizedShape));
        }
    }

    #[test]
    fn contact_shape_wins_over_attendee_shape() {
        // A body carrying both contact and attendee resolves via the newer
        // detector, which sits earlier in the chain.
        let mut body = official_current_body();
        body["booking"]["attendee"] = json!({ "name": "旧", "email": "old@example.com" });
        let normalized = normalize(&body).unwrap();
        assert_eq!(normalized.shape, "official-current");
        assert_eq!(normalized.event.attendee.email, "hanako@example.com");
    }

    // -- estimate id extraction --

    #[test]
    fn estimate_id_extracted_from_body() {
        let mut body = official_current_body();
        body["estimate_id"] = json!("est_1720000000000_abc123xyz");
        assert_eq!(
            extract_estimate_id(&body).as_deref(),
            Some("est_1720000000000_abc123xyz")
        );
    }

    #[test]
    fn missing_or_empty_estimate_id_is_none() {
        assert_eq!(extract_estimate_id(&official_current_body()), None);
        let mut body = official_current_body();
        body["estimate_id"] = json!("");
        assert_eq!(extract_estimate_id(&body), None);
    }

    #[test]
    fn event_type_is_read_from_either_field_name() {
        assert_eq!(
            extract_event_type(&official_current_body()).as_deref(),
            Some("booking.created")
        );
        assert_eq!(
            extract_event_type(&json!({ "event": "guest_booked" })).as_deref(),
            Some("guest_booked")
        );
        assert_eq!(extract_event_type(&json!({})), None);
    }
}

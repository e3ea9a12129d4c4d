//! Quote model: answers, resolved snapshots, lifecycle status, identifiers.

use chrono::{DateTime, Utc};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Answers
// ---------------------------------------------------------------------------

/// A visitor's answer to a catalog question.
///
/// `selected_option` is an index into the question's option list;
/// `custom_value` is an optional surcharge in yen (e.g. a pipe-extension fee
/// quoted over the phone).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    pub selected_option: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_value: Option<i64>,
}

impl Answer {
    pub fn new(question_id: impl Into<String>, selected_option: usize) -> Self {
        Self {
            question_id: question_id.into(),
            selected_option,
            custom_value: None,
        }
    }
}

/// An answer enriched with the option label and price captured at quote time.
///
/// This is a denormalized snapshot, not a live catalog reference: `price`
/// already includes any custom surcharge, so a historical quote is immune to
/// later catalog edits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedAnswer {
    pub question_id: String,
    pub selected_option: usize,
    pub option_label: String,
    pub price: i64,
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// Quote lifecycle. Only the notification path moves a quote to `EmailSent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuoteStatus {
    EstimateCompleted,
    ReservationPending,
    ReservationCompleted,
    EmailSent,
}

/// Reservation details attached once a booking event has been correlated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_uid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

// ---------------------------------------------------------------------------
// Quote
// ---------------------------------------------------------------------------

/// A finalized set of answers and computed price for one visitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: String,
    pub answers: Vec<ResolvedAnswer>,
    pub base_price: i64,
    pub total_price: i64,
    pub created_at: DateTime<Utc>,
    pub status: QuoteStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation: Option<ReservationData>,
}

impl Quote {
    /// Build a freshly created quote with a generated identifier.
    pub fn new(answers: Vec<ResolvedAnswer>, base_price: i64, total_price: i64) -> Self {
        Self {
            id: generate_estimate_id(),
            answers,
            base_price,
            total_price,
            created_at: Utc::now(),
            status: QuoteStatus::EstimateCompleted,
            reservation: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Identifier generation
// ---------------------------------------------------------------------------

/// Length of the random identifier suffix.
const ID_SUFFIX_LEN: usize = 9;

/// Generate a collision-resistant estimate identifier.
///
/// Format: `est_<unix-millis>_<random alphanumeric suffix>`. The identifier
/// only needs to be unique enough to key a short-lived correlation map; it is
/// not a security boundary.
pub fn generate_estimate_id() -> String {
    let suffix: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(ID_SUFFIX_LEN)
        .map(char::from)
        .collect();
    format!("est_{}_{}", Utc::now().timestamp_millis(), suffix)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estimate_id_has_expected_shape() {
        let id = generate_estimate_id();
        let parts: Vec<_> = id.split('_').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "est");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), ID_SUFFIX_LEN);
    }

    #[test]
    fn estimate_ids_do_not_collide() {
        let a = generate_estimate_id();
        let b = generate_estimate_id();
        assert_ne!(a, b);
    }

    #[test]
    fn new_quote_starts_in_estimate_completed() {
        let quote = Quote::new(vec![], 19_000, 19_000);
        assert_eq!(quote.status, QuoteStatus::EstimateCompleted);
        assert!(quote.reservation.is_none());
        assert!(quote.id.starts_with("est_"));
    }

    #[test]
    fn quote_status_serializes_snake_case() {
        let json = serde_json::to_string(&QuoteStatus::ReservationCompleted).unwrap();
        assert_eq!(json, "\"reservation_completed\"");
    }

    #[test]
    fn resolved_answer_serializes_camel_case() {
        let answer = ResolvedAnswer {
            question_id: "removal-needed".into(),
            selected_option: 0,
            option_label: "必要（回収・処分込み）".into(),
            price: 5_500,
        };
        let json = serde_json::to_value(&answer).unwrap();
        assert_eq!(json["questionId"], "removal-needed");
        assert_eq!(json["optionLabel"], "必要（回収・処分込み）");
        assert_eq!(json["price"], 5_500);
    }
}

//! Confirmation dispatch with bounded retry.
//!
//! The customer and staff sends are independent: one succeeding and the
//! other failing is a *partial* outcome, reported as such rather than
//! collapsed into a boolean. Each send retries a fixed number of times with
//! increasing backoff before giving up.

use std::sync::Arc;
use std::time::Duration;

use mansei_core::booking::BookingEvent;
use mansei_core::quote::Quote;

use crate::compose::{admin_confirmation, customer_confirmation, ConfirmationEmail, ADMIN_EMAIL};
use crate::email::EmailSender;

/// Backoff between retry attempts (the first attempt is immediate).
const RETRY_DELAYS: [Duration; 2] = [Duration::from_secs(1), Duration::from_secs(2)];

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Result of one recipient's send after retries are exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendStatus {
    Sent,
    Failed(String),
}

impl SendStatus {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendStatus::Sent)
    }
}

/// Collapsed view of a [`NotificationReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationOutcome {
    /// Both recipients received the confirmation.
    Sent,
    /// Exactly one recipient received it.
    Partial,
    /// Neither did.
    Failed,
}

/// Per-recipient outcome of one confirmation dispatch.
#[derive(Debug, Clone)]
pub struct NotificationReport {
    pub customer: SendStatus,
    pub admin: SendStatus,
}

impl NotificationReport {
    pub fn all_sent(&self) -> bool {
        self.customer.is_sent() && self.admin.is_sent()
    }

    pub fn any_sent(&self) -> bool {
        self.customer.is_sent() || self.admin.is_sent()
    }

    pub fn outcome(&self) -> NotificationOutcome {
        match (self.customer.is_sent(), self.admin.is_sent()) {
            (true, true) => NotificationOutcome::Sent,
            (false, false) => NotificationOutcome::Failed,
            _ => NotificationOutcome::Partial,
        }
    }
}

// ---------------------------------------------------------------------------
// NotificationSender
// ---------------------------------------------------------------------------

/// Composes and dispatches booking confirmations through an injected
/// [`EmailSender`].
pub struct NotificationSender {
    email: Arc<dyn EmailSender>,
    retry_delays: Vec<Duration>,
}

impl NotificationSender {
    pub fn new(email: Arc<dyn EmailSender>) -> Self {
        Self {
            email,
            retry_delays: RETRY_DELAYS.to_vec(),
        }
    }

    /// Override the backoff schedule (tests use sub-millisecond delays).
    pub fn with_retry_delays(email: Arc<dyn EmailSender>, retry_delays: Vec<Duration>) -> Self {
        Self { email, retry_delays }
    }

    /// Send the confirmation to the customer and the staff inbox.
    ///
    /// The two sends are independent; the report carries each outcome.
    /// A missing quote still produces a confirmation (pricing happens on
    /// site), so `quote` is optional.
    pub async fn send_confirmation(
        &self,
        quote: Option<&Quote>,
        event: &BookingEvent,
    ) -> NotificationReport {
        let customer_mail = customer_confirmation(quote, event);
        let admin_mail = admin_confirmation(quote, event);

        let customer = self
            .deliver_with_retry(&event.attendee.email, &customer_mail)
            .await;
        let admin = self.deliver_with_retry(ADMIN_EMAIL, &admin_mail).await;

        let report = NotificationReport { customer, admin };
        match report.outcome() {
            NotificationOutcome::Sent => {
                tracing::info!(booking_id = %event.booking_id, "Confirmation sent to customer and staff");
            }
            NotificationOutcome::Partial => {
                tracing::warn!(booking_id = %event.booking_id, ?report, "Confirmation partially sent");
            }
            NotificationOutcome::Failed => {
                tracing::error!(booking_id = %event.booking_id, ?report, "Confirmation delivery failed");
            }
        }
        report
    }

    /// Attempt one recipient, retrying with increasing backoff. The number
    /// of attempts is `retry_delays.len() + 1`.
    async fn deliver_with_retry(&self, to: &str, mail: &ConfirmationEmail) -> SendStatus {
        let mut last_error = String::new();

        for (attempt, delay) in self.retry_delays.iter().enumerate() {
            match self.email.send(to, mail).await {
                Ok(()) => return SendStatus::Sent,
                Err(e) => {
                    tracing::warn!(
                        to,
                        attempt = attempt + 1,
                        error = %e,
                        "Email send attempt failed, retrying"
                    );
                    last_error = e.to_string();
                    tokio::time::sleep(*delay).await;
                }
            }
        }

        // Final attempt after the last backoff.
        match self.email.send(to, mail).await {
            Ok(()) => SendStatus::Sent,
            Err(e) => {
                tracing::error!(to, error = %e, "Email delivery failed after all retries");
                SendStatus::Failed(e.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

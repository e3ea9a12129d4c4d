//! Client-side booking status poller.
//!
//! Webhooks land on the server, not in the browser, so after opening the
//! scheduling widget the client repeatedly asks the status endpoint whether
//! a booking has arrived for its estimate id. Polling starts only on
//! explicit request, stops on success, attempt exhaustion, elapsed-time
//! limit, repeated transport failure, or cancellation — and a poller never
//! runs two loops at once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Deserialize;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Bounds for one polling run.
#[derive(Debug, Clone, Copy)]
pub struct PollerConfig {
    /// Delay between status checks.
    pub interval: Duration,
    /// Stop after this many checks with no booking.
    pub max_attempts: u32,
    /// Hard wall-clock stop, independent of attempt arithmetic.
    pub max_elapsed: Duration,
    /// Stop early after this many *consecutive* transport failures.
    /// "No data yet" is not a failure and resets the counter.
    pub max_consecutive_errors: u32,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_attempts: 20,
            max_elapsed: Duration::from_secs(120),
            max_consecutive_errors: 3,
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// A booking returned by the status endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BookingStatus {
    #[serde(rename = "bookingData")]
    pub booking_data: serde_json::Value,
    pub timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    success: bool,
    #[serde(rename = "bookingData")]
    booking_data: Option<serde_json::Value>,
    timestamp: Option<String>,
}

/// How a polling run ended.
#[derive(Debug)]
pub enum PollOutcome {
    /// The booking arrived.
    Found(Box<BookingStatus>),
    /// All attempts (or the elapsed-time budget) ran out with no booking.
    /// This is absence, not an error.
    NotYetAvailable,
    /// Too many consecutive transport failures.
    TransportFailed { attempts: u32, last_error: String },
    /// The owning view cancelled the run.
    Cancelled,
}

#[derive(Debug, thiserror::Error)]
pub enum PollError {
    /// A run is already active on this poller.
    #[error("A polling loop is already active")]
    AlreadyActive,
}

// ---------------------------------------------------------------------------
// BookingPoller
// ---------------------------------------------------------------------------

/// Polls `GET {base_url}/api/booking-status/{estimate_id}`.
pub struct BookingPoller {
    client: reqwest::Client,
    base_url: String,
    config: PollerConfig,
    /// Single source of truth for "is polling active".
    active: AtomicBool,
}

impl BookingPoller {
    pub fn new(base_url: impl Into<String>, config: PollerConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            config,
            active: AtomicBool::new(false),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Run one bounded polling loop for an estimate id.
    ///
    /// Only one loop may run per poller; a second concurrent call fails with
    /// [`PollError::AlreadyActive`] instead of spawning a duplicate.
    pub async fn run(
        &self,
        estimate_id: &str,
        cancel: &CancellationToken,
    ) -> Result<PollOutcome, PollError> {
        if self
            .active
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(PollError::AlreadyActive);
        }
        let outcome = self.run_inner(estimate_id, cancel).await;
        self.active.store(false, Ordering::SeqCst);
        Ok(outcome)
    }

    async fn run_inner(&self, estimate_id: &str, cancel: &CancellationToken) -> PollOutcome {
        let url = format!("{}/api/booking-status/{estimate_id}", self.base_url);
        let started = tokio::time::Instant::now();
        let mut consecutive_errors = 0u32;
        let mut last_error = String::new();

        for attempt in 1..=self.config.max_attempts {
            if cancel.is_cancelled() {
                tracing::info!(estimate_id, "Booking poll cancelled");
                return PollOutcome::Cancelled;
            }
            if started.elapsed() >= self.config.max_elapsed {
                tracing::info!(estimate_id, attempt, "Booking poll hit the elapsed-time limit");
                return PollOutcome::NotYetAvailable;
            }

            let request = self.client.get(&url).send();
            let response = tokio::select! {
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                response = request => response,
            };

            match self.interpret(response).await {
                Ok(Some(status)) => {
                    tracing::info!(estimate_id, attempt, "Booking data received");
                    return PollOutcome::Found(Box::new(status));
                }
                Ok(None) => {
                    // Absence, not an error.
                    consecutive_errors = 0;
                    tracing::debug!(estimate_id, attempt, "No booking data yet");
                }
                Err(error) => {
                    consecutive_errors += 1;
                    last_error = error;
                    tracing::warn!(
                        estimate_id,
                        attempt,
                        consecutive_errors,
                        error = %last_error,
                        "Booking status check failed"
                    );
                    if consecutive_errors >= self.config.max_consecutive_errors {
                        return PollOutcome::TransportFailed {
                            attempts: attempt,
                            last_error,
                        };
                    }
                }
            }

            // Wait before the next attempt, respecting cancellation.
            tokio::select! {
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        tracing::info!(estimate_id, "Booking poll exhausted all attempts");
        PollOutcome::NotYetAvailable
    }

    /// Classify one response: booking present, not yet there, or transport
    /// failure.
    async fn interpret(
        &self,
        response: Result<reqwest::Response, reqwest::Error>,
    ) -> Result<Option<BookingStatus>, String> {
        let response = response.map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("status endpoint returned HTTP {}", response.status()));
        }
        let status: StatusResponse = response.json().await.map_err(|e| e.to_string())?;
        match (status.success, status.booking_data) {
            (true, Some(booking_data)) => Ok(Some(BookingStatus {
                booking_data,
                timestamp: status.timestamp,
            })),
            _ => Ok(None),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

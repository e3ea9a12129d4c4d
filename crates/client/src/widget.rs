//! Scheduling-widget launch URL construction.
//!
//! The provider echoes query parameters of the launch URL back on its
//! webhooks, which is how a booking finds its way to the quote that
//! preceded it. With no estimate id the widget still works — booking
//! proceeds uncorrelated and staff follow up manually.

/// Booking page for the installation slot event type.
pub const DEFAULT_WIDGET_URL: &str = "https://www.jicoo.com/t/d-mansei/e/o-P4XTBDZeLW";

/// Query parameter that carries the estimate id through the provider.
pub const ESTIMATE_ID_PARAM: &str = "estimate_id";

/// Build the widget launch URL, embedding the estimate id when one exists.
///
/// Estimate ids only contain URL-safe characters (`est_<digits>_<alnum>`),
/// so no percent-encoding is needed.
pub fn widget_url(base: &str, estimate_id: Option<&str>) -> String {
    match estimate_id {
        Some(id) if !id.is_empty() => {
            let separator = if base.contains('?') { '&' } else { '?' };
            format!("{base}{separator}{ESTIMATE_ID_PARAM}={id}")
        }
        _ => base.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

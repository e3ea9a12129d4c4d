//! Quote persistence: the session store and the server-side mirror.
//!
//! The browser session owns the canonical quote for the duration of a visit;
//! [`QuoteStore`] abstracts that storage so the wizard and pricing logic can
//! be exercised without a browser. The server keeps a disposable
//! [`QuoteMirror`] copy strictly to bridge the scheduling provider's webhook
//! back to the session.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use mansei_core::quote::{Quote, QuoteStatus, ReservationData};
use mansei_core::wizard::FinalizedQuote;

use crate::ttl::{spawn_sweeper, TtlConfig, TtlMap};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum QuoteStoreError {
    /// Absence of a stored quote — distinct from a storage failure.
    #[error("No quote found for id {0}")]
    NotFound(String),

    /// The session has no current quote pointer yet.
    #[error("No current quote in this session")]
    NoCurrentQuote,

    /// Serialization or quota failure. Surfaced, never swallowed.
    #[error("Failed to save quote: {0}")]
    SaveFailed(String),
}

// ---------------------------------------------------------------------------
// Session store trait
// ---------------------------------------------------------------------------

/// Session-scoped quote persistence.
///
/// One store instance corresponds to one browser session; there is no
/// cross-session sharing.
#[async_trait]
pub trait QuoteStore: Send + Sync {
    /// Persist a finalized quote under a generated identifier and make it
    /// the session's current quote.
    async fn create(&self, finalized: FinalizedQuote) -> Result<String, QuoteStoreError>;

    /// Fetch a quote by id. `Ok(None)` means "not found", not failure.
    async fn get(&self, id: &str) -> Result<Option<Quote>, QuoteStoreError>;

    /// The session's current quote, if one has been created.
    async fn current(&self) -> Result<Option<Quote>, QuoteStoreError>;

    /// Attach reservation data to the current quote and advance its status.
    /// Fails loudly when the session has no current quote.
    async fn update_reservation(&self, reservation: ReservationData)
        -> Result<(), QuoteStoreError>;

    /// Mark a quote's confirmation email as sent.
    async fn mark_email_sent(&self, id: &str) -> Result<(), QuoteStoreError>;

    /// Drop every stored quote and the current pointer (abandon-and-restart).
    async fn clear(&self);
}

// ---------------------------------------------------------------------------
// In-memory session store
// ---------------------------------------------------------------------------

/// Default quota: how many quotes one session may hold before writes fail
/// the way a full browser storage area would.
const DEFAULT_SESSION_CAPACITY: usize = 50;

#[derive(Default)]
struct SessionState {
    quotes: HashMap<String, Quote>,
    current_id: Option<String>,
}

/// In-memory [`QuoteStore`] used in tests and as the server-side default.
pub struct InMemoryQuoteStore {
    state: RwLock<SessionState>,
    capacity: usize,
}

impl InMemoryQuoteStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SESSION_CAPACITY)
    }

    /// A store that fails with [`QuoteStoreError::SaveFailed`] once it holds
    /// `capacity` quotes, mimicking a storage-quota failure.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: RwLock::new(SessionState::default()),
            capacity,
        }
    }
}

impl Default for InMemoryQuoteStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QuoteStore for InMemoryQuoteStore {
    async fn create(&self, finalized: FinalizedQuote) -> Result<String, QuoteStoreError> {
        let mut state = self.state.write().await;
        if state.quotes.len() >= self.capacity {
            return Err(QuoteStoreError::SaveFailed(
                "session storage quota exceeded".to_string(),
            ));
        }
        let quote = Quote::new(
            finalized.answers,
            finalized.base_price,
            finalized.total_price,
        );
        let id = quote.id.clone();
        state.quotes.insert(id.clone(), quote);
        state.current_id = Some(id.clone());
        tracing::info!(%id, "Saved finalized quote");
        Ok(id)
    }

    async fn get(&self, id: &str) -> Result<Option<Quote>, QuoteStoreError> {
        let state = self.state.read().await;
        Ok(state.quotes.get(id).cloned())
    }

    async fn current(&self) -> Result<Option<Quote>, QuoteStoreError> {
        let state = self.state.read().await;
        let quote = state
            .current_id
            .as_ref()
            .and_then(|id| state.quotes.get(id))
            .cloned();
        Ok(quote)
    }

    async fn update_reservation(
        &self,
        reservation: ReservationData,
    ) -> Result<(), QuoteStoreError> {
        let mut state = self.state.write().await;
        let id = state
            .current_id
            .clone()
            .ok_or(QuoteStoreError::NoCurrentQuote)?;
        let quote = state
            .quotes
            .get_mut(&id)
            .ok_or_else(|| QuoteStoreError::NotFound(id.clone()))?;
        quote.reservation = Some(reservation);
        quote.status = QuoteStatus::ReservationCompleted;
        tracing::info!(%id, "Updated reservation data");
        Ok(())
    }

    async fn mark_email_sent(&self, id: &str) -> Result<(), QuoteStoreError> {
        let mut state = self.state.write().await;
        let quote = state
            .quotes
            .get_mut(id)
            .ok_or_else(|| QuoteStoreError::NotFound(id.to_string()))?;
        quote.status = QuoteStatus::EmailSent;
        Ok(())
    }

    async fn clear(&self) {
        let mut state = self.state.write().await;
        state.quotes.clear();
        state.current_id = None;
    }
}

// ---------------------------------------------------------------------------
// Server-side mirror
// ---------------------------------------------------------------------------

/// Time-bounded server-side copy of submitted quotes, keyed by estimate id.
///
/// A mirrored quote exists only to let the webhook pipeline compose a priced
/// confirmation; it is deleted a retention window after the client first
/// retrieves it, and idle entries are swept like booking records.
pub struct QuoteMirror {
    inner: Arc<TtlMap<Quote>>,
}

impl QuoteMirror {
    pub fn new(config: TtlConfig) -> Self {
        Self {
            inner: Arc::new(TtlMap::new(config)),
        }
    }

    /// Start the background eviction task for the mirror.
    pub fn start_sweeper(&self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        spawn_sweeper(Arc::clone(&self.inner), interval, cancel)
    }

    /// Mirror a finalized quote; returns the generated estimate id.
    pub async fn create(&self, finalized: FinalizedQuote) -> String {
        let quote = Quote::new(
            finalized.answers,
            finalized.base_price,
            finalized.total_price,
        );
        let id = quote.id.clone();
        self.inner.insert(id.as_str(), quote).await;
        tracing::info!(%id, "Mirrored quote server-side");
        id
    }

    /// Client-facing read: schedules the retention delete.
    pub async fn get(&self, id: &str) -> Option<Quote> {
        self.inner.get(id).await
    }

    /// Pipeline-internal read (webhook correlation): does not start the
    /// retention clock.
    pub async fn peek(&self, id: &str) -> Option<Quote> {
        self.inner.peek(id).await
    }

    /// Attach reservation data from a correlated booking event.
    pub async fn attach_reservation(&self, id: &str, reservation: ReservationData) -> bool {
        self.inner
            .with_mut(id, |quote| {
                quote.reservation = Some(reservation);
                if quote.status != QuoteStatus::EmailSent {
                    quote.status = QuoteStatus::ReservationCompleted;
                }
            })
            .await
    }

    pub async fn set_status(&self, id: &str, status: QuoteStatus) -> bool {
        self.inner.with_mut(id, |quote| quote.status = status).await
    }

    pub async fn sweep(&self) -> usize {
        self.inner.sweep().await
    }

    pub async fn len(&self) -> usize {
        self.inner.len().await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use mansei_core::quote::ResolvedAnswer;

    fn finalized() -> FinalizedQuote {
        FinalizedQuote {
            answers: vec![ResolvedAnswer {
                question_id: "removal-needed".into(),
                selected_option: 0,
                option_label: "必要（回収・処分込み）".into(),
                price: 5_500,
            }],
            base_price: 19_000,
            total_price: 24_500,
        }
    }

    // -- session store --

    #[tokio::test]
    async fn create_sets_current_and_returns_id() {
        let store = InMemoryQuoteStore::new();
        let id = store.create(finalized()).await.unwrap();
        assert!(id.starts_with("est_"));

        let current = store.current().await.unwrap().unwrap();
        assert_eq!(current.id, id);
        assert_eq!(current.status, QuoteStatus::EstimateCompleted);
        assert_eq!(current.total_price, 24_500);
    }

    #[tokio::test]
    async fn get_missing_quote_is_none_not_error() {
        let store = InMemoryQuoteStore::new();
        assert!(store.get("est_unknown").await.unwrap().is_none());
        assert!(store.current().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn update_reservation_without_current_fails_loudly() {
        let store = InMemoryQuoteStore::new();
        assert_matches!(
            store.update_reservation(ReservationData::default()).await,
            Err(QuoteStoreError::NoCurrentQuote)
        );
    }

    #[tokio::test]
    async fn update_reservation_advances_status() {
        let store = InMemoryQuoteStore::new();
        let id = store.create(finalized()).await.unwrap();
        store
            .update_reservation(ReservationData {
                booking_uid: Some("bk_1".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let quote = store.get(&id).await.unwrap().unwrap();
        assert_eq!(quote.status, QuoteStatus::ReservationCompleted);
        assert_eq!(
            quote.reservation.unwrap().booking_uid.as_deref(),
            Some("bk_1")
        );
    }

    #[tokio::test]
    async fn mark_email_sent_transitions_status() {
        let store = InMemoryQuoteStore::new();
        let id = store.create(finalized()).await.unwrap();
        store.mark_email_sent(&id).await.unwrap();
        let quote = store.get(&id).await.unwrap().unwrap();
        assert_eq!(quote.status, QuoteStatus::EmailSent);
    }

    #[tokio::test]
    async fn mark_email_sent_for_unknown_id_is_not_found() {
        let store = InMemoryQuoteStore::new();
        assert_matches!(
            store.mark_email_sent("est_missing").await,
            Err(QuoteStoreError::NotFound(_))
        );
    }

    #[tokio::test]
    async fn exceeding_capacity_is_a_save_failure() {
        let store = InMemoryQuoteStore::with_capacity(1);
        store.create(finalized()).await.unwrap();
        assert_matches!(
            store.create(finalized()).await,
            Err(QuoteStoreError::SaveFailed(_))
        );
    }

    #[tokio::test]
    async fn clear_drops_quotes_and_pointer() {
        let store = InMemoryQuoteStore::new();
        store.create(finalized()).await.unwrap();
        store.clear().await;
        assert!(store.current().await.unwrap().is_none());
    }

    // -- mirror --

    #[tokio::test]
    async fn mirror_roundtrip_and_reservation() {
        let mirror = QuoteMirror::new(TtlConfig::default());
        let id = mirror.create(finalized()).await;

        assert!(mirror.peek(&id).await.is_some());
        assert!(
            mirror
                .attach_reservation(
                    &id,
                    ReservationData {
                        booking_uid: Some("bk_9".into()),
                        ..Default::default()
                    },
                )
                .await
        );
        let quote = mirror.peek(&id).await.unwrap();
        assert_eq!(quote.status, QuoteStatus::ReservationCompleted);
    }

    #[tokio::test]
    async fn mirror_status_update_for_unknown_id_is_false() {
        let mirror = QuoteMirror::new(TtlConfig::default());
        assert!(!mirror.set_status("est_x", QuoteStatus::EmailSent).await);
        assert!(
            !mirror
                .attach_reservation("est_x", ReservationData::default())
                .await
        );
    }

    #[tokio::test]
    async fn attach_reservation_does_not_regress_email_sent() {
        let mirror = QuoteMirror::new(TtlConfig::default());
        let id = mirror.create(finalized()).await;
        mirror.set_status(&id, QuoteStatus::EmailSent).await;
        mirror
            .attach_reservation(&id, ReservationData::default())
            .await;
        assert_eq!(mirror.peek(&id).await.unwrap().status, QuoteStatus::EmailSent);
    }
}

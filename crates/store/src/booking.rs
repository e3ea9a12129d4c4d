//! Server-side booking event store, keyed by estimate id.
//!
//! Bridges the provider webhook to the browser session: the webhook handler
//! writes a normalized event here and the status endpoint hands it to the
//! polling client. Entries are disposable — the TTL map purges anything the
//! poller has collected (after a grace window) or abandoned.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use mansei_core::booking::BookingEvent;

use crate::ttl::{spawn_sweeper, TtlConfig, TtlMap};

/// A stored booking event with its server-side capture timestamp.
#[derive(Debug, Clone, Serialize)]
pub struct BookingRecord {
    pub event: BookingEvent,
    pub received_at: DateTime<Utc>,
}

/// TTL-bounded map of correlation id → booking record.
pub struct BookingStore {
    inner: Arc<TtlMap<BookingRecord>>,
}

impl BookingStore {
    pub fn new(config: TtlConfig) -> Self {
        Self {
            inner: Arc::new(TtlMap::new(config)),
        }
    }

    /// Store (or overwrite) the event for an estimate id. A provider retry
    /// of the same booking leaves exactly one record.
    pub async fn store(&self, estimate_id: &str, event: BookingEvent) {
        let record = BookingRecord {
            event,
            received_at: Utc::now(),
        };
        self.inner.insert(estimate_id, record).await;
        tracing::info!(estimate_id, "Stored booking event");
    }

    /// Fetch the record for an estimate id. Reading schedules the delayed
    /// delete; absence is a normal outcome, not an error.
    pub async fn fetch(&self, estimate_id: &str) -> Option<BookingRecord> {
        self.inner.get(estimate_id).await
    }

    /// Read without affecting eviction (debug/introspection).
    pub async fn peek(&self, estimate_id: &str) -> Option<BookingRecord> {
        self.inner.peek(estimate_id).await
    }

    pub async fn list(&self) -> Vec<(String, BookingRecord)> {
        self.inner.entries().await
    }

    pub async fn len(&self) -> usize {
        self.inner.len().await
    }

    pub async fn sweep(&self) -> usize {
        self.inner.sweep().await
    }

    /// Start the background eviction task for this store.
    pub fn start_sweeper(&self, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        spawn_sweeper(Arc::clone(&self.inner), interval, cancel)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

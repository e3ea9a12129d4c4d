//! Bounded in-memory key-value map with idle eviction and read-grace expiry.
//!
//! [`TtlMap`] is the single shared mutable resource of the server: the
//! webhook handler writes, the status endpoint reads, and a background
//! sweeper purges. A read never deletes immediately — it schedules removal
//! after a grace window, so a slow reader cannot lose the entry it just
//! observed. An overwrite cancels any pending expiry.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Eviction tuning for a [`TtlMap`].
#[derive(Debug, Clone, Copy)]
pub struct TtlConfig {
    /// Entries untouched for this long are purged by [`TtlMap::sweep`].
    pub idle_ttl: Duration,
    /// How long an entry survives after a read before the sweeper may
    /// remove it. Re-reading pushes the deadline out again.
    pub read_grace: Duration,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            idle_ttl: Duration::from_secs(30 * 60),
            read_grace: Duration::from_secs(10 * 60),
        }
    }
}

// ---------------------------------------------------------------------------
// TtlMap
// ---------------------------------------------------------------------------

struct Entry<V> {
    value: V,
    last_touched: Instant,
    /// Set on first read: the sweep deadline granted by the grace window.
    expires_at: Option<Instant>,
}

/// String-keyed TTL map. Cheap to share via `Arc`.
pub struct TtlMap<V> {
    entries: RwLock<HashMap<String, Entry<V>>>,
    config: TtlConfig,
}

impl<V: Clone> TtlMap<V> {
    pub fn new(config: TtlConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Insert or overwrite. Overwriting resets the idle clock and cancels a
    /// pending read-grace expiry, so a provider retry keeps one fresh record.
    pub async fn insert(&self, key: impl Into<String>, value: V) {
        let mut entries = self.entries.write().await;
        entries.insert(
            key.into(),
            Entry {
                value,
                last_touched: Instant::now(),
                expires_at: None,
            },
        );
    }

    /// Read an entry, refresh its idle clock, and schedule its removal one
    /// grace window from now.
    pub async fn get(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(key)?;
        let now = Instant::now();
        entry.last_touched = now;
        entry.expires_at = Some(now + self.config.read_grace);
        Some(entry.value.clone())
    }

    /// Read without touching the idle clock or scheduling removal.
    pub async fn peek(&self, key: &str) -> Option<V> {
        let entries = self.entries.read().await;
        entries.get(key).map(|e| e.value.clone())
    }

    /// Mutate an entry in place. Returns `false` if the key is absent.
    pub async fn with_mut<F>(&self, key: &str, f: F) -> bool
    where
        F: FnOnce(&mut V),
    {
        let mut entries = self.entries.write().await;
        match entries.get_mut(key) {
            Some(entry) => {
                f(&mut entry.value);
                entry.last_touched = Instant::now();
                true
            }
            None => false,
        }
    }

    pub async fn remove(&self, key: &str) -> Option<V> {
        let mut entries = self.entries.write().await;
        entries.remove(key).map(|e| e.value)
    }

    /// Purge entries whose grace deadline passed or that sat untouched
    /// beyond the idle TTL. Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let idle_ttl = self.config.idle_ttl;
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, entry| {
            let grace_expired = entry.expires_at.is_some_and(|deadline| deadline <= now);
            let idle_expired = now.duration_since(entry.last_touched) >= idle_ttl;
            !(grace_expired || idle_expired)
        });
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Snapshot of all live entries (debug listing).
    pub async fn entries(&self) -> Vec<(String, V)> {
        self.entries
            .read()
            .await
            .iter()
            .map(|(k, e)| (k.clone(), e.value.clone()))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Sweeper task
// ---------------------------------------------------------------------------

/// Run [`TtlMap::sweep`] on an interval until the token is cancelled.
pub fn spawn_sweeper<V>(
    map: Arc<TtlMap<V>>,
    interval: Duration,
    cancel: CancellationToken,
) -> JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::debug!("Store sweeper stopped");
                    return;
                }
                _ = tokio::time::sleep(interval) => {}
            }
            let purged = map.sweep().await;
            if purged > 0 {
                tracing::debug!(purged, "Swept expired store entries");
            }
        }
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

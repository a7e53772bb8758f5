//! In-memory snapshot cache keyed by ticker symbol.

use crate::domain::snapshot::StockSnapshot;
use cached::{Cached, TimedCache};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Snapshot store with a fixed freshness window.
///
/// Entries are whole `Arc` values swapped under the lock, so a reader holds
/// either the old snapshot or the new one, never a mix. Owned by whoever hosts
/// the data service and shared by cloning the `Arc<SnapshotCache>`.
pub struct SnapshotCache {
    entries: RwLock<TimedCache<String, Arc<StockSnapshot>>>,
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(TimedCache::with_lifespan(ttl)),
        }
    }

    /// Returns the entry for `symbol` if it was stored less than one TTL ago.
    pub async fn get(&self, symbol: &str) -> Option<Arc<StockSnapshot>> {
        // Expired entries are evicted on lookup, which needs the write lock.
        let mut entries = self.entries.write().await;
        entries.cache_get(symbol).cloned()
    }

    /// Overwrites the entry for `symbol` and restarts its freshness window.
    pub async fn insert(&self, symbol: &str, snapshot: StockSnapshot) {
        let mut entries = self.entries.write().await;
        let _ = entries.cache_set(symbol.to_string(), Arc::new(snapshot));
    }

    pub async fn invalidate(&self, symbol: &str) {
        let mut entries = self.entries.write().await;
        let _ = entries.cache_remove(symbol);
    }

    pub async fn clear(&self) {
        self.entries.write().await.cache_clear();
    }

    /// Number of stored entries, expired ones included until they are looked up.
    pub async fn len(&self) -> usize {
        self.entries.read().await.cache_size()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(900))
    }
}

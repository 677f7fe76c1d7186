//! In-memory snapshot cache
//!
//! Holds the last-known market snapshot with replace-whole-value
//! semantics. Consumers always receive clones; the stored entry is
//! mutated only through `put` and `invalidate`.

use crate::models::Snapshot;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::time::{Duration, Instant};
use tracing::debug;

struct CacheEntry {
    snapshot: Snapshot,
    stored_at: Instant,
    stored_at_utc: DateTime<Utc>,
}

/// TTL'd holder of the most recent valid snapshot
pub struct SnapshotCache {
    ttl: Duration,
    entry: RwLock<Option<CacheEntry>>,
}

impl SnapshotCache {
    /// Empty cache with the given freshness window.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// Current snapshot, fresh or stale. Never blocks on I/O, never fails.
    pub fn get(&self) -> Option<Snapshot> {
        self.entry.read().as_ref().map(|e| e.snapshot.clone())
    }

    /// Replace the stored snapshot unconditionally and stamp it now.
    pub fn put(&self, snapshot: Snapshot) {
        let count = snapshot.len();
        *self.entry.write() = Some(CacheEntry {
            snapshot,
            stored_at: Instant::now(),
            stored_at_utc: Utc::now(),
        });
        debug!(count, "snapshot cached");
    }

    /// Drop the stored snapshot so the next fetch treats the cache as empty.
    pub fn invalidate(&self) {
        *self.entry.write() = None;
        debug!("snapshot cache invalidated");
    }

    /// True iff a non-empty snapshot is stored and younger than the TTL.
    pub fn is_valid(&self) -> bool {
        self.entry
            .read()
            .as_ref()
            .map(|e| !e.snapshot.is_empty() && e.stored_at.elapsed() < self.ttl)
            .unwrap_or(false)
    }

    /// When the stored snapshot's data was collected, preferring the
    /// records' own timestamps over the local store time.
    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.entry
            .read()
            .as_ref()
            .map(|e| e.snapshot.last_updated().unwrap_or(e.stored_at_utc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Stock;

    fn snapshot() -> Snapshot {
        let stock: Stock =
            serde_json::from_value(serde_json::json!({ "symbol": "ABC", "price": 10.5 })).unwrap();
        Snapshot::from(vec![stock])
    }

    #[test]
    fn empty_cache_is_invalid() {
        let cache = SnapshotCache::new(Duration::from_secs(300));
        assert!(!cache.is_valid());
        assert!(cache.get().is_none());
        assert!(cache.last_updated().is_none());
    }

    #[test]
    fn put_makes_cache_valid_until_ttl() {
        let cache = SnapshotCache::new(Duration::from_secs(300));
        cache.put(snapshot());
        assert!(cache.is_valid());
        assert_eq!(cache.get().unwrap().len(), 1);
        assert!(cache.last_updated().is_some());
    }

    #[test]
    fn expired_entry_is_stale_but_still_readable() {
        let cache = SnapshotCache::new(Duration::ZERO);
        cache.put(snapshot());
        assert!(!cache.is_valid());
        // Stale data is still served through get() for fallback paths.
        assert!(cache.get().is_some());
    }

    #[test]
    fn empty_snapshot_is_never_valid() {
        let cache = SnapshotCache::new(Duration::from_secs(300));
        cache.put(Snapshot::default());
        assert!(!cache.is_valid());
    }

    #[test]
    fn invalidate_clears_the_entry() {
        let cache = SnapshotCache::new(Duration::from_secs(300));
        cache.put(snapshot());
        cache.invalidate();
        assert!(!cache.is_valid());
        assert!(cache.get().is_none());
    }
}

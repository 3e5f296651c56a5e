//! Time-bounded cache in front of a [`SnapshotSource`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use paperdash_core::Snapshot;
use tracing::debug;

use crate::loader::load_latest;
use crate::source::SnapshotSource;
use crate::StoreError;

/// Default time-to-live: one hour.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3600);

/// Holds the last load result until `ttl` elapses.
///
/// "No snapshot found" is cached like a loaded snapshot; errors are not
/// cached, so the next call retries.
#[derive(Debug)]
pub struct SnapshotCache {
    ttl: Duration,
    entry: Option<CacheEntry>,
}

#[derive(Debug)]
struct CacheEntry {
    fetched_at: Instant,
    snapshot: Option<Arc<Snapshot>>,
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl SnapshotCache {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, entry: None }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Current snapshot, reloading from `source` if the entry has expired.
    pub async fn get(
        &mut self,
        source: &dyn SnapshotSource,
    ) -> Result<Option<Arc<Snapshot>>, StoreError> {
        self.get_at(source, Instant::now()).await
    }

    /// [`get`](Self::get) with an explicit clock reading.
    pub async fn get_at(
        &mut self,
        source: &dyn SnapshotSource,
        now: Instant,
    ) -> Result<Option<Arc<Snapshot>>, StoreError> {
        if let Some(entry) = self.fresh_entry(now) {
            debug!("snapshot cache hit");
            return Ok(entry.snapshot.clone());
        }
        debug!(location = %source.location(), "snapshot cache miss");
        let snapshot = load_latest(source).await?;
        Ok(self.insert_at(snapshot, now))
    }

    /// Store a load result as if it had been fetched at `now`.
    pub fn insert_at(&mut self, snapshot: Option<Snapshot>, now: Instant) -> Option<Arc<Snapshot>> {
        let snapshot = snapshot.map(Arc::new);
        self.entry = Some(CacheEntry {
            fetched_at: now,
            snapshot: snapshot.clone(),
        });
        snapshot
    }

    /// Drop the current entry so the next [`get`](Self::get) reloads.
    pub fn invalidate(&mut self) {
        self.entry = None;
    }

    fn fresh_entry(&self, now: Instant) -> Option<&CacheEntry> {
        self.entry
            .as_ref()
            .filter(|e| now.saturating_duration_since(e.fetched_at) < self.ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SnapshotObject;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source with no objects that counts how often it is listed.
    #[derive(Default)]
    struct CountingSource {
        lists: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SnapshotSource for CountingSource {
        fn location(&self) -> String {
            "memory://test".into()
        }

        async fn list(&self) -> Result<Vec<SnapshotObject>, StoreError> {
            self.lists.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(StoreError::Other("storage offline".into()));
            }
            Ok(Vec::new())
        }

        async fn fetch(&self, object: &SnapshotObject) -> Result<Bytes, StoreError> {
            Err(StoreError::SnapshotNotFound(object.key.clone()))
        }
    }

    fn snapshot(name: &str) -> Snapshot {
        Snapshot {
            name: name.into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn serves_entry_until_ttl_elapses() {
        let source = CountingSource::default();
        let mut cache = SnapshotCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.insert_at(Some(snapshot("a.parquet")), t0);

        let hit = cache.get_at(&source, t0 + Duration::from_secs(59)).await.unwrap();
        assert_eq!(hit.unwrap().name, "a.parquet");
        assert_eq!(source.lists.load(Ordering::SeqCst), 0);

        let miss = cache.get_at(&source, t0 + Duration::from_secs(60)).await.unwrap();
        assert!(miss.is_none());
        assert_eq!(source.lists.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn absence_is_cached() {
        let source = CountingSource::default();
        let mut cache = SnapshotCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        assert!(cache.get_at(&source, t0).await.unwrap().is_none());
        assert!(cache.get_at(&source, t0 + Duration::from_secs(1)).await.unwrap().is_none());
        assert_eq!(source.lists.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn errors_are_not_cached() {
        let source = CountingSource {
            fail: true,
            ..Default::default()
        };
        let mut cache = SnapshotCache::default();
        let t0 = Instant::now();
        assert!(cache.get_at(&source, t0).await.is_err());
        assert!(cache.get_at(&source, t0).await.is_err());
        assert_eq!(source.lists.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn expired_entry_retries_after_failed_reload() {
        let source = CountingSource {
            fail: true,
            ..Default::default()
        };
        let mut cache = SnapshotCache::new(Duration::from_secs(10));
        let t0 = Instant::now();
        cache.insert_at(Some(snapshot("a.parquet")), t0);
        let later = t0 + Duration::from_secs(10);
        assert!(cache.get_at(&source, later).await.is_err());
        assert!(cache.get_at(&source, later).await.is_err());
        assert_eq!(source.lists.load(Ordering::SeqCst), 2);
        assert_eq!(cache.ttl(), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn invalidate_forces_reload() {
        let source = CountingSource::default();
        let mut cache = SnapshotCache::new(Duration::from_secs(60));
        let t0 = Instant::now();
        cache.insert_at(Some(snapshot("a.parquet")), t0);
        assert!(cache.get_at(&source, t0).await.unwrap().is_some());
        assert_eq!(source.lists.load(Ordering::SeqCst), 0);

        cache.invalidate();
        assert!(cache.get_at(&source, t0).await.unwrap().is_none());
        assert_eq!(source.lists.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn default_ttl_is_one_hour() {
        assert_eq!(SnapshotCache::default().ttl(), Duration::from_secs(3600));
    }
}

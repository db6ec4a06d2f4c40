use std::sync::Arc;
use std::time::{Duration, Instant};

use accessmgmt_application::{ReferenceSnapshot, ReferenceSnapshotSource};
use accessmgmt_core::AppResult;
use async_trait::async_trait;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct SnapshotCacheEntry {
    snapshot: Arc<ReferenceSnapshot>,
    expires_at: Instant,
}

/// In-memory TTL cache in front of another snapshot source.
///
/// A zero TTL disables caching and every call reaches the inner source.
pub struct CachedReferenceSnapshotSource {
    inner: Arc<dyn ReferenceSnapshotSource>,
    ttl: Duration,
    entry: RwLock<Option<SnapshotCacheEntry>>,
}

impl CachedReferenceSnapshotSource {
    /// Creates a cache with the given time-to-live.
    #[must_use]
    pub fn new(inner: Arc<dyn ReferenceSnapshotSource>, ttl: Duration) -> Self {
        Self {
            inner,
            ttl,
            entry: RwLock::new(None),
        }
    }

    /// Drops the cached snapshot so the next load reaches the inner source.
    pub async fn invalidate(&self) {
        self.entry.write().await.take();
    }
}

#[async_trait]
impl ReferenceSnapshotSource for CachedReferenceSnapshotSource {
    async fn load_snapshot(&self) -> AppResult<Arc<ReferenceSnapshot>> {
        if self.ttl.is_zero() {
            return self.inner.load_snapshot().await;
        }

        {
            let entry = self.entry.read().await;
            if let Some(entry) = entry.as_ref()
                && entry.expires_at > Instant::now()
            {
                return Ok(entry.snapshot.clone());
            }
        }

        let mut entry = self.entry.write().await;
        if let Some(current) = entry.as_ref()
            && current.expires_at > Instant::now()
        {
            return Ok(current.snapshot.clone());
        }

        let snapshot = self.inner.load_snapshot().await?;
        let now = Instant::now();
        *entry = Some(SnapshotCacheEntry {
            snapshot: snapshot.clone(),
            expires_at: now.checked_add(self.ttl).unwrap_or(now),
        });

        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use accessmgmt_application::{ReferenceSnapshot, ReferenceSnapshotSource};
    use accessmgmt_core::AppResult;
    use async_trait::async_trait;

    use super::CachedReferenceSnapshotSource;

    #[derive(Default)]
    struct CountingSource {
        loads: AtomicUsize,
    }

    #[async_trait]
    impl ReferenceSnapshotSource for CountingSource {
        async fn load_snapshot(&self) -> AppResult<Arc<ReferenceSnapshot>> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(ReferenceSnapshot::default()))
        }
    }

    #[tokio::test]
    async fn snapshot_is_reused_until_invalidated() {
        let inner = Arc::new(CountingSource::default());
        let cache = CachedReferenceSnapshotSource::new(inner.clone(), Duration::from_secs(60));

        let first = cache.load_snapshot().await;
        let second = cache.load_snapshot().await;
        assert!(matches!((first, second), (Ok(a), Ok(b)) if Arc::ptr_eq(&a, &b)));
        assert_eq!(inner.loads.load(Ordering::SeqCst), 1);

        cache.invalidate().await;
        assert!(cache.load_snapshot().await.is_ok());
        assert_eq!(inner.loads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn zero_ttl_always_reaches_inner_source() {
        let inner = Arc::new(CountingSource::default());
        let cache = CachedReferenceSnapshotSource::new(inner.clone(), Duration::ZERO);

        assert!(cache.load_snapshot().await.is_ok());
        assert!(cache.load_snapshot().await.is_ok());

        assert_eq!(inner.loads.load(Ordering::SeqCst), 2);
    }
}

//! Per-origin concurrency limiting.
//!
//! Every origin (URL host) gets its own fixed-capacity permit pool, created
//! the first time the origin is seen. The registry lock only guards pool
//! creation; acquiring and releasing permits goes straight to the pool.
//! Once the registry holds [`DEFAULT_PRUNE_THRESHOLD`] origins, pools that
//! nobody holds or waits on are dropped before a new one is added.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Url;
use tokio::sync::{OwnedSemaphorePermit, RwLock, Semaphore};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::FetchError;

/// Registry size at which idle pools are pruned.
pub const DEFAULT_PRUNE_THRESHOLD: usize = 1024;

/// Snapshot of one origin's permit pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OriginStatus {
    pub origin: String,
    pub capacity: usize,
    pub available: usize,
}

impl OriginStatus {
    pub fn in_flight(&self) -> usize {
        self.capacity - self.available
    }
}

/// Derive the origin of a locator: its host, without port.
pub fn origin_of(locator: &str) -> Result<String, FetchError> {
    let url = Url::parse(locator).map_err(|e| FetchError::InvalidLocator {
        locator: locator.to_string(),
        reason: e.to_string(),
    })?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(host.to_ascii_lowercase()),
        _ => Err(FetchError::InvalidLocator {
            locator: locator.to_string(),
            reason: "locator has no host".to_string(),
        }),
    }
}

/// Registry of permit pools, one per origin.
///
/// Thread-safe and async-compatible.
pub struct OriginLimiterPool {
    capacity: usize,
    prune_threshold: usize,
    limiters: RwLock<HashMap<String, Arc<Semaphore>>>,
}

impl OriginLimiterPool {
    /// Create an empty registry whose pools each hold `capacity` permits.
    ///
    /// A capacity of zero is raised to one so that acquisition can never
    /// deadlock.
    pub fn new(capacity: usize) -> Self {
        Self::with_prune_threshold(capacity, DEFAULT_PRUNE_THRESHOLD)
    }

    /// Create an empty registry that prunes idle pools once it holds
    /// `prune_threshold` origins.
    pub fn with_prune_threshold(capacity: usize, prune_threshold: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            prune_threshold: prune_threshold.max(1),
            limiters: RwLock::new(HashMap::new()),
        }
    }

    /// Permits per origin.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the pool for `origin`, creating it if absent.
    ///
    /// Concurrent first access creates exactly one pool.
    pub async fn limiter(&self, origin: &str) -> Arc<Semaphore> {
        {
            let limiters = self.limiters.read().await;
            if let Some(semaphore) = limiters.get(origin) {
                return Arc::clone(semaphore);
            }
        }

        let mut limiters = self.limiters.write().await;
        if !limiters.contains_key(origin) && limiters.len() >= self.prune_threshold {
            let before = limiters.len();
            retain_busy(&mut limiters);
            debug!(pruned = before - limiters.len(), "Pruned idle origin pools");
        }
        Arc::clone(
            limiters
                .entry(origin.to_string())
                .or_insert_with(|| Arc::new(Semaphore::new(self.capacity))),
        )
    }

    /// Acquire one permit for `origin`, or give up when `cancel` fires.
    ///
    /// The permit is released when the returned guard is dropped.
    pub async fn acquire(
        &self,
        origin: &str,
        cancel: &CancellationToken,
    ) -> Result<OwnedSemaphorePermit, FetchError> {
        let semaphore = self.limiter(origin).await;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::Cancelled),
            permit = semaphore.acquire_owned() => permit.map_err(|_| FetchError::Cancelled),
        }
    }

    /// Get the status of a single origin, if it has been seen.
    pub async fn status(&self, origin: &str) -> Option<OriginStatus> {
        let limiters = self.limiters.read().await;
        limiters.get(origin).map(|semaphore| OriginStatus {
            origin: origin.to_string(),
            capacity: self.capacity,
            available: semaphore.available_permits(),
        })
    }

    /// Get the status of every known origin.
    pub async fn all_status(&self) -> Vec<OriginStatus> {
        let limiters = self.limiters.read().await;
        limiters
            .iter()
            .map(|(origin, semaphore)| OriginStatus {
                origin: origin.clone(),
                capacity: self.capacity,
                available: semaphore.available_permits(),
            })
            .collect()
    }

    /// Check if an origin has a pool.
    pub async fn has_origin(&self, origin: &str) -> bool {
        self.limiters.read().await.contains_key(origin)
    }

    /// Drop every pool with no permit held and no waiter. Returns how many
    /// were dropped.
    pub async fn prune_idle(&self) -> usize {
        let mut limiters = self.limiters.write().await;
        let before = limiters.len();
        retain_busy(&mut limiters);
        before - limiters.len()
    }
}

/// Keep only pools referenced outside the registry.
///
/// Held permits and pending acquisitions each own a clone of the pool, and
/// new clones are only handed out under the registry lock, so a count of one
/// means the pool is idle and cannot be picked up concurrently.
fn retain_busy(limiters: &mut HashMap<String, Arc<Semaphore>>) {
    limiters.retain(|_, semaphore| Arc::strong_count(semaphore) > 1);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[test]
    fn test_origin_of() {
        assert_eq!(
            origin_of("https://example.com/a/b?c=d").unwrap(),
            "example.com"
        );
        assert_eq!(origin_of("http://Example.COM:8080/x").unwrap(), "example.com");
        assert_eq!(origin_of("http://127.0.0.1:9999/doc").unwrap(), "127.0.0.1");
    }

    #[test]
    fn test_origin_of_invalid() {
        let err = origin_of("not a url").unwrap_err();
        assert!(matches!(err, FetchError::InvalidLocator { .. }));

        let err = origin_of("mailto:someone@example.com").unwrap_err();
        match err {
            FetchError::InvalidLocator { reason, .. } => assert!(reason.contains("no host")),
            other => panic!("Expected InvalidLocator, got {other:?}"),
        }
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        let pool = OriginLimiterPool::new(0);
        assert_eq!(pool.capacity(), 1);
    }

    #[tokio::test]
    async fn test_limiter_created_once() {
        let pool = OriginLimiterPool::new(3);
        assert!(!pool.has_origin("a.com").await);

        let first = pool.limiter("a.com").await;
        let second = pool.limiter("a.com").await;
        assert!(Arc::ptr_eq(&first, &second));
        assert!(pool.has_origin("a.com").await);
    }

    #[tokio::test]
    async fn test_concurrent_first_access_creates_single_pool() {
        let pool = Arc::new(OriginLimiterPool::new(2));
        let mut handles = Vec::new();
        for _ in 0..16 {
            let pool = Arc::clone(&pool);
            handles.push(tokio::spawn(async move { pool.limiter("race.com").await }));
        }

        let mut limiters = Vec::new();
        for handle in handles {
            limiters.push(handle.await.unwrap());
        }
        assert!(limiters.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
        assert_eq!(pool.all_status().await.len(), 1);
    }

    #[tokio::test]
    async fn test_acquire_blocks_at_capacity() {
        let pool = OriginLimiterPool::new(2);
        let cancel = CancellationToken::new();

        let p1 = pool.acquire("a.com", &cancel).await.unwrap();
        let _p2 = pool.acquire("a.com", &cancel).await.unwrap();

        let status = pool.status("a.com").await.unwrap();
        assert_eq!(status.available, 0);
        assert_eq!(status.in_flight(), 2);

        // Third permit must wait
        let third = timeout(Duration::from_millis(50), pool.acquire("a.com", &cancel)).await;
        assert!(third.is_err());

        // Other origins are unaffected
        let _other = pool.acquire("b.com", &cancel).await.unwrap();

        drop(p1);
        let third = timeout(Duration::from_millis(50), pool.acquire("a.com", &cancel)).await;
        assert!(third.is_ok());
    }

    #[tokio::test]
    async fn test_acquire_cancelled_while_waiting() {
        let pool = Arc::new(OriginLimiterPool::new(1));
        let cancel = CancellationToken::new();
        let _held = pool.acquire("a.com", &cancel).await.unwrap();

        let waiter = {
            let pool = Arc::clone(&pool);
            let cancel = cancel.clone();
            tokio::spawn(async move { pool.acquire("a.com", &cancel).await })
        };

        tokio::time::sleep(Duration::from_millis(20)).await;
        cancel.cancel();

        let result = timeout(Duration::from_secs(1), waiter).await.unwrap().unwrap();
        assert_eq!(result.unwrap_err(), FetchError::Cancelled);
    }

    #[tokio::test]
    async fn test_permits_released_on_drop() {
        let pool = OriginLimiterPool::new(3);
        let cancel = CancellationToken::new();

        {
            let _a = pool.acquire("a.com", &cancel).await.unwrap();
            let _b = pool.acquire("a.com", &cancel).await.unwrap();
            assert_eq!(pool.status("a.com").await.unwrap().available, 1);
        }

        let status = pool.status("a.com").await.unwrap();
        assert_eq!(status.available, 3);
        assert_eq!(status.capacity, 3);
    }

    #[tokio::test]
    async fn test_prune_idle_keeps_busy_origins() {
        let pool = OriginLimiterPool::new(2);
        let cancel = CancellationToken::new();

        let _held = pool.acquire("busy.com", &cancel).await.unwrap();
        drop(pool.acquire("idle.com", &cancel).await.unwrap());

        assert_eq!(pool.prune_idle().await, 1);
        assert!(pool.has_origin("busy.com").await);
        assert!(!pool.has_origin("idle.com").await);
    }

    #[tokio::test]
    async fn test_registry_pruned_at_threshold() {
        let pool = OriginLimiterPool::with_prune_threshold(1, 4);
        let cancel = CancellationToken::new();

        let held = pool.acquire("site0.com", &cancel).await.unwrap();
        for i in 1..4 {
            drop(pool.acquire(&format!("site{i}.com"), &cancel).await.unwrap());
        }
        assert_eq!(pool.all_status().await.len(), 4);

        // Adding a fifth origin drops the three idle ones.
        let _fresh = pool.acquire("site4.com", &cancel).await.unwrap();
        let mut origins: Vec<_> = pool
            .all_status()
            .await
            .into_iter()
            .map(|status| status.origin)
            .collect();
        origins.sort();
        assert_eq!(origins, vec!["site0.com", "site4.com"]);

        // The held permit still limits its origin.
        let blocked = timeout(Duration::from_millis(50), pool.acquire("site0.com", &cancel)).await;
        assert!(blocked.is_err());
        drop(held);
    }
}

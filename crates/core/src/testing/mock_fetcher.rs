//! Mock document fetcher for testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::{read, write};
use crate::fetch::{DocumentFetcher, FetchError};

/// A recorded fetch call for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedFetch {
    pub locator: String,
    pub timestamp: Instant,
}

/// Mock implementation of the DocumentFetcher trait.
///
/// Provides controllable behavior for testing:
/// - Serve fixed text per locator
/// - Fail specific locators with a chosen error
/// - Delay every fetch while still honoring cancellation
/// - Stall specific locators until the run is cancelled
/// - Track calls and peak concurrency
///
/// Locators with neither a document nor an error fail with `HttpStatus(404)`.
#[derive(Debug, Default)]
pub struct MockFetcher {
    responses: RwLock<HashMap<String, Result<String, FetchError>>>,
    delay: RwLock<Duration>,
    stalled: RwLock<HashSet<String>>,
    calls: RwLock<Vec<RecordedFetch>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `text` for `locator`.
    pub fn set_document(&self, locator: &str, text: &str) {
        write(&self.responses).insert(locator.to_string(), Ok(text.to_string()));
    }

    /// Fail every fetch of `locator` with `error`.
    pub fn set_error(&self, locator: &str, error: FetchError) {
        write(&self.responses).insert(locator.to_string(), Err(error));
    }

    /// Delay applied to every fetch before it resolves.
    pub fn set_delay(&self, delay: Duration) {
        *write(&self.delay) = delay;
    }

    /// Make every fetch of `locator` wait until cancellation.
    pub fn set_stalled(&self, locator: &str) {
        write(&self.stalled).insert(locator.to_string());
    }

    /// Recorded fetch calls, in call order.
    pub fn calls(&self) -> Vec<RecordedFetch> {
        read(&self.calls).clone()
    }

    /// Number of fetch calls made.
    pub fn call_count(&self) -> usize {
        read(&self.calls).len()
    }

    /// Fetches currently in progress.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of fetches that were in progress at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

/// Decrements the in-flight gauge on every exit path.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl DocumentFetcher for MockFetcher {
    async fn fetch(&self, locator: &str, cancel: &CancellationToken) -> Result<String, FetchError> {
        write(&self.calls).push(RecordedFetch {
            locator: locator.to_string(),
            timestamp: Instant::now(),
        });

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let stalled = read(&self.stalled).contains(locator);
        if stalled {
            cancel.cancelled().await;
            return Err(FetchError::Cancelled);
        }

        let delay = *read(&self.delay);
        if !delay.is_zero() {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        read(&self.responses)
            .get(locator)
            .cloned()
            .unwrap_or(Err(FetchError::HttpStatus(404)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_serves_documents_and_errors() {
        let fetcher = MockFetcher::new();
        fetcher.set_document("http://a.com/1", "alpha");
        fetcher.set_error("http://a.com/2", FetchError::Timeout);
        let cancel = CancellationToken::new();

        assert_eq!(fetcher.fetch("http://a.com/1", &cancel).await.unwrap(), "alpha");
        assert_eq!(
            fetcher.fetch("http://a.com/2", &cancel).await,
            Err(FetchError::Timeout)
        );
        assert_eq!(
            fetcher.fetch("http://a.com/3", &cancel).await,
            Err(FetchError::HttpStatus(404))
        );
        assert_eq!(fetcher.call_count(), 3);
        assert_eq!(fetcher.calls()[1].locator, "http://a.com/2");
        assert_eq!(fetcher.in_flight(), 0);
    }

    #[tokio::test]
    async fn test_delay_honors_cancellation() {
        let fetcher = MockFetcher::new();
        fetcher.set_document("http://a.com/1", "alpha");
        fetcher.set_delay(Duration::from_secs(30));
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let result = fetcher.fetch("http://a.com/1", &cancel).await;
        assert_eq!(result, Err(FetchError::Cancelled));
        assert_eq!(fetcher.in_flight(), 0);
        assert_eq!(fetcher.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_stalled_locator_waits_for_cancellation() {
        let fetcher = MockFetcher::new();
        fetcher.set_document("http://a.com/fast", "alpha");
        fetcher.set_document("http://a.com/slow", "alpha");
        fetcher.set_stalled("http://a.com/slow");
        let cancel = CancellationToken::new();

        assert_eq!(fetcher.fetch("http://a.com/fast", &cancel).await.unwrap(), "alpha");

        let slow = fetcher.fetch("http://a.com/slow", &cancel);
        let pending = tokio::time::timeout(Duration::from_millis(50), slow).await;
        assert!(pending.is_err());

        cancel.cancel();
        assert_eq!(
            fetcher.fetch("http://a.com/slow", &cancel).await,
            Err(FetchError::Cancelled)
        );
        assert_eq!(fetcher.in_flight(), 0);
    }
}

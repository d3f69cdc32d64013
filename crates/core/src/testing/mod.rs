//! Testing utilities and mock implementations.
//!
//! Lets the counter and application layers be exercised without network
//! access.
//!
//! # Example
//!
//! ```rust,ignore
//! use firefly_core::testing::{MockFetcher, RecordingObserver};
//!
//! let fetcher = Arc::new(MockFetcher::new());
//! fetcher.set_document("http://a.com/1", "alpha beta");
//! fetcher.set_error("http://a.com/2", FetchError::HttpStatus(404));
//!
//! let observer = Arc::new(RecordingObserver::new());
//! // Hand both to a WordCounter...
//! ```

mod mock_fetcher;
mod recording_observer;

pub use mock_fetcher::{MockFetcher, RecordedFetch};
pub use recording_observer::{RecordedFailure, RecordedRetry, RecordingObserver};

use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// Read a lock, ignoring poisoning from a panicked test thread.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

/// Write a lock, ignoring poisoning from a panicked test thread.
fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

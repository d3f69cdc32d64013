//! Cancellable stream of document locators.

use std::path::Path;

use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Buffer between the reader task and the workers.
const FEED_BUFFER_SIZE: usize = 1000;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to open locator list {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// A lazy sequence of locators shared by all workers.
///
/// Locators are produced by a background task into a bounded channel. The
/// producer stops as soon as the cancellation token fires, and
/// [`LocatorFeed::next`] returns `None` once the feed is exhausted or
/// cancelled.
pub struct LocatorFeed {
    rx: Mutex<mpsc::Receiver<String>>,
    cancel: CancellationToken,
}

impl LocatorFeed {
    /// Stream locators from a line-oriented file.
    ///
    /// The file is opened up front so that a missing list fails the run
    /// before any fetching starts. Lines are trimmed and blank lines skipped.
    /// Bytes that are not valid UTF-8 become U+FFFD.
    pub async fn from_file(path: &Path, cancel: CancellationToken) -> Result<Self, FeedError> {
        let file = tokio::fs::File::open(path)
            .await
            .map_err(|source| FeedError::Open {
                path: path.display().to_string(),
                source,
            })?;

        let (tx, rx) = mpsc::channel(FEED_BUFFER_SIZE);
        let producer_cancel = cancel.clone();
        let display_path = path.display().to_string();

        tokio::spawn(async move {
            let mut reader = BufReader::new(file);
            let mut buf = Vec::new();
            loop {
                buf.clear();
                let read = tokio::select! {
                    biased;
                    _ = producer_cancel.cancelled() => break,
                    read = reader.read_until(b'\n', &mut buf) => read,
                };

                match read {
                    Ok(0) => break,
                    Ok(_) => {
                        // Invalid UTF-8 is replaced, not fatal.
                        let line = String::from_utf8_lossy(&buf);
                        let locator = line.trim();
                        if locator.is_empty() {
                            continue;
                        }
                        if !send_or_cancel(&tx, locator.to_string(), &producer_cancel).await {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!("Error reading locator list from {}: {}", display_path, e);
                        break;
                    }
                }
            }
            debug!("Locator feed for {} closed", display_path);
        });

        Ok(Self {
            rx: Mutex::new(rx),
            cancel,
        })
    }

    /// Feed an in-memory list of locators.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn from_locators<I, S>(locators: I, cancel: CancellationToken) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String> + Send + 'static,
        I::IntoIter: Send + 'static,
    {
        let (tx, rx) = mpsc::channel(FEED_BUFFER_SIZE);
        let producer_cancel = cancel.clone();
        let locators = locators.into_iter();

        tokio::spawn(async move {
            for locator in locators {
                let locator: String = locator.into();
                let locator = locator.trim();
                if locator.is_empty() {
                    continue;
                }
                if !send_or_cancel(&tx, locator.to_string(), &producer_cancel).await {
                    break;
                }
            }
        });

        Self {
            rx: Mutex::new(rx),
            cancel,
        }
    }

    /// Next locator, or `None` when the feed is exhausted or cancelled.
    pub async fn next(&self) -> Option<String> {
        if self.cancel.is_cancelled() {
            return None;
        }
        let mut rx = self.rx.lock().await;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            locator = rx.recv() => locator,
        }
    }
}

/// Returns false if the feed should stop.
async fn send_or_cancel(
    tx: &mpsc::Sender<String>,
    locator: String,
    cancel: &CancellationToken,
) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = tx.send(locator) => sent.is_ok(),
    }
}

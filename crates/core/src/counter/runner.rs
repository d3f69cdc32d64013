//! Word counter implementation.
//!
//! A fixed pool of workers pulls locators from a shared feed, fetches and
//! tokenizes each document, and hands per-document partial counts to a
//! single merge task through a bounded queue. The merge task is the only
//! writer of the global count.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use regex_lite::Regex;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::error;
use uuid::Uuid;

use crate::feed::LocatorFeed;
use crate::fetch::{DocumentFetcher, FetchError};
use crate::observer::{NoopObserver, PipelineObserver};
use crate::vocabulary::TokenValidator;

use super::config::CounterConfig;
use super::types::{CountOutcome, CounterError, RunSummary, TokenCounts};

/// State shared read-only by every worker.
struct Shared {
    fetcher: Arc<dyn DocumentFetcher>,
    validator: Arc<dyn TokenValidator>,
    token_pattern: Regex,
    observer: Arc<dyn PipelineObserver>,
}

/// Per-run outcome counters.
#[derive(Default)]
struct RunStats {
    succeeded: AtomicU64,
    failed: AtomicU64,
}

/// Counts validated tokens across many documents concurrently.
pub struct WordCounter {
    shared: Arc<Shared>,
    workers: usize,
    queue_capacity: usize,
}

impl WordCounter {
    /// Create a counter.
    ///
    /// Fails if the configured token pattern does not compile.
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        validator: Arc<dyn TokenValidator>,
        config: &CounterConfig,
    ) -> Result<Self, CounterError> {
        let token_pattern =
            Regex::new(&config.token_pattern).map_err(|e| CounterError::InvalidTokenPattern {
                pattern: config.token_pattern.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            shared: Arc::new(Shared {
                fetcher,
                validator,
                token_pattern,
                observer: Arc::new(NoopObserver),
            }),
            workers: config.effective_workers().max(1),
            queue_capacity: config.effective_queue_capacity().max(1),
        })
    }

    /// Set the observer notified of per-document outcomes.
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.shared = Arc::new(Shared {
            fetcher: Arc::clone(&self.shared.fetcher),
            validator: Arc::clone(&self.shared.validator),
            token_pattern: self.shared.token_pattern.clone(),
            observer,
        });
        self
    }

    /// Number of workers a run spawns.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Count every accepted token of every document in `feed`.
    ///
    /// Returns once all workers have stopped and the merge stage has
    /// folded every partial it was handed. Cancellation stops workers from
    /// pulling new locators; partials already built are still merged.
    pub async fn count(
        &self,
        feed: Arc<LocatorFeed>,
        cancel: &CancellationToken,
    ) -> Result<CountOutcome, CounterError> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let stats = Arc::new(RunStats::default());

        let (tx, rx) = mpsc::channel::<TokenCounts>(self.queue_capacity);
        let merge = tokio::spawn(merge_partials(rx));

        let mut workers = JoinSet::new();
        for _ in 0..self.workers {
            workers.spawn(run_worker(
                Arc::clone(&self.shared),
                Arc::clone(&feed),
                tx.clone(),
                cancel.clone(),
                Arc::clone(&stats),
            ));
        }
        drop(tx);

        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                error!(run_id = %run_id, "Counter worker terminated abnormally: {}", e);
            }
        }

        // Every sender is gone now, so the merge task sees end of input.
        let counts = merge
            .await
            .map_err(|e| CounterError::MergeFailed(e.to_string()))?;

        let summary = RunSummary {
            run_id,
            started_at,
            finished_at: Utc::now(),
            documents_succeeded: stats.succeeded.load(Ordering::Relaxed),
            documents_failed: stats.failed.load(Ordering::Relaxed),
            distinct_tokens: counts.len(),
            cancelled: cancel.is_cancelled(),
        };
        self.shared.observer.run_completed(&summary);

        Ok(CountOutcome { counts, summary })
    }
}

async fn run_worker(
    shared: Arc<Shared>,
    feed: Arc<LocatorFeed>,
    tx: mpsc::Sender<TokenCounts>,
    cancel: CancellationToken,
    stats: Arc<RunStats>,
) {
    loop {
        let locator = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = feed.next() => match next {
                Some(locator) => locator,
                None => break,
            },
        };

        let text = match shared.fetcher.fetch(&locator, &cancel).await {
            Ok(text) => text,
            Err(FetchError::Cancelled) => break,
            Err(e) => {
                stats.failed.fetch_add(1, Ordering::Relaxed);
                shared.observer.document_failed(&locator, &e);
                continue;
            }
        };

        let partial = tally_tokens(&text, &shared.token_pattern, shared.validator.as_ref());
        stats.succeeded.fetch_add(1, Ordering::Relaxed);
        shared
            .observer
            .document_counted(&locator, partial.values().sum());

        // Not raced against cancellation: the merge task keeps draining
        // until every sender is dropped, so this cannot block forever.
        if !partial.is_empty() && tx.send(partial).await.is_err() {
            break;
        }
    }
}

/// The single writer of the global count.
async fn merge_partials(mut rx: mpsc::Receiver<TokenCounts>) -> TokenCounts {
    let mut global = TokenCounts::new();
    while let Some(partial) = rx.recv().await {
        for (token, count) in partial {
            *global.entry(token).or_insert(0) += count;
        }
    }
    global
}

/// Count the tokens of `text` that match `pattern` and pass `validator`.
pub fn tally_tokens(text: &str, pattern: &Regex, validator: &dyn TokenValidator) -> TokenCounts {
    let mut partial = TokenCounts::new();
    for token in pattern.find_iter(text) {
        let token = token.as_str();
        if validator.validate(token) {
            *partial.entry(token.to_string()).or_insert(0) += 1;
        }
    }
    partial
}

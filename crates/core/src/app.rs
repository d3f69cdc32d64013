//! Application runner.
//!
//! Wires the configured sources, fetch client and word counter into a single
//! run that produces the most frequent vocabulary tokens.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::Config;
use crate::counter::{CounterError, RunSummary, WordCounter};
use crate::feed::{FeedError, LocatorFeed};
use crate::fetch::{DocumentFetcher, FetchError, HttpFetcher};
use crate::observer::{PipelineObserver, TracingObserver};
use crate::ranking::{select_top, TopWords};
use crate::vocabulary::{load_vocabulary, VocabularyError, VocabularyValidator};

/// Errors that abort a run.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Vocabulary(#[from] VocabularyError),

    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("failed to build fetch client: {0}")]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Counter(#[from] CounterError),

    #[error("failed to write report: {0}")]
    Output(#[from] std::io::Error),
}

/// Result of one run: the ranked tokens and how the run went.
#[derive(Debug, Clone, Serialize)]
pub struct TopWordsReport {
    pub top: TopWords,
    pub summary: RunSummary,
}

/// Runs the counting pipeline against the configured sources.
///
/// The fetch client is shared by every run, so per-origin limits hold across
/// concurrent runs.
pub struct FireflyApp {
    config: Config,
    fetcher: Arc<dyn DocumentFetcher>,
    observer: Arc<dyn PipelineObserver>,
}

impl FireflyApp {
    /// Create an app that reports through `tracing`.
    pub fn new(config: Config) -> Result<Self, AppError> {
        Self::with_observer(config, Arc::new(TracingObserver))
    }

    /// Create an app whose fetch client and counter report to `observer`.
    pub fn with_observer(
        config: Config,
        observer: Arc<dyn PipelineObserver>,
    ) -> Result<Self, AppError> {
        let fetcher = HttpFetcher::new(&config.fetch)?.with_observer(Arc::clone(&observer));
        Ok(Self {
            config,
            fetcher: Arc::new(fetcher),
            observer,
        })
    }

    /// Create an app around an existing fetcher.
    pub fn with_fetcher(
        config: Config,
        fetcher: Arc<dyn DocumentFetcher>,
        observer: Arc<dyn PipelineObserver>,
    ) -> Self {
        Self {
            config,
            fetcher,
            observer,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run once, keeping the configured number of tokens.
    pub async fn run(&self, cancel: &CancellationToken) -> Result<TopWordsReport, AppError> {
        self.run_with_top_n(self.config.run.top_n, cancel).await
    }

    /// Run once, keeping the `top_n` most frequent tokens.
    ///
    /// Cancelling `cancel` (or reaching the configured deadline) stops the run
    /// early; the report then covers the documents counted so far.
    pub async fn run_with_top_n(
        &self,
        top_n: i64,
        cancel: &CancellationToken,
    ) -> Result<TopWordsReport, AppError> {
        let deadline = match self.config.run.deadline_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };
        let run_cancel = deadline_token(cancel, deadline);

        let sources = &self.config.sources;
        let vocabulary = load_vocabulary(&sources.vocabulary).await?;
        debug!(
            path = %sources.vocabulary.display(),
            words = vocabulary.len(),
            "Loaded vocabulary"
        );
        let validator = Arc::new(VocabularyValidator::new(Arc::new(vocabulary)));

        let feed = LocatorFeed::from_file(&sources.locators, run_cancel.clone()).await?;

        let counter =
            WordCounter::new(Arc::clone(&self.fetcher), validator, &self.config.counter)?
                .with_observer(Arc::clone(&self.observer));
        info!(workers = counter.workers(), top_n, "Starting word count");

        let result = counter.count(Arc::new(feed), &run_cancel).await;
        // Stops the deadline timer if it has not fired.
        run_cancel.cancel();
        let outcome = result?;

        Ok(TopWordsReport {
            top: select_top(&outcome.counts, top_n),
            summary: outcome.summary,
        })
    }
}

/// Child of `parent` that is also cancelled once `deadline` elapses.
///
/// Must be called within a Tokio runtime when a deadline is given.
pub fn deadline_token(
    parent: &CancellationToken,
    deadline: Option<Duration>,
) -> CancellationToken {
    let child = parent.child_token();
    if let Some(deadline) = deadline {
        let timer = child.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = timer.cancelled() => {}
                _ = tokio::time::sleep(deadline) => {
                    info!(deadline_secs = deadline.as_secs(), "Run deadline reached, cancelling");
                    timer.cancel();
                }
            }
        });
    }
    child
}

/// Write the token-to-count mapping as pretty-printed JSON, keys sorted.
pub fn write_json<W: Write>(report: &TopWordsReport, mut writer: W) -> Result<(), AppError> {
    serde_json::to_writer_pretty(&mut writer, &report.top).map_err(std::io::Error::from)?;
    writeln!(writer)?;
    Ok(())
}

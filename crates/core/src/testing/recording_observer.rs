//! Observer that records notifications for assertions.

use std::sync::RwLock;
use std::time::Duration;

use super::{read, write};
use crate::counter::RunSummary;
use crate::fetch::FetchError;
use crate::observer::PipelineObserver;

/// A recorded retry notification.
#[derive(Debug, Clone)]
pub struct RecordedRetry {
    pub locator: String,
    pub attempt: u32,
    pub delay: Duration,
    pub cause: FetchError,
}

/// A recorded document failure.
#[derive(Debug, Clone)]
pub struct RecordedFailure {
    pub locator: String,
    pub error: FetchError,
}

/// Records every [`PipelineObserver`] notification.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    retries: RwLock<Vec<RecordedRetry>>,
    counted: RwLock<Vec<(String, u64)>>,
    failed: RwLock<Vec<RecordedFailure>>,
    completed: RwLock<Vec<RunSummary>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn retries(&self) -> Vec<RecordedRetry> {
        read(&self.retries).clone()
    }

    /// Locators counted, with their accepted token totals.
    pub fn counted(&self) -> Vec<(String, u64)> {
        read(&self.counted).clone()
    }

    pub fn failed(&self) -> Vec<RecordedFailure> {
        read(&self.failed).clone()
    }

    pub fn completed(&self) -> Vec<RunSummary> {
        read(&self.completed).clone()
    }
}

impl PipelineObserver for RecordingObserver {
    fn retry_scheduled(&self, locator: &str, attempt: u32, delay: Duration, cause: &FetchError) {
        write(&self.retries).push(RecordedRetry {
            locator: locator.to_string(),
            attempt,
            delay,
            cause: cause.clone(),
        });
    }

    fn document_counted(&self, locator: &str, accepted: u64) {
        write(&self.counted).push((locator.to_string(), accepted));
    }

    fn document_failed(&self, locator: &str, error: &FetchError) {
        write(&self.failed).push(RecordedFailure {
            locator: locator.to_string(),
            error: error.clone(),
        });
    }

    fn run_completed(&self, summary: &RunSummary) {
        write(&self.completed).push(summary.clone());
    }
}

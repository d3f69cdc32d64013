//! Pipeline observation hooks.
//!
//! The fetch client and the word counter report what they do through an
//! injected [`PipelineObserver`] instead of logging directly. Every method
//! has a no-op default, so implementations only override what they need.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::counter::RunSummary;
use crate::fetch::FetchError;

/// Receives progress notifications from a counting run.
///
/// Methods are called from worker tasks and must not block.
pub trait PipelineObserver: Send + Sync {
    /// A retryable failure occurred and attempt `attempt` will follow after `delay`.
    fn retry_scheduled(&self, _locator: &str, _attempt: u32, _delay: Duration, _cause: &FetchError) {
    }

    /// A document was fetched and tokenized; `accepted` tokens passed validation.
    fn document_counted(&self, _locator: &str, _accepted: u64) {}

    /// A document was skipped after a fetch failure.
    fn document_failed(&self, _locator: &str, _error: &FetchError) {}

    /// The run finished (normally or after cancellation).
    fn run_completed(&self, _summary: &RunSummary) {}
}

/// Observer that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PipelineObserver for NoopObserver {}

/// Observer that emits structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl PipelineObserver for TracingObserver {
    fn retry_scheduled(&self, locator: &str, attempt: u32, delay: Duration, cause: &FetchError) {
        debug!(
            locator,
            attempt,
            delay_ms = delay.as_millis() as u64,
            cause = %cause,
            "Retrying document fetch"
        );
    }

    fn document_counted(&self, locator: &str, accepted: u64) {
        info!(locator, accepted, "Successfully loaded document");
    }

    fn document_failed(&self, locator: &str, error: &FetchError) {
        warn!(locator, kind = error.kind(), error = %error, "Failed to load document");
    }

    fn run_completed(&self, summary: &RunSummary) {
        info!(
            run_id = %summary.run_id,
            succeeded = summary.documents_succeeded,
            failed = summary.documents_failed,
            distinct_tokens = summary.distinct_tokens,
            cancelled = summary.cancelled,
            "Processed documents"
        );
    }
}

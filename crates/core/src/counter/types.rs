//! Types for the word counter.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Token to occurrence count.
pub type TokenCounts = HashMap<String, u64>;

/// Errors that can occur while setting up or running the counter.
#[derive(Debug, Error)]
pub enum CounterError {
    /// The token pattern is not a valid regular expression.
    #[error("invalid token pattern {pattern:?}: {reason}")]
    InvalidTokenPattern { pattern: String, reason: String },

    /// The merge stage terminated abnormally.
    #[error("merge stage failed: {0}")]
    MergeFailed(String),
}

/// Outcome counters of one counting run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique id of the run.
    pub run_id: Uuid,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// When the merge stage finished.
    pub finished_at: DateTime<Utc>,
    /// Documents fetched and tokenized.
    pub documents_succeeded: u64,
    /// Documents skipped after a fetch failure.
    pub documents_failed: u64,
    /// Distinct accepted tokens in the global count.
    pub distinct_tokens: usize,
    /// Whether cancellation fired before the feed was exhausted.
    pub cancelled: bool,
}

impl RunSummary {
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Global counts of a run together with its summary.
#[derive(Debug, Clone)]
pub struct CountOutcome {
    pub counts: TokenCounts,
    pub summary: RunSummary,
}

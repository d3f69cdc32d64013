//! Concurrent word counting.
//!
//! - **Workers**: fixed pool, each pulls locators and builds per-document partial counts
//! - **Merge**: a single task owns the global count and folds partials into it
//! - **Barrier**: the merge result is read only after every worker has stopped

mod config;
mod runner;
mod types;

pub use config::CounterConfig;
pub use runner::{tally_tokens, WordCounter};
pub use types::{CountOutcome, CounterError, RunSummary, TokenCounts};

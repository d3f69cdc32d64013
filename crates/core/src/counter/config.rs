//! Word counter configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the word counter worker pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CounterConfig {
    /// Number of concurrent workers (0 = number of available CPUs).
    #[serde(default)]
    pub workers: usize,

    /// Capacity of the queue between workers and the merge stage
    /// (0 = twice the worker count).
    #[serde(default)]
    pub queue_capacity: usize,

    /// Regular expression that extracts tokens from document text.
    #[serde(default = "default_token_pattern")]
    pub token_pattern: String,
}

fn default_token_pattern() -> String {
    r"\w+".to_string()
}

impl CounterConfig {
    /// Worker count with the CPU-count default applied.
    pub fn effective_workers(&self) -> usize {
        if self.workers > 0 {
            self.workers
        } else {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        }
    }

    /// Merge queue capacity with the default applied.
    pub fn effective_queue_capacity(&self) -> usize {
        if self.queue_capacity > 0 {
            self.queue_capacity
        } else {
            self.effective_workers() * 2
        }
    }
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            queue_capacity: 0,
            token_pattern: default_token_pattern(),
        }
    }
}

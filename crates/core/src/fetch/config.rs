//! Fetch client configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the HTTP document fetcher.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum number of retries after the first attempt.
    #[serde(default = "default_retry_max")]
    pub retry_max: u32,

    /// Lower bound for any backoff delay (milliseconds).
    #[serde(default = "default_retry_wait_min")]
    pub retry_wait_min_ms: u64,

    /// Upper bound for any backoff delay (milliseconds).
    #[serde(default = "default_retry_wait_max")]
    pub retry_wait_max_ms: u64,

    /// Maximum concurrent requests against one origin.
    #[serde(default = "default_concurrency_per_origin")]
    pub concurrency_per_origin: usize,

    /// User-Agent header sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout() -> u64 {
    15
}

fn default_retry_max() -> u32 {
    3
}

fn default_retry_wait_min() -> u64 {
    1000
}

fn default_retry_wait_max() -> u64 {
    5000
}

fn default_concurrency_per_origin() -> usize {
    3
}

fn default_user_agent() -> String {
    concat!("firefly/", env!("CARGO_PKG_VERSION")).to_string()
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn retry_wait_min(&self) -> Duration {
        Duration::from_millis(self.retry_wait_min_ms)
    }

    pub fn retry_wait_max(&self) -> Duration {
        Duration::from_millis(self.retry_wait_max_ms)
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            retry_max: default_retry_max(),
            retry_wait_min_ms: default_retry_wait_min(),
            retry_wait_max_ms: default_retry_wait_max(),
            concurrency_per_origin: default_concurrency_per_origin(),
            user_agent: default_user_agent(),
        }
    }
}

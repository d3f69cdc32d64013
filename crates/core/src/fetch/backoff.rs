//! Delay policy between retried fetch attempts.

use std::time::Duration;

use super::FetchError;

/// Computes how long to wait before the next attempt.
///
/// All delays are clamped to `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    min: Duration,
    max: Duration,
}

impl BackoffPolicy {
    /// Create a policy. If `min > max` the bounds are swapped.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min > max {
            Self { min: max, max: min }
        } else {
            Self { min, max }
        }
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    /// Delay before retry number `attempt` (zero-based) after `cause`.
    ///
    /// - Rate limited with a parseable retry hint: the hint, in seconds.
    /// - Rate limited without a usable hint: `2^attempt` seconds.
    /// - Any other retryable failure: `min * 2^attempt`.
    pub fn delay(&self, attempt: u32, cause: &FetchError) -> Duration {
        match cause {
            FetchError::RateLimited { retry_after } => {
                match retry_after.as_deref().and_then(parse_retry_hint) {
                    Some(hint) => self.clamp(hint),
                    None => self.clamp(Duration::from_secs(1u64 << attempt.min(32))),
                }
            }
            _ => self.clamp(self.min.saturating_mul(1u32 << attempt.min(31))),
        }
    }

    fn clamp(&self, delay: Duration) -> Duration {
        delay.clamp(self.min, self.max)
    }
}

/// Parse a `Retry-After` value given as whole seconds.
///
/// HTTP-date values and negative numbers are not accepted.
pub fn parse_retry_hint(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

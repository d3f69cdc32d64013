//! Types for the document fetch client.

use async_trait::async_trait;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors that can occur while fetching a single document.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The locator could not be parsed or has no origin.
    #[error("invalid locator {locator}: {reason}")]
    InvalidLocator { locator: String, reason: String },

    /// Cancellation was observed before the fetch completed.
    #[error("fetch cancelled")]
    Cancelled,

    /// The server answered 429 Too Many Requests.
    #[error("rate limited (retry-after: {})", retry_after.as_deref().unwrap_or("none"))]
    RateLimited { retry_after: Option<String> },

    /// The server answered with a status other than 200 or 429.
    #[error("unexpected status: {0}")]
    HttpStatus(u16),

    /// The request exceeded the per-request timeout.
    #[error("request timed out")]
    Timeout,

    /// Connection-level failure.
    #[error("network error: {0}")]
    Network(String),

    /// The response body could not be read.
    #[error("failed to read body: {0}")]
    Body(String),

    /// The extraction collaborator rejected the body.
    #[error("failed to extract text: {0}")]
    Extraction(String),

    /// The request could not be built (bad scheme, client misconfiguration).
    #[error("failed to build request: {0}")]
    Request(String),

    /// Every allowed attempt failed with a retryable error.
    #[error("giving up after {attempts} attempt(s): {last}")]
    RetriesExhausted {
        attempts: u32,
        last: Box<FetchError>,
    },
}

impl FetchError {
    /// Whether another attempt may succeed.
    ///
    /// Only rate limiting and transient transport failures qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::RateLimited { .. }
                | FetchError::Timeout
                | FetchError::Network(_)
                | FetchError::Body(_)
        )
    }

    /// Short stable label, used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::InvalidLocator { .. } => "invalid_locator",
            FetchError::Cancelled => "cancelled",
            FetchError::RateLimited { .. } => "rate_limited",
            FetchError::HttpStatus(_) => "http_status",
            FetchError::Timeout => "timeout",
            FetchError::Network(_) => "network",
            FetchError::Body(_) => "body",
            FetchError::Extraction(_) => "extraction",
            FetchError::Request(_) => "request",
            FetchError::RetriesExhausted { .. } => "retries_exhausted",
        }
    }
}

/// Fetches a document and returns its plain text.
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch the document behind `locator`.
    ///
    /// Implementations must return promptly with [`FetchError::Cancelled`]
    /// once `cancel` fires.
    async fn fetch(&self, locator: &str, cancel: &CancellationToken) -> Result<String, FetchError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(FetchError::RateLimited { retry_after: None }.is_retryable());
        assert!(FetchError::Timeout.is_retryable());
        assert!(FetchError::Network("reset".to_string()).is_retryable());

        assert!(!FetchError::HttpStatus(404).is_retryable());
        assert!(!FetchError::HttpStatus(503).is_retryable());
        assert!(!FetchError::Cancelled.is_retryable());
        assert!(!FetchError::Extraction("bad".to_string()).is_retryable());
        assert!(!FetchError::InvalidLocator {
            locator: "x".to_string(),
            reason: "y".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn test_error_display() {
        let err = FetchError::HttpStatus(404);
        assert_eq!(err.to_string(), "unexpected status: 404");

        let err = FetchError::RateLimited {
            retry_after: Some("5".to_string()),
        };
        assert_eq!(err.to_string(), "rate limited (retry-after: 5)");

        let err = FetchError::RetriesExhausted {
            attempts: 4,
            last: Box::new(FetchError::RateLimited { retry_after: None }),
        };
        assert_eq!(
            err.to_string(),
            "giving up after 4 attempt(s): rate limited (retry-after: none)"
        );
    }
}

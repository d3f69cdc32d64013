//! HTTP implementation of [`DocumentFetcher`].

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, StatusCode};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::observer::{NoopObserver, PipelineObserver};

use super::backoff::BackoffPolicy;
use super::config::FetchConfig;
use super::extract::{HtmlTextExtractor, TextExtractor};
use super::origin::{origin_of, OriginLimiterPool, OriginStatus};
use super::{DocumentFetcher, FetchError};

/// Fetches documents over HTTP with per-origin concurrency limits and
/// retry on rate limiting and transient failures.
pub struct HttpFetcher {
    client: Client,
    retry_max: u32,
    backoff: BackoffPolicy,
    origins: OriginLimiterPool,
    extractor: Arc<dyn TextExtractor>,
    observer: Arc<dyn PipelineObserver>,
}

impl HttpFetcher {
    /// Create a fetcher using the HTML text extractor.
    pub fn new(config: &FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FetchError::Request(e.to_string()))?;

        Ok(Self {
            client,
            retry_max: config.retry_max,
            backoff: BackoffPolicy::new(config.retry_wait_min(), config.retry_wait_max()),
            origins: OriginLimiterPool::new(config.concurrency_per_origin),
            extractor: Arc::new(HtmlTextExtractor),
            observer: Arc::new(NoopObserver),
        })
    }

    /// Replace the text extractor.
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Set the observer notified of scheduled retries.
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Current permit usage for every origin seen so far.
    pub async fn origin_status(&self) -> Vec<OriginStatus> {
        self.origins.all_status().await
    }

    /// One request, no retry.
    async fn request_once(&self, locator: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(locator)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|value| value.to_str().ok())
                .map(|value| value.to_string());
            return Err(FetchError::RateLimited { retry_after });
        }
        if status != StatusCode::OK {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| match map_reqwest_error(e) {
                FetchError::Network(msg) => FetchError::Body(msg),
                other => other,
            })?;

        self.extractor.extract(&body)
    }

    /// Request with retries. The caller holds the origin permit.
    async fn request_with_retry(
        &self,
        locator: &str,
        cancel: &CancellationToken,
    ) -> Result<String, FetchError> {
        let mut attempt: u32 = 0;
        loop {
            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                result = self.request_once(locator) => result,
            };

            let err = match result {
                Ok(text) => return Ok(text),
                Err(err) if !err.is_retryable() => return Err(err),
                Err(err) => err,
            };

            if attempt >= self.retry_max {
                return Err(FetchError::RetriesExhausted {
                    attempts: attempt + 1,
                    last: Box::new(err),
                });
            }

            let delay = self.backoff.delay(attempt, &err);
            self.observer.retry_scheduled(locator, attempt + 1, delay, &err);
            debug!(locator, attempt = attempt + 1, ?delay, error = %err, "Retry scheduled");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::Cancelled),
                _ = tokio::time::sleep(delay) => {}
            }
            attempt += 1;
        }
    }
}

#[async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, locator: &str, cancel: &CancellationToken) -> Result<String, FetchError> {
        let origin = origin_of(locator)?;

        // Held across retries, released on every return path.
        let _permit = self.origins.acquire(&origin, cancel).await?;

        self.request_with_retry(locator, cancel).await
    }
}

fn map_reqwest_error(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        return FetchError::Timeout;
    }
    if err.is_builder() || err.is_redirect() {
        return FetchError::Request(err.to_string());
    }
    FetchError::Network(err.to_string())
}

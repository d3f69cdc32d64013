//! Document fetching.
//!
//! This module provides a `DocumentFetcher` trait and an HTTP implementation
//! with per-origin concurrency limiting, retry with backoff on rate limiting
//! and transient failures, and HTML-to-text extraction.

mod backoff;
mod client;
mod config;
mod extract;
mod origin;
mod types;

pub use backoff::{parse_retry_hint, BackoffPolicy};
pub use client::HttpFetcher;
pub use config::FetchConfig;
pub use extract::{HtmlTextExtractor, TextExtractor};
pub use origin::{origin_of, OriginLimiterPool, OriginStatus, DEFAULT_PRUNE_THRESHOLD};
pub use types::{DocumentFetcher, FetchError};

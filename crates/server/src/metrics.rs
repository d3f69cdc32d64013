//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the firefly service:
//! - HTTP request metrics (latency, counts, in flight)
//! - Document outcomes and fetch retries, fed by [`MetricsObserver`]
//! - Completed runs and their duration

use std::time::Duration;

use firefly_core::{FetchError, PipelineObserver, RunSummary, TracingObserver};
use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge,
    Opts, Registry, TextEncoder,
};
use tracing::warn;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "firefly_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("firefly_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "firefly_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Documents processed, by result (counted, failed).
pub static DOCUMENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("firefly_documents_total", "Documents processed by result"),
        &["result"],
    )
    .unwrap()
});

/// Document failures, by error kind.
pub static DOCUMENT_FAILURES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "firefly_document_failures_total",
            "Documents skipped after a fetch failure, by error kind",
        ),
        &["kind"],
    )
    .unwrap()
});

/// Scheduled fetch retries, by cause.
pub static FETCH_RETRIES_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("firefly_fetch_retries_total", "Scheduled fetch retries by cause"),
        &["reason"],
    )
    .unwrap()
});

/// Tokens that passed validation.
pub static TOKENS_ACCEPTED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "firefly_tokens_accepted_total",
        "Tokens accepted by the vocabulary validator",
    )
    .unwrap()
});

/// Finished runs, by outcome (completed, cancelled).
pub static RUNS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("firefly_runs_total", "Finished counting runs by outcome"),
        &["outcome"],
    )
    .unwrap()
});

/// Run duration in seconds.
pub static RUN_DURATION: Lazy<Histogram> = Lazy::new(|| {
    Histogram::with_opts(
        HistogramOpts::new("firefly_run_duration_seconds", "Counting run duration in seconds")
            .buckets(vec![0.1, 0.5, 1.0, 5.0, 15.0, 30.0, 60.0, 300.0, 900.0]),
    )
    .unwrap()
});

/// Register all metrics with the registry.
fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Pipeline
    registry.register(Box::new(DOCUMENTS_TOTAL.clone())).unwrap();
    registry
        .register(Box::new(DOCUMENT_FAILURES_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(FETCH_RETRIES_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(TOKENS_ACCEPTED_TOTAL.clone()))
        .unwrap();
    registry.register(Box::new(RUNS_TOTAL.clone())).unwrap();
    registry.register(Box::new(RUN_DURATION.clone())).unwrap();
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Pipeline observer that records metrics and also logs through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MetricsObserver {
    inner: TracingObserver,
}

impl PipelineObserver for MetricsObserver {
    fn retry_scheduled(&self, locator: &str, attempt: u32, delay: Duration, cause: &FetchError) {
        FETCH_RETRIES_TOTAL.with_label_values(&[cause.kind()]).inc();
        self.inner.retry_scheduled(locator, attempt, delay, cause);
    }

    fn document_counted(&self, locator: &str, accepted: u64) {
        DOCUMENTS_TOTAL.with_label_values(&["counted"]).inc();
        TOKENS_ACCEPTED_TOTAL.inc_by(accepted);
        self.inner.document_counted(locator, accepted);
    }

    fn document_failed(&self, locator: &str, error: &FetchError) {
        DOCUMENTS_TOTAL.with_label_values(&["failed"]).inc();
        DOCUMENT_FAILURES_TOTAL
            .with_label_values(&[error.kind()])
            .inc();
        self.inner.document_failed(locator, error);
    }

    fn run_completed(&self, summary: &RunSummary) {
        let outcome = if summary.cancelled {
            "cancelled"
        } else {
            "completed"
        };
        RUNS_TOTAL.with_label_values(&[outcome]).inc();
        RUN_DURATION.observe(summary.duration_ms().max(0) as f64 / 1000.0);
        self.inner.run_completed(summary);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_metrics_returns_prometheus_format() {
        // Access metrics to ensure they're initialized
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = encode_metrics();
        assert!(output.contains("firefly_http_requests_total"));
        assert!(output.contains("# HELP"));
        assert!(output.contains("# TYPE"));
    }

    #[test]
    fn test_observer_updates_counters() {
        let observer = MetricsObserver::default();
        let counted_before = DOCUMENTS_TOTAL.with_label_values(&["counted"]).get();
        let failed_before = DOCUMENTS_TOTAL.with_label_values(&["failed"]).get();
        let retries_before = FETCH_RETRIES_TOTAL
            .with_label_values(&["rate_limited"])
            .get();

        observer.document_counted("http://a.com/1", 4);
        observer.document_failed("http://a.com/2", &FetchError::HttpStatus(404));
        observer.retry_scheduled(
            "http://a.com/3",
            1,
            Duration::from_secs(1),
            &FetchError::RateLimited { retry_after: None },
        );

        assert!(DOCUMENTS_TOTAL.with_label_values(&["counted"]).get() > counted_before);
        assert!(DOCUMENTS_TOTAL.with_label_values(&["failed"]).get() > failed_before);
        assert!(
            FETCH_RETRIES_TOTAL
                .with_label_values(&["rate_limited"])
                .get()
                > retries_before
        );
    }

    #[test]
    fn test_registry_contains_all_metrics() {
        // Touch all metrics to ensure they appear in output
        // (Prometheus only outputs metrics that have been accessed)
        HTTP_REQUEST_DURATION
            .with_label_values(&["GET", "/test", "200"])
            .observe(0.1);
        HTTP_REQUESTS_IN_FLIGHT.set(0);
        DOCUMENTS_TOTAL.with_label_values(&["counted"]).inc_by(0);
        DOCUMENT_FAILURES_TOTAL
            .with_label_values(&["timeout"])
            .inc_by(0);
        FETCH_RETRIES_TOTAL.with_label_values(&["network"]).inc_by(0);
        TOKENS_ACCEPTED_TOTAL.inc_by(0);
        RUNS_TOTAL.with_label_values(&["completed"]).inc_by(0);
        RUN_DURATION.observe(0.5);

        let output = encode_metrics();

        assert!(output.contains("firefly_http_request_duration_seconds"));
        assert!(output.contains("firefly_http_requests_total"));
        assert!(output.contains("firefly_http_requests_in_flight"));
        assert!(output.contains("firefly_documents_total"));
        assert!(output.contains("firefly_document_failures_total"));
        assert!(output.contains("firefly_fetch_retries_total"));
        assert!(output.contains("firefly_tokens_accepted_total"));
        assert!(output.contains("firefly_runs_total"));
        assert!(output.contains("firefly_run_duration_seconds"));
    }
}

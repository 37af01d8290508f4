//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Source aggregation (provider calls, results per search)
//! - Streaming sessions (starts, live endpoints)
//! - Cache quota (bytes reclaimed)
//! - External services (subtitles, metadata)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Source Aggregation
// =============================================================================

/// Provider requests total by provider and status.
pub static PROVIDER_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cinebridge_provider_requests_total",
            "Total torrent provider requests",
        ),
        &["provider", "status"], // status: "success", "error", "panic", "skipped"
    )
    .unwrap()
});

/// Provider request duration in seconds.
pub static PROVIDER_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cinebridge_provider_duration_seconds",
            "Duration of torrent provider requests",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["provider"],
    )
    .unwrap()
});

/// Ranked candidates returned per search.
pub static SEARCH_RESULTS: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "cinebridge_search_results",
            "Number of ranked sources returned per search",
        )
        .buckets(vec![0.0, 1.0, 5.0, 10.0, 25.0, 50.0, 100.0, 250.0]),
        &[],
    )
    .unwrap()
});

/// Candidates hidden by the content filter.
pub static NSFW_FILTERED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cinebridge_nsfw_filtered_total",
        "Total candidates removed by the content filter",
    )
    .unwrap()
});

// =============================================================================
// Streaming Sessions
// =============================================================================

/// Stream starts total by result.
pub static STREAM_STARTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("cinebridge_stream_starts_total", "Total stream start attempts"),
        &["result"], // "ready", "resumed", "select_file", "superseded", "error"
    )
    .unwrap()
});

/// Local file endpoints currently serving.
pub static ACTIVE_ENDPOINTS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "cinebridge_active_endpoints",
        "Number of local stream endpoints currently bound",
    )
    .unwrap()
});

// =============================================================================
// Cache
// =============================================================================

/// Bytes deleted by quota enforcement and wipes.
pub static CACHE_BYTES_RECLAIMED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "cinebridge_cache_bytes_reclaimed_total",
        "Total bytes deleted from the download directory",
    )
    .unwrap()
});

// =============================================================================
// External Services
// =============================================================================

/// External service requests total.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "cinebridge_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

/// Get all core metrics for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Aggregation
        Box::new(PROVIDER_REQUESTS.clone()),
        Box::new(PROVIDER_DURATION.clone()),
        Box::new(SEARCH_RESULTS.clone()),
        Box::new(NSFW_FILTERED.clone()),
        // Sessions
        Box::new(STREAM_STARTS.clone()),
        Box::new(ACTIVE_ENDPOINTS.clone()),
        // Cache
        Box::new(CACHE_BYTES_RECLAIMED.clone()),
        // External services
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
    ]
}

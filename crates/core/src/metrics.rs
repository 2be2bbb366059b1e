//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Tracking file change detection
//! - Check scheduling (due topics, pending schedule size)
//! - Topic checks and layout classification
//! - External services (Jackett, torrent client)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts};

// =============================================================================
// Watcher Metrics
// =============================================================================

/// Tracking file change notifications by result.
pub static TRACKING_FILE_EVENTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "topicwatch_tracking_file_events_total",
            "Tracking file change notifications",
        ),
        &["result"], // "changed", "duplicate", "parse_error"
    )
    .unwrap()
});

/// Topic change events emitted by the detector.
pub static TOPIC_CHANGES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "topicwatch_topic_changes_total",
        "Topic change events emitted",
    )
    .unwrap()
});

// =============================================================================
// Scheduler Metrics
// =============================================================================

/// Topics that became due for a check.
pub static TOPICS_DUE: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("topicwatch_topics_due_total", "Topics that became due").unwrap()
});

/// Topics currently holding a schedule entry.
pub static PENDING_TOPICS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "topicwatch_pending_topics",
        "Number of topics with a pending schedule entry",
    )
    .unwrap()
});

/// Due topics skipped by a tick, by reason.
pub static SCHEDULE_SKIPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "topicwatch_schedule_skips_total",
            "Due topics skipped during a tick",
        ),
        &["reason"], // "missing_config", "missing_record", "store_error"
    )
    .unwrap()
});

// =============================================================================
// Acquisition Metrics
// =============================================================================

/// Topic checks by outcome.
pub static TOPIC_CHECKS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("topicwatch_topic_checks_total", "Topic checks by outcome"),
        &["outcome"], // "not_found", "unchanged", "queued", "failed"
    )
    .unwrap()
});

/// Torrent layout classifications by result.
pub static LAYOUT_CLASSIFICATIONS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "topicwatch_layout_classifications_total",
            "Torrent layout classifications by result",
        ),
        &["result"], // "movie", "tv_show", "raw_tv_show", "rejected"
    )
    .unwrap()
});

// =============================================================================
// External Service Metrics
// =============================================================================

/// External service request duration.
pub static EXTERNAL_SERVICE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "topicwatch_external_service_duration_seconds",
            "Duration of external service calls",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["service", "operation"],
    )
    .unwrap()
});

/// External service requests total.
pub static EXTERNAL_SERVICE_REQUESTS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "topicwatch_external_service_requests_total",
            "Total external service requests",
        ),
        &["service", "operation", "status"], // status: "success", "error"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Watcher
        Box::new(TRACKING_FILE_EVENTS.clone()),
        Box::new(TOPIC_CHANGES.clone()),
        // Scheduler
        Box::new(TOPICS_DUE.clone()),
        Box::new(PENDING_TOPICS.clone()),
        Box::new(SCHEDULE_SKIPS.clone()),
        // Acquisition
        Box::new(TOPIC_CHECKS.clone()),
        Box::new(LAYOUT_CLASSIFICATIONS.clone()),
        // External services
        Box::new(EXTERNAL_SERVICE_DURATION.clone()),
        Box::new(EXTERNAL_SERVICE_REQUESTS.clone()),
    ]
}

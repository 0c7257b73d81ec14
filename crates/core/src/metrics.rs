//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Task lifecycle (created, rejected, finished)
//! - Command actor (commands handled by action)
//! - Pipeline (fetches, fetched bytes, archive building, cleanup)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Task Lifecycle Metrics
// =============================================================================

/// Tasks created total.
pub static TASKS_CREATED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new("fetchpack_tasks_created_total", "Total tasks created").unwrap()
});

/// Task creations rejected because the task limit was reached.
pub static TASKS_REJECTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "fetchpack_tasks_rejected_total",
        "Task creations rejected because the server was busy",
    )
    .unwrap()
});

/// Tasks reaching a terminal state, by result.
pub static TASKS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetchpack_tasks_finished_total", "Tasks that reached a terminal state"),
        &["result"], // "completed", "failed"
    )
    .unwrap()
});

/// Task commands handled by the actor, by action and result.
pub static TASK_COMMANDS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetchpack_task_commands_total", "Task commands handled"),
        &["action", "result"], // "ok", "error"
    )
    .unwrap()
});

// =============================================================================
// Pipeline Metrics
// =============================================================================

/// Fetch attempts by result.
pub static FETCHES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetchpack_fetches_total", "Total fetch attempts"),
        &["result"], // "success" or a FetchError kind
    )
    .unwrap()
});

/// Bytes written by successful fetches.
pub static FETCHED_BYTES: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "fetchpack_fetched_bytes_total",
        "Total bytes written by successful fetches",
    )
    .unwrap()
});

/// Fetch duration in seconds.
pub static FETCH_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("fetchpack_fetch_duration_seconds", "Duration of single fetches")
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Archive build duration in seconds.
pub static ARCHIVE_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "fetchpack_archive_duration_seconds",
            "Duration of archive creation",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0]),
        &["result"], // "success", "failed"
    )
    .unwrap()
});

/// Task directory cleanups by result.
pub static CLEANUPS: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetchpack_cleanups_total", "Task directory cleanups"),
        &["result"], // "removed", "already_absent", "failed"
    )
    .unwrap()
});

/// Returns all core metrics for registration with a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Tasks
        Box::new(TASKS_CREATED.clone()),
        Box::new(TASKS_REJECTED.clone()),
        Box::new(TASKS_FINISHED.clone()),
        Box::new(TASK_COMMANDS.clone()),
        // Pipeline
        Box::new(FETCHES.clone()),
        Box::new(FETCHED_BYTES.clone()),
        Box::new(FETCH_DURATION.clone()),
        Box::new(ARCHIVE_DURATION.clone()),
        Box::new(CLEANUPS.clone()),
    ]
}

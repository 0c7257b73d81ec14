//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the fetchpack server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Tasks by state and orchestrator status (collected dynamically)
//! - Core task, fetch and archive metrics (registered from the core crate)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};

use fetchpack_core::TaskState;

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
            "fetchpack_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("fetchpack_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "fetchpack_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Orchestrator Metrics
// =============================================================================

/// Registered tasks by state.
pub static TASKS_BY_STATE: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("fetchpack_tasks_by_state", "Registered tasks by state"),
        &["state"],
    )
    .unwrap()
});

/// Whether the orchestrator accepts commands.
pub static ORCHESTRATOR_RUNNING: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "fetchpack_orchestrator_running",
        "Whether the orchestrator is running (1) or stopped (0)",
    )
    .unwrap()
});

/// Pipeline runs in flight.
pub static PIPELINES_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("fetchpack_pipelines_active", "Pipeline runs in flight").unwrap()
});

/// Cleanups waiting for their delay to elapse.
pub static CLEANUPS_SCHEDULED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "fetchpack_cleanups_scheduled",
        "Cleanups waiting for their delay to elapse",
    )
    .unwrap()
});

/// Commands waiting in the actor mailbox.
pub static COMMAND_QUEUE_DEPTH: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "fetchpack_command_queue_depth",
        "Commands waiting in the orchestrator mailbox",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

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

    // Orchestrator
    registry
        .register(Box::new(TASKS_BY_STATE.clone()))
        .unwrap();
    registry
        .register(Box::new(ORCHESTRATOR_RUNNING.clone()))
        .unwrap();
    registry
        .register(Box::new(PIPELINES_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(CLEANUPS_SCHEDULED.clone()))
        .unwrap();
    registry
        .register(Box::new(COMMAND_QUEUE_DEPTH.clone()))
        .unwrap();

    // Core metrics (tasks, fetches, archives, cleanup)
    for metric in fetchpack_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so gauges reflect the orchestrator right now.
pub async fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.orchestrator().overview().await;

    ORCHESTRATOR_RUNNING.set(if status.running { 1 } else { 0 });
    PIPELINES_ACTIVE.set(status.active_pipelines as i64);
    CLEANUPS_SCHEDULED.set(status.scheduled_cleanups as i64);
    COMMAND_QUEUE_DEPTH.set(status.actor.queued as i64);

    for (task_state, count) in [
        (TaskState::Pending, status.pending_count),
        (TaskState::Processing, status.processing_count),
        (TaskState::Completed, status.completed_count),
        (TaskState::Failed, status.failed_count),
    ] {
        TASKS_BY_STATE
            .with_label_values(&[task_state.state_type()])
            .set(count as i64);
    }
}

/// Normalize a path for metric labels (replace IDs with placeholders).
pub fn normalize_path(path: &str) -> String {
    static UUID: Lazy<regex_lite::Regex> = Lazy::new(|| {
        regex_lite::Regex::new(
            r"[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}",
        )
        .unwrap()
    });
    static NUMERIC: Lazy<regex_lite::Regex> =
        Lazy::new(|| regex_lite::Regex::new(r"/\d+(/|$)").unwrap());

    let result = UUID.replace_all(path, "{id}");
    let result = NUMERIC.replace_all(&result, "/{id}$1");
    result.to_string()
}

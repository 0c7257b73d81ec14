//! Delayed removal of finished tasks.

use std::io::ErrorKind;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::metrics;

use super::runner::Shared;

/// Remove the task's directory and registry entry once the cleanup delay
/// has elapsed. Abandoned if the orchestrator shuts down first.
pub(crate) fn schedule(shared: Arc<Shared>, task_id: String) {
    let delay = shared.config.cleanup_delay();
    shared.scheduled_cleanups.fetch_add(1, Ordering::SeqCst);
    info!("Scheduled cleanup for task {} in {:?}", task_id, delay);

    tokio::spawn(async move {
        tokio::select! {
            _ = shared.shutdown.cancelled() => {
                debug!("Cleanup for task {} abandoned on shutdown", task_id);
            }
            _ = tokio::time::sleep(delay) => {
                remove_task(&shared, &task_id).await;
            }
        }
        shared.scheduled_cleanups.fetch_sub(1, Ordering::SeqCst);
    });
}

/// Delete `<work_dir>/<task_id>` and, if that worked (or it was already
/// gone), drop the task from the registry. Returns whether the task was
/// released.
pub(crate) async fn remove_task(shared: &Shared, task_id: &str) -> bool {
    let task_dir = shared.config.task_dir(task_id);

    let released = match tokio::fs::remove_dir_all(&task_dir).await {
        Ok(()) => {
            metrics::CLEANUPS.with_label_values(&["removed"]).inc();
            info!("Cleaned up task {} directory", task_id);
            true
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            metrics::CLEANUPS.with_label_values(&["already_absent"]).inc();
            info!("Task {} directory already removed", task_id);
            true
        }
        Err(e) => {
            metrics::CLEANUPS.with_label_values(&["failed"]).inc();
            error!("Failed to clean up task {}: {}", task_id, e);
            false
        }
    };

    if released && shared.registry.remove(task_id).await.is_some() {
        debug!("Task {} removed from registry", task_id);
    }
    released
}

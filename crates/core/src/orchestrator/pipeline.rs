//! Background processing of a claimed task: fetch every URL, archive what
//! arrived, then schedule cleanup.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

use crate::fetcher::{file_name_from_url, FetchError, FetchedFile};
use crate::metrics;
use crate::task::Task;

use super::cleanup;
use super::runner::Shared;

/// Keeps the active pipeline gauge accurate even if a run panics.
struct ActivePipeline(Arc<Shared>);

impl ActivePipeline {
    fn enter(shared: &Arc<Shared>) -> Self {
        shared.active_pipelines.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(shared))
    }
}

impl Drop for ActivePipeline {
    fn drop(&mut self) {
        self.0.active_pipelines.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Spawn a pipeline run. The caller must already hold the processing claim.
pub(crate) fn spawn(shared: Arc<Shared>, task: Arc<Task>) {
    let guard = ActivePipeline::enter(&shared);
    tokio::spawn(async move {
        let _guard = guard;
        run(shared, task).await;
    });
}

async fn run(shared: Arc<Shared>, task: Arc<Task>) {
    let task_id = task.id().to_string();
    let started = Instant::now();
    info!("Processing task {}", task_id);

    let downloads_dir = shared.config.downloads_dir(&task_id);
    if let Err(e) = tokio::fs::create_dir_all(&downloads_dir).await {
        error!("Failed to create dir for task {}: {}", task_id, e);
        finish(
            &shared,
            &task,
            Err(format!("failed to create working directory: {}", e)),
        )
        .await;
        return;
    }

    let urls = task.urls().await;
    let mut used_names = HashSet::new();
    let mut fetched: Vec<PathBuf> = Vec::with_capacity(urls.len());

    for url in urls {
        let destination = downloads_dir.join(unique_name(&file_name_from_url(&url), &mut used_names));

        match fetch_one(&shared, &url, &destination).await {
            Ok(file) => {
                debug!("Task {}: fetched {} ({} bytes)", task_id, url, file.bytes);
                fetched.push(file.path);
            }
            Err(e) => {
                warn!("Failed to download {} for task {}: {}", url, task_id, e);
                task.record_failure(&url, e.to_string()).await;
                remove_partial(&destination).await;
            }
        }
    }

    if fetched.is_empty() {
        finish(&shared, &task, Err("no files could be fetched".to_string())).await;
        return;
    }

    let archive_path = shared.config.archive_path(&task_id);
    let archive_started = Instant::now();
    let outcome = match shared.archiver.archive(&fetched, &archive_path).await {
        Ok(summary) => {
            metrics::ARCHIVE_DURATION
                .with_label_values(&["success"])
                .observe(archive_started.elapsed().as_secs_f64());
            info!(
                "Task {}: archive ready with {} files ({} bytes)",
                task_id,
                summary.entries.len(),
                summary.bytes
            );
            Ok(())
        }
        Err(e) => {
            metrics::ARCHIVE_DURATION
                .with_label_values(&["failed"])
                .observe(archive_started.elapsed().as_secs_f64());
            error!("Task {}: archiving failed: {}", task_id, e);
            Err(format!("failed to create archive: {}", e))
        }
    };

    finish(&shared, &task, outcome).await;
    debug!("Task {} pipeline finished in {:?}", task_id, started.elapsed());
}

/// Fetch one URL within the per-item budget, giving up early on shutdown.
async fn fetch_one(
    shared: &Shared,
    url: &str,
    destination: &Path,
) -> Result<FetchedFile, FetchError> {
    let started = Instant::now();

    let result = tokio::select! {
        biased;
        _ = shared.shutdown.cancelled() => Err(FetchError::Cancelled),
        result = tokio::time::timeout(
            shared.config.fetch_timeout(),
            shared.fetcher.fetch(url, destination),
        ) => result.unwrap_or(Err(FetchError::Timeout)),
    };

    let elapsed = started.elapsed().as_secs_f64();
    match &result {
        Ok(file) => {
            metrics::FETCHES.with_label_values(&["success"]).inc();
            metrics::FETCHED_BYTES.inc_by(file.bytes);
            metrics::FETCH_DURATION
                .with_label_values(&["success"])
                .observe(elapsed);
        }
        Err(e) => {
            metrics::FETCHES.with_label_values(&[e.kind()]).inc();
            metrics::FETCH_DURATION
                .with_label_values(&["failed"])
                .observe(elapsed);
        }
    }
    result
}

/// Apply the terminal transition and schedule cleanup.
async fn finish(shared: &Arc<Shared>, task: &Arc<Task>, outcome: Result<(), String>) {
    let (transition, label) = match outcome {
        Ok(()) => (task.complete().await, "completed"),
        Err(reason) => {
            warn!("Task {} failed: {}", task.id(), reason);
            (task.fail(reason).await, "failed")
        }
    };

    match transition {
        Ok(()) => {
            metrics::TASKS_FINISHED.with_label_values(&[label]).inc();
            info!("Task {}: {}", task.id(), label);
        }
        Err(e) => error!("Task {}: {}", task.id(), e),
    }

    cleanup::schedule(Arc::clone(shared), task.id().to_string());
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            warn!("Failed to remove partial file {:?}: {}", path, e);
        }
    }
}

/// Return `name`, or `name` with a numeric suffix before the extension if
/// it is already taken. Records the returned name in `used`.
fn unique_name(name: &str, used: &mut HashSet<String>) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }

    let path = Path::new(name);
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| name.to_string());
    let extension = path.extension().map(|e| e.to_string_lossy().into_owned());

    let mut counter = 1;
    loop {
        let candidate = match &extension {
            Some(ext) => format!("{}-{}.{}", stem, counter, ext),
            None => format!("{}-{}", stem, counter),
        };
        if used.insert(candidate.clone()) {
            return candidate;
        }
        counter += 1;
    }
}

//! Orchestrator configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the task orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum number of tasks held in the registry at once.
    /// Finished tasks count until their cleanup runs.
    #[serde(default = "default_max_tasks")]
    pub max_tasks: usize,

    /// URLs per task. Reaching this count starts processing.
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Capacity of the command mailbox.
    #[serde(default = "default_mailbox_size")]
    pub mailbox_size: usize,

    /// How long an API call waits for the actor to answer (milliseconds).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,

    /// Per-URL fetch budget (seconds).
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Delay between a task finishing and its files being removed (seconds).
    #[serde(default = "default_cleanup_delay")]
    pub cleanup_delay_secs: u64,

    /// Root directory for task downloads and archives.
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Path prefix used to build archive download links.
    #[serde(default = "default_download_prefix")]
    pub download_prefix: String,
}

fn default_max_tasks() -> usize {
    3
}

fn default_max_files() -> usize {
    3
}

fn default_mailbox_size() -> usize {
    10
}

fn default_request_timeout() -> u64 {
    5000 // 5 seconds
}

fn default_fetch_timeout() -> u64 {
    60
}

fn default_cleanup_delay() -> u64 {
    3600 // 1 hour
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("fetchpack")
}

fn default_download_prefix() -> String {
    "/api/v1/tasks".to_string()
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_tasks: default_max_tasks(),
            max_files: default_max_files(),
            mailbox_size: default_mailbox_size(),
            request_timeout_ms: default_request_timeout(),
            fetch_timeout_secs: default_fetch_timeout(),
            cleanup_delay_secs: default_cleanup_delay(),
            work_dir: default_work_dir(),
            download_prefix: default_download_prefix(),
        }
    }
}

impl OrchestratorConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn cleanup_delay(&self) -> Duration {
        Duration::from_secs(self.cleanup_delay_secs)
    }

    /// `<work_dir>/<task_id>`
    pub fn task_dir(&self, task_id: &str) -> PathBuf {
        self.work_dir.join(task_id)
    }

    /// `<work_dir>/<task_id>/downloads`
    pub fn downloads_dir(&self, task_id: &str) -> PathBuf {
        self.task_dir(task_id).join("downloads")
    }

    /// `<work_dir>/<task_id>/archive.zip`
    pub fn archive_path(&self, task_id: &str) -> PathBuf {
        self.task_dir(task_id).join("archive.zip")
    }

    /// Client-facing download link for a completed task.
    pub fn download_url(&self, task_id: &str) -> String {
        format!(
            "{}/{}/archive",
            self.download_prefix.trim_end_matches('/'),
            task_id
        )
    }
}

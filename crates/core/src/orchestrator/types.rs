//! Types for the task orchestrator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actor::{ActorError, ActorStats};
use crate::task::{FileError, TaskError, TaskSnapshot, TaskState};

use super::config::OrchestratorConfig;

/// Errors returned by orchestrator API calls.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// The registry already holds the maximum number of tasks.
    #[error("server busy: {max_tasks} tasks already registered")]
    AdmissionRejected { max_tasks: usize },

    /// No task with this id.
    #[error("task not found: {0}")]
    NotFound(String),

    /// The task rejected the mutation.
    #[error(transparent)]
    Task(#[from] TaskError),

    /// The id is not a valid task id.
    #[error("invalid task id: {0}")]
    InvalidTaskId(String),

    /// The task has no archive to serve (not completed, or already cleaned up).
    #[error("archive not available for task {0}")]
    ArchiveNotFound(String),

    /// Reading the archive from storage failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// The actor did not answer within the request deadline.
    #[error("request deadline exceeded")]
    DeadlineExceeded,

    /// The command was dropped before a reply was produced.
    #[error("request cancelled")]
    Cancelled,

    /// The command actor no longer accepts commands.
    #[error(transparent)]
    ActorStopped(#[from] ActorError),
}

/// Client-facing view of a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskStatusReport {
    pub task_id: String,
    pub status: TaskState,
    /// Set only once the task has completed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    pub urls: Vec<String>,
    pub errors: Vec<FileError>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    pub max_urls: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TaskStatusReport {
    pub fn from_snapshot(snapshot: TaskSnapshot, config: &OrchestratorConfig) -> Self {
        let download_url = (snapshot.state == TaskState::Completed)
            .then(|| config.download_url(&snapshot.id));

        Self {
            task_id: snapshot.id,
            status: snapshot.state,
            download_url,
            urls: snapshot.urls,
            errors: snapshot.errors,
            failure_reason: snapshot.failure_reason,
            max_urls: snapshot.max_urls,
            created_at: snapshot.created_at,
            updated_at: snapshot.updated_at,
        }
    }
}

/// Current status of the orchestrator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Whether the orchestrator accepts commands.
    pub running: bool,
    /// Tasks currently registered (any state).
    pub total_tasks: usize,
    /// Admission limit.
    pub max_tasks: usize,
    /// Tasks waiting for URLs.
    pub pending_count: usize,
    /// Tasks being fetched or archived.
    pub processing_count: usize,
    /// Tasks with an archive ready.
    pub completed_count: usize,
    /// Tasks that produced no archive.
    pub failed_count: usize,
    /// Pipeline runs in flight.
    pub active_pipelines: usize,
    /// Cleanups waiting for their delay to elapse.
    pub scheduled_cleanups: usize,
    /// Command actor counters.
    pub actor: ActorStats,
}

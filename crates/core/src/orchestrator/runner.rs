//! Task orchestrator implementation.
//!
//! Registry mutations (create, append, status) are serialized through a
//! single command actor. Fetching and archiving run in background tasks
//! spawned once a task is claimed, so the actor never waits on the network.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::actor::{handler, Actor, HandlerMap, Message};
use crate::archiver::Archiver;
use crate::fetcher::Fetcher;
use crate::metrics;
use crate::task::{Task, TaskState};

use super::commands::{Reply, TaskAction, TaskCommand};
use super::config::OrchestratorConfig;
use super::pipeline;
use super::registry::TaskRegistry;
use super::types::{OrchestratorError, OrchestratorStatus, TaskStatusReport};

/// State shared between the actor handlers, pipelines and cleanups.
pub(crate) struct Shared {
    pub(crate) config: OrchestratorConfig,
    pub(crate) registry: TaskRegistry,
    pub(crate) fetcher: Arc<dyn Fetcher>,
    pub(crate) archiver: Arc<dyn Archiver>,
    pub(crate) shutdown: CancellationToken,
    pub(crate) active_pipelines: AtomicUsize,
    pub(crate) scheduled_cleanups: AtomicUsize,
}

/// An opened archive ready to stream.
#[derive(Debug)]
pub struct ArchiveFile {
    pub file: tokio::fs::File,
    pub size: u64,
    /// Suggested download name, `<task_id>.zip`.
    pub file_name: String,
}

/// The task orchestrator: admits tasks, collects URLs and starts a
/// pipeline run for each task that fills up.
pub struct TaskOrchestrator {
    shared: Arc<Shared>,
    actor: Actor<TaskCommand>,
}

impl TaskOrchestrator {
    /// Create the orchestrator and start its command actor.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(
        config: OrchestratorConfig,
        fetcher: Arc<dyn Fetcher>,
        archiver: Arc<dyn Archiver>,
    ) -> Self {
        info!(
            "Starting task orchestrator (max_tasks={}, max_files={}, fetcher={}, archiver={})",
            config.max_tasks,
            config.max_files,
            fetcher.name(),
            archiver.name()
        );

        let mailbox_size = config.mailbox_size;
        let shared = Arc::new(Shared {
            config,
            registry: TaskRegistry::new(),
            fetcher,
            archiver,
            shutdown: CancellationToken::new(),
            active_pipelines: AtomicUsize::new(0),
            scheduled_cleanups: AtomicUsize::new(0),
        });

        let actor = Actor::spawn("tasks", mailbox_size, command_handlers(&shared));

        Self { shared, actor }
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.shared.config
    }

    /// Register a new task, optionally seeded with URLs. Returns its id.
    pub async fn create_task(&self, urls: Vec<String>) -> Result<String, OrchestratorError> {
        self.round_trip(TaskAction::Create, |reply, cancel| TaskCommand::Create {
            urls,
            reply,
            cancel,
        })
        .await
    }

    /// Append URLs to a pending task.
    ///
    /// Every URL is attempted; the first rejection is returned. Processing
    /// starts as soon as the task is full, even if some URLs were rejected.
    pub async fn add_urls(
        &self,
        task_id: &str,
        urls: Vec<String>,
    ) -> Result<TaskStatusReport, OrchestratorError> {
        let task_id = task_id.to_string();
        self.round_trip(TaskAction::AddUrls, |reply, cancel| TaskCommand::AddUrls {
            task_id,
            urls,
            reply,
            cancel,
        })
        .await
    }

    pub async fn add_url(
        &self,
        task_id: &str,
        url: String,
    ) -> Result<TaskStatusReport, OrchestratorError> {
        self.add_urls(task_id, vec![url]).await
    }

    pub async fn status(&self, task_id: &str) -> Result<TaskStatusReport, OrchestratorError> {
        let task_id = task_id.to_string();
        self.round_trip(TaskAction::Status, |reply, cancel| TaskCommand::Status {
            task_id,
            reply,
            cancel,
        })
        .await
    }

    /// Open the archive of a completed task.
    pub async fn open_archive(&self, task_id: &str) -> Result<ArchiveFile, OrchestratorError> {
        Uuid::parse_str(task_id)
            .map_err(|_| OrchestratorError::InvalidTaskId(task_id.to_string()))?;

        let report = self.status(task_id).await?;
        if report.status != TaskState::Completed {
            return Err(OrchestratorError::ArchiveNotFound(task_id.to_string()));
        }

        let path = self.shared.config.archive_path(task_id);
        let file = tokio::fs::File::open(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                OrchestratorError::ArchiveNotFound(task_id.to_string())
            } else {
                OrchestratorError::Storage(e.to_string())
            }
        })?;
        let size = file
            .metadata()
            .await
            .map_err(|e| OrchestratorError::Storage(e.to_string()))?
            .len();

        Ok(ArchiveFile {
            file,
            size,
            file_name: format!("{}.zip", task_id),
        })
    }

    /// Snapshot of registry, pipeline and actor counters.
    pub async fn overview(&self) -> OrchestratorStatus {
        let counts = self.shared.registry.state_counts().await;
        let count = |state: TaskState| counts.get(&state).copied().unwrap_or(0);

        OrchestratorStatus {
            running: !self.actor.is_stopped() && !self.shared.shutdown.is_cancelled(),
            total_tasks: counts.values().sum(),
            max_tasks: self.shared.config.max_tasks,
            pending_count: count(TaskState::Pending),
            processing_count: count(TaskState::Processing),
            completed_count: count(TaskState::Completed),
            failed_count: count(TaskState::Failed),
            active_pipelines: self.shared.active_pipelines.load(Ordering::SeqCst),
            scheduled_cleanups: self.shared.scheduled_cleanups.load(Ordering::SeqCst),
            actor: self.actor.stats(),
        }
    }

    /// Stop accepting commands and abandon in-flight fetches and pending
    /// cleanups.
    pub fn shutdown(&self) {
        if self.shared.shutdown.is_cancelled() {
            return;
        }
        info!("Shutting down task orchestrator");
        self.shared.shutdown.cancel();
        self.actor.stop();
    }

    /// Send a command and wait for its reply within the request deadline.
    ///
    /// The per-call token is cancelled when this returns, so a handler that
    /// dequeues the command after the caller gave up can skip it.
    async fn round_trip<T>(
        &self,
        action: TaskAction,
        build: impl FnOnce(Reply<T>, CancellationToken) -> TaskCommand,
    ) -> Result<T, OrchestratorError> {
        let (reply, receiver) = oneshot::channel();
        let cancel = CancellationToken::new();
        let _guard = cancel.clone().drop_guard();

        let exchange = self.exchange(build(reply, cancel), receiver);
        let result = match tokio::time::timeout(self.shared.config.request_timeout(), exchange).await
        {
            Ok(result) => result,
            Err(_) => {
                warn!("{} request timed out", action.as_str());
                Err(OrchestratorError::DeadlineExceeded)
            }
        };

        let label = if result.is_ok() { "ok" } else { "error" };
        metrics::TASK_COMMANDS
            .with_label_values(&[action.as_str(), label])
            .inc();
        result
    }

    async fn exchange<T>(
        &self,
        command: TaskCommand,
        receiver: oneshot::Receiver<Result<T, OrchestratorError>>,
    ) -> Result<T, OrchestratorError> {
        self.actor.send(command).await?;
        receiver.await.map_err(|_| OrchestratorError::Cancelled)?
    }
}

impl Drop for TaskOrchestrator {
    fn drop(&mut self) {
        self.shared.shutdown.cancel();
    }
}

// =============================================================================
// Command handlers
// =============================================================================

fn command_handlers(shared: &Arc<Shared>) -> HandlerMap<TaskCommand> {
    let mut handlers: HandlerMap<TaskCommand> = HashMap::new();

    let state = Arc::clone(shared);
    handlers.insert(
        TaskAction::Create,
        handler(move |command, _shutdown| handle_create(Arc::clone(&state), command)),
    );

    let state = Arc::clone(shared);
    handlers.insert(
        TaskAction::AddUrls,
        handler(move |command, _shutdown| handle_add_urls(Arc::clone(&state), command)),
    );

    let state = Arc::clone(shared);
    handlers.insert(
        TaskAction::Status,
        handler(move |command, _shutdown| handle_status(Arc::clone(&state), command)),
    );

    handlers
}

async fn handle_create(shared: Arc<Shared>, command: TaskCommand) -> anyhow::Result<()> {
    let (urls, reply, cancel) = match command {
        TaskCommand::Create { urls, reply, cancel } => (urls, reply, cancel),
        other => anyhow::bail!("create handler received {:?}", other.action()),
    };

    if cancel.is_cancelled() {
        debug!("Create request abandoned by caller, skipping");
        return Ok(());
    }

    let max_tasks = shared.config.max_tasks;
    let max_urls = shared.config.max_files;
    let task_id = Uuid::new_v4().to_string();

    let admitted = shared
        .registry
        .admit(max_tasks, || Task::new(task_id.clone(), max_urls, urls))
        .await;

    let Some(task) = admitted else {
        metrics::TASKS_REJECTED.inc();
        warn!("Rejected new task: {} tasks already registered", max_tasks);
        let _ = reply.send(Err(OrchestratorError::AdmissionRejected { max_tasks }));
        return Ok(());
    };

    if reply.send(Ok(task_id.clone())).is_err() {
        shared.registry.remove(&task_id).await;
        debug!("Caller gone before task {} was handed out, rolled back", task_id);
        return Ok(());
    }

    metrics::TASKS_CREATED.inc();
    info!(
        "Created task {} with {} initial urls",
        task_id,
        task.url_count().await
    );

    maybe_start(&shared, &task).await;
    Ok(())
}

async fn handle_add_urls(shared: Arc<Shared>, command: TaskCommand) -> anyhow::Result<()> {
    let (task_id, urls, reply, cancel) = match command {
        TaskCommand::AddUrls {
            task_id,
            urls,
            reply,
            cancel,
        } => (task_id, urls, reply, cancel),
        other => anyhow::bail!("add_urls handler received {:?}", other.action()),
    };

    if cancel.is_cancelled() {
        debug!("Append to task {} abandoned by caller, skipping", task_id);
        return Ok(());
    }

    let Some(task) = shared.registry.get(&task_id).await else {
        let _ = reply.send(Err(OrchestratorError::NotFound(task_id)));
        return Ok(());
    };

    let mut first_error = None;
    for url in urls {
        match task.add_url(url).await {
            Ok(count) => debug!("Task {} now has {} urls", task_id, count),
            Err(e) => {
                debug!("Task {} rejected url: {}", task_id, e);
                first_error.get_or_insert(e);
            }
        }
    }

    maybe_start(&shared, &task).await;

    let result = match first_error {
        Some(e) => Err(e.into()),
        None => Ok(TaskStatusReport::from_snapshot(
            task.snapshot().await,
            &shared.config,
        )),
    };
    let _ = reply.send(result);
    Ok(())
}

async fn handle_status(shared: Arc<Shared>, command: TaskCommand) -> anyhow::Result<()> {
    let (task_id, reply, cancel) = match command {
        TaskCommand::Status {
            task_id,
            reply,
            cancel,
        } => (task_id, reply, cancel),
        other => anyhow::bail!("status handler received {:?}", other.action()),
    };

    if cancel.is_cancelled() {
        return Ok(());
    }

    let result = match shared.registry.get(&task_id).await {
        Some(task) => Ok(TaskStatusReport::from_snapshot(
            task.snapshot().await,
            &shared.config,
        )),
        None => Err(OrchestratorError::NotFound(task_id)),
    };
    let _ = reply.send(result);
    Ok(())
}

/// Start processing if the task is full and nobody has claimed it yet.
async fn maybe_start(shared: &Arc<Shared>, task: &Arc<Task>) {
    if !task.is_full().await {
        return;
    }
    if shared.shutdown.is_cancelled() {
        debug!("Not starting task {}: shutting down", task.id());
        return;
    }
    if task.begin_processing().await {
        pipeline::spawn(Arc::clone(shared), Arc::clone(task));
    }
}

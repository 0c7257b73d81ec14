//! The task record and its lock-guarded state machine.

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::types::{FileError, TaskError, TaskSnapshot, TaskState};

#[derive(Debug)]
struct TaskInner {
    urls: Vec<String>,
    state: TaskState,
    errors: Vec<FileError>,
    failure_reason: Option<String>,
    updated_at: DateTime<Utc>,
}

/// A batch of URLs to fetch and archive.
///
/// Identity and capacity are fixed at construction; everything else sits
/// behind the task's own lock, so callers share a task as `Arc<Task>`.
#[derive(Debug)]
pub struct Task {
    id: String,
    max_urls: usize,
    created_at: DateTime<Utc>,
    inner: RwLock<TaskInner>,
}

impl Task {
    /// Create a pending task. URLs beyond `max_urls` are dropped.
    pub fn new(id: impl Into<String>, max_urls: usize, mut urls: Vec<String>) -> Self {
        urls.truncate(max_urls);
        let now = Utc::now();
        Self {
            id: id.into(),
            max_urls,
            created_at: now,
            inner: RwLock::new(TaskInner {
                urls,
                state: TaskState::Pending,
                errors: Vec::new(),
                failure_reason: None,
                updated_at: now,
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn max_urls(&self) -> usize {
        self.max_urls
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Append a URL. Returns the new URL count.
    pub async fn add_url(&self, url: String) -> Result<usize, TaskError> {
        let mut inner = self.inner.write().await;
        if inner.state != TaskState::Pending {
            return Err(TaskError::NotPending {
                task_id: self.id.clone(),
                state: inner.state,
            });
        }
        if inner.urls.len() >= self.max_urls {
            return Err(TaskError::CapacityExceeded {
                task_id: self.id.clone(),
                max: self.max_urls,
            });
        }
        inner.urls.push(url);
        inner.updated_at = Utc::now();
        Ok(inner.urls.len())
    }

    pub async fn state(&self) -> TaskState {
        self.inner.read().await.state
    }

    pub async fn urls(&self) -> Vec<String> {
        self.inner.read().await.urls.clone()
    }

    pub async fn url_count(&self) -> usize {
        self.inner.read().await.urls.len()
    }

    pub async fn errors(&self) -> Vec<FileError> {
        self.inner.read().await.errors.clone()
    }

    /// Returns true once the task holds `max_urls` URLs.
    pub async fn is_full(&self) -> bool {
        self.inner.read().await.urls.len() >= self.max_urls
    }

    pub async fn snapshot(&self) -> TaskSnapshot {
        let inner = self.inner.read().await;
        TaskSnapshot {
            id: self.id.clone(),
            state: inner.state,
            urls: inner.urls.clone(),
            errors: inner.errors.clone(),
            failure_reason: inner.failure_reason.clone(),
            max_urls: self.max_urls,
            created_at: self.created_at,
            updated_at: inner.updated_at,
        }
    }

    /// Claim the task for processing.
    ///
    /// Compare-and-set `Pending -> Processing`; exactly one caller ever gets
    /// `true`.
    pub async fn begin_processing(&self) -> bool {
        let mut inner = self.inner.write().await;
        if inner.state != TaskState::Pending {
            return false;
        }
        inner.state = TaskState::Processing;
        inner.updated_at = Utc::now();
        true
    }

    /// Mark a processing task as completed.
    pub async fn complete(&self) -> Result<(), TaskError> {
        let mut inner = self.inner.write().await;
        Self::transition(&mut inner, TaskState::Completed)
    }

    /// Mark a processing task as failed, keeping the reason.
    pub async fn fail(&self, reason: impl Into<String>) -> Result<(), TaskError> {
        let mut inner = self.inner.write().await;
        Self::transition(&mut inner, TaskState::Failed)?;
        inner.failure_reason = Some(reason.into());
        Ok(())
    }

    /// Record a failed URL: log it and drop it from the URL list.
    ///
    /// Both happen under one lock acquisition so readers never see one
    /// without the other.
    pub async fn record_failure(&self, url: &str, error: impl Into<String>) {
        let mut inner = self.inner.write().await;
        inner.errors.push(FileError {
            url: url.to_string(),
            error: error.into(),
        });
        if let Some(pos) = inner.urls.iter().position(|u| u == url) {
            inner.urls.remove(pos);
        }
        inner.updated_at = Utc::now();
    }

    fn transition(inner: &mut TaskInner, to: TaskState) -> Result<(), TaskError> {
        if !inner.state.can_transition_to(to) {
            return Err(TaskError::InvalidTransition {
                from: inner.state,
                to,
            });
        }
        inner.state = to;
        inner.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_new_task_is_pending_and_truncated() {
        let urls = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let task = Task::new("t1", 2, urls);

        assert_eq!(task.id(), "t1");
        assert_eq!(task.state().await, TaskState::Pending);
        assert_eq!(task.urls().await, vec!["a", "b"]);
        assert!(task.is_full().await);
    }

    #[tokio::test]
    async fn test_add_url_respects_capacity() {
        let task = Task::new("t1", 2, vec![]);

        assert_eq!(task.add_url("a".to_string()).await, Ok(1));
        assert_eq!(task.add_url("b".to_string()).await, Ok(2));
        let err = task.add_url("c".to_string()).await.unwrap_err();
        assert!(matches!(err, TaskError::CapacityExceeded { max: 2, .. }));
        assert_eq!(task.url_count().await, 2);
    }

    #[tokio::test]
    async fn test_concurrent_appends_never_exceed_capacity() {
        let task = Arc::new(Task::new("t1", 3, vec![]));

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let task = Arc::clone(&task);
                tokio::spawn(async move { task.add_url(format!("http://h/{}.jpg", i)).await })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                accepted += 1;
            }
        }

        assert_eq!(accepted, 3);
        assert_eq!(task.url_count().await, 3);
    }

    #[tokio::test]
    async fn test_add_url_rejected_after_claim() {
        let task = Task::new("t1", 3, vec!["a".to_string()]);
        assert!(task.begin_processing().await);

        let err = task.add_url("b".to_string()).await.unwrap_err();
        assert!(matches!(
            err,
            TaskError::NotPending {
                state: TaskState::Processing,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_begin_processing_claims_once() {
        let task = Arc::new(Task::new("t1", 1, vec!["a".to_string()]));

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let task = Arc::clone(&task);
                tokio::spawn(async move { task.begin_processing().await })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(task.state().await, TaskState::Processing);
    }

    #[tokio::test]
    async fn test_terminal_transitions_require_processing() {
        let task = Task::new("t1", 1, vec![]);
        assert!(matches!(
            task.complete().await,
            Err(TaskError::InvalidTransition {
                from: TaskState::Pending,
                to: TaskState::Completed
            })
        ));

        assert!(task.begin_processing().await);
        task.fail("nothing fetched").await.unwrap();
        assert_eq!(task.state().await, TaskState::Failed);

        // Terminal states are final.
        assert!(task.complete().await.is_err());
        assert!(!task.begin_processing().await);
        let snapshot = task.snapshot().await;
        assert_eq!(snapshot.failure_reason.as_deref(), Some("nothing fetched"));
    }

    #[tokio::test]
    async fn test_record_failure_moves_url_to_errors() {
        let task = Task::new(
            "t1",
            3,
            vec!["a".to_string(), "b".to_string(), "c".to_string()],
        );

        task.record_failure("b", "HTTP 404").await;

        assert_eq!(task.urls().await, vec!["a", "c"]);
        let errors = task.errors().await;
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].url, "b");
        assert_eq!(errors[0].error, "HTTP 404");
    }

    #[tokio::test]
    async fn test_snapshot_reflects_state() {
        let task = Task::new("t1", 2, vec!["a".to_string()]);
        let snapshot = task.snapshot().await;

        assert_eq!(snapshot.id, "t1");
        assert_eq!(snapshot.state, TaskState::Pending);
        assert_eq!(snapshot.urls, vec!["a"]);
        assert!(snapshot.errors.is_empty());
        assert_eq!(snapshot.max_urls, 2);
        assert!(snapshot.updated_at >= snapshot.created_at);
    }
}

//! In-memory task registry.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::task::{Task, TaskState};

/// Tasks by id.
///
/// Only id-keyed operations are exposed; the map itself never leaves the
/// lock. Task locks are never taken while the registry lock is held.
#[derive(Debug, Default)]
pub struct TaskRegistry {
    tasks: RwLock<HashMap<String, Arc<Task>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, task_id: &str) -> Option<Arc<Task>> {
        self.tasks.read().await.get(task_id).cloned()
    }

    /// Insert a task built by `build` unless the registry already holds
    /// `max_tasks` tasks. The check and the insert happen under one write
    /// lock. Returns `None` when admission is refused.
    pub async fn admit<F>(&self, max_tasks: usize, build: F) -> Option<Arc<Task>>
    where
        F: FnOnce() -> Task,
    {
        let mut tasks = self.tasks.write().await;
        if tasks.len() >= max_tasks {
            return None;
        }
        let task = Arc::new(build());
        tasks.insert(task.id().to_string(), Arc::clone(&task));
        Some(task)
    }

    pub async fn remove(&self, task_id: &str) -> Option<Arc<Task>> {
        self.tasks.write().await.remove(task_id)
    }

    pub async fn len(&self) -> usize {
        self.tasks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.tasks.read().await.is_empty()
    }

    /// Number of tasks in each state.
    pub async fn state_counts(&self) -> HashMap<TaskState, usize> {
        let tasks: Vec<Arc<Task>> = self.tasks.read().await.values().cloned().collect();

        let mut counts: HashMap<TaskState, usize> =
            TaskState::ALL.iter().map(|state| (*state, 0)).collect();
        for task in tasks {
            *counts.entry(task.state().await).or_default() += 1;
        }
        counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_admit_until_full() {
        let registry = TaskRegistry::new();

        assert!(registry.admit(2, || Task::new("a", 3, vec![])).await.is_some());
        assert!(registry.admit(2, || Task::new("b", 3, vec![])).await.is_some());
        assert!(registry.admit(2, || Task::new("c", 3, vec![])).await.is_none());

        assert_eq!(registry.len().await, 2);
        assert!(registry.get("c").await.is_none());
    }

    #[tokio::test]
    async fn test_concurrent_admission_respects_limit() {
        let registry = Arc::new(TaskRegistry::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let registry = Arc::clone(&registry);
                tokio::spawn(async move {
                    registry
                        .admit(3, || Task::new(format!("t{}", i), 3, vec![]))
                        .await
                        .is_some()
                })
            })
            .collect();

        let mut admitted = 0;
        for handle in handles {
            if handle.await.unwrap() {
                admitted += 1;
            }
        }
        assert_eq!(admitted, 3);
        assert_eq!(registry.len().await, 3);
    }

    #[tokio::test]
    async fn test_remove_frees_a_slot() {
        let registry = TaskRegistry::new();
        registry.admit(1, || Task::new("a", 3, vec![])).await.unwrap();

        assert!(registry.admit(1, || Task::new("b", 3, vec![])).await.is_none());
        assert!(registry.remove("a").await.is_some());
        assert!(registry.remove("a").await.is_none());
        assert!(registry.admit(1, || Task::new("b", 3, vec![])).await.is_some());
    }

    #[tokio::test]
    async fn test_state_counts() {
        let registry = TaskRegistry::new();
        registry.admit(5, || Task::new("a", 1, vec![])).await.unwrap();
        let b = registry.admit(5, || Task::new("b", 1, vec![])).await.unwrap();
        assert!(b.begin_processing().await);

        let counts = registry.state_counts().await;
        assert_eq!(counts[&TaskState::Pending], 1);
        assert_eq!(counts[&TaskState::Processing], 1);
        assert_eq!(counts[&TaskState::Completed], 0);
        assert_eq!(counts[&TaskState::Failed], 0);
    }
}

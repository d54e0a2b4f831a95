//! In-memory batch task registry
//!
//! One coarse lock guards the map; each task guards its own counters, so
//! workers update progress without touching the registry lock. Capacity is
//! bounded and tasks expire after a fixed time-to-live.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use nfo_common::config::BatchConfig;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::BatchTask;

/// Live task ceiling
pub const MAX_CONCURRENT_TASKS: usize = 5;

/// Task time-to-live in seconds
pub const TASK_TTL_SECONDS: i64 = 1800;

/// Periodic sweep runs every N successful adds
pub const CLEANUP_INTERVAL: u64 = 100;

/// Registry is full of live tasks
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Too many concurrent tasks (max {max})")]
pub struct CapacityError {
    pub max: usize,
}

/// Registry limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskStoreLimits {
    pub max_tasks: usize,
    pub ttl: Duration,
    pub cleanup_interval: u64,
}

impl Default for TaskStoreLimits {
    fn default() -> Self {
        Self {
            max_tasks: MAX_CONCURRENT_TASKS,
            ttl: Duration::seconds(TASK_TTL_SECONDS),
            cleanup_interval: CLEANUP_INTERVAL,
        }
    }
}

impl From<&BatchConfig> for TaskStoreLimits {
    fn from(config: &BatchConfig) -> Self {
        Self {
            max_tasks: config.max_concurrent_tasks,
            ttl: i64::try_from(config.task_ttl_seconds)
                .ok()
                .and_then(Duration::try_seconds)
                .unwrap_or_else(|| Duration::seconds(TASK_TTL_SECONDS)),
            cleanup_interval: config.cleanup_interval.max(1),
        }
    }
}

#[derive(Debug, Default)]
struct StoreInner {
    tasks: HashMap<String, Arc<BatchTask>>,
    add_count: u64,
}

/// Process-wide task registry, shared as `Arc<TaskStore>`
#[derive(Debug, Default)]
pub struct TaskStore {
    inner: Mutex<StoreInner>,
    limits: TaskStoreLimits,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::with_limits(TaskStoreLimits::default())
    }

    pub fn with_limits(limits: TaskStoreLimits) -> Self {
        Self {
            inner: Mutex::new(StoreInner::default()),
            limits,
        }
    }

    pub fn limits(&self) -> TaskStoreLimits {
        self.limits
    }

    fn lock(&self) -> MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a task, replacing any task with the same id
    pub fn add(&self, task: Arc<BatchTask>) -> Result<(), CapacityError> {
        self.add_at(task, Utc::now())
    }

    /// [`TaskStore::add`] with an explicit clock
    pub fn add_at(&self, task: Arc<BatchTask>, now: DateTime<Utc>) -> Result<(), CapacityError> {
        let mut inner = self.lock();

        if inner.tasks.len() >= self.limits.max_tasks {
            let removed = self.sweep_locked(&mut inner, now);
            if removed > 0 {
                info!(removed, "Reclaimed capacity from expired tasks");
            }
            if inner.tasks.len() >= self.limits.max_tasks {
                return Err(CapacityError {
                    max: self.limits.max_tasks,
                });
            }
        }

        debug!(task_id = %task.task_id(), "Registering task");
        inner.tasks.insert(task.task_id().to_string(), task);
        inner.add_count += 1;

        if inner.add_count % self.limits.cleanup_interval.max(1) == 0 {
            let removed = self.sweep_locked(&mut inner, now);
            debug!(removed, "Periodic task sweep");
        }

        Ok(())
    }

    pub fn get(&self, task_id: &str) -> Option<Arc<BatchTask>> {
        self.lock().tasks.get(task_id).cloned()
    }

    /// Remove a task; true when something was removed
    pub fn delete(&self, task_id: &str) -> bool {
        self.lock().tasks.remove(task_id).is_some()
    }

    /// Every live task, in no particular order
    pub fn list_all(&self) -> Vec<Arc<BatchTask>> {
        self.lock().tasks.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove tasks older than the TTL; returns how many were removed
    pub fn sweep_expired(&self) -> usize {
        self.sweep_expired_at(Utc::now())
    }

    pub fn sweep_expired_at(&self, now: DateTime<Utc>) -> usize {
        let mut inner = self.lock();
        self.sweep_locked(&mut inner, now)
    }

    fn sweep_locked(&self, inner: &mut StoreInner, now: DateTime<Utc>) -> usize {
        let before = inner.tasks.len();
        let ttl = self.limits.ttl;
        inner.tasks.retain(|_, task| !task.is_expired_at(now, ttl));
        before - inner.tasks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BatchField, BatchMode, TaskSpec};
    use std::path::PathBuf;

    fn task(id: &str) -> Arc<BatchTask> {
        Arc::new(BatchTask::with_id(
            id,
            TaskSpec {
                field: BatchField::Studio,
                value: "Disney".to_string(),
                mode: BatchMode::Overwrite,
                directory: PathBuf::from("/media"),
                preview_files: Vec::new(),
            },
        ))
    }

    #[test]
    fn test_add_get_delete() {
        let store = TaskStore::new();
        store.add(task("a")).unwrap();

        assert_eq!(store.get("a").unwrap().task_id(), "a");
        assert!(store.get("missing").is_none());
        assert!(store.delete("a"));
        assert!(!store.delete("a"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_add_replaces_same_id() {
        let store = TaskStore::new();
        store.add(task("a")).unwrap();
        store.add(task("a")).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_periodic_sweep_every_interval() {
        let store = TaskStore::with_limits(TaskStoreLimits {
            max_tasks: 10,
            ttl: Duration::seconds(60),
            cleanup_interval: 3,
        });
        let now = Utc::now();
        let stale = |id: &str| {
            Arc::new(
                Arc::try_unwrap(task(id))
                    .unwrap()
                    .with_created_at(now - Duration::seconds(120)),
            )
        };

        store.add_at(stale("old1"), now).unwrap();
        store.add_at(stale("old2"), now).unwrap();
        assert_eq!(store.len(), 2);

        // Third add triggers the sweep
        store.add_at(task("fresh"), now).unwrap();
        assert_eq!(store.len(), 1);
        assert!(store.get("fresh").is_some());
    }

    #[test]
    fn test_limits_from_config() {
        let config = BatchConfig {
            max_concurrent_tasks: 2,
            task_ttl_seconds: 30,
            cleanup_interval: 0,
            ..BatchConfig::default()
        };
        let limits = TaskStoreLimits::from(&config);
        assert_eq!(limits.max_tasks, 2);
        assert_eq!(limits.ttl, Duration::seconds(30));
        assert_eq!(limits.cleanup_interval, 1);
    }

    #[test]
    fn test_out_of_range_ttl_uses_default() {
        for task_ttl_seconds in [u64::MAX, i64::MAX as u64, 10_000_000_000_000_000] {
            let config = BatchConfig {
                task_ttl_seconds,
                ..BatchConfig::default()
            };
            let limits = TaskStoreLimits::from(&config);
            assert_eq!(limits.ttl, Duration::seconds(TASK_TTL_SECONDS));
        }
    }
}

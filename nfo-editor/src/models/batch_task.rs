//! Batch task state
//!
//! A task carries the frozen configuration captured at preview time plus
//! progress counters that many workers update concurrently. All counter
//! changes for one file outcome happen under the task's own lock, so any
//! snapshot satisfies `success + failed <= processed <= total`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use uuid::Uuid;

/// Field a batch rewrites
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchField {
    Studio,
    Genre,
    Director,
}

/// Write mode for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchMode {
    #[default]
    Overwrite,
    Append,
}

/// Unrecognised field or mode literal
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} must be one of {expected}, got '{value}'")]
pub struct UnknownLiteral {
    pub kind: &'static str,
    pub expected: &'static str,
    pub value: String,
}

impl BatchField {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchField::Studio => "studio",
            BatchField::Genre => "genre",
            BatchField::Director => "director",
        }
    }
}

impl FromStr for BatchField {
    type Err = UnknownLiteral;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "studio" => Ok(BatchField::Studio),
            "genre" => Ok(BatchField::Genre),
            "director" => Ok(BatchField::Director),
            other => Err(UnknownLiteral {
                kind: "field",
                expected: "'studio', 'genre', 'director'",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for BatchField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BatchMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BatchMode::Overwrite => "overwrite",
            BatchMode::Append => "append",
        }
    }
}

impl FromStr for BatchMode {
    type Err = UnknownLiteral;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overwrite" => Ok(BatchMode::Overwrite),
            "append" => Ok(BatchMode::Append),
            other => Err(UnknownLiteral {
                kind: "mode",
                expected: "'overwrite', 'append'",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for BatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task lifecycle: Pending → Running → {Completed, Failed}
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Registered by preview, not yet applied
    Pending,
    /// Apply in progress
    Running,
    /// All files processed, at least one success (or no failures)
    Completed,
    /// All files processed, zero successes and at least one failure
    Failed,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

/// One file's preview line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreviewEntry {
    pub path: PathBuf,
    pub filename: String,
    pub title: String,
    pub current_value: String,
    pub new_value: String,
}

/// Configuration frozen at preview time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub field: BatchField,
    pub value: String,
    pub mode: BatchMode,
    pub directory: PathBuf,
    pub preview_files: Vec<PreviewEntry>,
}

impl TaskSpec {
    /// Paths captured by the preview
    pub fn files(&self) -> Vec<PathBuf> {
        self.preview_files.iter().map(|p| p.path.clone()).collect()
    }
}

#[derive(Debug, Clone)]
struct Progress {
    status: TaskStatus,
    total_files: usize,
    processed_files: usize,
    success_count: usize,
    failed_count: usize,
    errors: Vec<String>,
}

/// One batch operation, shared between the registry and workers
#[derive(Debug)]
pub struct BatchTask {
    task_id: String,
    created_at: DateTime<Utc>,
    spec: TaskSpec,
    progress: Mutex<Progress>,
}

/// Owned copy of a task at one instant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskSnapshot {
    pub task_id: String,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub field: BatchField,
    pub value: String,
    pub mode: BatchMode,
    pub directory: PathBuf,
    pub total_files: usize,
    pub processed_files: usize,
    pub success_count: usize,
    pub failed_count: usize,
    pub errors: Vec<String>,
}

impl TaskSnapshot {
    /// processed / total × 100, 0 when total is 0
    pub fn progress_percent(&self) -> f64 {
        if self.total_files == 0 {
            0.0
        } else {
            self.processed_files as f64 / self.total_files as f64 * 100.0
        }
    }

    /// Polling view with the last `error_tail` error messages
    pub fn status_report(&self, error_tail: usize) -> TaskStatusReport {
        let skip = self.errors.len().saturating_sub(error_tail);
        TaskStatusReport {
            task_id: self.task_id.clone(),
            status: self.status,
            progress: self.progress_percent(),
            processed: self.processed_files,
            total: self.total_files,
            success: self.success_count,
            failed: self.failed_count,
            errors: self.errors[skip..].to_vec(),
        }
    }
}

/// Status polling response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskStatusReport {
    pub task_id: String,
    pub status: TaskStatus,
    pub progress: f64,
    pub processed: usize,
    pub total: usize,
    pub success: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

impl BatchTask {
    /// New Pending task with a fresh v4 id
    pub fn new(spec: TaskSpec) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), spec)
    }

    /// New Pending task with an explicit id
    pub fn with_id(task_id: impl Into<String>, spec: TaskSpec) -> Self {
        let total_files = spec.preview_files.len();
        Self {
            task_id: task_id.into(),
            created_at: Utc::now(),
            spec,
            progress: Mutex::new(Progress {
                status: TaskStatus::Pending,
                total_files,
                processed_files: 0,
                success_count: 0,
                failed_count: 0,
                errors: Vec::new(),
            }),
        }
    }

    /// Override the creation timestamp
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn spec(&self) -> &TaskSpec {
        &self.spec
    }

    fn lock(&self) -> MutexGuard<'_, Progress> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn status(&self) -> TaskStatus {
        self.lock().status
    }

    /// Older than `ttl` at `now`
    pub fn is_expired_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now - self.created_at > ttl
    }

    /// Pending → Running with a fresh set of counters
    ///
    /// Returns the current status as the error when the task is not Pending.
    pub fn begin(&self, total_files: usize) -> Result<(), TaskStatus> {
        let mut progress = self.lock();
        if progress.status != TaskStatus::Pending {
            return Err(progress.status);
        }
        progress.status = TaskStatus::Running;
        progress.total_files = total_files;
        progress.processed_files = 0;
        progress.success_count = 0;
        progress.failed_count = 0;
        progress.errors.clear();
        Ok(())
    }

    /// Record one successful file
    pub fn record_success(&self) {
        let mut progress = self.lock();
        progress.success_count += 1;
        progress.processed_files += 1;
    }

    /// Record one failed file as `"<filename>: <message>"`
    pub fn record_failure(&self, filename: &str, message: &str) {
        let mut progress = self.lock();
        progress.failed_count += 1;
        progress.errors.push(format!("{}: {}", filename, message));
        progress.processed_files += 1;
    }

    /// Set the terminal status from the final counters
    pub fn finish(&self) -> TaskStatus {
        let mut progress = self.lock();
        progress.status = if progress.success_count == 0 && progress.failed_count >= 1 {
            TaskStatus::Failed
        } else {
            TaskStatus::Completed
        };
        progress.status
    }

    pub fn snapshot(&self) -> TaskSnapshot {
        let progress = self.lock().clone();
        TaskSnapshot {
            task_id: self.task_id.clone(),
            status: progress.status,
            created_at: self.created_at,
            field: self.spec.field,
            value: self.spec.value.clone(),
            mode: self.spec.mode,
            directory: self.spec.directory.clone(),
            total_files: progress.total_files,
            processed_files: progress.processed_files,
            success_count: progress.success_count,
            failed_count: progress.failed_count,
            errors: progress.errors,
        }
    }
}

//! Batch preview / apply engine
//!
//! Scans a directory, fans per-file work out over one shared worker pool and
//! records outcomes on a [`BatchTask`]. `preview` and `apply` block until
//! every file has been handled; results arrive in completion order.
//!
//! Failure policy: structural problems (bad directory, too many files,
//! unknown task, depth ceiling) abort before any file work. A single file's
//! parse, validation or write failure is recorded on the task and never
//! stops the batch.

use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc};

use nfo_common::config::BatchConfig;
use rayon::{ThreadPool, ThreadPoolBuilder};
use thiserror::Error;
use tracing::{debug, info};

use crate::codec::{self, CodecError};
use crate::error::BatchError;
use crate::models::{
    BatchField, BatchMode, BatchTask, PreviewEntry, Record, TaskSnapshot, TaskSpec, TaskStatus,
};
use crate::services::file_scanner::{validate_directory, FileScanner};
use crate::services::task_store::TaskStore;
use crate::validation::{self, ValidationError};

/// Worker threads shared by all batches
pub const MAX_WORKERS: usize = 10;

/// Candidate file ceiling per batch
pub const MAX_FILES_PER_BATCH: usize = 2000;

/// Why one file could not be rewritten
#[derive(Debug, Error)]
enum FileFailure {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Edit(#[from] BatchError),
}

/// Batch engine limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineLimits {
    pub max_workers: usize,
    pub max_files: usize,
    pub max_scan_depth: usize,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_workers: MAX_WORKERS,
            max_files: MAX_FILES_PER_BATCH,
            max_scan_depth: crate::services::file_scanner::MAX_SCAN_DEPTH,
        }
    }
}

impl From<&BatchConfig> for EngineLimits {
    fn from(config: &BatchConfig) -> Self {
        Self {
            max_workers: config.max_workers.max(1),
            max_files: config.max_files_per_batch,
            max_scan_depth: config.max_scan_depth,
        }
    }
}

pub struct BatchEngine {
    pool: ThreadPool,
    scanner: FileScanner,
    store: Arc<TaskStore>,
    limits: EngineLimits,
}

impl BatchEngine {
    /// Engine with default limits
    pub fn new(store: Arc<TaskStore>) -> Result<Self, BatchError> {
        Self::with_limits(store, EngineLimits::default())
    }

    pub fn with_limits(store: Arc<TaskStore>, limits: EngineLimits) -> Result<Self, BatchError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(limits.max_workers.max(1))
            .thread_name(|i| format!("nfo-batch-{}", i))
            .build()
            .map_err(|e| BatchError::WorkerPool(format!("rayon threadpool build failed: {}", e)))?;

        Ok(Self {
            pool,
            scanner: FileScanner::with_max_depth(limits.max_scan_depth),
            store,
            limits,
        })
    }

    pub fn store(&self) -> &Arc<TaskStore> {
        &self.store
    }

    pub fn scanner(&self) -> &FileScanner {
        &self.scanner
    }

    pub fn limits(&self) -> EngineLimits {
        self.limits
    }

    /// Every sidecar below `directory`, failing past the depth ceiling
    pub fn scan(&self, directory: &Path) -> Result<Vec<PathBuf>, BatchError> {
        Ok(self.scanner.scan(directory)?)
    }

    fn check_file_count(&self, found: usize) -> Result<(), BatchError> {
        if found > self.limits.max_files {
            return Err(BatchError::TooManyFiles {
                found,
                max: self.limits.max_files,
            });
        }
        Ok(())
    }

    /// Compute what an edit would do to every sidecar in `directory`
    ///
    /// Files that fail to parse are left out of the result.
    pub fn preview(
        &self,
        directory: &Path,
        field: BatchField,
        value: &str,
        mode: BatchMode,
    ) -> Result<Vec<PreviewEntry>, BatchError> {
        validate_directory(directory)?;
        check_mode(field, mode)?;

        let files = self.scan(directory)?;
        self.check_file_count(files.len())?;

        info!(
            directory = %directory.display(),
            field = %field,
            mode = %mode,
            files = files.len(),
            "Previewing batch"
        );

        let (tx, rx) = mpsc::channel();
        self.pool.scope(|s| {
            for path in &files {
                let tx = tx.clone();
                s.spawn(move |_| {
                    let _ = tx.send(preview_file(path, field, value, mode));
                });
            }
        });
        drop(tx);

        let entries: Vec<PreviewEntry> = rx.into_iter().flatten().collect();
        debug!(
            candidates = files.len(),
            previewed = entries.len(),
            "Preview complete"
        );
        Ok(entries)
    }

    /// Preview and register the result as a Pending task
    pub fn create_task(
        &self,
        directory: &Path,
        field: BatchField,
        value: &str,
        mode: BatchMode,
    ) -> Result<Arc<BatchTask>, BatchError> {
        let preview_files = self.preview(directory, field, value, mode)?;
        let task = Arc::new(BatchTask::new(TaskSpec {
            field,
            value: value.to_string(),
            mode,
            directory: directory.to_path_buf(),
            preview_files,
        }));
        self.store.add(Arc::clone(&task))?;
        info!(task_id = %task.task_id(), "Batch task created");
        Ok(task)
    }

    /// Apply an edit to `files`, blocking until every file is done
    pub fn apply(
        &self,
        task_id: &str,
        files: &[PathBuf],
        field: BatchField,
        value: &str,
        mode: BatchMode,
    ) -> Result<TaskSnapshot, BatchError> {
        let task = self.start(task_id, files.len(), field, mode)?;
        self.run(&task, files, field, value, mode);
        Ok(task.snapshot())
    }

    /// Apply a task using its stored configuration and preview file list
    pub fn apply_task(&self, task_id: &str) -> Result<TaskSnapshot, BatchError> {
        let task = self
            .store
            .get(task_id)
            .ok_or_else(|| BatchError::TaskNotFound(task_id.to_string()))?;
        let spec = task.spec().clone();
        self.apply(task_id, &spec.files(), spec.field, &spec.value, spec.mode)
    }

    /// Look up a task and mark it Running
    ///
    /// Split from [`BatchEngine::run`] so callers can report "running"
    /// before the fan-out happens elsewhere.
    pub fn start(
        &self,
        task_id: &str,
        file_count: usize,
        field: BatchField,
        mode: BatchMode,
    ) -> Result<Arc<BatchTask>, BatchError> {
        let task = self
            .store
            .get(task_id)
            .ok_or_else(|| BatchError::TaskNotFound(task_id.to_string()))?;
        check_mode(field, mode)?;
        self.check_file_count(file_count)?;
        task.begin(file_count)
            .map_err(|status| BatchError::already_started(task_id, status))?;
        info!(task_id = %task_id, files = file_count, "Batch apply started");
        Ok(task)
    }

    /// Fan out the edit over a started task; returns the terminal status
    pub fn run(
        &self,
        task: &BatchTask,
        files: &[PathBuf],
        field: BatchField,
        value: &str,
        mode: BatchMode,
    ) -> TaskStatus {
        let (tx, rx) = mpsc::channel::<()>();
        self.pool.scope(|s| {
            for path in files {
                let tx = tx.clone();
                s.spawn(move |_| {
                    match apply_file(path, field, value, mode) {
                        Ok(()) => task.record_success(),
                        Err(e) => {
                            debug!(path = %path.display(), "Batch file failed: {}", e);
                            task.record_failure(&file_name(path), &e.to_string());
                        }
                    }
                    let _ = tx.send(());
                });
            }
        });
        drop(tx);
        let finished = rx.into_iter().count();

        let status = task.finish();
        let snapshot = task.snapshot();
        info!(
            task_id = %task.task_id(),
            status = status.as_str(),
            processed = finished,
            success = snapshot.success_count,
            failed = snapshot.failed_count,
            "Batch apply finished"
        );
        status
    }
}

/// Studio is single-valued, so it has no append
fn check_mode(field: BatchField, mode: BatchMode) -> Result<(), BatchError> {
    if field == BatchField::Studio && mode == BatchMode::Append {
        return Err(BatchError::UnsupportedMode);
    }
    Ok(())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn preview_file(
    path: &Path,
    field: BatchField,
    value: &str,
    mode: BatchMode,
) -> Option<PreviewEntry> {
    let record = match codec::load_file(path) {
        Ok(record) => record,
        Err(e) => {
            debug!(path = %path.display(), "Excluded from preview: {}", e);
            return None;
        }
    };

    let current = current_value(&record, field);
    let new_value = preview_value(&current, value, mode);
    Some(PreviewEntry {
        path: path.to_path_buf(),
        filename: file_name(path),
        title: record.display_title(&file_stem(path)).to_string(),
        current_value: current,
        new_value,
    })
}

fn apply_file(
    path: &Path,
    field: BatchField,
    value: &str,
    mode: BatchMode,
) -> Result<(), FileFailure> {
    let mut record = codec::load_file(path)?;
    apply_edit(&mut record, field, value, mode)?;
    validation::ensure_valid(&record)?;
    codec::save_file(&record, path)?;
    Ok(())
}

/// Current value of `field`; list fields are joined with ", "
pub fn current_value(record: &Record, field: BatchField) -> String {
    match field {
        BatchField::Studio => record.studio.clone(),
        BatchField::Genre => record.genres.join(", "),
        BatchField::Director => record.directors.join(", "),
    }
}

/// Value the preview shows after the edit
pub fn preview_value(current: &str, value: &str, mode: BatchMode) -> String {
    match mode {
        BatchMode::Overwrite => value.to_string(),
        BatchMode::Append if !current.is_empty() => format!("{}, {}", current, value),
        BatchMode::Append => value.to_string(),
    }
}

/// Apply one edit in place
///
/// Appending a value already in the list adds a duplicate.
pub fn apply_edit(
    record: &mut Record,
    field: BatchField,
    value: &str,
    mode: BatchMode,
) -> Result<(), BatchError> {
    check_mode(field, mode)?;
    let list = match field {
        BatchField::Studio => {
            record.studio = value.to_string();
            return Ok(());
        }
        BatchField::Genre => &mut record.genres,
        BatchField::Director => &mut record.directors,
    };
    match mode {
        BatchMode::Overwrite => *list = vec![value.to_string()],
        BatchMode::Append => list.push(value.to_string()),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_value() {
        assert_eq!(preview_value("Old", "New", BatchMode::Overwrite), "New");
        assert_eq!(preview_value("Action", "Comedy", BatchMode::Append), "Action, Comedy");
        assert_eq!(preview_value("", "Comedy", BatchMode::Append), "Comedy");
    }

    #[test]
    fn test_apply_edit_matrix() {
        let mut record = Record::default();
        record.genres = vec!["Action".to_string(), "Drama".to_string()];
        record.directors = vec!["A".to_string()];

        apply_edit(&mut record, BatchField::Studio, "Disney", BatchMode::Overwrite).unwrap();
        assert_eq!(record.studio, "Disney");

        assert!(matches!(
            apply_edit(&mut record, BatchField::Studio, "X", BatchMode::Append),
            Err(BatchError::UnsupportedMode)
        ));
        assert_eq!(record.studio, "Disney");

        apply_edit(&mut record, BatchField::Genre, "Action", BatchMode::Append).unwrap();
        assert_eq!(record.genres, vec!["Action", "Drama", "Action"]);

        apply_edit(&mut record, BatchField::Genre, "Horror", BatchMode::Overwrite).unwrap();
        assert_eq!(record.genres, vec!["Horror"]);

        apply_edit(&mut record, BatchField::Director, "B", BatchMode::Append).unwrap();
        assert_eq!(record.directors, vec!["A", "B"]);
    }

    #[test]
    fn test_current_value_joins_lists() {
        let mut record = Record::default();
        record.directors = vec!["A".to_string(), "B".to_string()];
        assert_eq!(current_value(&record, BatchField::Director), "A, B");
        assert_eq!(current_value(&record, BatchField::Genre), "");
    }

    #[test]
    fn test_limits_from_config() {
        let config = BatchConfig {
            max_workers: 0,
            max_files_per_batch: 3,
            ..BatchConfig::default()
        };
        let limits = EngineLimits::from(&config);
        assert_eq!(limits.max_workers, 1);
        assert_eq!(limits.max_files, 3);
        assert_eq!(limits.max_scan_depth, 50);
    }
}

//! Sidecar file scanner
//!
//! Recursive `.nfo` discovery. Dot-named entries below the root are skipped,
//! directories that cannot be read are skipped, and symlinks are followed
//! with loop detection.
//!
//! Two depth policies:
//! - [`FileScanner::scan`]: a directory nested deeper than the ceiling fails
//!   the whole scan with [`ScanError::DepthExceeded`]
//! - [`FileScanner::scan_bounded`]: directories deeper than the limit are
//!   simply not entered

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

/// Directory nesting ceiling for batch scans
pub const MAX_SCAN_DEPTH: usize = 50;

const SIDECAR_EXTENSION: &str = "nfo";

/// Scanner errors
#[derive(Debug, Error)]
pub enum ScanError {
    /// Specified path does not exist
    #[error("Directory not found: {0}")]
    PathNotFound(PathBuf),

    /// Path exists but is not a directory
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// Directory tree nested deeper than the ceiling
    #[error("Maximum scan depth ({max_depth}) exceeded at {path}")]
    DepthExceeded { path: PathBuf, max_depth: usize },

    /// Path escapes the configured browse root
    #[error("Permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// General I/O error
    #[error("I/O error {0}: {1}")]
    Io(PathBuf, String),
}

/// Sidecar file scanner
#[derive(Debug, Clone)]
pub struct FileScanner {
    max_depth: usize,
}

impl FileScanner {
    pub fn new() -> Self {
        Self::with_max_depth(MAX_SCAN_DEPTH)
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Collect every sidecar below `root`, failing on excessive nesting
    pub fn scan(&self, root: &Path) -> Result<Vec<PathBuf>, ScanError> {
        self.walk(root, self.max_depth, true)
    }

    /// Collect sidecars without entering directories deeper than `max_depth`
    pub fn scan_bounded(&self, root: &Path, max_depth: usize) -> Result<Vec<PathBuf>, ScanError> {
        self.walk(root, max_depth, false)
    }

    fn walk(&self, root: &Path, max_depth: usize, strict: bool) -> Result<Vec<PathBuf>, ScanError> {
        validate_directory(root)?;

        let mut files = Vec::new();

        let mut walker = WalkDir::new(root).follow_links(true);
        if !strict {
            // Files one level below the deepest entered directory
            walker = walker.max_depth(max_depth.saturating_add(1));
        }

        for entry in walker.into_iter().filter_entry(|e| !is_hidden(e)) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    if e.loop_ancestor().is_some() {
                        tracing::warn!("Symlink loop skipped: {}", e);
                    } else if e.io_error().map(|io| io.kind()) == Some(ErrorKind::PermissionDenied)
                    {
                        tracing::debug!("Permission denied, skipping: {}", e);
                    } else if e.depth() == 0 {
                        return Err(ScanError::Io(root.to_path_buf(), e.to_string()));
                    } else {
                        tracing::warn!("Error accessing entry: {}", e);
                    }
                    continue;
                }
            };

            if entry.file_type().is_dir() {
                if strict && entry.depth() > max_depth {
                    return Err(ScanError::DepthExceeded {
                        path: entry.path().to_path_buf(),
                        max_depth,
                    });
                }
                continue;
            }

            if entry.file_type().is_file() && is_sidecar(entry.path()) {
                files.push(entry.into_path());
            }
        }

        files.sort();

        tracing::debug!(
            root = %root.display(),
            files = files.len(),
            "Scan complete"
        );

        Ok(files)
    }

    /// Validate path is within root folder (prevent directory traversal)
    pub fn validate_path(&self, path: &Path, root: &Path) -> Result<(), ScanError> {
        ensure_within(path, root)
    }
}

impl Default for FileScanner {
    fn default() -> Self {
        Self::new()
    }
}

/// Existing directory check used before any scan
pub fn validate_directory(path: &Path) -> Result<(), ScanError> {
    if !path.exists() {
        return Err(ScanError::PathNotFound(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(ScanError::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}

/// Reject `path` unless it resolves inside `root`
///
/// Paths that do not exist yet are checked through their nearest existing
/// ancestor.
pub fn ensure_within(path: &Path, root: &Path) -> Result<(), ScanError> {
    let canonical_root = root
        .canonicalize()
        .map_err(|e| ScanError::Io(root.to_path_buf(), e.to_string()))?;

    let mut probe = path;
    let canonical_path = loop {
        match probe.canonicalize() {
            Ok(p) => break p,
            Err(_) => match probe.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => probe = parent,
                _ => return Err(ScanError::PermissionDenied(path.to_path_buf())),
            },
        }
    };

    if !canonical_path.starts_with(&canonical_root) {
        return Err(ScanError::PermissionDenied(path.to_path_buf()));
    }

    Ok(())
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

fn is_sidecar(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(SIDECAR_EXTENSION))
        .unwrap_or(false)
}

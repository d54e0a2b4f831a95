//! Filename and content search over a directory tree

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codec;
use crate::models::Record;
use crate::services::file_scanner::{FileScanner, ScanError, MAX_SCAN_DEPTH};

/// Where a query matched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Filename,
    Title,
    #[serde(rename = "originaltitle")]
    OriginalTitle,
    Actor,
    Plot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub path: PathBuf,
    pub filename: String,
    pub match_type: MatchType,
    pub matched_text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub results: Vec<SearchHit>,
    /// More matching files existed than were returned
    pub truncated: bool,
}

/// Case-insensitive substring match; an empty query matches everything
pub fn match_filename(filename: &str, query: &str) -> bool {
    filename.to_lowercase().contains(&query.to_lowercase())
}

/// First match among title, original title, actor names, plot
pub fn match_content(record: &Record, query: &str) -> Option<(MatchType, String)> {
    let needle = query.to_lowercase();
    let hit = |text: &str| !text.is_empty() && text.to_lowercase().contains(&needle);

    if hit(&record.title) {
        return Some((MatchType::Title, record.title.clone()));
    }
    if hit(&record.original_title) {
        return Some((MatchType::OriginalTitle, record.original_title.clone()));
    }
    if let Some(actor) = record.cast.iter().find(|a| hit(&a.name)) {
        return Some((MatchType::Actor, actor.name.clone()));
    }
    if hit(&record.plot) {
        return Some((MatchType::Plot, record.plot.clone()));
    }
    None
}

/// Search sidecars below `base` by filename, then by content
///
/// Each file is reported at most once. `max_depth` is clamped to the scan
/// ceiling.
pub fn search(
    base: &Path,
    query: &str,
    max_depth: usize,
    max_results: usize,
) -> Result<SearchOutcome, ScanError> {
    let query = query.trim();
    if query.is_empty() {
        return Ok(SearchOutcome::default());
    }

    let files = FileScanner::new().scan_bounded(base, max_depth.min(MAX_SCAN_DEPTH))?;

    let mut outcome = SearchOutcome::default();
    for path in files {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let hit = if match_filename(&filename, query) {
            Some((MatchType::Filename, filename.clone()))
        } else {
            match codec::load_file(&path) {
                Ok(record) => match_content(&record, query),
                Err(e) => {
                    debug!(path = %path.display(), "Skipping unparsable file: {}", e);
                    None
                }
            }
        };

        let Some((match_type, matched_text)) = hit else {
            continue;
        };

        if outcome.results.len() >= max_results {
            outcome.truncated = true;
            break;
        }
        outcome.results.push(SearchHit {
            path,
            filename,
            match_type,
            matched_text,
        });
    }

    debug!(
        query,
        results = outcome.results.len(),
        truncated = outcome.truncated,
        "Search complete"
    );
    Ok(outcome)
}

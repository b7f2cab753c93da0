//! Append-only run history.
//!
//! The ledger is a JSON array of past run summaries, newest last, stored in
//! the output directory. It is one of the files the artifact store carries
//! across a forced wipe, so trends survive `--force` re-runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

use crate::score::CategoryResult;

/// File name of the ledger inside the output directory.
pub const HISTORY_FILE: &str = "history.json";

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("failed to write history {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Summary of one completed run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunHistoryEntry {
    pub analyzed_at: DateTime<Utc>,
    pub overall_score: i32,
    pub overall_grade: String,
    pub categories: Vec<CategoryResult>,
}

/// File-backed ledger of run summaries.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    /// Ledger stored as `history.json` inside `output_dir`.
    pub fn in_dir<P: AsRef<Path>>(output_dir: P) -> Self {
        Self::at(output_dir.as_ref().join(HISTORY_FILE))
    }

    /// Ledger stored at an explicit path.
    pub fn at<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every entry. A missing or unparsable file reads as empty.
    pub fn load(&self) -> Vec<RunHistoryEntry> {
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(_) => return Vec::new(),
        };

        match serde_json::from_str(&content) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "history is corrupt, starting fresh");
                Vec::new()
            }
        }
    }

    /// Most recent entry, if any.
    pub fn latest(&self) -> Option<RunHistoryEntry> {
        self.load().pop()
    }

    /// Append one entry and persist the whole list.
    ///
    /// The list is written to a sibling temp file and renamed into place, so
    /// a crash mid-write leaves the previous ledger intact.
    pub fn append(&self, entry: RunHistoryEntry) -> Result<(), HistoryError> {
        let mut entries = self.load();
        entries.push(entry);

        let json = serde_json::to_string_pretty(&entries)?;
        let tmp = self.path.with_extension("json.tmp");

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| HistoryError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        fs::write(&tmp, json).map_err(|source| HistoryError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| HistoryError::Io {
            path: self.path.clone(),
            source,
        })?;

        debug!(path = %self.path.display(), entries = entries.len(), "history appended");
        Ok(())
    }

    /// Compare an earlier entry (default: the one before the newest) with the
    /// newest entry. `None` when there are fewer than two entries or the
    /// index does not name an earlier entry.
    pub fn compare(&self, from_index: Option<usize>) -> Option<HistoryComparison> {
        let entries = self.load();
        if entries.len() < 2 {
            return None;
        }
        let latest_index = entries.len() - 1;
        let from = from_index.unwrap_or(latest_index - 1);
        if from >= latest_index {
            return None;
        }
        Some(compare(&entries[from], &entries[latest_index]))
    }
}

/// Score movement of one category between two runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryDelta {
    pub name: String,
    pub from: Option<i32>,
    pub to: Option<i32>,
    /// Present only when the category appears in both runs
    pub delta: Option<i32>,
}

/// Difference between two runs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryComparison {
    pub from_at: DateTime<Utc>,
    pub to_at: DateTime<Utc>,
    pub from_score: i32,
    pub to_score: i32,
    pub overall_delta: i32,
    pub categories: Vec<CategoryDelta>,
}

/// Compare two entries category by category.
///
/// Categories are listed in the newer entry's order, followed by categories
/// that only the older entry had.
pub fn compare(earlier: &RunHistoryEntry, later: &RunHistoryEntry) -> HistoryComparison {
    let score_in = |entry: &RunHistoryEntry, name: &str| {
        entry
            .categories
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.score)
    };

    let mut categories: Vec<CategoryDelta> = later
        .categories
        .iter()
        .map(|c| {
            let from = score_in(earlier, &c.name);
            CategoryDelta {
                name: c.name.clone(),
                from,
                to: Some(c.score),
                delta: from.map(|f| c.score - f),
            }
        })
        .collect();

    for c in &earlier.categories {
        if score_in(later, &c.name).is_none() {
            categories.push(CategoryDelta {
                name: c.name.clone(),
                from: Some(c.score),
                to: None,
                delta: None,
            });
        }
    }

    HistoryComparison {
        from_at: earlier.analyzed_at,
        to_at: later.analyzed_at,
        from_score: earlier.overall_score,
        to_score: later.overall_score,
        overall_delta: later.overall_score - earlier.overall_score,
        categories,
    }
}

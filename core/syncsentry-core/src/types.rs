//! Shared data model: folders, inactive-folder records, and the report.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Placeholder shown for folders the upstream reports without a label.
pub const NO_LABEL: &str = "No label";

/// A synchronization unit known to the upstream service.
///
/// Fetched fresh on every pass; never persisted. The `id` is stable across
/// runs and is the key into the inactivity cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub id: String,
    pub label: String,
}

impl Folder {
    /// Builds a folder, substituting [`NO_LABEL`] when the upstream sent no
    /// label or an empty one.
    pub fn new(id: impl Into<String>, label: Option<String>) -> Self {
        let label = match label {
            Some(value) if !value.trim().is_empty() => value,
            _ => NO_LABEL.to_string(),
        };
        Self {
            id: id.into(),
            label,
        }
    }
}

/// One entry of a report's inactive list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InactiveFolderRecord {
    pub id: String,
    pub label: String,
    pub last_modified: DateTime<Utc>,
}

/// Aggregated outcome of one evaluation pass that found inactive folders.
///
/// Immutable once built; `inactive_folders_count` always equals
/// `inactive_folders.len()` and `generated_at` is the pass start time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub total_folders: usize,
    pub inactive_folders_count: usize,
    pub inactive_folders: Vec<InactiveFolderRecord>,
    pub generated_at: DateTime<Utc>,
}

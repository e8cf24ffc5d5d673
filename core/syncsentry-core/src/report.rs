//! Report aggregation and the persisted last-report snapshot.

use std::path::Path;

use chrono::{DateTime, Utc};
use fs_err as fs;
use tracing::warn;

use crate::error::{Result, SentryError};
use crate::types::{InactiveFolderRecord, Report};

/// Aggregates the evaluator's output for one pass.
///
/// `generated_at` is the pass start time, not the build time, so reports
/// and cache entries produced by the same pass agree on "now".
pub fn build_report(
    total_folders: usize,
    inactive_folders: Vec<InactiveFolderRecord>,
    generated_at: DateTime<Utc>,
) -> Report {
    Report {
        total_folders,
        inactive_folders_count: inactive_folders.len(),
        inactive_folders,
        generated_at,
    }
}

/// Loads the inactive list of the most recent non-empty report.
///
/// Missing file means no report has been generated yet; a malformed file is
/// logged and treated as absent (the snapshot is for external inspection,
/// never an input to suppression decisions).
pub fn load_last_report(path: &Path) -> Result<Vec<InactiveFolderRecord>> {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => {
            return Err(SentryError::StorageRead {
                path: path.to_path_buf(),
                source: err,
            });
        }
    };

    match serde_json::from_slice(&data) {
        Ok(records) => Ok(records),
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "Last-report snapshot unreadable; ignoring"
            );
            Ok(Vec::new())
        }
    }
}

/// Overwrites the snapshot wholesale with this pass's inactive list.
pub fn save_last_report(path: &Path, records: &[InactiveFolderRecord]) -> Result<()> {
    let payload = serde_json::to_vec_pretty(records).map_err(|err| SentryError::StorageEncode {
        path: path.to_path_buf(),
        source: err,
    })?;
    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, payload).map_err(|err| SentryError::StorageWrite {
        path: tmp_path.clone(),
        source: err,
    })?;
    fs::rename(&tmp_path, path).map_err(|err| SentryError::StorageWrite {
        path: path.to_path_buf(),
        source: err,
    })
}

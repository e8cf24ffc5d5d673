//! Durable notification de-duplication cache.
//!
//! Maps folder id to the `last_modified` instant that was most recently
//! flagged. A folder is present exactly while its current inactivity episode
//! has been reported; the entry is removed the moment the folder is seen
//! active again.
//!
//! Persisted as pretty JSON keyed by folder id, with RFC 3339 timestamps so
//! a reload reproduces the identical instant. Saves go through a temp file
//! and rename: this file is the single source of truth for suppression
//! decisions and must never be visible half-written.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use fs_err as fs;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, SentryError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InactivityCache {
    entries: BTreeMap<String, DateTime<Utc>>,
}

impl InactivityCache {
    /// Loads the cache from disk.
    ///
    /// A missing file is an empty cache. A file that exists but does not
    /// parse is treated as empty with a logged warning (the tolerant option
    /// the contract allows): losing suppression state means at worst one
    /// duplicate notification, which beats refusing to run.
    pub fn load(path: &Path) -> Result<Self> {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(err) => {
                return Err(SentryError::StorageRead {
                    path: path.to_path_buf(),
                    source: err,
                });
            }
        };

        match serde_json::from_slice(&data) {
            Ok(cache) => Ok(cache),
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "Cache file unreadable; starting from an empty cache"
                );
                Ok(Self::default())
            }
        }
    }

    /// Persists the full mapping, replacing prior content atomically
    /// (write-then-rename).
    pub fn save(&self, path: &Path) -> Result<()> {
        let payload =
            serde_json::to_vec_pretty(self).map_err(|err| SentryError::StorageEncode {
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

    pub fn contains(&self, folder_id: &str) -> bool {
        self.entries.contains_key(folder_id)
    }

    /// The `last_modified` instant recorded when this folder was last
    /// flagged, if it is currently in an episode.
    pub fn flagged_at(&self, folder_id: &str) -> Option<DateTime<Utc>> {
        self.entries.get(folder_id).copied()
    }

    /// Sets or overwrites the entry for a folder.
    pub fn update(&mut self, folder_id: &str, timestamp: DateTime<Utc>) {
        self.entries.insert(folder_id.to_string(), timestamp);
    }

    /// Deletes the entry if present; returns whether it existed.
    pub fn remove(&mut self, folder_id: &str) -> bool {
        self.entries.remove(folder_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

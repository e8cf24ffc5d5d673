//! Storage paths and startup directory checks.
//!
//! All file-location decisions live here so tests can inject temp
//! directories and production code never concatenates paths ad hoc.

use std::path::{Path, PathBuf};

use fs_err as fs;

use crate::error::{Result, SentryError};

const CACHE_FILE: &str = "cache.json";
const LAST_REPORT_FILE: &str = "last_report.json";

/// Central configuration for durable-state and log locations.
///
/// Production code builds this from [`crate::Config`]; tests use
/// [`StorageConfig::with_root`] with a temp directory.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    state_dir: PathBuf,
    log_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(state_dir: PathBuf, log_dir: PathBuf) -> Self {
        Self { state_dir, log_dir }
    }

    /// Puts state and logs under a single root. Used for testing.
    pub fn with_root(root: &Path) -> Self {
        Self {
            state_dir: root.to_path_buf(),
            log_dir: root.to_path_buf(),
        }
    }

    pub fn state_dir(&self) -> &Path {
        &self.state_dir
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    /// Path to the notification de-duplication cache.
    pub fn cache_file(&self) -> PathBuf {
        self.state_dir.join(CACHE_FILE)
    }

    /// Path to the persisted snapshot of the last non-empty report.
    pub fn last_report_file(&self) -> PathBuf {
        self.state_dir.join(LAST_REPORT_FILE)
    }

    /// Verifies that both directories exist, are directories, and are
    /// writable. Called once at startup; any failure is fatal before the
    /// run loop starts.
    pub fn verify(&self) -> Result<()> {
        verify_writable_dir(&self.state_dir)?;
        verify_writable_dir(&self.log_dir)
    }
}

fn verify_writable_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(SentryError::DirectoryMissing(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Err(SentryError::NotADirectory(path.to_path_buf()));
    }

    // Probe with an actual write; access bits alone miss read-only mounts.
    let probe = path.join(".write-probe");
    fs::write(&probe, b"probe").map_err(|err| SentryError::DirectoryNotWritable {
        path: path.to_path_buf(),
        source: err,
    })?;
    let _ = fs::remove_file(&probe);
    Ok(())
}

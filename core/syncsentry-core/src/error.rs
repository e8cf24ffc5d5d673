//! Error types for syncsentry operations.
//!
//! Four families, mirroring the failure modes of an evaluation pass:
//! configuration problems (fatal at startup only), upstream API failures
//! (recovered by skipping a folder or aborting the pass), storage failures
//! (logged, pass treated as failed), and dispatch failures (logged per
//! channel, never fatal).

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum SentryError {
    // ─────────────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Missing required setting: {0}")]
    MissingSetting(String),

    #[error("Invalid setting {name}: {details}")]
    InvalidSetting { name: String, details: String },

    #[error("Required directory missing: {0}")]
    DirectoryMissing(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("Directory not writable: {path}: {source}")]
    DirectoryNotWritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────────────
    // Upstream Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Upstream request failed: {operation}: {details}")]
    Upstream { operation: String, details: String },

    // ─────────────────────────────────────────────────────────────────────
    // Storage Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Storage read failed: {path}: {source}")]
    StorageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage write failed: {path}: {source}")]
    StorageWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage encoding failed: {path}: {source}")]
    StorageEncode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    // ─────────────────────────────────────────────────────────────────────
    // Dispatch Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Dispatch via {channel} failed: {details}")]
    Dispatch {
        channel: &'static str,
        details: String,
    },
}

/// Convenience type alias for Results using SentryError.
pub type Result<T> = std::result::Result<T, SentryError>;

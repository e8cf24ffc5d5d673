//! # syncsentry-core
//!
//! Core library for syncsentry: detects folders of a Syncthing instance that
//! have gone inactive and decides, once per daily pass, which of them to
//! notify about: exactly once per inactivity episode.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime dependency; probing parallelism is a
//!   bounded `std::thread` pool inside the pass.
//! - **Pure core**: The evaluator takes every input explicitly (clock,
//!   threshold, cache state) and performs no I/O.
//! - **Durable de-duplication**: The cache and last-report snapshot are the
//!   only persistent state, written atomically once per pass.
//! - **UTC everywhere**: Timestamps are converted to UTC at the
//!   activity-prober boundary and stay UTC through cache and report.

pub mod cache;
pub mod config;
pub mod error;
pub mod evaluate;
pub mod pass;
pub mod report;
pub mod storage;
pub mod types;

pub use cache::InactivityCache;
pub use config::{Config, DiscordConfig, GotifyConfig, SmtpConfig};
pub use error::{Result, SentryError};
pub use evaluate::{evaluate, Decision};
pub use pass::{run_pass, ActivityProber, FolderSource, Notifier, PassOutcome};
pub use report::{build_report, load_last_report, save_last_report};
pub use storage::StorageConfig;
pub use types::{Folder, InactiveFolderRecord, Report, NO_LABEL};

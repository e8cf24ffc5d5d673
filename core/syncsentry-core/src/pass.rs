//! One evaluation pass: load cache, fetch folders, probe activity, classify,
//! report, dispatch, persist.
//!
//! The upstream API and the notification channels sit behind traits so the
//! whole pass runs against in-memory fakes in tests. The pass owns both
//! durable files; nothing is persisted when it aborts early.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::thread;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::cache::InactivityCache;
use crate::config::Config;
use crate::error::Result;
use crate::evaluate::{evaluate, Decision};
use crate::report::{build_report, save_last_report};
use crate::storage::StorageConfig;
use crate::types::{Folder, InactiveFolderRecord, Report};

/// Source of the current folder set.
pub trait FolderSource {
    /// Returns all folders known to the sync service, in upstream order.
    /// An error here aborts the pass: evaluating against a partial folder
    /// list would poison the cache.
    fn folders(&self) -> Result<Vec<Folder>>;
}

/// Per-folder activity lookup. `Sync` because probes run on a worker pool.
pub trait ActivityProber: Sync {
    /// Most recent modification instant among the folder's files, already
    /// converted to UTC, or `None` if undeterminable.
    fn last_modified(&self, folder_id: &str) -> Result<Option<DateTime<Utc>>>;
}

/// One outbound notification channel.
pub trait Notifier {
    fn channel(&self) -> &'static str;
    fn notify(&self, report: &Report) -> Result<()>;
}

/// Counters and the report (if any) from a completed pass.
#[derive(Debug)]
pub struct PassOutcome {
    pub total_folders: usize,
    pub flagged: usize,
    pub suppressed: usize,
    pub cleared: usize,
    pub skipped: usize,
    pub report: Option<Report>,
}

/// Runs one full evaluation pass.
///
/// Terminal after a single traversal. Probe failures skip the folder;
/// dispatch failures are logged per channel and do not fail the pass. The
/// cache is saved exactly once, after all folders are evaluated; the
/// last-report snapshot is overwritten only when a report was generated.
pub fn run_pass(
    config: &Config,
    storage: &StorageConfig,
    source: &dyn FolderSource,
    prober: &dyn ActivityProber,
    notifiers: &[Box<dyn Notifier>],
) -> Result<PassOutcome> {
    let started_at = Utc::now();
    run_pass_at(started_at, config, storage, source, prober, notifiers)
}

/// Same as [`run_pass`] with an injected pass start time.
pub fn run_pass_at(
    started_at: DateTime<Utc>,
    config: &Config,
    storage: &StorageConfig,
    source: &dyn FolderSource,
    prober: &dyn ActivityProber,
    notifiers: &[Box<dyn Notifier>],
) -> Result<PassOutcome> {
    let cache_file = storage.cache_file();
    let mut cache = InactivityCache::load(&cache_file)?;

    let folders = source.folders()?;
    info!(folders = folders.len(), "Folder list fetched");

    let probes = probe_all(prober, &folders, config.probe_workers);

    let mut inactive = Vec::new();
    let mut outcome = PassOutcome {
        total_folders: folders.len(),
        flagged: 0,
        suppressed: 0,
        cleared: 0,
        skipped: 0,
        report: None,
    };

    // Single-threaded reducer: all cache mutations happen here, in folder
    // order, after the probes returned.
    for (index, probe) in probes {
        let folder = &folders[index];
        let last_modified = match probe {
            Ok(value) => value,
            Err(err) => {
                warn!(
                    folder = %folder.id,
                    error = %err,
                    "Activity probe failed; skipping folder"
                );
                None
            }
        };

        match evaluate(
            started_at,
            config.days_threshold,
            last_modified,
            cache.flagged_at(&folder.id),
        ) {
            Decision::Skip => outcome.skipped += 1,
            Decision::Active { clear } => {
                if clear {
                    cache.remove(&folder.id);
                    info!(folder = %folder.id, "Folder active again; removed from cache");
                    outcome.cleared += 1;
                }
            }
            Decision::Flag { last_modified } => {
                cache.update(&folder.id, last_modified);
                inactive.push(InactiveFolderRecord {
                    id: folder.id.clone(),
                    label: folder.label.clone(),
                    last_modified,
                });
                outcome.flagged += 1;
            }
            Decision::Suppress => outcome.suppressed += 1,
        }
    }

    if !inactive.is_empty() {
        let report = build_report(folders.len(), inactive, started_at);
        dispatch(notifiers, &report);
        save_last_report(&storage.last_report_file(), &report.inactive_folders)?;
        outcome.report = Some(report);
    }

    cache.save(&cache_file)?;
    Ok(outcome)
}

/// Probes all folders on a bounded worker pool.
///
/// Each folder touches a disjoint cache key, so probes are independent;
/// results are collected and handed to the reducer in folder order.
fn probe_all(
    prober: &dyn ActivityProber,
    folders: &[Folder],
    workers: usize,
) -> Vec<(usize, Result<Option<DateTime<Utc>>>)> {
    if folders.is_empty() {
        return Vec::new();
    }

    let workers = workers.clamp(1, folders.len());
    let next = AtomicUsize::new(0);
    let (tx, rx) = mpsc::channel();

    thread::scope(|scope| {
        for _ in 0..workers {
            let tx = tx.clone();
            let next = &next;
            scope.spawn(move || loop {
                let index = next.fetch_add(1, Ordering::SeqCst);
                if index >= folders.len() {
                    break;
                }
                let outcome = prober.last_modified(&folders[index].id);
                if tx.send((index, outcome)).is_err() {
                    break;
                }
            });
        }
    });
    drop(tx);

    let mut results: Vec<(usize, Result<Option<DateTime<Utc>>>)> = rx.into_iter().collect();
    results.sort_by_key(|(index, _)| *index);
    results
}

/// Attempts every enabled channel; one channel failing never blocks the
/// others.
fn dispatch(notifiers: &[Box<dyn Notifier>], report: &Report) {
    for notifier in notifiers {
        match notifier.notify(report) {
            Ok(()) => info!(channel = notifier.channel(), "Report dispatched"),
            Err(err) => error!(
                channel = notifier.channel(),
                error = %err,
                "Report dispatch failed"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SentryError;
    use chrono::{Duration, TimeZone};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    struct FixedFolders(Vec<Folder>);

    impl FolderSource for FixedFolders {
        fn folders(&self) -> Result<Vec<Folder>> {
            Ok(self.0.clone())
        }
    }

    struct FailingFolders;

    impl FolderSource for FailingFolders {
        fn folders(&self) -> Result<Vec<Folder>> {
            Err(SentryError::Upstream {
                operation: "config/folders".to_string(),
                details: "connection refused".to_string(),
            })
        }
    }

    /// Probe table: missing id => probe error, `None` value => unknown.
    struct TableProber(HashMap<String, Option<DateTime<Utc>>>);

    impl ActivityProber for TableProber {
        fn last_modified(&self, folder_id: &str) -> Result<Option<DateTime<Utc>>> {
            match self.0.get(folder_id) {
                Some(value) => Ok(*value),
                None => Err(SentryError::Upstream {
                    operation: format!("db/browse folder={folder_id}"),
                    details: "timeout".to_string(),
                }),
            }
        }
    }

    struct RecordingNotifier {
        name: &'static str,
        fail: bool,
        seen: Arc<Mutex<Vec<Report>>>,
    }

    impl RecordingNotifier {
        fn boxed(name: &'static str, fail: bool, seen: &Arc<Mutex<Vec<Report>>>) -> Box<Self> {
            Box::new(Self {
                name,
                fail,
                seen: Arc::clone(seen),
            })
        }
    }

    impl Notifier for RecordingNotifier {
        fn channel(&self) -> &'static str {
            self.name
        }

        fn notify(&self, report: &Report) -> Result<()> {
            self.seen.lock().unwrap().push(report.clone());
            if self.fail {
                Err(SentryError::Dispatch {
                    channel: self.name,
                    details: "boom".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    fn config() -> Config {
        Config::from_lookup(|name| {
            match name {
                "SYNCTHING_URL" => Some("http://syncthing:8384"),
                "SYNCTHING_API_KEY" => Some("key"),
                "SYNCTHING_DAYS_INACTIVE" => Some("30"),
                _ => None,
            }
            .map(String::from)
        })
        .expect("config")
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap()
    }

    fn folder(id: &str) -> Folder {
        Folder::new(id, Some(format!("label-{id}")))
    }

    fn run(
        temp: &TempDir,
        source: &dyn FolderSource,
        prober: &dyn ActivityProber,
        notifiers: &[Box<dyn Notifier>],
        started_at: DateTime<Utc>,
    ) -> Result<PassOutcome> {
        let storage = StorageConfig::with_root(temp.path());
        run_pass_at(started_at, &config(), &storage, source, prober, notifiers)
    }

    #[test]
    fn new_inactive_folder_is_reported_and_cached() {
        let temp = TempDir::new().unwrap();
        let stale = now() - Duration::days(45);
        let source = FixedFolders(vec![folder("f")]);
        let prober = TableProber(HashMap::from([("f".to_string(), Some(stale))]));

        let outcome = run(&temp, &source, &prober, &[], now()).unwrap();

        assert_eq!(outcome.flagged, 1);
        let report = outcome.report.expect("report");
        assert_eq!(report.total_folders, 1);
        assert_eq!(report.inactive_folders[0].id, "f");
        assert_eq!(report.inactive_folders[0].last_modified, stale);

        let storage = StorageConfig::with_root(temp.path());
        let cache = InactivityCache::load(&storage.cache_file()).unwrap();
        assert_eq!(cache.flagged_at("f"), Some(stale));
        assert!(storage.last_report_file().exists());
    }

    #[test]
    fn second_identical_pass_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let stale = now() - Duration::days(45);
        let source = FixedFolders(vec![folder("f")]);
        let prober = TableProber(HashMap::from([("f".to_string(), Some(stale))]));

        run(&temp, &source, &prober, &[], now()).unwrap();
        let outcome = run(&temp, &source, &prober, &[], now() + Duration::days(1)).unwrap();

        assert_eq!(outcome.flagged, 0);
        assert_eq!(outcome.suppressed, 1);
        assert!(outcome.report.is_none());
    }

    #[test]
    fn renewed_inactivity_is_reported_again() {
        let temp = TempDir::new().unwrap();
        let source = FixedFolders(vec![folder("f")]);

        let first = now() - Duration::days(45);
        let prober = TableProber(HashMap::from([("f".to_string(), Some(first))]));
        run(&temp, &source, &prober, &[], now()).unwrap();

        // Touched again, still older than the threshold.
        let renewed = now() - Duration::days(31);
        let prober = TableProber(HashMap::from([("f".to_string(), Some(renewed))]));
        let outcome = run(&temp, &source, &prober, &[], now()).unwrap();

        assert_eq!(outcome.flagged, 1);
        let storage = StorageConfig::with_root(temp.path());
        let cache = InactivityCache::load(&storage.cache_file()).unwrap();
        assert_eq!(cache.flagged_at("f"), Some(renewed));
    }

    #[test]
    fn folder_turning_active_is_cleared_from_cache() {
        let temp = TempDir::new().unwrap();
        let source = FixedFolders(vec![folder("f")]);

        let stale = now() - Duration::days(45);
        let prober = TableProber(HashMap::from([("f".to_string(), Some(stale))]));
        run(&temp, &source, &prober, &[], now()).unwrap();

        let fresh = now() - Duration::hours(2);
        let prober = TableProber(HashMap::from([("f".to_string(), Some(fresh))]));
        let outcome = run(&temp, &source, &prober, &[], now()).unwrap();

        assert_eq!(outcome.cleared, 1);
        assert!(outcome.report.is_none());
        let storage = StorageConfig::with_root(temp.path());
        let cache = InactivityCache::load(&storage.cache_file()).unwrap();
        assert!(!cache.contains("f"));
    }

    #[test]
    fn cache_survives_restart_and_keeps_suppressing() {
        let temp = TempDir::new().unwrap();
        let stale = now() - Duration::days(45);
        let source = FixedFolders(vec![folder("f")]);
        let prober = TableProber(HashMap::from([("f".to_string(), Some(stale))]));

        run(&temp, &source, &prober, &[], now()).unwrap();

        // "Restart": a brand-new pass loading the same state directory.
        let outcome = run(&temp, &source, &prober, &[], now() + Duration::days(2)).unwrap();
        assert_eq!(outcome.suppressed, 1);
        assert!(outcome.report.is_none());
    }

    #[test]
    fn probe_failure_skips_only_that_folder() {
        let temp = TempDir::new().unwrap();
        let stale = now() - Duration::days(45);
        let source = FixedFolders(vec![folder("broken"), folder("f")]);
        // "broken" is absent from the table => probe error.
        let prober = TableProber(HashMap::from([("f".to_string(), Some(stale))]));

        let outcome = run(&temp, &source, &prober, &[], now()).unwrap();

        assert_eq!(outcome.skipped, 1);
        assert_eq!(outcome.flagged, 1);
        let storage = StorageConfig::with_root(temp.path());
        let cache = InactivityCache::load(&storage.cache_file()).unwrap();
        assert!(!cache.contains("broken"));
        assert!(cache.contains("f"));
    }

    #[test]
    fn unknown_modification_time_never_mutates_cache() {
        let temp = TempDir::new().unwrap();
        let source = FixedFolders(vec![folder("f")]);
        let prober = TableProber(HashMap::from([("f".to_string(), None)]));

        let outcome = run(&temp, &source, &prober, &[], now()).unwrap();

        assert_eq!(outcome.skipped, 1);
        assert!(outcome.report.is_none());
        let storage = StorageConfig::with_root(temp.path());
        assert!(InactivityCache::load(&storage.cache_file())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn folder_list_failure_aborts_without_persisting() {
        let temp = TempDir::new().unwrap();
        let prober = TableProber(HashMap::new());

        let result = run(&temp, &FailingFolders, &prober, &[], now());

        assert!(matches!(result, Err(SentryError::Upstream { .. })));
        let storage = StorageConfig::with_root(temp.path());
        assert!(!storage.cache_file().exists());
        assert!(!storage.last_report_file().exists());
    }

    #[test]
    fn empty_report_still_saves_cache_after_removal() {
        let temp = TempDir::new().unwrap();
        let source = FixedFolders(vec![folder("f")]);

        let stale = now() - Duration::days(45);
        let prober = TableProber(HashMap::from([("f".to_string(), Some(stale))]));
        run(&temp, &source, &prober, &[], now()).unwrap();

        let fresh = now();
        let prober = TableProber(HashMap::from([("f".to_string(), Some(fresh))]));
        run(&temp, &source, &prober, &[], now()).unwrap();

        // The removal reached disk even though no report was generated.
        let storage = StorageConfig::with_root(temp.path());
        let cache = InactivityCache::load(&storage.cache_file()).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn last_report_untouched_when_pass_finds_nothing() {
        let temp = TempDir::new().unwrap();
        let source = FixedFolders(vec![folder("f")]);

        let stale = now() - Duration::days(45);
        let prober = TableProber(HashMap::from([("f".to_string(), Some(stale))]));
        run(&temp, &source, &prober, &[], now()).unwrap();

        let storage = StorageConfig::with_root(temp.path());
        let before = std::fs::read(storage.last_report_file()).unwrap();

        // Suppressing pass: snapshot must remain the previous report.
        run(&temp, &source, &prober, &[], now() + Duration::days(1)).unwrap();
        let after = std::fs::read(storage.last_report_file()).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn one_failing_channel_does_not_block_others() {
        let temp = TempDir::new().unwrap();
        let stale = now() - Duration::days(45);
        let source = FixedFolders(vec![folder("f")]);
        let prober = TableProber(HashMap::from([("f".to_string(), Some(stale))]));

        let mail_seen = Arc::new(Mutex::new(Vec::new()));
        let chat_seen = Arc::new(Mutex::new(Vec::new()));
        let notifiers: Vec<Box<dyn Notifier>> = vec![
            RecordingNotifier::boxed("mail", true, &mail_seen),
            RecordingNotifier::boxed("chat", false, &chat_seen),
        ];

        let outcome = run(&temp, &source, &prober, &notifiers, now()).unwrap();

        // Pass still succeeds and both channels were attempted.
        assert!(outcome.report.is_some());
        assert_eq!(mail_seen.lock().unwrap().len(), 1);
        assert_eq!(chat_seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn every_notifier_sees_the_same_report() {
        let temp = TempDir::new().unwrap();
        let stale = now() - Duration::days(45);
        let source = FixedFolders(vec![folder("a"), folder("b")]);
        let prober = TableProber(HashMap::from([
            ("a".to_string(), Some(stale)),
            ("b".to_string(), Some(stale - Duration::days(3))),
        ]));

        let seen = Arc::new(Mutex::new(Vec::new()));
        let notifiers: Vec<Box<dyn Notifier>> =
            vec![RecordingNotifier::boxed("mail", false, &seen)];

        let outcome = run(&temp, &source, &prober, &notifiers, now()).unwrap();
        let report = outcome.report.expect("report");
        assert_eq!(report.inactive_folders_count, 2);
        assert_eq!(seen.lock().unwrap()[0], report);
    }

    #[test]
    fn probe_pool_preserves_folder_order_in_report() {
        let temp = TempDir::new().unwrap();
        let stale = now() - Duration::days(45);
        let folders: Vec<Folder> = (0..16).map(|i| folder(&format!("f{i:02}"))).collect();
        let table: HashMap<String, Option<DateTime<Utc>>> = folders
            .iter()
            .map(|f| (f.id.clone(), Some(stale)))
            .collect();
        let source = FixedFolders(folders.clone());
        let prober = TableProber(table);

        let outcome = run(&temp, &source, &prober, &[], now()).unwrap();
        let report = outcome.report.expect("report");
        let ids: Vec<&str> = report
            .inactive_folders
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        let expected: Vec<&str> = folders.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, expected);
    }
}

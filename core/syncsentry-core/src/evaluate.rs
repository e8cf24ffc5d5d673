//! Pure inactivity classification.
//!
//! Given the pass start time, the configured threshold, a folder's most
//! recent modification instant, and what the cache already recorded for the
//! folder, decide what the pass should do. No I/O, no clock reads: every
//! input is explicit, which is what makes the suppression behavior testable.
//!
//! All timestamps are UTC. Conversion happens once at the activity-prober
//! boundary, so there is no naive/aware coercion here.

use chrono::{DateTime, Duration, Utc};

/// Outcome of classifying one folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// The prober could not determine a modification time. Insufficient
    /// data: no cache mutation, no report inclusion.
    Skip,
    /// Folder was modified within the threshold. `clear` is true when a
    /// cache entry exists and must be removed (episode closed).
    Active { clear: bool },
    /// Folder is inactive and must be reported; the cache entry is set to
    /// the carried `last_modified`.
    Flag { last_modified: DateTime<Utc> },
    /// Folder is inactive but was already reported for this episode and
    /// nothing changed since. No cache mutation, no report inclusion.
    Suppress,
}

/// Classifies a folder.
///
/// `flagged_at` is the cache entry for the folder, if any: the
/// `last_modified` value recorded when the folder was last flagged. A folder
/// is re-flagged only when its file set changed again after that point while
/// still being inactive, i.e. the episode "renewed".
///
/// A zero or negative `threshold_days` is applied as configured; the cutoff
/// then sits at or after `now` and everything becomes inactive.
pub fn evaluate(
    now: DateTime<Utc>,
    threshold_days: i64,
    last_modified: Option<DateTime<Utc>>,
    flagged_at: Option<DateTime<Utc>>,
) -> Decision {
    let last_modified = match last_modified {
        Some(value) => value,
        None => return Decision::Skip,
    };

    let cutoff = now - Duration::days(threshold_days);
    if last_modified >= cutoff {
        return Decision::Active {
            clear: flagged_at.is_some(),
        };
    }

    match flagged_at {
        None => Decision::Flag { last_modified },
        Some(flagged) if last_modified > flagged => Decision::Flag { last_modified },
        Some(_) => Decision::Suppress,
    }
}

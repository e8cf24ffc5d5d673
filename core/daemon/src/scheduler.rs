//! Daily trigger with at most one evaluation pass in flight.
//!
//! A ticker thread fires at the configured local wall-clock time each day
//! and hands the tick over a rendezvous channel. `try_send` on a rendezvous
//! channel succeeds only while the receiver is parked waiting, so a trigger
//! that arrives mid-pass is dropped rather than queued.

use std::sync::mpsc;
use std::thread;

use chrono::{DateTime, Duration, Local, LocalResult, NaiveDateTime, NaiveTime, TimeZone};
use tracing::{info, warn};

/// Drives `pass` once per daily tick. Does not return.
pub fn run(at: NaiveTime, mut pass: impl FnMut()) {
    let (tx, rx) = mpsc::sync_channel::<()>(0);

    thread::spawn(move || loop {
        let now = Local::now();
        let next = resolve_local(next_trigger(now.naive_local(), at), now);
        info!(next = %next.format("%Y-%m-%d %H:%M:%S"), "Waiting for next run");

        let wait = (next - Local::now()).to_std().unwrap_or_default();
        thread::sleep(wait);

        if tx.try_send(()).is_err() {
            warn!("Previous pass still running; dropping trigger");
        }
    });

    for () in rx {
        pass();
    }
}

/// Next wall-clock occurrence of `at` strictly after `now`.
fn next_trigger(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if today > now {
        today
    } else {
        today + Duration::days(1)
    }
}

fn resolve_local(naive: NaiveDateTime, fallback_base: DateTime<Local>) -> DateTime<Local> {
    match Local.from_local_datetime(&naive) {
        LocalResult::Single(resolved) => resolved,
        LocalResult::Ambiguous(earliest, _) => earliest,
        // The trigger time falls into a DST gap; fire a day later instead.
        LocalResult::None => fallback_base + Duration::days(1),
    }
}

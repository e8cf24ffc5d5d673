//! syncsentry daemon entrypoint.
//!
//! Runs one evaluation pass immediately at startup, then one per day at the
//! configured local time. Startup problems (bad configuration, missing or
//! read-only directories) exit non-zero before the loop; once the loop is
//! running, every error is logged and the process keeps going.

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use syncsentry_core::{run_pass, Config, Notifier, StorageConfig};

mod notify;
mod scheduler;
mod syncthing;

use syncthing::SyncthingClient;

const LOG_FILE: &str = "app.log";

#[derive(Parser)]
#[command(
    name = "syncsentry-daemon",
    version,
    about = "Syncthing folder inactivity watchdog"
)]
struct Cli {
    /// Directory holding cache.json and last_report.json (overrides
    /// SYNCSENTRY_STATE_DIR)
    #[arg(long)]
    state_dir: Option<PathBuf>,

    /// Directory receiving app.log (overrides SYNCSENTRY_LOG_DIR)
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Run a single evaluation pass and exit
    #[arg(long)]
    once: bool,
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Configuration error: {err}");
            std::process::exit(1);
        }
    };

    let state_dir = cli.state_dir.unwrap_or_else(|| config.state_dir.clone());
    let log_dir = cli.log_dir.unwrap_or_else(|| config.log_dir.clone());
    let storage = StorageConfig::new(state_dir, log_dir);

    if let Err(err) = storage.verify() {
        eprintln!("Startup check failed: {err}");
        std::process::exit(1);
    }

    let _log_guard = init_logging(storage.log_dir());
    info!(version = env!("CARGO_PKG_VERSION"), "syncsentry daemon started");

    let client = match SyncthingClient::new(&config) {
        Ok(client) => client,
        Err(err) => {
            error!(error = %err, "Failed to build upstream client");
            std::process::exit(1);
        }
    };

    let notifiers = notify::build(&config);
    info!(
        channels = notifiers.len(),
        threshold_days = config.days_threshold,
        schedule_at = %config.schedule_at,
        "Configuration loaded"
    );

    run_once(&config, &storage, &client, &notifiers);
    if cli.once {
        return;
    }

    scheduler::run(config.schedule_at, || {
        run_once(&config, &storage, &client, &notifiers)
    });
}

fn run_once(
    config: &Config,
    storage: &StorageConfig,
    client: &SyncthingClient,
    notifiers: &[Box<dyn Notifier>],
) {
    info!("Starting evaluation pass");
    match run_pass(config, storage, client, client, notifiers) {
        Ok(outcome) => info!(
            total = outcome.total_folders,
            flagged = outcome.flagged,
            suppressed = outcome.suppressed,
            cleared = outcome.cleared,
            skipped = outcome.skipped,
            reported = outcome.report.is_some(),
            "Evaluation pass finished"
        ),
        Err(err) => error!(error = %err, "Evaluation pass failed"),
    }
}

/// Log to stderr and to `app.log` in the log directory. The returned guard
/// must stay alive for the process lifetime or buffered lines are lost.
fn init_logging(log_dir: &Path) -> tracing_appender::non_blocking::WorkerGuard {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .init();
    guard
}

//! Runtime configuration.
//!
//! Read once from the process environment at startup into an immutable
//! [`Config`] that is passed by reference into the pass orchestrator. Nothing
//! inside the evaluator looks at the environment again.
//!
//! A notification channel is represented as `Some(settings)` when its enable
//! flag is set; enabling a channel without its required settings is a
//! configuration error, surfaced before the loop starts.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;

use crate::error::{Result, SentryError};

const DEFAULT_STATE_DIR: &str = "/config";
const DEFAULT_LOG_DIR: &str = "/logs";
const DEFAULT_SCHEDULE_AT: &str = "08:00";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
const DEFAULT_PROBE_WORKERS: usize = 4;

/// Mail channel settings (SMTP with STARTTLS).
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub sender: String,
    pub receiver: String,
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// Push channel settings (Gotify).
#[derive(Debug, Clone)]
pub struct GotifyConfig {
    pub url: String,
    pub token: String,
}

/// Chat channel settings (Discord webhook).
#[derive(Debug, Clone)]
pub struct DiscordConfig {
    pub webhook_url: String,
}

/// Immutable runtime configuration, constructed once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the upstream Syncthing API.
    pub api_url: String,
    /// API key sent as `X-API-Key` on every upstream request.
    pub api_key: String,
    /// Inactivity threshold in days. Zero or negative is accepted as
    /// configured; the evaluator does not validate it.
    pub days_threshold: i64,
    pub smtp: Option<SmtpConfig>,
    pub gotify: Option<GotifyConfig>,
    pub discord: Option<DiscordConfig>,
    /// Local wall-clock time of the daily trigger.
    pub schedule_at: NaiveTime,
    /// Timeout applied to upstream HTTP requests.
    pub http_timeout: Duration,
    /// Bounded worker-pool size for activity probing.
    pub probe_workers: usize,
    /// Directory holding `cache.json` and `last_report.json`.
    pub state_dir: PathBuf,
    /// Directory receiving `app.log`.
    pub log_dir: PathBuf,
}

impl Config {
    /// Reads configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads configuration through an injected lookup function.
    ///
    /// Production uses [`Config::from_env`]; tests inject a map so they do
    /// not race over process-global environment state.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_url = required(&lookup, "SYNCTHING_URL")?;
        let api_key = required(&lookup, "SYNCTHING_API_KEY")?;
        let days_threshold = parse(&lookup, "SYNCTHING_DAYS_INACTIVE", None)?;

        let smtp = if flag(&lookup, "SMTP_ENABLE") {
            Some(SmtpConfig {
                sender: required(&lookup, "SMTP_SENDER")?,
                receiver: required(&lookup, "SMTP_RECEIVER")?,
                server: required(&lookup, "SMTP_SERVER")?,
                port: parse(&lookup, "SMTP_PORT", None)?,
                username: required(&lookup, "SMTP_USERNAME")?,
                password: required(&lookup, "SMTP_PASSWORD")?,
            })
        } else {
            None
        };

        let gotify = if flag(&lookup, "GOTIFY_ENABLE") {
            Some(GotifyConfig {
                url: required(&lookup, "GOTIFY_URL")?,
                token: required(&lookup, "GOTIFY_TOKEN")?,
            })
        } else {
            None
        };

        let discord = if flag(&lookup, "DISCORD_ENABLE") {
            Some(DiscordConfig {
                webhook_url: required(&lookup, "DISCORD_WEBHOOK")?,
            })
        } else {
            None
        };

        let schedule_raw = lookup("SYNCSENTRY_SCHEDULE_AT")
            .unwrap_or_else(|| DEFAULT_SCHEDULE_AT.to_string());
        let schedule_at = NaiveTime::parse_from_str(&schedule_raw, "%H:%M").map_err(|err| {
            SentryError::InvalidSetting {
                name: "SYNCSENTRY_SCHEDULE_AT".to_string(),
                details: format!("expected HH:MM, got {:?}: {}", schedule_raw, err),
            }
        })?;

        let http_timeout = Duration::from_secs(parse(
            &lookup,
            "SYNCSENTRY_HTTP_TIMEOUT_SECS",
            Some(DEFAULT_HTTP_TIMEOUT_SECS),
        )?);
        let probe_workers: usize = parse(
            &lookup,
            "SYNCSENTRY_PROBE_WORKERS",
            Some(DEFAULT_PROBE_WORKERS),
        )?;

        Ok(Self {
            api_url,
            api_key,
            days_threshold,
            smtp,
            gotify,
            discord,
            schedule_at,
            http_timeout,
            probe_workers: probe_workers.max(1),
            state_dir: lookup("SYNCSENTRY_STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR)),
            log_dir: lookup("SYNCSENTRY_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOG_DIR)),
        })
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<String> {
    match lookup(name) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(SentryError::MissingSetting(name.to_string())),
    }
}

fn flag(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> bool {
    lookup(name)
        .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: Option<T>) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(raw) => raw.trim().parse().map_err(|err| SentryError::InvalidSetting {
            name: name.to_string(),
            details: format!("could not parse {:?}: {}", raw, err),
        }),
        None => default.ok_or_else(|| SentryError::MissingSetting(name.to_string())),
    }
}

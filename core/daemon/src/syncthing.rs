//! Syncthing REST client: folder snapshot source and activity prober.
//!
//! Two endpoints are used: `/rest/config/folders` for the folder set and
//! `/rest/db/browse?folder={id}` for the per-folder directory listing whose
//! maximum `modTime` is the folder's last-modified instant. Every request
//! carries the API key header and the configured timeout; a timed-out call
//! surfaces as the same upstream error as any other failure.

use chrono::{DateTime, Utc};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use tracing::{debug, warn};

use syncsentry_core::{ActivityProber, Config, Folder, FolderSource, Result, SentryError};

const API_KEY_HEADER: &str = "X-API-Key";

pub struct SyncthingClient {
    http: Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct FolderEntry {
    id: String,
    #[serde(default)]
    label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BrowseEntry {
    #[serde(rename = "modTime")]
    mod_time: Option<String>,
}

impl SyncthingClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|err| upstream("client setup", err))?;
        Ok(Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Response> {
        let mut request = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header(API_KEY_HEADER, &self.api_key);
        if !query.is_empty() {
            request = request.query(query);
        }
        request
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|err| upstream(path, err))
    }
}

fn upstream(operation: impl Into<String>, err: reqwest::Error) -> SentryError {
    SentryError::Upstream {
        operation: operation.into(),
        details: err.to_string(),
    }
}

impl FolderSource for SyncthingClient {
    fn folders(&self) -> Result<Vec<Folder>> {
        let entries: Vec<FolderEntry> = self
            .get("/rest/config/folders", &[])?
            .json()
            .map_err(|err| upstream("/rest/config/folders", err))?;
        debug!(count = entries.len(), "Folder config fetched");
        Ok(entries
            .into_iter()
            .map(|entry| Folder::new(entry.id, entry.label))
            .collect())
    }
}

impl ActivityProber for SyncthingClient {
    fn last_modified(&self, folder_id: &str) -> Result<Option<DateTime<Utc>>> {
        let entries: Vec<BrowseEntry> = self
            .get("/rest/db/browse", &[("folder", folder_id)])?
            .json()
            .map_err(|err| upstream(format!("/rest/db/browse folder={folder_id}"), err))?;
        Ok(most_recent_mod_time(&entries))
    }
}

/// Maximum parseable `modTime` across the folder's entries.
fn most_recent_mod_time(entries: &[BrowseEntry]) -> Option<DateTime<Utc>> {
    entries
        .iter()
        .filter_map(|entry| entry.mod_time.as_deref())
        .filter_map(parse_mod_time)
        .max()
}

/// UTC conversion happens here, at the prober boundary; everything past
/// this point compares like with like.
fn parse_mod_time(raw: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => Some(parsed.with_timezone(&Utc)),
        Err(err) => {
            warn!(raw, error = %err, "Unparsable modTime; ignoring entry");
            None
        }
    }
}

//! Push dispatch via a Gotify server.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::json;

use syncsentry_core::{GotifyConfig, Notifier, Report, Result, SentryError};

const DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);
const PRIORITY: u8 = 5;

pub struct GotifyNotifier {
    config: GotifyConfig,
}

impl GotifyNotifier {
    pub fn new(config: GotifyConfig) -> Self {
        Self { config }
    }
}

fn dispatch_err(details: impl ToString) -> SentryError {
    SentryError::Dispatch {
        channel: "gotify",
        details: details.to_string(),
    }
}

impl Notifier for GotifyNotifier {
    fn channel(&self) -> &'static str {
        "gotify"
    }

    fn notify(&self, report: &Report) -> Result<()> {
        let client = Client::builder()
            .timeout(DISPATCH_TIMEOUT)
            .build()
            .map_err(dispatch_err)?;

        client
            .post(format!("{}/message", self.config.url.trim_end_matches('/')))
            .header("X-Gotify-Key", &self.config.token)
            .json(&json!({
                "message": super::summary(report),
                "priority": PRIORITY,
            }))
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(dispatch_err)?;
        Ok(())
    }
}

//! Chat dispatch via a Discord webhook.

use std::time::Duration;

use reqwest::blocking::Client;
use serde_json::{json, Value};

use syncsentry_core::{DiscordConfig, Notifier, Report, Result, SentryError};

const DISPATCH_TIMEOUT: Duration = Duration::from_secs(30);

pub struct DiscordNotifier {
    config: DiscordConfig,
}

impl DiscordNotifier {
    pub fn new(config: DiscordConfig) -> Self {
        Self { config }
    }
}

fn dispatch_err(details: impl ToString) -> SentryError {
    SentryError::Dispatch {
        channel: "discord",
        details: details.to_string(),
    }
}

fn payload(report: &Report) -> Value {
    json!({
        "content": "Syncthing Daily Report:",
        "embeds": [{
            "title": "Stats",
            "fields": [
                { "name": "Sync folders", "value": report.total_folders.to_string() },
                { "name": "Inactive folders", "value": report.inactive_folders_count.to_string() },
            ],
        }],
    })
}

impl Notifier for DiscordNotifier {
    fn channel(&self) -> &'static str {
        "discord"
    }

    fn notify(&self, report: &Report) -> Result<()> {
        let client = Client::builder()
            .timeout(DISPATCH_TIMEOUT)
            .build()
            .map_err(dispatch_err)?;

        client
            .post(&self.config.webhook_url)
            .json(&payload(report))
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(dispatch_err)?;
        Ok(())
    }
}

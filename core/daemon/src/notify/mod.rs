//! Outbound notification channels.
//!
//! Every enabled channel receives the same report and fails in isolation:
//! the pass logs per-channel errors and carries on with the rest.

mod discord;
mod email;
mod gotify;

pub use discord::DiscordNotifier;
pub use email::EmailNotifier;
pub use gotify::GotifyNotifier;

use syncsentry_core::{Config, Notifier, Report};

/// Builds the set of enabled channels, in a fixed dispatch order.
pub fn build(config: &Config) -> Vec<Box<dyn Notifier>> {
    let mut notifiers: Vec<Box<dyn Notifier>> = Vec::new();
    if let Some(smtp) = &config.smtp {
        notifiers.push(Box::new(EmailNotifier::new(smtp.clone())));
    }
    if let Some(gotify) = &config.gotify {
        notifiers.push(Box::new(GotifyNotifier::new(gotify.clone())));
    }
    if let Some(discord) = &config.discord {
        notifiers.push(Box::new(DiscordNotifier::new(discord.clone())));
    }
    notifiers
}

/// Plain-text summary shared by the mail and push channels.
fn summary(report: &Report) -> String {
    format!(
        "Syncthing Daily Report:\n- Sync folders: {}\n- Inactive folders: {}",
        report.total_folders, report.inactive_folders_count
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use syncsentry_core::build_report;

    fn report() -> Report {
        build_report(
            12,
            vec![],
            Utc.with_ymd_and_hms(2026, 6, 1, 8, 0, 0).unwrap(),
        )
    }

    #[test]
    fn summary_carries_both_counts() {
        let text = summary(&report());
        assert!(text.contains("Sync folders: 12"));
        assert!(text.contains("Inactive folders: 0"));
    }

    #[test]
    fn build_returns_only_enabled_channels() {
        let config = Config::from_lookup(|name| {
            match name {
                "SYNCTHING_URL" => Some("http://syncthing:8384"),
                "SYNCTHING_API_KEY" => Some("key"),
                "SYNCTHING_DAYS_INACTIVE" => Some("30"),
                "GOTIFY_ENABLE" => Some("true"),
                "GOTIFY_URL" => Some("http://gotify"),
                "GOTIFY_TOKEN" => Some("token"),
                _ => None,
            }
            .map(String::from)
        })
        .unwrap();

        let notifiers = build(&config);
        assert_eq!(notifiers.len(), 1);
        assert_eq!(notifiers[0].channel(), "gotify");
    }
}

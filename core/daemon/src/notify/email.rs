//! Mail dispatch over SMTP with STARTTLS.

use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

use syncsentry_core::{Notifier, Report, Result, SentryError, SmtpConfig};

const SUBJECT: &str = "Syncthing Daily Report";

pub struct EmailNotifier {
    config: SmtpConfig,
}

impl EmailNotifier {
    pub fn new(config: SmtpConfig) -> Self {
        Self { config }
    }
}

fn dispatch_err(details: impl ToString) -> SentryError {
    SentryError::Dispatch {
        channel: "email",
        details: details.to_string(),
    }
}

fn body(report: &Report) -> Result<String> {
    let list = serde_json::to_string_pretty(&report.inactive_folders).map_err(dispatch_err)?;
    Ok(format!("{}\n- List:\n{}\n", super::summary(report), list))
}

impl Notifier for EmailNotifier {
    fn channel(&self) -> &'static str {
        "email"
    }

    fn notify(&self, report: &Report) -> Result<()> {
        let message = Message::builder()
            .from(self.config.sender.parse().map_err(dispatch_err)?)
            .to(self.config.receiver.parse().map_err(dispatch_err)?)
            .subject(SUBJECT)
            .date_now()
            .header(ContentType::TEXT_PLAIN)
            .body(body(report)?)
            .map_err(dispatch_err)?;

        let transport = SmtpTransport::starttls_relay(&self.config.server)
            .map_err(dispatch_err)?
            .port(self.config.port)
            .credentials(Credentials::new(
                self.config.username.clone(),
                self.config.password.clone(),
            ))
            .build();

        transport.send(&message).map_err(dispatch_err)?;
        Ok(())
    }
}

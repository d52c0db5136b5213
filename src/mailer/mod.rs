//! Notification dispatcher.
//!
//! Renders and sends the three transactional messages (recipient notified,
//! sender confirmed, sender notified of download) plus the admin test
//! message. SMTP settings live in a small JSON document that is re-read
//! before every send, so saved changes apply immediately.
//!
//! Dispatch is blocking network I/O; async callers wrap the send methods in
//! `tokio::task::spawn_blocking`. Notification failures are surfaced as
//! booleans and never abort the calling pipeline.

pub mod template;

use std::path::{Path, PathBuf};

use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};
use serde::{Deserialize, Serialize};

use crate::datetime::format_for_mail;
use crate::db::TransferRecord;
use crate::{Result, TransferError};

/// Durable SMTP settings document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailSettings {
    /// SMTP server hostname.
    pub smtp_server: String,
    /// SMTP server port. 465 selects implicit TLS, anything else STARTTLS.
    pub smtp_port: u16,
    /// SMTP username.
    pub smtp_user: String,
    /// SMTP password.
    pub smtp_password: String,
    /// Sender address shown on outgoing mail.
    pub smtp_sender_email: String,
}

impl MailSettings {
    /// Load settings from the JSON document, `None` when not yet configured.
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        let settings =
            serde_json::from_str(&content).map_err(|e| TransferError::Config(e.to_string()))?;
        Ok(Some(settings))
    }

    /// Persist settings to the JSON document, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let content =
            serde_json::to_string_pretty(self).map_err(|e| TransferError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

/// Renders and dispatches transactional email.
#[derive(Debug, Clone)]
pub struct Mailer {
    settings_path: PathBuf,
    timezone: String,
}

impl Mailer {
    /// Create a new Mailer.
    pub fn new(settings_path: impl Into<PathBuf>, timezone: impl Into<String>) -> Self {
        Self {
            settings_path: settings_path.into(),
            timezone: timezone.into(),
        }
    }

    /// Path of the SMTP settings document.
    pub fn settings_path(&self) -> &Path {
        &self.settings_path
    }

    /// Notify the recipient that files are waiting for them.
    ///
    /// Returns false on any failure; the caller records it as a warning.
    pub fn send_recipient_notification(&self, record: &TransferRecord, download_link: &str) -> bool {
        let expiry = format_for_mail(&record.expires_at, &self.timezone);
        let (text, html) = template::render(
            "You have received files",
            &format!(
                "{} sent you files. Use the link below to access the download page.<br><br>This link expires on {}.",
                record.sender_email, expiry
            ),
            &template::files_summary(&record.manifest),
            &template::total_size(&record.manifest),
            Some(download_link),
        );

        self.try_send(
            &record.recipient_email,
            &format!("{} is sending you files", record.sender_email),
            text,
            html,
        )
    }

    /// Confirm to the sender that the upload went through.
    pub fn send_sender_confirmation(&self, record: &TransferRecord, download_link: &str) -> bool {
        let (text, html) = template::render(
            "Your files have been sent",
            &format!(
                "Your files were sent to {}.<br><br>The download page is available at: {}",
                record.recipient_email, download_link
            ),
            &template::files_summary(&record.manifest),
            &template::total_size(&record.manifest),
            None,
        );

        self.try_send(
            &record.sender_email,
            &format!("Transfer confirmation for {}", record.recipient_email),
            text,
            html,
        )
    }

    /// Tell the sender their files were downloaded.
    pub fn send_download_notification(&self, record: &TransferRecord) -> bool {
        let downloaded_at = format_for_mail(&chrono::Utc::now(), &self.timezone);
        let (text, html) = template::render(
            "Your files have been downloaded",
            &format!("Your files were downloaded on {downloaded_at}."),
            &template::files_summary(&record.manifest),
            &template::total_size(&record.manifest),
            None,
        );

        self.try_send(
            &record.sender_email,
            "Your files have been downloaded",
            text,
            html,
        )
    }

    /// Send a fixed test message to the configured sender address.
    ///
    /// Unlike the notification methods this propagates errors, so the
    /// settings endpoint can distinguish "unconfigured" from "send failed".
    pub fn send_test_message(&self) -> Result<()> {
        let settings = MailSettings::load(&self.settings_path)?
            .ok_or_else(|| TransferError::NotFound("SMTP configuration".to_string()))?;

        let (text, html) = template::render(
            "SMTP configuration test",
            "This is a test message to verify the SMTP configuration. \
             If you received it, the configuration works.",
            "",
            "0.00 B",
            None,
        );

        self.dispatch(
            &settings,
            &settings.smtp_sender_email,
            "SMTP configuration test",
            text,
            html,
        )
    }

    /// Send one message, logging and swallowing any failure.
    fn try_send(&self, to: &str, subject: &str, text: String, html: String) -> bool {
        let settings = match MailSettings::load(&self.settings_path) {
            Ok(Some(settings)) => settings,
            Ok(None) => {
                tracing::error!("Cannot send mail to {}: SMTP is not configured", to);
                return false;
            }
            Err(e) => {
                tracing::error!("Cannot read SMTP settings: {}", e);
                return false;
            }
        };

        match self.dispatch(&settings, to, subject, text, html) {
            Ok(()) => {
                tracing::info!("Sent \"{}\" to {}", subject, to);
                true
            }
            Err(e) => {
                tracing::error!("Failed to send \"{}\" to {}: {}", subject, to, e);
                false
            }
        }
    }

    /// Build the transport and hand one message to SMTP.
    fn dispatch(
        &self,
        settings: &MailSettings,
        to: &str,
        subject: &str,
        text: String,
        html: String,
    ) -> Result<()> {
        let from_address = settings
            .smtp_sender_email
            .parse()
            .map_err(|e| TransferError::Mail(format!("invalid sender address: {e}")))?;
        let to_mailbox: Mailbox = to
            .parse()
            .map_err(|e| TransferError::Mail(format!("invalid recipient address: {e}")))?;

        let message = Message::builder()
            .from(Mailbox::new(Some("iTransfer".to_string()), from_address))
            .to(to_mailbox)
            .subject(subject)
            .multipart(MultiPart::alternative_plain_html(text, html))
            .map_err(|e| TransferError::Mail(e.to_string()))?;

        // Port 465 means implicit TLS, any other port upgrades via STARTTLS
        let builder = if settings.smtp_port == 465 {
            SmtpTransport::relay(&settings.smtp_server)
        } else {
            SmtpTransport::starttls_relay(&settings.smtp_server)
        }
        .map_err(|e| TransferError::Mail(e.to_string()))?;

        let transport = builder
            .port(settings.smtp_port)
            .credentials(Credentials::new(
                settings.smtp_user.clone(),
                settings.smtp_password.clone(),
            ))
            .build();

        transport
            .send(&message)
            .map_err(|e| TransferError::Mail(e.to_string()))?;

        Ok(())
    }
}

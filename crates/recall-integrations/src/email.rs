//! Reminder notification delivery.
//!
//! [`ResendNotifier`] posts to a Resend-compatible `/emails` endpoint.
//! [`LogNotifier`] only logs and is selected when no API key is configured.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};

use recall_core::{defaults, Error, NotificationSender, ReminderEmail, Result};

/// Configuration for [`ResendNotifier`].
#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: String,
    /// Base URL without the `/emails` path.
    pub api_url: String,
    /// `From` header, e.g. `Memory <reminders@resend.dev>`.
    pub from: String,
    pub timeout: Duration,
}

impl ResendConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_url: defaults::RESEND_API_URL.to_string(),
            from: defaults::REMINDER_FROM_ADDRESS.to_string(),
            timeout: Duration::from_secs(defaults::EMAIL_TIMEOUT_SECS),
        }
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    pub fn with_from(mut self, from: impl Into<String>) -> Self {
        self.from = from.into();
        self
    }
}

#[derive(Serialize)]
struct SendEmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    html: String,
}

/// Subject line of a reminder email.
pub fn reminder_subject(email: &ReminderEmail) -> String {
    format!(
        "🔔 Reminder: {}",
        email.bookmark_title.as_deref().unwrap_or("Your saved link")
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// HTML body of a reminder email. User-supplied text is escaped.
pub fn reminder_html(email: &ReminderEmail) -> String {
    let title = escape_html(email.bookmark_title.as_deref().unwrap_or("Untitled"));
    let url = escape_html(&email.bookmark_url);
    let message = email
        .message
        .as_deref()
        .filter(|m| !m.trim().is_empty())
        .map(|m| {
            format!(
                r#"<p style="margin: 12px 0 0; color: #64748b; font-size: 14px;">{}</p>"#,
                escape_html(m)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="utf-8"></head>
<body style="margin: 0; padding: 0; background-color: #f8fafc; font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;">
  <div style="max-width: 480px; margin: 40px auto; padding: 32px; background: white; border-radius: 24px;">
    <h1 style="margin: 0 0 24px; font-size: 24px; color: #1e293b; text-align: center;">Time to revisit!</h1>
    <div style="background: #f8fafc; border-radius: 16px; padding: 20px; margin-bottom: 24px;">
      <p style="margin: 0 0 8px; font-size: 12px; text-transform: uppercase; color: #94a3b8;">Your saved link</p>
      <p style="margin: 0; font-size: 18px; font-weight: 600; color: #1e293b;">{title}</p>
      {message}
    </div>
    <a href="{url}" style="display: block; text-align: center; background: #6366f1; color: white; padding: 16px 24px; border-radius: 12px; text-decoration: none; font-weight: 600;">Open Link</a>
  </div>
</body>
</html>"#
    )
}

/// Sends reminder emails through the Resend HTTP API.
pub struct ResendNotifier {
    client: reqwest::Client,
    config: ResendConfig,
}

impl ResendNotifier {
    pub fn new(config: ResendConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }
}

#[async_trait]
impl NotificationSender for ResendNotifier {
    async fn send_reminder(&self, email: &ReminderEmail) -> Result<()> {
        let body = SendEmailBody {
            from: &self.config.from,
            to: [email.to.as_str()],
            subject: reminder_subject(email),
            html: reminder_html(email),
        };
        let endpoint = format!("{}/emails", self.config.api_url.trim_end_matches('/'));

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Notification(format!("Email request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(
                subsystem = "integrations",
                component = "email",
                status = status.as_u16(),
                "Email provider rejected reminder"
            );
            return Err(Error::Notification(format!(
                "Email provider returned {}: {}",
                status,
                detail.chars().take(200).collect::<String>()
            )));
        }

        info!(
            subsystem = "integrations",
            component = "email",
            op = "send",
            "Reminder email sent"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "resend"
    }
}

/// Logs reminders instead of sending them.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSender for LogNotifier {
    async fn send_reminder(&self, email: &ReminderEmail) -> Result<()> {
        info!(
            subsystem = "integrations",
            component = "email",
            op = "send",
            to = %email.to,
            bookmark = %email.bookmark_title.as_deref().unwrap_or(&email.bookmark_url),
            "Email delivery not configured; reminder logged only"
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "log"
    }
}

/// Pick the sender from `RESEND_API_KEY`, `RESEND_API_URL` and
/// `REMINDER_FROM_ADDRESS`. Without an API key reminders are only logged.
pub fn notifier_from_env() -> Result<Arc<dyn NotificationSender>> {
    let api_key = std::env::var("RESEND_API_KEY")
        .ok()
        .filter(|k| !k.trim().is_empty());
    let Some(api_key) = api_key else {
        warn!(
            subsystem = "integrations",
            component = "email",
            "RESEND_API_KEY not set; reminder emails will only be logged"
        );
        return Ok(Arc::new(LogNotifier));
    };

    let mut config = ResendConfig::new(api_key);
    if let Ok(url) = std::env::var("RESEND_API_URL") {
        config = config.with_api_url(url);
    }
    if let Ok(from) = std::env::var("REMINDER_FROM_ADDRESS") {
        config = config.with_from(from);
    }
    Ok(Arc::new(ResendNotifier::new(config)?))
}

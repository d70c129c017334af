//! Reminder sweep: claim due reminders, notify, record outcomes, purge.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use tracing::{error, info, warn};

use recall_core::{
    defaults, DueReminder, NotificationSender, ReminderEmail, ReminderRepository, Result,
    SweepItem, SweepOutcome, SweepReport,
};

/// Timing parameters of a sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Completed reminders older than this are deleted.
    pub retention: Duration,
    /// A `PROCESSING` claim older than this is considered abandoned.
    pub claim_lease: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            retention: Duration::days(defaults::REMINDER_RETENTION_DAYS),
            claim_lease: Duration::seconds(defaults::REMINDER_CLAIM_LEASE_SECS),
        }
    }
}

/// Runs reminder sweeps against a repository and a notification sender.
#[derive(Clone)]
pub struct ReminderSweeper {
    reminders: Arc<dyn ReminderRepository>,
    sender: Arc<dyn NotificationSender>,
    config: SweepConfig,
}

impl ReminderSweeper {
    pub fn new(reminders: Arc<dyn ReminderRepository>, sender: Arc<dyn NotificationSender>) -> Self {
        Self {
            reminders,
            sender,
            config: SweepConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SweepConfig) -> Self {
        self.config = config;
        self
    }

    /// Run one sweep as of `now`.
    ///
    /// Each claimed reminder is handled independently; a failed send or a
    /// failed status write only affects that reminder's entry in the report.
    /// Only a failed claim aborts the sweep.
    pub async fn sweep(&self, now: DateTime<Utc>) -> Result<SweepReport> {
        let start = Instant::now();
        let claimed = self
            .reminders
            .claim_due(now, now - self.config.claim_lease)
            .await?;

        let mut results = Vec::with_capacity(claimed.len());
        for due in &claimed {
            results.push(self.deliver(due, now).await);
        }

        let cutoff = now - self.config.retention;
        let cleaned = match self.reminders.purge_completed_before(cutoff).await {
            Ok(n) => n,
            Err(e) => {
                error!(
                    subsystem = "jobs",
                    component = "reminder_sweep",
                    op = "purge",
                    error = %e,
                    "Failed to purge completed reminders"
                );
                0
            }
        };

        let report = SweepReport {
            processed: claimed.len(),
            results,
            cleaned,
            timestamp: now,
        };

        info!(
            subsystem = "jobs",
            component = "reminder_sweep",
            op = "sweep",
            sender = self.sender.name(),
            result_count = report.processed,
            sent = report.sent_count(),
            failed = report.failed_count(),
            cleaned = report.cleaned,
            duration_ms = start.elapsed().as_millis() as u64,
            "Reminder sweep finished"
        );
        Ok(report)
    }

    async fn deliver(&self, due: &DueReminder, now: DateTime<Utc>) -> SweepItem {
        let email = ReminderEmail::from(due);

        match self.sender.send_reminder(&email).await {
            Ok(()) => match self.reminders.mark_completed(due.id, now).await {
                Ok(()) => SweepItem {
                    id: due.id,
                    status: SweepOutcome::Sent,
                    email: Some(email.to),
                    error: None,
                },
                Err(e) => {
                    error!(
                        subsystem = "jobs",
                        component = "reminder_sweep",
                        reminder_id = %due.id,
                        error = %e,
                        "Reminder sent but completion could not be recorded"
                    );
                    SweepItem {
                        id: due.id,
                        status: SweepOutcome::Failed,
                        email: Some(email.to),
                        error: Some(format!("Failed to record delivery: {}", e)),
                    }
                }
            },
            Err(send_err) => {
                warn!(
                    subsystem = "jobs",
                    component = "reminder_sweep",
                    reminder_id = %due.id,
                    error = %send_err,
                    "Reminder delivery failed"
                );
                if let Err(e) = self.reminders.mark_failed(due.id, now).await {
                    error!(
                        subsystem = "jobs",
                        component = "reminder_sweep",
                        reminder_id = %due.id,
                        error = %e,
                        "Failed to record reminder failure"
                    );
                }
                SweepItem {
                    id: due.id,
                    status: SweepOutcome::Failed,
                    email: None,
                    error: Some(send_err.to_string()),
                }
            }
        }
    }
}

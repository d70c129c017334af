//! Reminder repository implementation.
//!
//! Sweeps claim due reminders with `FOR UPDATE SKIP LOCKED`, so concurrent
//! sweeps (HTTP trigger, interval worker, other instances) never hand the
//! same reminder to two senders. The claim time is stored in `updated_at`;
//! a `PROCESSING` row whose claim is older than the lease is claimable again.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use recall_core::{
    new_v7, BookmarkSummary, DueReminder, Error, Reminder, ReminderRepository, ReminderStatus,
    ReminderWithBookmark, Result, UpsertReminderRequest,
};

use crate::rows::reminder_from_row;

/// PostgreSQL implementation of ReminderRepository.
pub struct PgReminderRepository {
    pool: Pool<Postgres>,
}

impl PgReminderRepository {
    /// Create a new PgReminderRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn finish(&self, id: Uuid, status: ReminderStatus, at: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query(
            "UPDATE reminder SET status = $2, updated_at = $3
             WHERE id = $1 AND status = $4",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(at)
        .bind(ReminderStatus::Processing.as_str())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            // Rescheduled by its owner or deleted while the send was in flight.
            debug!(
                subsystem = "database",
                component = "reminders",
                reminder_id = %id,
                status = status.as_str(),
                "Reminder no longer claimed; outcome not recorded"
            );
        }
        Ok(())
    }
}

#[async_trait]
impl ReminderRepository for PgReminderRepository {
    async fn upsert(&self, req: UpsertReminderRequest) -> Result<Reminder> {
        let now = Utc::now();
        let row = sqlx::query(
            r#"
            INSERT INTO reminder (id, bookmark_id, scheduled_at, message, status, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $6)
            ON CONFLICT (bookmark_id) DO UPDATE SET
                scheduled_at = EXCLUDED.scheduled_at,
                message      = EXCLUDED.message,
                status       = EXCLUDED.status,
                updated_at   = EXCLUDED.updated_at
            RETURNING id, bookmark_id, scheduled_at, message, status, created_at, updated_at
            "#,
        )
        .bind(new_v7())
        .bind(req.bookmark_id)
        .bind(req.scheduled_at)
        .bind(&req.message)
        .bind(ReminderStatus::Pending.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        reminder_from_row(&row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Reminder>> {
        let row = sqlx::query(
            "SELECT id, bookmark_id, scheduled_at, message, status, created_at, updated_at
             FROM reminder WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(reminder_from_row).transpose()
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ReminderWithBookmark>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.bookmark_id, r.scheduled_at, r.message, r.status,
                   r.created_at, r.updated_at,
                   b.url AS b_url, b.domain AS b_domain, b.title AS b_title,
                   b.favicon_url AS b_favicon_url
            FROM reminder r
            JOIN bookmark b ON b.id = r.bookmark_id
            WHERE b.user_id = $1
            ORDER BY r.scheduled_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter()
            .map(|row| {
                let reminder = reminder_from_row(row)?;
                Ok(ReminderWithBookmark {
                    bookmark: BookmarkSummary {
                        id: reminder.bookmark_id,
                        url: row.get("b_url"),
                        domain: row.get("b_domain"),
                        title: row.get("b_title"),
                        favicon_url: row.get("b_favicon_url"),
                    },
                    reminder,
                })
            })
            .collect()
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease_expired_before: DateTime<Utc>,
    ) -> Result<Vec<DueReminder>> {
        let rows = sqlx::query(
            r#"
            WITH due AS (
                SELECT id FROM reminder
                WHERE (status = 'PENDING' AND scheduled_at <= $1)
                   OR (status = 'PROCESSING' AND updated_at < $2)
                ORDER BY scheduled_at
                FOR UPDATE SKIP LOCKED
            )
            UPDATE reminder r
            SET status = 'PROCESSING', updated_at = $1
            FROM due, bookmark b, app_user u
            WHERE r.id = due.id AND b.id = r.bookmark_id AND u.id = b.user_id
            RETURNING r.id, r.bookmark_id, r.scheduled_at, r.message,
                      b.title AS bookmark_title, b.url AS bookmark_url, u.email AS user_email
            "#,
        )
        .bind(now)
        .bind(lease_expired_before)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut claimed: Vec<DueReminder> = rows
            .into_iter()
            .map(|row| DueReminder {
                id: row.get("id"),
                bookmark_id: row.get("bookmark_id"),
                scheduled_at: row.get("scheduled_at"),
                message: row.get("message"),
                bookmark_title: row.get("bookmark_title"),
                bookmark_url: row.get("bookmark_url"),
                user_email: row.get("user_email"),
            })
            .collect();
        claimed.sort_by_key(|r| r.scheduled_at);
        Ok(claimed)
    }

    async fn mark_completed(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        self.finish(id, ReminderStatus::Completed, at).await
    }

    async fn mark_failed(&self, id: Uuid, at: DateTime<Utc>) -> Result<()> {
        self.finish(id, ReminderStatus::Failed, at).await
    }

    async fn purge_completed_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM reminder WHERE status = $1 AND updated_at < $2")
            .bind(ReminderStatus::Completed.as_str())
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}

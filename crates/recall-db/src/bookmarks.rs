//! Bookmark repository implementation.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::debug;
use uuid::Uuid;

use recall_core::{
    new_v7, Bookmark, BookmarkRepository, BookmarkStatus, CreateBookmarkRequest, Error,
    ListBookmarksFilter, Reminder, ReminderStatus, Result, Tag, UpdateBookmarkRequest,
};

use crate::escape_like;
use crate::rows::{joined_reminder, parse_enum, tag_from_row};

const BOOKMARK_COLUMNS: &str = r#"
    b.id, b.user_id, b.url, b.domain, b.title, b.favicon_url, b.note,
    b.is_favorite, b.is_pinned, b.is_read_later, b.status, b.position,
    b.created_at, b.updated_at,
    r.id AS r_id, r.scheduled_at AS r_scheduled_at, r.message AS r_message,
    r.status AS r_status, r.created_at AS r_created_at, r.updated_at AS r_updated_at
"#;

fn bookmark_from_row(row: &PgRow) -> Result<Bookmark> {
    let id: Uuid = row.get("id");
    Ok(Bookmark {
        id,
        user_id: row.get("user_id"),
        url: row.get("url"),
        domain: row.get("domain"),
        title: row.get("title"),
        favicon_url: row.get("favicon_url"),
        note: row.get("note"),
        is_favorite: row.get("is_favorite"),
        is_pinned: row.get("is_pinned"),
        is_read_later: row.get("is_read_later"),
        status: parse_enum(row, "status")?,
        position: row.get("position"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        tags: Vec::new(),
        reminder: joined_reminder(row, id)?,
    })
}

/// PostgreSQL implementation of BookmarkRepository.
pub struct PgBookmarkRepository {
    pool: Pool<Postgres>,
}

impl PgBookmarkRepository {
    /// Create a new PgBookmarkRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Load tags for a page of bookmarks with a single query.
    async fn attach_tags(&self, bookmarks: &mut [Bookmark]) -> Result<()> {
        if bookmarks.is_empty() {
            return Ok(());
        }
        let ids: Vec<Uuid> = bookmarks.iter().map(|b| b.id).collect();
        let rows = sqlx::query(
            r#"
            SELECT bt.bookmark_id, t.id, t.user_id, t.name, t.color, t.created_at
            FROM bookmark_tag bt
            JOIN tag t ON t.id = bt.tag_id
            WHERE bt.bookmark_id = ANY($1)
            ORDER BY t.name
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let mut by_bookmark: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for row in rows {
            let bookmark_id: Uuid = row.get("bookmark_id");
            by_bookmark
                .entry(bookmark_id)
                .or_default()
                .push(tag_from_row(&row));
        }
        for bookmark in bookmarks.iter_mut() {
            bookmark.tags = by_bookmark.remove(&bookmark.id).unwrap_or_default();
        }
        Ok(())
    }
}

#[async_trait]
impl BookmarkRepository for PgBookmarkRepository {
    async fn insert(&self, req: CreateBookmarkRequest) -> Result<Bookmark> {
        let id = new_v7();
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        sqlx::query(
            "INSERT INTO bookmark (id, user_id, url, domain, title, favicon_url, note, status, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)",
        )
        .bind(id)
        .bind(req.user_id)
        .bind(&req.url)
        .bind(&req.domain)
        .bind(&req.title)
        .bind(&req.favicon_url)
        .bind(&req.note)
        .bind(BookmarkStatus::Pending.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let reminder = match req.reminder_at {
            Some(scheduled_at) => {
                let reminder_id = new_v7();
                sqlx::query(
                    "INSERT INTO reminder (id, bookmark_id, scheduled_at, status, created_at, updated_at)
                     VALUES ($1, $2, $3, $4, $5, $5)",
                )
                .bind(reminder_id)
                .bind(id)
                .bind(scheduled_at)
                .bind(ReminderStatus::Pending.as_str())
                .bind(now)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;
                Some(Reminder {
                    id: reminder_id,
                    bookmark_id: id,
                    scheduled_at,
                    message: None,
                    status: ReminderStatus::Pending,
                    created_at: now,
                    updated_at: now,
                })
            }
            None => None,
        };

        tx.commit().await.map_err(Error::Database)?;

        debug!(
            subsystem = "database",
            component = "bookmarks",
            op = "insert",
            bookmark_id = %id,
            with_reminder = reminder.is_some(),
            "Bookmark created"
        );

        Ok(Bookmark {
            id,
            user_id: req.user_id,
            url: req.url,
            domain: req.domain,
            title: req.title,
            favicon_url: req.favicon_url,
            note: req.note,
            is_favorite: false,
            is_pinned: false,
            is_read_later: false,
            status: BookmarkStatus::Pending,
            position: 0,
            created_at: now,
            updated_at: now,
            tags: Vec::new(),
            reminder,
        })
    }

    async fn get(&self, id: Uuid, user_id: Uuid) -> Result<Option<Bookmark>> {
        let sql = format!(
            "SELECT {BOOKMARK_COLUMNS}
             FROM bookmark b
             LEFT JOIN reminder r ON r.bookmark_id = b.id
             WHERE b.id = $1 AND b.user_id = $2"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let mut bookmarks = vec![bookmark_from_row(&row)?];
        self.attach_tags(&mut bookmarks).await?;
        Ok(bookmarks.pop())
    }

    async fn list(&self, user_id: Uuid, filter: ListBookmarksFilter) -> Result<Vec<Bookmark>> {
        let pattern = filter
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(|q| format!("%{}%", escape_like(q)));

        let sql = format!(
            r#"
            SELECT {BOOKMARK_COLUMNS}
            FROM bookmark b
            LEFT JOIN reminder r ON r.bookmark_id = b.id
            WHERE b.user_id = $1
              AND ($2::text IS NULL OR b.status = $2)
              AND ($3::uuid IS NULL OR EXISTS (
                    SELECT 1 FROM bookmark_tag bt
                    WHERE bt.bookmark_id = b.id AND bt.tag_id = $3))
              AND ($4::text IS NULL
                    OR b.title ILIKE $4
                    OR b.url ILIKE $4
                    OR b.note ILIKE $4
                    OR b.domain ILIKE $4)
            ORDER BY b.position ASC, b.is_pinned DESC, b.is_favorite DESC, b.created_at DESC
            LIMIT $5
            "#
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.tag_id)
            .bind(pattern)
            .bind(filter.limit)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let mut bookmarks = rows
            .iter()
            .map(bookmark_from_row)
            .collect::<Result<Vec<_>>>()?;
        self.attach_tags(&mut bookmarks).await?;
        Ok(bookmarks)
    }

    async fn list_for_export(&self, user_id: Uuid) -> Result<Vec<Bookmark>> {
        let sql = format!(
            "SELECT {BOOKMARK_COLUMNS}
             FROM bookmark b
             LEFT JOIN reminder r ON r.bookmark_id = b.id
             WHERE b.user_id = $1
             ORDER BY b.created_at DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        let mut bookmarks = rows
            .iter()
            .map(bookmark_from_row)
            .collect::<Result<Vec<_>>>()?;
        self.attach_tags(&mut bookmarks).await?;
        Ok(bookmarks)
    }

    async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        req: UpdateBookmarkRequest,
    ) -> Result<Bookmark> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let (clear_or_set_note, note) = match req.note {
            Some(note) => (true, note),
            None => (false, None),
        };

        let updated = sqlx::query(
            r#"
            UPDATE bookmark SET
                is_favorite   = COALESCE($3, is_favorite),
                is_pinned     = COALESCE($4, is_pinned),
                is_read_later = COALESCE($5, is_read_later),
                status        = COALESCE($6, status),
                note          = CASE WHEN $7 THEN $8 ELSE note END,
                updated_at    = $9
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(req.is_favorite)
        .bind(req.is_pinned)
        .bind(req.is_read_later)
        .bind(req.status.map(|s| s.as_str()))
        .bind(clear_or_set_note)
        .bind(note)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if updated.rows_affected() == 0 {
            return Err(Error::NotFound(format!("Bookmark {} not found", id)));
        }

        if let Some(tag_ids) = req.tag_ids {
            sqlx::query("DELETE FROM bookmark_tag WHERE bookmark_id = $1")
                .bind(id)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;

            // Tags owned by someone else are silently skipped.
            sqlx::query(
                "INSERT INTO bookmark_tag (bookmark_id, tag_id)
                 SELECT $1, t.id FROM tag t WHERE t.id = ANY($2) AND t.user_id = $3
                 ON CONFLICT DO NOTHING",
            )
            .bind(id)
            .bind(&tag_ids)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;

        self.get(id, user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Bookmark {} not found", id)))
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM bookmark WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn reorder(&self, user_id: Uuid, ordered_ids: &[Uuid]) -> Result<()> {
        let unique: HashSet<&Uuid> = ordered_ids.iter().collect();
        if unique.len() != ordered_ids.len() {
            return Err(Error::InvalidInput(
                "bookmarkIds must not contain duplicates".to_string(),
            ));
        }
        if ordered_ids.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let owned: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookmark WHERE user_id = $1 AND id = ANY($2)",
        )
        .bind(user_id)
        .bind(ordered_ids)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if owned != ordered_ids.len() as i64 {
            // Dropping the transaction rolls it back; nothing was written.
            return Err(Error::NotFound(
                "One or more bookmarks not found".to_string(),
            ));
        }

        let positions: Vec<i32> = (0..ordered_ids.len() as i32).collect();
        sqlx::query(
            r#"
            UPDATE bookmark SET position = v.position, updated_at = $3
            FROM UNNEST($1::uuid[], $2::int4[]) AS v(id, position)
            WHERE bookmark.id = v.id AND bookmark.user_id = $4
            "#,
        )
        .bind(ordered_ids)
        .bind(&positions)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }
}

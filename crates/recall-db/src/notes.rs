//! Note repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use recall_core::{
    new_v7, CreateNoteRequest, Error, Note, NoteRepository, Result, UpdateNoteRequest,
};

fn note_from_row(row: &PgRow) -> Note {
    Note {
        id: row.get("id"),
        user_id: row.get("user_id"),
        room_id: row.get("room_id"),
        title: row.get("title"),
        content: row.get("content"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        author_name: row
            .try_get::<Option<String>, _>("author_name")
            .ok()
            .flatten(),
    }
}

/// PostgreSQL implementation of NoteRepository.
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn insert(&self, req: CreateNoteRequest) -> Result<Note> {
        let now = Utc::now();
        let row = sqlx::query(
            "INSERT INTO note (id, user_id, room_id, title, content, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)
             RETURNING id, user_id, room_id, title, content, created_at, updated_at",
        )
        .bind(new_v7())
        .bind(req.user_id)
        .bind(req.room_id)
        .bind(&req.title)
        .bind(&req.content)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(note_from_row(&row))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Note>> {
        let row = sqlx::query(
            "SELECT id, user_id, room_id, title, content, created_at, updated_at
             FROM note WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(note_from_row))
    }

    async fn list_personal(&self, user_id: Uuid) -> Result<Vec<Note>> {
        let rows = sqlx::query(
            r#"
            SELECT n.id, n.user_id, n.room_id, n.title, n.content, n.created_at, n.updated_at,
                   u.name AS author_name
            FROM note n
            JOIN app_user u ON u.id = n.user_id
            WHERE n.user_id = $1 AND n.room_id IS NULL
            ORDER BY n.updated_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(note_from_row).collect())
    }

    async fn list_for_room(&self, room_id: Uuid) -> Result<Vec<Note>> {
        let rows = sqlx::query(
            r#"
            SELECT n.id, n.user_id, n.room_id, n.title, n.content, n.created_at, n.updated_at,
                   u.name AS author_name
            FROM note n
            JOIN app_user u ON u.id = n.user_id
            WHERE n.room_id = $1
            ORDER BY n.updated_at DESC
            "#,
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(note_from_row).collect())
    }

    async fn update(&self, id: Uuid, req: UpdateNoteRequest) -> Result<Note> {
        let (set_title, title) = match req.title {
            Some(title) => (true, title),
            None => (false, None),
        };

        let row = sqlx::query(
            r#"
            UPDATE note SET
                title      = CASE WHEN $2 THEN $3 ELSE title END,
                content    = COALESCE($4, content),
                updated_at = $5
            WHERE id = $1
            RETURNING id, user_id, room_id, title, content, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(set_title)
        .bind(title)
        .bind(&req.content)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref()
            .map(note_from_row)
            .ok_or_else(|| Error::NotFound(format!("Note {} not found", id)))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM note WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }
}

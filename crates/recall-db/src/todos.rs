//! Todo repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use recall_core::{
    new_v7, CreateTodoRequest, Error, Result, Todo, TodoRepository, UpdateTodoRequest,
};

fn todo_from_row(row: &PgRow) -> Todo {
    Todo {
        id: row.get("id"),
        user_id: row.get("user_id"),
        room_id: row.get("room_id"),
        task: row.get("task"),
        is_done: row.get("is_done"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        author_name: row
            .try_get::<Option<String>, _>("author_name")
            .ok()
            .flatten(),
    }
}

const TODO_LIST_SQL: &str = r#"
    SELECT t.id, t.user_id, t.room_id, t.task, t.is_done, t.created_at, t.updated_at,
           u.name AS author_name
    FROM todo t
    JOIN app_user u ON u.id = t.user_id
"#;

/// PostgreSQL implementation of TodoRepository.
pub struct PgTodoRepository {
    pool: Pool<Postgres>,
}

impl PgTodoRepository {
    /// Create a new PgTodoRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TodoRepository for PgTodoRepository {
    async fn insert(&self, req: CreateTodoRequest) -> Result<Todo> {
        let now = Utc::now();
        let row = sqlx::query(
            "INSERT INTO todo (id, user_id, room_id, task, is_done, created_at, updated_at)
             VALUES ($1, $2, $3, $4, FALSE, $5, $5)
             RETURNING id, user_id, room_id, task, is_done, created_at, updated_at",
        )
        .bind(new_v7())
        .bind(req.user_id)
        .bind(req.room_id)
        .bind(&req.task)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(todo_from_row(&row))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Todo>> {
        let row = sqlx::query(
            "SELECT id, user_id, room_id, task, is_done, created_at, updated_at
             FROM todo WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(todo_from_row))
    }

    async fn list_personal(&self, user_id: Uuid) -> Result<Vec<Todo>> {
        let sql =
            format!("{TODO_LIST_SQL} WHERE t.user_id = $1 AND t.room_id IS NULL ORDER BY t.created_at DESC");
        let rows = sqlx::query(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.iter().map(todo_from_row).collect())
    }

    async fn list_for_room(&self, room_id: Uuid) -> Result<Vec<Todo>> {
        let sql = format!("{TODO_LIST_SQL} WHERE t.room_id = $1 ORDER BY t.created_at DESC");
        let rows = sqlx::query(&sql)
            .bind(room_id)
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.iter().map(todo_from_row).collect())
    }

    async fn update(&self, id: Uuid, req: UpdateTodoRequest) -> Result<Todo> {
        let row = sqlx::query(
            r#"
            UPDATE todo SET
                task       = COALESCE($2, task),
                is_done    = COALESCE($3, is_done),
                updated_at = $4
            WHERE id = $1
            RETURNING id, user_id, room_id, task, is_done, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&req.task)
        .bind(req.is_done)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref()
            .map(todo_from_row)
            .ok_or_else(|| Error::NotFound(format!("Todo {} not found", id)))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM todo WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }
}

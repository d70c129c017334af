//! Tag repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use recall_core::{defaults, new_v7, Error, Result, Tag, TagRepository};

use crate::rows::tag_from_row;

/// Validate a tag name: non-blank and at most [`defaults::TAG_NAME_MAX_LEN`] characters.
pub fn validate_tag_name(name: &str) -> std::result::Result<(), String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err("Tag name cannot be empty".to_string());
    }
    if trimmed.chars().count() > defaults::TAG_NAME_MAX_LEN {
        return Err(format!(
            "Tag name must be {} characters or less",
            defaults::TAG_NAME_MAX_LEN
        ));
    }
    Ok(())
}

/// PostgreSQL implementation of TagRepository.
pub struct PgTagRepository {
    pool: Pool<Postgres>,
}

impl PgTagRepository {
    /// Create a new PgTagRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn list(&self, user_id: Uuid) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            "SELECT id, user_id, name, color, created_at FROM tag
             WHERE user_id = $1 ORDER BY name ASC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(tag_from_row).collect())
    }

    async fn create(&self, user_id: Uuid, name: &str, color: Option<&str>) -> Result<Tag> {
        validate_tag_name(name).map_err(Error::InvalidInput)?;

        let row = sqlx::query(
            "INSERT INTO tag (id, user_id, name, color, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, user_id, name, color, created_at",
        )
        .bind(new_v7())
        .bind(user_id)
        .bind(name.trim())
        .bind(color)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(tag_from_row(&row))
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tag WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_tag_name() {
        assert!(validate_tag_name("reading").is_ok());
        assert!(validate_tag_name("  ").is_err());
        assert!(validate_tag_name(&"x".repeat(defaults::TAG_NAME_MAX_LEN + 1)).is_err());
    }
}

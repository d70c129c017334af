//! User and session repository implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use uuid::Uuid;

use recall_core::{
    new_v7, Error, NewUser, Principal, Result, SessionRepository, User, UserCredentials,
    UserRepository,
};

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        email: row.get("email"),
        name: row.get("name"),
        created_at: row.get("created_at"),
    }
}

/// PostgreSQL implementation of UserRepository.
pub struct PgUserRepository {
    pool: Pool<Postgres>,
}

impl PgUserRepository {
    /// Create a new PgUserRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, req: NewUser) -> Result<User> {
        let id = new_v7();
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO app_user (id, email, name, password_hash, created_at)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING id, email, name, created_at",
        )
        .bind(id)
        .bind(req.email.trim())
        .bind(&req.name)
        .bind(&req.password_hash)
        .bind(now)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(user_from_row(&row)),
            Err(e) => {
                let err = Error::Database(e);
                if err.is_unique_violation() {
                    Err(Error::Conflict("Email is already registered".to_string()))
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query("SELECT id, email, name, created_at FROM app_user WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query(
            "SELECT id, email, name, created_at FROM app_user WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
        let row = sqlx::query(
            "SELECT id, email, name, created_at, password_hash
             FROM app_user WHERE LOWER(email) = LOWER($1)",
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| UserCredentials {
            user: user_from_row(&r),
            password_hash: r.get("password_hash"),
        }))
    }
}

/// PostgreSQL implementation of SessionRepository.
pub struct PgSessionRepository {
    pool: Pool<Postgres>,
}

impl PgSessionRepository {
    /// Create a new PgSessionRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create(&self, user_id: Uuid, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "INSERT INTO session (token, user_id, created_at, expires_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(token)
        .bind(user_id)
        .bind(Utc::now())
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn resolve(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Principal>> {
        let row = sqlx::query(
            "SELECT u.id, u.email
             FROM session s
             JOIN app_user u ON u.id = s.user_id
             WHERE s.token = $1 AND s.expires_at > $2",
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|r| Principal {
            user_id: r.get("id"),
            email: r.get("email"),
        }))
    }

    async fn delete(&self, token: &str) -> Result<()> {
        sqlx::query("DELETE FROM session WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM session WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected())
    }
}

//! Room, membership, and room bookmark repository implementations.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::info;
use uuid::Uuid;

use recall_core::{
    new_v7, CreateRoomBookmarkRequest, CreateRoomRequest, Error, MemberUser, Result, Room,
    RoomBookmark, RoomBookmarkRepository, RoomMember, RoomMemberRepository, RoomMemberWithUser,
    RoomRepository, RoomRole, RoomSummary, UpdateRoomRequest,
};

use crate::rows::parse_enum;

fn room_from_row(row: &PgRow) -> Room {
    Room {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        owner_id: row.get("owner_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

fn member_from_row(row: &PgRow) -> Result<RoomMember> {
    Ok(RoomMember {
        id: row.get("id"),
        room_id: row.get("room_id"),
        user_id: row.get("user_id"),
        role: parse_enum(row, "role")?,
        joined_at: row.get("joined_at"),
    })
}

fn member_with_user_from_row(row: &PgRow) -> Result<RoomMemberWithUser> {
    let member = member_from_row(row)?;
    Ok(RoomMemberWithUser {
        user: MemberUser {
            id: member.user_id,
            name: row.get("user_name"),
            email: row.get("user_email"),
        },
        member,
    })
}

/// PostgreSQL implementation of RoomRepository.
pub struct PgRoomRepository {
    pool: Pool<Postgres>,
}

impl PgRoomRepository {
    /// Create a new PgRoomRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomRepository for PgRoomRepository {
    async fn create_with_owner(&self, req: CreateRoomRequest) -> Result<Room> {
        let room_id = new_v7();
        let now = Utc::now();

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let row = sqlx::query(
            "INSERT INTO room (id, name, description, owner_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)
             RETURNING id, name, description, owner_id, created_at, updated_at",
        )
        .bind(room_id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(req.owner_id)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;

        sqlx::query(
            "INSERT INTO room_member (id, room_id, user_id, role, joined_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(new_v7())
        .bind(room_id)
        .bind(req.owner_id)
        .bind(RoomRole::Owner.as_str())
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;

        info!(
            subsystem = "database",
            component = "rooms",
            op = "create",
            room_id = %room_id,
            user_id = %req.owner_id,
            "Room created"
        );

        Ok(room_from_row(&row))
    }

    async fn get(&self, id: Uuid) -> Result<Option<Room>> {
        let row = sqlx::query(
            "SELECT id, name, description, owner_id, created_at, updated_at
             FROM room WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(room_from_row))
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<RoomSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT r.id, r.name, r.description, r.owner_id, r.created_at, r.updated_at,
                   m.role, m.joined_at,
                   (SELECT COUNT(*) FROM room_member c WHERE c.room_id = r.id) AS member_count
            FROM room_member m
            JOIN room r ON r.id = m.room_id
            WHERE m.user_id = $1
            ORDER BY m.joined_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter()
            .map(|row| {
                Ok(RoomSummary {
                    room: room_from_row(row),
                    role: parse_enum(row, "role")?,
                    member_count: row.get("member_count"),
                    joined_at: row.get("joined_at"),
                })
            })
            .collect()
    }

    async fn update(&self, id: Uuid, req: UpdateRoomRequest) -> Result<Room> {
        let (set_description, description) = match req.description {
            Some(description) => (true, description),
            None => (false, None),
        };

        let row = sqlx::query(
            r#"
            UPDATE room SET
                name        = COALESCE($2, name),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                updated_at  = $5
            WHERE id = $1
            RETURNING id, name, description, owner_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(&req.name)
        .bind(set_description)
        .bind(description)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref()
            .map(room_from_row)
            .ok_or_else(|| Error::NotFound("Room not found".to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM room WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }
}

/// PostgreSQL implementation of RoomMemberRepository.
pub struct PgRoomMemberRepository {
    pool: Pool<Postgres>,
}

impl PgRoomMemberRepository {
    /// Create a new PgRoomMemberRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoomMemberRepository for PgRoomMemberRepository {
    async fn get(&self, room_id: Uuid, user_id: Uuid) -> Result<Option<RoomMember>> {
        let row = sqlx::query(
            "SELECT id, room_id, user_id, role, joined_at
             FROM room_member WHERE room_id = $1 AND user_id = $2",
        )
        .bind(room_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.as_ref().map(member_from_row).transpose()
    }

    async fn list(&self, room_id: Uuid) -> Result<Vec<RoomMemberWithUser>> {
        let rows = sqlx::query(
            r#"
            SELECT m.id, m.room_id, m.user_id, m.role, m.joined_at,
                   u.name AS user_name, u.email AS user_email
            FROM room_member m
            JOIN app_user u ON u.id = m.user_id
            WHERE m.room_id = $1
            ORDER BY CASE m.role
                         WHEN 'OWNER' THEN 3
                         WHEN 'ADMIN' THEN 2
                         WHEN 'MEMBER' THEN 1
                         ELSE 0
                     END DESC,
                     m.joined_at ASC
            "#,
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter().map(member_with_user_from_row).collect()
    }

    async fn add(
        &self,
        room_id: Uuid,
        user_id: Uuid,
        role: RoomRole,
    ) -> Result<RoomMemberWithUser> {
        let result = sqlx::query(
            r#"
            WITH inserted AS (
                INSERT INTO room_member (id, room_id, user_id, role, joined_at)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id, room_id, user_id, role, joined_at
            )
            SELECT i.id, i.room_id, i.user_id, i.role, i.joined_at,
                   u.name AS user_name, u.email AS user_email
            FROM inserted i
            JOIN app_user u ON u.id = i.user_id
            "#,
        )
        .bind(new_v7())
        .bind(room_id)
        .bind(user_id)
        .bind(role.as_str())
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => member_with_user_from_row(&row),
            Err(e) => {
                let err = Error::Database(e);
                if err.is_unique_violation() {
                    Err(Error::Conflict(
                        "User is already a member of this room".to_string(),
                    ))
                } else {
                    Err(err)
                }
            }
        }
    }

    async fn remove(&self, room_id: Uuid, user_id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM room_member WHERE room_id = $1 AND user_id = $2")
            .bind(room_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(result.rows_affected() > 0)
    }

    async fn count(&self, room_id: Uuid) -> Result<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM room_member WHERE room_id = $1")
            .bind(room_id)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)
    }
}

/// PostgreSQL implementation of RoomBookmarkRepository.
pub struct PgRoomBookmarkRepository {
    pool: Pool<Postgres>,
}

impl PgRoomBookmarkRepository {
    /// Create a new PgRoomBookmarkRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn room_bookmark_from_row(row: &PgRow) -> RoomBookmark {
    RoomBookmark {
        id: row.get("id"),
        room_id: row.get("room_id"),
        added_by_id: row.get("added_by_id"),
        url: row.get("url"),
        title: row.get("title"),
        note: row.get("note"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl RoomBookmarkRepository for PgRoomBookmarkRepository {
    async fn insert(&self, req: CreateRoomBookmarkRequest) -> Result<RoomBookmark> {
        let row = sqlx::query(
            "INSERT INTO room_bookmark (id, room_id, added_by_id, url, title, note, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING id, room_id, added_by_id, url, title, note, created_at",
        )
        .bind(new_v7())
        .bind(req.room_id)
        .bind(req.added_by_id)
        .bind(&req.url)
        .bind(&req.title)
        .bind(&req.note)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(room_bookmark_from_row(&row))
    }

    async fn list(&self, room_id: Uuid) -> Result<Vec<RoomBookmark>> {
        let rows = sqlx::query(
            "SELECT id, room_id, added_by_id, url, title, note, created_at
             FROM room_bookmark WHERE room_id = $1 ORDER BY created_at DESC",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(room_bookmark_from_row).collect())
    }
}

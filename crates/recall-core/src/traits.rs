//! Core traits for recall abstractions.
//!
//! These traits define the interfaces that the PostgreSQL store, the
//! in-memory test store, and the outbound integrations implement.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;
use crate::roles::RoomRole;

// =============================================================================
// USERS & SESSIONS
// =============================================================================

/// Request for creating a user account.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
}

/// Repository for user accounts.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a user. A duplicate email is a [`crate::Error::Conflict`].
    async fn create(&self, req: NewUser) -> Result<User>;

    /// Fetch a user by ID.
    async fn get(&self, id: Uuid) -> Result<Option<User>>;

    /// Find a user by email, case-insensitively.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Fetch a user and its password hash by email, for login.
    async fn credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>>;
}

/// Repository for login sessions.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Store a new session token.
    async fn create(&self, user_id: Uuid, token: &str, expires_at: DateTime<Utc>) -> Result<()>;

    /// Resolve an unexpired session token to its principal.
    async fn resolve(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Principal>>;

    /// Delete a session. Unknown tokens are ignored.
    async fn delete(&self, token: &str) -> Result<()>;

    /// Delete every session that expired at or before `now`; returns the count.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64>;
}

// =============================================================================
// BOOKMARKS & TAGS
// =============================================================================

/// Request for creating a bookmark with already-fetched metadata.
#[derive(Debug, Clone)]
pub struct CreateBookmarkRequest {
    pub user_id: Uuid,
    pub url: String,
    pub domain: String,
    pub title: Option<String>,
    pub favicon_url: Option<String>,
    pub note: Option<String>,
    /// When set, a reminder is created in the same transaction.
    pub reminder_at: Option<DateTime<Utc>>,
}

/// Field-sparse bookmark update. `None` leaves a field untouched;
/// `note: Some(None)` clears the note.
#[derive(Debug, Clone, Default)]
pub struct UpdateBookmarkRequest {
    pub is_favorite: Option<bool>,
    pub is_pinned: Option<bool>,
    pub is_read_later: Option<bool>,
    pub status: Option<BookmarkStatus>,
    pub note: Option<Option<String>>,
    /// Replaces the whole tag set. Tags not owned by the bookmark owner are ignored.
    pub tag_ids: Option<Vec<Uuid>>,
}

impl UpdateBookmarkRequest {
    pub fn is_empty(&self) -> bool {
        self.is_favorite.is_none()
            && self.is_pinned.is_none()
            && self.is_read_later.is_none()
            && self.status.is_none()
            && self.note.is_none()
            && self.tag_ids.is_none()
    }
}

/// Filters for listing bookmarks.
#[derive(Debug, Clone, Default)]
pub struct ListBookmarksFilter {
    pub status: Option<BookmarkStatus>,
    pub tag_id: Option<Uuid>,
    /// Case-insensitive substring over title, url, note and domain.
    pub query: Option<String>,
    pub limit: Option<i64>,
}

/// Repository for personal bookmarks. Every method is scoped to the owner.
#[async_trait]
pub trait BookmarkRepository: Send + Sync {
    /// Insert a bookmark (and its reminder, when requested) atomically.
    async fn insert(&self, req: CreateBookmarkRequest) -> Result<Bookmark>;

    /// Fetch a bookmark owned by `user_id`, with tags and reminder.
    async fn get(&self, id: Uuid, user_id: Uuid) -> Result<Option<Bookmark>>;

    /// List bookmarks ordered by position, pinned, favorite, newest.
    async fn list(&self, user_id: Uuid, filter: ListBookmarksFilter) -> Result<Vec<Bookmark>>;

    /// List all bookmarks newest first, for export.
    async fn list_for_export(&self, user_id: Uuid) -> Result<Vec<Bookmark>>;

    /// Apply a sparse update. Missing or foreign bookmarks are `NotFound`.
    async fn update(&self, id: Uuid, user_id: Uuid, req: UpdateBookmarkRequest)
        -> Result<Bookmark>;

    /// Delete a bookmark; its reminder and tag links cascade.
    /// Returns false when no owned bookmark matched.
    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool>;

    /// Set `position = index` for every id, all-or-nothing. Any id not owned
    /// by `user_id` is `NotFound` and nothing is written.
    async fn reorder(&self, user_id: Uuid, ordered_ids: &[Uuid]) -> Result<()>;
}

/// Repository for user-owned tags.
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// List tags ordered by name.
    async fn list(&self, user_id: Uuid) -> Result<Vec<Tag>>;

    /// Create a tag.
    async fn create(&self, user_id: Uuid, name: &str, color: Option<&str>) -> Result<Tag>;

    /// Delete a tag owned by `user_id`. Returns false when none matched.
    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool>;
}

// =============================================================================
// REMINDERS
// =============================================================================

/// Request for creating or rescheduling a reminder.
#[derive(Debug, Clone)]
pub struct UpsertReminderRequest {
    pub bookmark_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub message: Option<String>,
}

/// Repository for reminders and their lifecycle transitions.
#[async_trait]
pub trait ReminderRepository: Send + Sync {
    /// Create the bookmark's reminder, or overwrite schedule and message and
    /// reset status to `Pending` if one exists. Ownership is checked by the caller.
    async fn upsert(&self, req: UpsertReminderRequest) -> Result<Reminder>;

    /// Fetch a reminder by ID.
    async fn get(&self, id: Uuid) -> Result<Option<Reminder>>;

    /// List the user's reminders joined with bookmarks, soonest first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ReminderWithBookmark>>;

    /// Atomically move every due reminder to `Processing` and return it.
    ///
    /// Due means `Pending` with `scheduled_at <= now`, or `Processing` with a
    /// claim older than `lease_expired_before`. A reminder is returned to at
    /// most one concurrent caller.
    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease_expired_before: DateTime<Utc>,
    ) -> Result<Vec<DueReminder>>;

    /// Mark a claimed reminder as delivered.
    async fn mark_completed(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;

    /// Mark a claimed reminder as failed.
    async fn mark_failed(&self, id: Uuid, at: DateTime<Utc>) -> Result<()>;

    /// Delete `Completed` reminders last updated before `cutoff`.
    async fn purge_completed_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;
}

// =============================================================================
// NOTES & TODOS
// =============================================================================

/// Request for creating a note.
#[derive(Debug, Clone)]
pub struct CreateNoteRequest {
    pub user_id: Uuid,
    pub room_id: Option<Uuid>,
    pub title: Option<String>,
    pub content: String,
}

/// Field-sparse note update. `title: Some(None)` clears the title.
#[derive(Debug, Clone, Default)]
pub struct UpdateNoteRequest {
    pub title: Option<Option<String>>,
    pub content: Option<String>,
}

/// Repository for notes.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    async fn insert(&self, req: CreateNoteRequest) -> Result<Note>;

    async fn get(&self, id: Uuid) -> Result<Option<Note>>;

    /// Personal notes (no room) of a user, most recently updated first.
    async fn list_personal(&self, user_id: Uuid) -> Result<Vec<Note>>;

    /// Notes of a room, most recently updated first.
    async fn list_for_room(&self, room_id: Uuid) -> Result<Vec<Note>>;

    async fn update(&self, id: Uuid, req: UpdateNoteRequest) -> Result<Note>;

    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// Request for creating a todo.
#[derive(Debug, Clone)]
pub struct CreateTodoRequest {
    pub user_id: Uuid,
    pub room_id: Option<Uuid>,
    pub task: String,
}

/// Field-sparse todo update.
#[derive(Debug, Clone, Default)]
pub struct UpdateTodoRequest {
    pub task: Option<String>,
    pub is_done: Option<bool>,
}

/// Repository for todos.
#[async_trait]
pub trait TodoRepository: Send + Sync {
    async fn insert(&self, req: CreateTodoRequest) -> Result<Todo>;

    async fn get(&self, id: Uuid) -> Result<Option<Todo>>;

    /// Personal todos (no room) of a user, newest first.
    async fn list_personal(&self, user_id: Uuid) -> Result<Vec<Todo>>;

    /// Todos of a room, newest first.
    async fn list_for_room(&self, room_id: Uuid) -> Result<Vec<Todo>>;

    async fn update(&self, id: Uuid, req: UpdateTodoRequest) -> Result<Todo>;

    async fn delete(&self, id: Uuid) -> Result<bool>;
}

// =============================================================================
// ROOMS
// =============================================================================

/// Request for creating a room.
#[derive(Debug, Clone)]
pub struct CreateRoomRequest {
    pub owner_id: Uuid,
    pub name: String,
    pub description: Option<String>,
}

/// Field-sparse room update. `description: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct UpdateRoomRequest {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
}

/// Repository for rooms.
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Create a room and its creator's `Owner` membership in one transaction.
    async fn create_with_owner(&self, req: CreateRoomRequest) -> Result<Room>;

    async fn get(&self, id: Uuid) -> Result<Option<Room>>;

    /// Rooms the user belongs to, with role and member count, newest membership first.
    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<RoomSummary>>;

    async fn update(&self, id: Uuid, req: UpdateRoomRequest) -> Result<Room>;

    /// Delete a room; notes, todos, bookmarks and memberships cascade.
    async fn delete(&self, id: Uuid) -> Result<bool>;
}

/// Repository for room memberships.
#[async_trait]
pub trait RoomMemberRepository: Send + Sync {
    /// The user's membership in a room, if any.
    async fn get(&self, room_id: Uuid, user_id: Uuid) -> Result<Option<RoomMember>>;

    /// Members ordered by role (owner first), then join time.
    async fn list(&self, room_id: Uuid) -> Result<Vec<RoomMemberWithUser>>;

    /// Add a membership. An existing membership is a [`crate::Error::Conflict`].
    async fn add(&self, room_id: Uuid, user_id: Uuid, role: RoomRole)
        -> Result<RoomMemberWithUser>;

    /// Remove a membership. Returns false when none existed.
    async fn remove(&self, room_id: Uuid, user_id: Uuid) -> Result<bool>;

    async fn count(&self, room_id: Uuid) -> Result<i64>;
}

/// Request for sharing a bookmark in a room.
#[derive(Debug, Clone)]
pub struct CreateRoomBookmarkRequest {
    pub room_id: Uuid,
    pub added_by_id: Uuid,
    pub url: String,
    pub title: Option<String>,
    pub note: Option<String>,
}

/// Repository for room bookmarks.
#[async_trait]
pub trait RoomBookmarkRepository: Send + Sync {
    async fn insert(&self, req: CreateRoomBookmarkRequest) -> Result<RoomBookmark>;

    /// Bookmarks of a room, newest first.
    async fn list(&self, room_id: Uuid) -> Result<Vec<RoomBookmark>>;
}

// =============================================================================
// STORE BUNDLE
// =============================================================================

/// Every repository behind a trait object, shared across request handlers.
#[derive(Clone)]
pub struct Store {
    pub users: Arc<dyn UserRepository>,
    pub sessions: Arc<dyn SessionRepository>,
    pub bookmarks: Arc<dyn BookmarkRepository>,
    pub tags: Arc<dyn TagRepository>,
    pub reminders: Arc<dyn ReminderRepository>,
    pub notes: Arc<dyn NoteRepository>,
    pub todos: Arc<dyn TodoRepository>,
    pub rooms: Arc<dyn RoomRepository>,
    pub members: Arc<dyn RoomMemberRepository>,
    pub room_bookmarks: Arc<dyn RoomBookmarkRepository>,
}

impl Store {
    /// The principal's role in a room, if they are a member.
    pub async fn room_role(&self, principal: &Principal, room_id: Uuid) -> Result<Option<RoomRole>> {
        Ok(self
            .members
            .get(room_id, principal.user_id)
            .await?
            .map(|m| m.role))
    }
}

// =============================================================================
// OUTBOUND INTEGRATIONS
// =============================================================================

/// Fetches title, favicon and domain for a URL.
#[async_trait]
pub trait MetadataFetcher: Send + Sync {
    /// Fetch metadata for `url`.
    ///
    /// Only an unparsable URL is an error; any network failure degrades to
    /// a fallback favicon and no title.
    async fn fetch(&self, url: &str) -> Result<PageMetadata>;
}

/// Delivers reminder notifications.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    async fn send_reminder(&self, email: &ReminderEmail) -> Result<()>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

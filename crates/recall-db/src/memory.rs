//! In-memory store with the same observable semantics as the PostgreSQL
//! repositories: owner scoping, cascades, uniqueness, ordering, and the
//! all-or-nothing reorder. Every repository shares one mutex-guarded state.
//!
//! Enabled by the `mock` feature; used by the API, job, and service tests.

use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use recall_core::{
    new_v7, Bookmark, BookmarkRepository, BookmarkStatus, BookmarkSummary,
    CreateBookmarkRequest, CreateNoteRequest, CreateRoomBookmarkRequest, CreateRoomRequest,
    CreateTodoRequest, DueReminder, Error, ListBookmarksFilter, MemberUser, NewUser, Note,
    NoteRepository, Principal, Reminder, ReminderRepository, ReminderStatus,
    ReminderWithBookmark, Result, Room, RoomBookmark, RoomBookmarkRepository, RoomMember,
    RoomMemberRepository, RoomMemberWithUser, RoomRepository, RoomRole, RoomSummary,
    SessionRepository, Store, Tag, TagRepository, Todo, TodoRepository, UpdateBookmarkRequest,
    UpdateNoteRequest, UpdateRoomRequest, UpdateTodoRequest, UpsertReminderRequest, User,
    UserCredentials, UserRepository,
};

use crate::tags::validate_tag_name;

#[derive(Default)]
struct State {
    users: Vec<UserCredentials>,
    sessions: HashMap<String, (Uuid, DateTime<Utc>)>,
    bookmarks: Vec<Bookmark>,
    tags: Vec<Tag>,
    bookmark_tags: HashSet<(Uuid, Uuid)>,
    reminders: Vec<Reminder>,
    notes: Vec<Note>,
    todos: Vec<Todo>,
    rooms: Vec<Room>,
    members: Vec<RoomMember>,
    room_bookmarks: Vec<RoomBookmark>,
}

impl State {
    fn user(&self, id: Uuid) -> Option<&User> {
        self.users.iter().map(|c| &c.user).find(|u| u.id == id)
    }

    fn user_name(&self, id: Uuid) -> Option<String> {
        self.user(id).and_then(|u| u.name.clone())
    }

    /// Attach tags and reminder, as the SQL joins do.
    fn hydrate(&self, bookmark: &Bookmark) -> Bookmark {
        let mut out = bookmark.clone();
        let mut tags: Vec<Tag> = self
            .tags
            .iter()
            .filter(|t| self.bookmark_tags.contains(&(bookmark.id, t.id)))
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        out.tags = tags;
        out.reminder = self
            .reminders
            .iter()
            .find(|r| r.bookmark_id == bookmark.id)
            .cloned();
        out
    }

    fn member_with_user(&self, member: &RoomMember) -> RoomMemberWithUser {
        let user = self.user(member.user_id);
        RoomMemberWithUser {
            member: member.clone(),
            user: MemberUser {
                id: member.user_id,
                name: user.and_then(|u| u.name.clone()),
                email: user.map(|u| u.email.clone()).unwrap_or_default(),
            },
        }
    }

    fn delete_bookmark_cascade(&mut self, id: Uuid) {
        self.bookmarks.retain(|b| b.id != id);
        self.reminders.retain(|r| r.bookmark_id != id);
        self.bookmark_tags.retain(|(b, _)| *b != id);
    }
}

/// Shared handle to the in-memory state.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a [`Store`] whose repositories all share this state.
    pub fn store(&self) -> Store {
        Store {
            users: Arc::new(MemUsers(self.clone())),
            sessions: Arc::new(MemSessions(self.clone())),
            bookmarks: Arc::new(MemBookmarks(self.clone())),
            tags: Arc::new(MemTags(self.clone())),
            reminders: Arc::new(MemReminders(self.clone())),
            notes: Arc::new(MemNotes(self.clone())),
            todos: Arc::new(MemTodos(self.clone())),
            rooms: Arc::new(MemRooms(self.clone())),
            members: Arc::new(MemMembers(self.clone())),
            room_bookmarks: Arc::new(MemRoomBookmarks(self.clone())),
        }
    }
}

struct MemUsers(InMemoryStore);
struct MemSessions(InMemoryStore);
struct MemBookmarks(InMemoryStore);
struct MemTags(InMemoryStore);
struct MemReminders(InMemoryStore);
struct MemNotes(InMemoryStore);
struct MemTodos(InMemoryStore);
struct MemRooms(InMemoryStore);
struct MemMembers(InMemoryStore);
struct MemRoomBookmarks(InMemoryStore);

// =============================================================================
// USERS & SESSIONS
// =============================================================================

#[async_trait]
impl UserRepository for MemUsers {
    async fn create(&self, req: NewUser) -> Result<User> {
        let mut state = self.0.state.lock().await;
        let email = req.email.trim().to_string();
        if state
            .users
            .iter()
            .any(|c| c.user.email.eq_ignore_ascii_case(&email))
        {
            return Err(Error::Conflict("Email is already registered".to_string()));
        }
        let user = User {
            id: new_v7(),
            email,
            name: req.name,
            created_at: Utc::now(),
        };
        state.users.push(UserCredentials {
            user: user.clone(),
            password_hash: req.password_hash,
        });
        Ok(user)
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.0.state.lock().await.user(id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.credentials_by_email(email).await?.map(|c| c.user))
    }

    async fn credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>> {
        let state = self.0.state.lock().await;
        Ok(state
            .users
            .iter()
            .find(|c| c.user.email.eq_ignore_ascii_case(email.trim()))
            .cloned())
    }
}

#[async_trait]
impl SessionRepository for MemSessions {
    async fn create(&self, user_id: Uuid, token: &str, expires_at: DateTime<Utc>) -> Result<()> {
        let mut state = self.0.state.lock().await;
        state
            .sessions
            .insert(token.to_string(), (user_id, expires_at));
        Ok(())
    }

    async fn resolve(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Principal>> {
        let state = self.0.state.lock().await;
        let Some((user_id, expires_at)) = state.sessions.get(token) else {
            return Ok(None);
        };
        if *expires_at <= now {
            return Ok(None);
        }
        Ok(state.user(*user_id).map(User::principal))
    }

    async fn delete(&self, token: &str) -> Result<()> {
        self.0.state.lock().await.sessions.remove(token);
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let mut state = self.0.state.lock().await;
        let before = state.sessions.len();
        state.sessions.retain(|_, (_, expires_at)| *expires_at > now);
        Ok((before - state.sessions.len()) as u64)
    }
}

// =============================================================================
// BOOKMARKS & TAGS
// =============================================================================

fn matches_query(bookmark: &Bookmark, needle: &str) -> bool {
    let hit = |value: &str| value.to_lowercase().contains(needle);
    hit(bookmark.url.as_str())
        || hit(bookmark.domain.as_str())
        || bookmark.title.as_deref().is_some_and(hit)
        || bookmark.note.as_deref().is_some_and(hit)
}

#[async_trait]
impl BookmarkRepository for MemBookmarks {
    async fn insert(&self, req: CreateBookmarkRequest) -> Result<Bookmark> {
        let mut state = self.0.state.lock().await;
        let now = Utc::now();
        let bookmark = Bookmark {
            id: new_v7(),
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
            reminder: None,
        };
        if let Some(scheduled_at) = req.reminder_at {
            state.reminders.push(Reminder {
                id: new_v7(),
                bookmark_id: bookmark.id,
                scheduled_at,
                message: None,
                status: ReminderStatus::Pending,
                created_at: now,
                updated_at: now,
            });
        }
        state.bookmarks.push(bookmark.clone());
        Ok(state.hydrate(&bookmark))
    }

    async fn get(&self, id: Uuid, user_id: Uuid) -> Result<Option<Bookmark>> {
        let state = self.0.state.lock().await;
        Ok(state
            .bookmarks
            .iter()
            .find(|b| b.id == id && b.user_id == user_id)
            .map(|b| state.hydrate(b)))
    }

    async fn list(&self, user_id: Uuid, filter: ListBookmarksFilter) -> Result<Vec<Bookmark>> {
        let state = self.0.state.lock().await;
        let needle = filter
            .query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase);

        let mut bookmarks: Vec<Bookmark> = state
            .bookmarks
            .iter()
            .filter(|b| b.user_id == user_id)
            .filter(|b| filter.status.map_or(true, |s| b.status == s))
            .filter(|b| {
                filter
                    .tag_id
                    .map_or(true, |tag_id| state.bookmark_tags.contains(&(b.id, tag_id)))
            })
            .filter(|b| needle.as_deref().map_or(true, |n| matches_query(b, n)))
            .map(|b| state.hydrate(b))
            .collect();

        bookmarks.sort_by_key(|b| {
            (
                b.position,
                Reverse(b.is_pinned),
                Reverse(b.is_favorite),
                Reverse(b.created_at),
            )
        });
        if let Some(limit) = filter.limit {
            bookmarks.truncate(limit.max(0) as usize);
        }
        Ok(bookmarks)
    }

    async fn list_for_export(&self, user_id: Uuid) -> Result<Vec<Bookmark>> {
        let state = self.0.state.lock().await;
        let mut bookmarks: Vec<Bookmark> = state
            .bookmarks
            .iter()
            .filter(|b| b.user_id == user_id)
            .map(|b| state.hydrate(b))
            .collect();
        bookmarks.sort_by_key(|b| Reverse(b.created_at));
        Ok(bookmarks)
    }

    async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        req: UpdateBookmarkRequest,
    ) -> Result<Bookmark> {
        let mut state = self.0.state.lock().await;
        let owned_tags: HashSet<Uuid> = state
            .tags
            .iter()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.id)
            .collect();

        let bookmark = state
            .bookmarks
            .iter_mut()
            .find(|b| b.id == id && b.user_id == user_id)
            .ok_or_else(|| Error::NotFound(format!("Bookmark {} not found", id)))?;

        if let Some(v) = req.is_favorite {
            bookmark.is_favorite = v;
        }
        if let Some(v) = req.is_pinned {
            bookmark.is_pinned = v;
        }
        if let Some(v) = req.is_read_later {
            bookmark.is_read_later = v;
        }
        if let Some(v) = req.status {
            bookmark.status = v;
        }
        if let Some(note) = req.note {
            bookmark.note = note;
        }
        bookmark.updated_at = Utc::now();
        let updated = bookmark.clone();

        if let Some(tag_ids) = req.tag_ids {
            state.bookmark_tags.retain(|(b, _)| *b != id);
            for tag_id in tag_ids.into_iter().filter(|t| owned_tags.contains(t)) {
                state.bookmark_tags.insert((id, tag_id));
            }
        }
        Ok(state.hydrate(&updated))
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut state = self.0.state.lock().await;
        if !state
            .bookmarks
            .iter()
            .any(|b| b.id == id && b.user_id == user_id)
        {
            return Ok(false);
        }
        state.delete_bookmark_cascade(id);
        Ok(true)
    }

    async fn reorder(&self, user_id: Uuid, ordered_ids: &[Uuid]) -> Result<()> {
        let unique: HashSet<&Uuid> = ordered_ids.iter().collect();
        if unique.len() != ordered_ids.len() {
            return Err(Error::InvalidInput(
                "bookmarkIds must not contain duplicates".to_string(),
            ));
        }
        let mut state = self.0.state.lock().await;
        let all_owned = ordered_ids.iter().all(|id| {
            state
                .bookmarks
                .iter()
                .any(|b| b.id == *id && b.user_id == user_id)
        });
        if !all_owned {
            return Err(Error::NotFound(
                "One or more bookmarks not found".to_string(),
            ));
        }
        let now = Utc::now();
        for (position, id) in ordered_ids.iter().enumerate() {
            if let Some(b) = state.bookmarks.iter_mut().find(|b| b.id == *id) {
                b.position = position as i32;
                b.updated_at = now;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl TagRepository for MemTags {
    async fn list(&self, user_id: Uuid) -> Result<Vec<Tag>> {
        let state = self.0.state.lock().await;
        let mut tags: Vec<Tag> = state
            .tags
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn create(&self, user_id: Uuid, name: &str, color: Option<&str>) -> Result<Tag> {
        validate_tag_name(name).map_err(Error::InvalidInput)?;
        let tag = Tag {
            id: new_v7(),
            user_id,
            name: name.trim().to_string(),
            color: color.map(str::to_string),
            created_at: Utc::now(),
        };
        self.0.state.lock().await.tags.push(tag.clone());
        Ok(tag)
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut state = self.0.state.lock().await;
        let before = state.tags.len();
        state.tags.retain(|t| !(t.id == id && t.user_id == user_id));
        let deleted = state.tags.len() < before;
        if deleted {
            state.bookmark_tags.retain(|(_, t)| *t != id);
        }
        Ok(deleted)
    }
}

// =============================================================================
// REMINDERS
// =============================================================================

impl MemReminders {
    async fn finish(&self, id: Uuid, status: ReminderStatus, at: DateTime<Utc>) -> Result<()> {
        let mut state = self.0.state.lock().await;
        if let Some(r) = state
            .reminders
            .iter_mut()
            .find(|r| r.id == id && r.status == ReminderStatus::Processing)
        {
            r.status = status;
            r.updated_at = at;
        }
        Ok(())
    }
}

#[async_trait]
impl ReminderRepository for MemReminders {
    async fn upsert(&self, req: UpsertReminderRequest) -> Result<Reminder> {
        let mut state = self.0.state.lock().await;
        let now = Utc::now();
        if let Some(existing) = state
            .reminders
            .iter_mut()
            .find(|r| r.bookmark_id == req.bookmark_id)
        {
            existing.scheduled_at = req.scheduled_at;
            existing.message = req.message;
            existing.status = ReminderStatus::Pending;
            existing.updated_at = now;
            return Ok(existing.clone());
        }
        let reminder = Reminder {
            id: new_v7(),
            bookmark_id: req.bookmark_id,
            scheduled_at: req.scheduled_at,
            message: req.message,
            status: ReminderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        state.reminders.push(reminder.clone());
        Ok(reminder)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Reminder>> {
        let state = self.0.state.lock().await;
        Ok(state.reminders.iter().find(|r| r.id == id).cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ReminderWithBookmark>> {
        let state = self.0.state.lock().await;
        let mut out: Vec<ReminderWithBookmark> = state
            .reminders
            .iter()
            .filter_map(|r| {
                let b = state
                    .bookmarks
                    .iter()
                    .find(|b| b.id == r.bookmark_id && b.user_id == user_id)?;
                Some(ReminderWithBookmark {
                    reminder: r.clone(),
                    bookmark: BookmarkSummary {
                        id: b.id,
                        url: b.url.clone(),
                        domain: b.domain.clone(),
                        title: b.title.clone(),
                        favicon_url: b.favicon_url.clone(),
                    },
                })
            })
            .collect();
        out.sort_by_key(|r| r.reminder.scheduled_at);
        Ok(out)
    }

    async fn claim_due(
        &self,
        now: DateTime<Utc>,
        lease_expired_before: DateTime<Utc>,
    ) -> Result<Vec<DueReminder>> {
        let mut state = self.0.state.lock().await;
        let State {
            reminders,
            bookmarks,
            users,
            ..
        } = &mut *state;

        let mut claimed = Vec::new();
        for r in reminders.iter_mut() {
            let due = match r.status {
                ReminderStatus::Pending => r.scheduled_at <= now,
                ReminderStatus::Processing => r.updated_at < lease_expired_before,
                _ => false,
            };
            if !due {
                continue;
            }
            let Some(bookmark) = bookmarks.iter().find(|b| b.id == r.bookmark_id) else {
                continue;
            };
            let Some(owner) = users.iter().find(|c| c.user.id == bookmark.user_id) else {
                continue;
            };
            r.status = ReminderStatus::Processing;
            r.updated_at = now;
            claimed.push(DueReminder {
                id: r.id,
                bookmark_id: r.bookmark_id,
                scheduled_at: r.scheduled_at,
                message: r.message.clone(),
                bookmark_title: bookmark.title.clone(),
                bookmark_url: bookmark.url.clone(),
                user_email: owner.user.email.clone(),
            });
        }
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
        let mut state = self.0.state.lock().await;
        let before = state.reminders.len();
        state
            .reminders
            .retain(|r| !(r.status == ReminderStatus::Completed && r.updated_at < cutoff));
        Ok((before - state.reminders.len()) as u64)
    }
}

// =============================================================================
// NOTES & TODOS
// =============================================================================

#[async_trait]
impl NoteRepository for MemNotes {
    async fn insert(&self, req: CreateNoteRequest) -> Result<Note> {
        let now = Utc::now();
        let note = Note {
            id: new_v7(),
            user_id: req.user_id,
            room_id: req.room_id,
            title: req.title,
            content: req.content,
            created_at: now,
            updated_at: now,
            author_name: None,
        };
        self.0.state.lock().await.notes.push(note.clone());
        Ok(note)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Note>> {
        let state = self.0.state.lock().await;
        Ok(state.notes.iter().find(|n| n.id == id).cloned())
    }

    async fn list_personal(&self, user_id: Uuid) -> Result<Vec<Note>> {
        let state = self.0.state.lock().await;
        let mut notes: Vec<Note> = state
            .notes
            .iter()
            .filter(|n| n.user_id == user_id && n.room_id.is_none())
            .map(|n| Note {
                author_name: state.user_name(n.user_id),
                ..n.clone()
            })
            .collect();
        notes.sort_by_key(|n| Reverse(n.updated_at));
        Ok(notes)
    }

    async fn list_for_room(&self, room_id: Uuid) -> Result<Vec<Note>> {
        let state = self.0.state.lock().await;
        let mut notes: Vec<Note> = state
            .notes
            .iter()
            .filter(|n| n.room_id == Some(room_id))
            .map(|n| Note {
                author_name: state.user_name(n.user_id),
                ..n.clone()
            })
            .collect();
        notes.sort_by_key(|n| Reverse(n.updated_at));
        Ok(notes)
    }

    async fn update(&self, id: Uuid, req: UpdateNoteRequest) -> Result<Note> {
        let mut state = self.0.state.lock().await;
        let note = state
            .notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| Error::NotFound(format!("Note {} not found", id)))?;
        if let Some(title) = req.title {
            note.title = title;
        }
        if let Some(content) = req.content {
            note.content = content;
        }
        note.updated_at = Utc::now();
        Ok(note.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.0.state.lock().await;
        let before = state.notes.len();
        state.notes.retain(|n| n.id != id);
        Ok(state.notes.len() < before)
    }
}

#[async_trait]
impl TodoRepository for MemTodos {
    async fn insert(&self, req: CreateTodoRequest) -> Result<Todo> {
        let now = Utc::now();
        let todo = Todo {
            id: new_v7(),
            user_id: req.user_id,
            room_id: req.room_id,
            task: req.task,
            is_done: false,
            created_at: now,
            updated_at: now,
            author_name: None,
        };
        self.0.state.lock().await.todos.push(todo.clone());
        Ok(todo)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Todo>> {
        let state = self.0.state.lock().await;
        Ok(state.todos.iter().find(|t| t.id == id).cloned())
    }

    async fn list_personal(&self, user_id: Uuid) -> Result<Vec<Todo>> {
        let state = self.0.state.lock().await;
        let mut todos: Vec<Todo> = state
            .todos
            .iter()
            .filter(|t| t.user_id == user_id && t.room_id.is_none())
            .map(|t| Todo {
                author_name: state.user_name(t.user_id),
                ..t.clone()
            })
            .collect();
        todos.sort_by_key(|t| Reverse(t.created_at));
        Ok(todos)
    }

    async fn list_for_room(&self, room_id: Uuid) -> Result<Vec<Todo>> {
        let state = self.0.state.lock().await;
        let mut todos: Vec<Todo> = state
            .todos
            .iter()
            .filter(|t| t.room_id == Some(room_id))
            .map(|t| Todo {
                author_name: state.user_name(t.user_id),
                ..t.clone()
            })
            .collect();
        todos.sort_by_key(|t| Reverse(t.created_at));
        Ok(todos)
    }

    async fn update(&self, id: Uuid, req: UpdateTodoRequest) -> Result<Todo> {
        let mut state = self.0.state.lock().await;
        let todo = state
            .todos
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::NotFound(format!("Todo {} not found", id)))?;
        if let Some(task) = req.task {
            todo.task = task;
        }
        if let Some(is_done) = req.is_done {
            todo.is_done = is_done;
        }
        todo.updated_at = Utc::now();
        Ok(todo.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.0.state.lock().await;
        let before = state.todos.len();
        state.todos.retain(|t| t.id != id);
        Ok(state.todos.len() < before)
    }
}

// =============================================================================
// ROOMS
// =============================================================================

#[async_trait]
impl RoomRepository for MemRooms {
    async fn create_with_owner(&self, req: CreateRoomRequest) -> Result<Room> {
        let mut state = self.0.state.lock().await;
        let now = Utc::now();
        let room = Room {
            id: new_v7(),
            name: req.name,
            description: req.description,
            owner_id: req.owner_id,
            created_at: now,
            updated_at: now,
        };
        state.members.push(RoomMember {
            id: new_v7(),
            room_id: room.id,
            user_id: req.owner_id,
            role: RoomRole::Owner,
            joined_at: now,
        });
        state.rooms.push(room.clone());
        Ok(room)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Room>> {
        let state = self.0.state.lock().await;
        Ok(state.rooms.iter().find(|r| r.id == id).cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<RoomSummary>> {
        let state = self.0.state.lock().await;
        let mut out: Vec<RoomSummary> = state
            .members
            .iter()
            .filter(|m| m.user_id == user_id)
            .filter_map(|m| {
                let room = state.rooms.iter().find(|r| r.id == m.room_id)?;
                let member_count = state
                    .members
                    .iter()
                    .filter(|c| c.room_id == m.room_id)
                    .count() as i64;
                Some(RoomSummary {
                    room: room.clone(),
                    role: m.role,
                    member_count,
                    joined_at: m.joined_at,
                })
            })
            .collect();
        out.sort_by_key(|s| Reverse(s.joined_at));
        Ok(out)
    }

    async fn update(&self, id: Uuid, req: UpdateRoomRequest) -> Result<Room> {
        let mut state = self.0.state.lock().await;
        let room = state
            .rooms
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| Error::NotFound("Room not found".to_string()))?;
        if let Some(name) = req.name {
            room.name = name;
        }
        if let Some(description) = req.description {
            room.description = description;
        }
        room.updated_at = Utc::now();
        Ok(room.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut state = self.0.state.lock().await;
        let before = state.rooms.len();
        state.rooms.retain(|r| r.id != id);
        if state.rooms.len() == before {
            return Ok(false);
        }
        state.members.retain(|m| m.room_id != id);
        state.notes.retain(|n| n.room_id != Some(id));
        state.todos.retain(|t| t.room_id != Some(id));
        state.room_bookmarks.retain(|b| b.room_id != id);
        Ok(true)
    }
}

#[async_trait]
impl RoomMemberRepository for MemMembers {
    async fn get(&self, room_id: Uuid, user_id: Uuid) -> Result<Option<RoomMember>> {
        let state = self.0.state.lock().await;
        Ok(state
            .members
            .iter()
            .find(|m| m.room_id == room_id && m.user_id == user_id)
            .cloned())
    }

    async fn list(&self, room_id: Uuid) -> Result<Vec<RoomMemberWithUser>> {
        let state = self.0.state.lock().await;
        let mut members: Vec<&RoomMember> = state
            .members
            .iter()
            .filter(|m| m.room_id == room_id)
            .collect();
        members.sort_by_key(|m| (Reverse(m.role), m.joined_at));
        Ok(members
            .into_iter()
            .map(|m| state.member_with_user(m))
            .collect())
    }

    async fn add(
        &self,
        room_id: Uuid,
        user_id: Uuid,
        role: RoomRole,
    ) -> Result<RoomMemberWithUser> {
        let mut state = self.0.state.lock().await;
        if state
            .members
            .iter()
            .any(|m| m.room_id == room_id && m.user_id == user_id)
        {
            return Err(Error::Conflict(
                "User is already a member of this room".to_string(),
            ));
        }
        if state.user(user_id).is_none() || !state.rooms.iter().any(|r| r.id == room_id) {
            return Err(Error::NotFound("User or room not found".to_string()));
        }
        let member = RoomMember {
            id: new_v7(),
            room_id,
            user_id,
            role,
            joined_at: Utc::now(),
        };
        state.members.push(member.clone());
        Ok(state.member_with_user(&member))
    }

    async fn remove(&self, room_id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut state = self.0.state.lock().await;
        let before = state.members.len();
        state
            .members
            .retain(|m| !(m.room_id == room_id && m.user_id == user_id));
        Ok(state.members.len() < before)
    }

    async fn count(&self, room_id: Uuid) -> Result<i64> {
        let state = self.0.state.lock().await;
        Ok(state.members.iter().filter(|m| m.room_id == room_id).count() as i64)
    }
}

#[async_trait]
impl RoomBookmarkRepository for MemRoomBookmarks {
    async fn insert(&self, req: CreateRoomBookmarkRequest) -> Result<RoomBookmark> {
        let bookmark = RoomBookmark {
            id: new_v7(),
            room_id: req.room_id,
            added_by_id: req.added_by_id,
            url: req.url,
            title: req.title,
            note: req.note,
            created_at: Utc::now(),
        };
        self.0
            .state
            .lock()
            .await
            .room_bookmarks
            .push(bookmark.clone());
        Ok(bookmark)
    }

    async fn list(&self, room_id: Uuid) -> Result<Vec<RoomBookmark>> {
        let state = self.0.state.lock().await;
        let mut out: Vec<RoomBookmark> = state
            .room_bookmarks
            .iter()
            .filter(|b| b.room_id == room_id)
            .cloned()
            .collect();
        out.sort_by_key(|b| Reverse(b.created_at));
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn user(store: &Store, email: &str) -> User {
        store
            .users
            .create(NewUser {
                email: email.to_string(),
                name: Some(email.to_string()),
                password_hash: "x".to_string(),
            })
            .await
            .unwrap()
    }

    async fn bookmark(store: &Store, owner: Uuid, url: &str) -> Bookmark {
        store
            .bookmarks
            .insert(CreateBookmarkRequest {
                user_id: owner,
                url: url.to_string(),
                domain: "example.com".to_string(),
                title: None,
                favicon_url: None,
                note: None,
                reminder_at: None,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_delete_expired_sessions() {
        let store = InMemoryStore::new().store();
        let owner = user(&store, "s@example.com").await;
        let now = Utc::now();
        store
            .sessions
            .create(owner.id, "old", now - Duration::minutes(1))
            .await
            .unwrap();
        store
            .sessions
            .create(owner.id, "edge", now)
            .await
            .unwrap();
        store
            .sessions
            .create(owner.id, "live", now + Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(store.sessions.delete_expired(now).await.unwrap(), 2);
        assert_eq!(store.sessions.delete_expired(now).await.unwrap(), 0);
        assert!(store.sessions.resolve("live", now).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let store = InMemoryStore::new().store();
        user(&store, "a@example.com").await;
        let err = store
            .users
            .create(NewUser {
                email: "A@Example.com".to_string(),
                name: None,
                password_hash: "x".to_string(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[tokio::test]
    async fn test_reorder_is_all_or_nothing() {
        let store = InMemoryStore::new().store();
        let alice = user(&store, "alice@example.com").await;
        let bob = user(&store, "bob@example.com").await;
        let a = bookmark(&store, alice.id, "https://a.example.com").await;
        let b = bookmark(&store, alice.id, "https://b.example.com").await;
        let foreign = bookmark(&store, bob.id, "https://c.example.com").await;

        let err = store
            .bookmarks
            .reorder(alice.id, &[b.id, foreign.id, a.id])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));

        let after = store.bookmarks.get(b.id, alice.id).await.unwrap().unwrap();
        assert_eq!(after.position, 0);
        let after = store.bookmarks.get(a.id, alice.id).await.unwrap().unwrap();
        assert_eq!(after.position, 0);

        store.bookmarks.reorder(alice.id, &[b.id, a.id]).await.unwrap();
        let a = store.bookmarks.get(a.id, alice.id).await.unwrap().unwrap();
        assert_eq!(a.position, 1);
    }

    #[tokio::test]
    async fn test_reminder_upsert_keeps_single_row() {
        let store = InMemoryStore::new().store();
        let alice = user(&store, "alice@example.com").await;
        let b = bookmark(&store, alice.id, "https://a.example.com").await;
        let t1 = Utc::now() + Duration::hours(1);
        let t2 = Utc::now() + Duration::hours(2);

        let first = store
            .reminders
            .upsert(UpsertReminderRequest {
                bookmark_id: b.id,
                scheduled_at: t1,
                message: None,
            })
            .await
            .unwrap();
        let second = store
            .reminders
            .upsert(UpsertReminderRequest {
                bookmark_id: b.id,
                scheduled_at: t2,
                message: Some("again".into()),
            })
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        let listed = store.reminders.list_for_user(alice.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].reminder.scheduled_at, t2);
    }

    #[tokio::test]
    async fn test_claim_is_exclusive_until_lease_expires() {
        let store = InMemoryStore::new().store();
        let alice = user(&store, "alice@example.com").await;
        let b = bookmark(&store, alice.id, "https://a.example.com").await;
        let now = Utc::now();
        store
            .reminders
            .upsert(UpsertReminderRequest {
                bookmark_id: b.id,
                scheduled_at: now - Duration::minutes(1),
                message: None,
            })
            .await
            .unwrap();

        let lease = Duration::minutes(10);
        let first = store.reminders.claim_due(now, now - lease).await.unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(first[0].user_email, "alice@example.com");

        let second = store.reminders.claim_due(now, now - lease).await.unwrap();
        assert!(second.is_empty());

        let later = now + Duration::minutes(11);
        let reclaimed = store.reminders.claim_due(later, later - lease).await.unwrap();
        assert_eq!(reclaimed.len(), 1);
    }

    #[tokio::test]
    async fn test_room_delete_cascades() {
        let store = InMemoryStore::new().store();
        let alice = user(&store, "alice@example.com").await;
        let room = store
            .rooms
            .create_with_owner(CreateRoomRequest {
                owner_id: alice.id,
                name: "Alpha".into(),
                description: None,
            })
            .await
            .unwrap();
        store
            .notes
            .insert(CreateNoteRequest {
                user_id: alice.id,
                room_id: Some(room.id),
                title: None,
                content: "hello".into(),
            })
            .await
            .unwrap();

        assert!(store.rooms.delete(room.id).await.unwrap());
        assert!(store.notes.list_for_room(room.id).await.unwrap().is_empty());
        assert!(store.members.get(room.id, alice.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_member_list_orders_owner_first() {
        let store = InMemoryStore::new().store();
        let alice = user(&store, "alice@example.com").await;
        let bob = user(&store, "bob@example.com").await;
        let carol = user(&store, "carol@example.com").await;
        let room = store
            .rooms
            .create_with_owner(CreateRoomRequest {
                owner_id: alice.id,
                name: "Alpha".into(),
                description: None,
            })
            .await
            .unwrap();
        store
            .members
            .add(room.id, bob.id, RoomRole::Viewer)
            .await
            .unwrap();
        store
            .members
            .add(room.id, carol.id, RoomRole::Admin)
            .await
            .unwrap();

        let roles: Vec<RoomRole> = store
            .members
            .list(room.id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| m.member.role)
            .collect();
        assert_eq!(roles, vec![RoomRole::Owner, RoomRole::Admin, RoomRole::Viewer]);
    }
}

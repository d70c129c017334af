//! Core data models for recall.
//!
//! These types are shared across all recall crates and represent the domain
//! entities. Wire names are camelCase; enum values are upper-case.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roles::RoomRole;

// =============================================================================
// USERS & SESSIONS
// =============================================================================

/// The authenticated user making a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Principal {
    pub user_id: Uuid,
    pub email: String,
}

/// Public view of a user account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal {
            user_id: self.id,
            email: self.email.clone(),
        }
    }
}

/// A user together with its stored password hash. Never serialized.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

// =============================================================================
// BOOKMARKS
// =============================================================================

/// Triage status of a personal bookmark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookmarkStatus {
    #[default]
    Pending,
    Done,
    Ignored,
}

impl BookmarkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookmarkStatus::Pending => "PENDING",
            BookmarkStatus::Done => "DONE",
            BookmarkStatus::Ignored => "IGNORED",
        }
    }
}

impl std::fmt::Display for BookmarkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BookmarkStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "DONE" => Ok(Self::Done),
            "IGNORED" => Ok(Self::Ignored),
            _ => Err(format!("Invalid bookmark status: {}", s)),
        }
    }
}

/// A personal bookmark with its tags and optional reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bookmark {
    pub id: Uuid,
    pub user_id: Uuid,
    pub url: String,
    pub domain: String,
    pub title: Option<String>,
    pub favicon_url: Option<String>,
    pub note: Option<String>,
    pub is_favorite: bool,
    pub is_pinned: bool,
    pub is_read_later: bool,
    pub status: BookmarkStatus,
    pub position: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub tags: Vec<Tag>,
    pub reminder: Option<Reminder>,
}

/// Bookmark fields shown next to a reminder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkSummary {
    pub id: Uuid,
    pub url: String,
    pub domain: String,
    pub title: Option<String>,
    pub favicon_url: Option<String>,
}

/// Metadata extracted from a bookmarked page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub favicon: Option<String>,
    pub domain: String,
}

// =============================================================================
// TAGS
// =============================================================================

/// A user-owned label for bookmarks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub color: Option<String>,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// REMINDERS
// =============================================================================

/// Lifecycle state of a reminder.
///
/// `Pending` → `Processing` (claimed by a sweep) → `Completed` | `Failed`.
/// Only an owner upsert moves a reminder back to `Pending`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReminderStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Pending => "PENDING",
            ReminderStatus::Processing => "PROCESSING",
            ReminderStatus::Completed => "COMPLETED",
            ReminderStatus::Failed => "FAILED",
        }
    }

    /// True for states a sweep never leaves.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ReminderStatus::Completed | ReminderStatus::Failed)
    }
}

impl std::fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReminderStatus {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "PENDING" => Ok(Self::Pending),
            "PROCESSING" => Ok(Self::Processing),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            _ => Err(format!("Invalid reminder status: {}", s)),
        }
    }
}

/// A scheduled reminder attached to exactly one bookmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: Uuid,
    pub bookmark_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub message: Option<String>,
    pub status: ReminderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A reminder joined with its bookmark, as listed to the owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderWithBookmark {
    #[serde(flatten)]
    pub reminder: Reminder,
    pub bookmark: BookmarkSummary,
}

/// A claimed reminder with everything needed to notify its owner.
#[derive(Debug, Clone, PartialEq)]
pub struct DueReminder {
    pub id: Uuid,
    pub bookmark_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub message: Option<String>,
    pub bookmark_title: Option<String>,
    pub bookmark_url: String,
    pub user_email: String,
}

/// Content of a reminder notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderEmail {
    pub to: String,
    pub bookmark_title: Option<String>,
    pub bookmark_url: String,
    pub message: Option<String>,
}

impl From<&DueReminder> for ReminderEmail {
    fn from(due: &DueReminder) -> Self {
        Self {
            to: due.user_email.clone(),
            bookmark_title: due.bookmark_title.clone(),
            bookmark_url: due.bookmark_url.clone(),
            message: due.message.clone(),
        }
    }
}

/// Per-reminder outcome of a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SweepOutcome {
    Sent,
    Failed,
}

/// One entry of a sweep report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepItem {
    pub id: Uuid,
    pub status: SweepOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Summary returned by a reminder sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SweepReport {
    pub processed: usize,
    pub results: Vec<SweepItem>,
    pub cleaned: u64,
    pub timestamp: DateTime<Utc>,
}

impl SweepReport {
    pub fn sent_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == SweepOutcome::Sent)
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.status == SweepOutcome::Failed)
            .count()
    }
}

// =============================================================================
// NOTES & TODOS
// =============================================================================

/// A note, personal (`room_id` is `None`) or shared in a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,
    pub user_id: Uuid,
    pub room_id: Option<Uuid>,
    pub title: Option<String>,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Display name of the creator, filled on list queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
}

/// A todo item, personal or shared in a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub room_id: Option<Uuid>,
    pub task: String,
    pub is_done: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
}

// =============================================================================
// ROOMS
// =============================================================================

/// A shared workspace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A room as listed to one of its members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    #[serde(flatten)]
    pub room: Room,
    pub role: RoomRole,
    pub member_count: i64,
    pub joined_at: DateTime<Utc>,
}

/// A room with the caller's role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetail {
    #[serde(flatten)]
    pub room: Room,
    pub current_user_role: RoomRole,
}

/// Membership of a user in a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMember {
    pub id: Uuid,
    pub room_id: Uuid,
    pub user_id: Uuid,
    pub role: RoomRole,
    pub joined_at: DateTime<Utc>,
}

/// User fields exposed in member lists.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberUser {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
}

/// A membership joined with the member's user record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomMemberWithUser {
    #[serde(flatten)]
    pub member: RoomMember,
    pub user: MemberUser,
}

/// A bookmark shared inside a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomBookmark {
    pub id: Uuid,
    pub room_id: Uuid,
    pub added_by_id: Uuid,
    pub url: String,
    pub title: Option<String>,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bookmark_status_parse() {
        assert_eq!(
            "done".parse::<BookmarkStatus>().unwrap(),
            BookmarkStatus::Done
        );
        assert_eq!(BookmarkStatus::default(), BookmarkStatus::Pending);
        assert!("archived".parse::<BookmarkStatus>().is_err());
    }

    #[test]
    fn test_reminder_status_terminal() {
        assert!(!ReminderStatus::Pending.is_terminal());
        assert!(!ReminderStatus::Processing.is_terminal());
        assert!(ReminderStatus::Completed.is_terminal());
        assert!(ReminderStatus::Failed.is_terminal());
    }

    #[test]
    fn test_reminder_status_wire_format() {
        let json = serde_json::to_string(&ReminderStatus::Completed).unwrap();
        assert_eq!(json, "\"COMPLETED\"");
    }

    #[test]
    fn test_room_summary_flattens_room() {
        let now = Utc::now();
        let summary = RoomSummary {
            room: Room {
                id: Uuid::nil(),
                name: "Alpha".into(),
                description: None,
                owner_id: Uuid::nil(),
                created_at: now,
                updated_at: now,
            },
            role: RoomRole::Owner,
            member_count: 1,
            joined_at: now,
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["name"], "Alpha");
        assert_eq!(value["role"], "OWNER");
        assert_eq!(value["memberCount"], 1);
        assert!(value.get("room").is_none());
    }

    #[test]
    fn test_sweep_item_omits_empty_fields() {
        let item = SweepItem {
            id: Uuid::nil(),
            status: SweepOutcome::Sent,
            email: Some("a@example.com".into()),
            error: None,
        };
        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(value["status"], "sent");
        assert!(value.get("error").is_none());
    }

    #[test]
    fn test_reminder_email_from_due() {
        let due = DueReminder {
            id: Uuid::nil(),
            bookmark_id: Uuid::nil(),
            scheduled_at: Utc::now(),
            message: Some("read it".into()),
            bookmark_title: None,
            bookmark_url: "https://example.com".into(),
            user_email: "u@example.com".into(),
        };
        let email = ReminderEmail::from(&due);
        assert_eq!(email.to, "u@example.com");
        assert_eq!(email.message.as_deref(), Some("read it"));
    }
}

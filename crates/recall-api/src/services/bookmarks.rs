//! Personal bookmarks, their reminders, and export.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use recall_core::{
    defaults, Bookmark, CreateBookmarkRequest, Error, ListBookmarksFilter, MetadataFetcher,
    Principal, Reminder, Result, Store, UpdateBookmarkRequest, UpsertReminderRequest,
};

use super::rooms::normalize_optional;

/// Bookmark operations, all scoped to the caller.
#[derive(Clone)]
pub struct BookmarkService {
    store: Store,
    fetcher: Arc<dyn MetadataFetcher>,
}

impl BookmarkService {
    pub fn new(store: Store, fetcher: Arc<dyn MetadataFetcher>) -> Self {
        Self { store, fetcher }
    }

    pub async fn list(
        &self,
        principal: &Principal,
        filter: ListBookmarksFilter,
    ) -> Result<Vec<Bookmark>> {
        self.store.bookmarks.list(principal.user_id, filter).await
    }

    /// Substring search capped at the search limit. A blank query matches nothing.
    pub async fn search(&self, principal: &Principal, query: &str) -> Result<Vec<Bookmark>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        self.store
            .bookmarks
            .list(
                principal.user_id,
                ListBookmarksFilter {
                    query: Some(query.to_string()),
                    limit: Some(defaults::BOOKMARK_SEARCH_LIMIT),
                    ..Default::default()
                },
            )
            .await
    }

    /// Save a URL with fetched metadata and an optional reminder.
    ///
    /// An unparsable URL is rejected before anything is written; any other
    /// metadata failure degrades to a fallback favicon and no title.
    pub async fn create(
        &self,
        principal: &Principal,
        url: &str,
        note: Option<String>,
        reminder_at: Option<DateTime<Utc>>,
    ) -> Result<Bookmark> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::InvalidInput("URL is required".to_string()));
        }
        let metadata = self.fetcher.fetch(url).await?;

        let bookmark = self
            .store
            .bookmarks
            .insert(CreateBookmarkRequest {
                user_id: principal.user_id,
                url: url.to_string(),
                domain: metadata.domain,
                title: metadata.title,
                favicon_url: metadata.favicon,
                note: normalize_optional(note),
                reminder_at,
            })
            .await?;
        info!(
            subsystem = "api",
            component = "bookmarks",
            op = "create",
            bookmark_id = %bookmark.id,
            user_id = %principal.user_id,
            has_reminder = bookmark.reminder.is_some(),
            "Bookmark saved"
        );
        Ok(bookmark)
    }

    pub async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        req: UpdateBookmarkRequest,
    ) -> Result<Bookmark> {
        if req.is_empty() {
            return self
                .store
                .bookmarks
                .get(id, principal.user_id)
                .await?
                .ok_or_else(|| Error::NotFound("Bookmark not found".to_string()));
        }
        self.store.bookmarks.update(id, principal.user_id, req).await
    }

    pub async fn delete(&self, principal: &Principal, id: Uuid) -> Result<()> {
        if !self.store.bookmarks.delete(id, principal.user_id).await? {
            return Err(Error::NotFound("Bookmark not found".to_string()));
        }
        Ok(())
    }

    pub async fn reorder(&self, principal: &Principal, ordered_ids: &[Uuid]) -> Result<()> {
        self.store
            .bookmarks
            .reorder(principal.user_id, ordered_ids)
            .await
    }

    /// Create or reschedule the reminder of a bookmark the caller owns.
    pub async fn upsert_reminder(
        &self,
        principal: &Principal,
        bookmark_id: Uuid,
        scheduled_at: DateTime<Utc>,
        message: Option<String>,
    ) -> Result<Reminder> {
        if self
            .store
            .bookmarks
            .get(bookmark_id, principal.user_id)
            .await?
            .is_none()
        {
            return Err(Error::NotFound("Bookmark not found".to_string()));
        }
        let reminder = self
            .store
            .reminders
            .upsert(UpsertReminderRequest {
                bookmark_id,
                scheduled_at,
                message: normalize_optional(message),
            })
            .await?;
        info!(
            subsystem = "api",
            component = "reminders",
            op = "upsert",
            reminder_id = %reminder.id,
            bookmark_id = %bookmark_id,
            scheduled_at = %scheduled_at,
            "Reminder scheduled"
        );
        Ok(reminder)
    }

    pub async fn export(&self, principal: &Principal) -> Result<Vec<Bookmark>> {
        self.store.bookmarks.list_for_export(principal.user_id).await
    }
}

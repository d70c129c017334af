//! Bookmark HTTP handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use recall_core::{Bookmark, BookmarkStatus, ListBookmarksFilter, UpdateBookmarkRequest};

use crate::error::{nullable, parse_uuid};
use crate::{ApiError, AppState, JsonBody, RequireAuth};

/// Query parameters for listing bookmarks.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBookmarksQuery {
    /// PENDING, DONE or IGNORED
    pub status: Option<String>,
    pub tag_id: Option<String>,
    /// Case-insensitive substring over title, url, note and domain
    pub query: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookmarkBody {
    pub url: Option<String>,
    pub note: Option<String>,
    pub reminder_at: Option<DateTime<Utc>>,
}

/// Sparse update. Absent keys are left alone; `"note": null` clears the note.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookmarkBody {
    pub id: Option<Uuid>,
    pub is_favorite: Option<bool>,
    pub is_pinned: Option<bool>,
    pub is_read_later: Option<bool>,
    pub status: Option<BookmarkStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub note: Option<Option<String>>,
    pub tag_ids: Option<Vec<Uuid>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderBody {
    pub bookmark_ids: Option<Vec<Uuid>>,
}

/// List the caller's bookmarks.
///
/// # Query Parameters
/// - `status`: filter by status (optional)
/// - `tagId`: only bookmarks carrying this tag (optional)
/// - `query`: substring search (optional)
pub async fn list_bookmarks(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(query): Query<ListBookmarksQuery>,
) -> Result<Json<Vec<Bookmark>>, ApiError> {
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => Some(s.parse::<BookmarkStatus>().map_err(ApiError::BadRequest)?),
        None => None,
    };
    let tag_id = match query.tag_id.as_deref().filter(|s| !s.is_empty()) {
        Some(s) => Some(parse_uuid(s, "tagId")?),
        None => None,
    };
    let filter = ListBookmarksFilter {
        status,
        tag_id,
        query: query.query.filter(|q| !q.trim().is_empty()),
        limit: None,
    };
    let bookmarks = state.bookmarks.list(&auth.principal, filter).await?;
    Ok(Json(bookmarks))
}

/// Save a bookmark, fetching its title and favicon.
///
/// # Returns
/// - 201 Created with the bookmark (including its reminder when `reminderAt` was given)
/// - 400 Bad Request if `url` is missing or unparsable
pub async fn create_bookmark(
    State(state): State<AppState>,
    auth: RequireAuth,
    JsonBody(body): JsonBody<CreateBookmarkBody>,
) -> Result<(StatusCode, Json<Bookmark>), ApiError> {
    let url = body
        .url
        .ok_or_else(|| ApiError::BadRequest("URL is required".to_string()))?;
    let bookmark = state
        .bookmarks
        .create(&auth.principal, &url, body.note, body.reminder_at)
        .await?;
    Ok((StatusCode::CREATED, Json(bookmark)))
}

/// Apply a sparse update to one bookmark.
pub async fn update_bookmark(
    State(state): State<AppState>,
    auth: RequireAuth,
    JsonBody(body): JsonBody<UpdateBookmarkBody>,
) -> Result<Json<Bookmark>, ApiError> {
    let id = body
        .id
        .ok_or_else(|| ApiError::BadRequest("Bookmark ID is required".to_string()))?;
    let req = UpdateBookmarkRequest {
        is_favorite: body.is_favorite,
        is_pinned: body.is_pinned,
        is_read_later: body.is_read_later,
        status: body.status,
        note: body.note,
        tag_ids: body.tag_ids,
    };
    let bookmark = state.bookmarks.update(&auth.principal, id, req).await?;
    Ok(Json(bookmark))
}

/// Delete a bookmark by `?id=`.
pub async fn delete_bookmark(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(query): Query<IdQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = query
        .id
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("Bookmark ID is required".to_string()))
        .and_then(|id| parse_uuid(id, "id"))?;
    state.bookmarks.delete(&auth.principal, id).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Rewrite positions from an ordered id list, all-or-nothing.
///
/// # Returns
/// - 200 OK with `{success: true}`
/// - 400 Bad Request if `bookmarkIds` is missing or has duplicates
/// - 404 Not Found if any id is not one of the caller's bookmarks
pub async fn reorder_bookmarks(
    State(state): State<AppState>,
    auth: RequireAuth,
    JsonBody(body): JsonBody<ReorderBody>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let ids = body
        .bookmark_ids
        .ok_or_else(|| ApiError::BadRequest("bookmarkIds array is required".to_string()))?;
    state.bookmarks.reorder(&auth.principal, &ids).await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// Quick search over the caller's bookmarks; at most 20 results.
pub async fn search_bookmarks(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Bookmark>>, ApiError> {
    let results = state
        .bookmarks
        .search(&auth.principal, query.q.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(results))
}

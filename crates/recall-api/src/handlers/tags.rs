//! Tag HTTP handlers.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;

use recall_core::Tag;

use super::bookmarks::IdQuery;
use crate::error::parse_uuid;
use crate::{ApiError, AppState, JsonBody, RequireAuth};

#[derive(Debug, Deserialize)]
pub struct CreateTagBody {
    pub name: Option<String>,
    pub color: Option<String>,
}

/// List the caller's tags by name.
pub async fn list_tags(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<Vec<Tag>>, ApiError> {
    Ok(Json(state.store.tags.list(auth.principal.user_id).await?))
}

/// Create a tag.
///
/// # Returns
/// - 201 Created with the tag
/// - 400 Bad Request if `name` is missing or blank
pub async fn create_tag(
    State(state): State<AppState>,
    auth: RequireAuth,
    JsonBody(body): JsonBody<CreateTagBody>,
) -> Result<(StatusCode, Json<Tag>), ApiError> {
    let name = body
        .name
        .ok_or_else(|| ApiError::BadRequest("Name is required".to_string()))?;
    let color = body.color.as_deref().map(str::trim).filter(|c| !c.is_empty());
    let tag = state
        .store
        .tags
        .create(auth.principal.user_id, name.trim(), color)
        .await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

/// Delete one of the caller's tags by `?id=`.
pub async fn delete_tag(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(query): Query<IdQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = query
        .id
        .as_deref()
        .ok_or_else(|| ApiError::BadRequest("Tag ID is required".to_string()))
        .and_then(|id| parse_uuid(id, "id"))?;
    if !state.store.tags.delete(id, auth.principal.user_id).await? {
        return Err(ApiError::NotFound("Tag not found".to_string()));
    }
    Ok(Json(serde_json::json!({ "success": true })))
}

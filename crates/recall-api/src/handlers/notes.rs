//! Note HTTP handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use recall_core::{Note, UpdateNoteRequest};

use super::RoomScopeQuery;
use crate::error::{nullable, parse_uuid};
use crate::{ApiError, AppState, JsonBody, RequireAuth};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteBody {
    pub title: Option<String>,
    pub content: Option<String>,
    pub room_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateNoteBody {
    #[serde(default, deserialize_with = "nullable")]
    pub title: Option<Option<String>>,
    pub content: Option<String>,
}

/// List personal notes, or a room's notes with `?roomId=`.
pub async fn list_notes(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(query): Query<RoomScopeQuery>,
) -> Result<Json<Vec<Note>>, ApiError> {
    let room_id = query.room_id()?;
    Ok(Json(state.content.list_notes(&auth.principal, room_id).await?))
}

/// Create a note, personal or inside a room the caller belongs to.
pub async fn create_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    JsonBody(body): JsonBody<CreateNoteBody>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let note = state
        .content
        .create_note(
            &auth.principal,
            body.room_id,
            body.title,
            body.content.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// Edit a note: its author, or any member of its room.
pub async fn update_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UpdateNoteBody>,
) -> Result<Json<Note>, ApiError> {
    let id = parse_uuid(&id, "id")?;
    let note = state
        .content
        .update_note(
            &auth.principal,
            id,
            UpdateNoteRequest {
                title: body.title,
                content: body.content,
            },
        )
        .await?;
    Ok(Json(note))
}

/// Delete a note: its author, or an ADMIN/OWNER of its room.
pub async fn delete_note(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_uuid(&id, "id")?;
    state.content.delete_note(&auth.principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

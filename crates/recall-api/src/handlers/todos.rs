//! Todo HTTP handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use recall_core::{Todo, UpdateTodoRequest};

use super::RoomScopeQuery;
use crate::error::parse_uuid;
use crate::{ApiError, AppState, JsonBody, RequireAuth};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoBody {
    pub task: Option<String>,
    pub room_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoBody {
    pub task: Option<String>,
    pub is_done: Option<bool>,
}

pub async fn list_todos(
    State(state): State<AppState>,
    auth: RequireAuth,
    Query(query): Query<RoomScopeQuery>,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let room_id = query.room_id()?;
    Ok(Json(state.content.list_todos(&auth.principal, room_id).await?))
}

pub async fn create_todo(
    State(state): State<AppState>,
    auth: RequireAuth,
    JsonBody(body): JsonBody<CreateTodoBody>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let todo = state
        .content
        .create_todo(
            &auth.principal,
            body.room_id,
            body.task.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn update_todo(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UpdateTodoBody>,
) -> Result<Json<Todo>, ApiError> {
    let id = parse_uuid(&id, "id")?;
    let todo = state
        .content
        .update_todo(
            &auth.principal,
            id,
            UpdateTodoRequest {
                task: body.task,
                is_done: body.is_done,
            },
        )
        .await?;
    Ok(Json(todo))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_uuid(&id, "id")?;
    state.content.delete_todo(&auth.principal, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

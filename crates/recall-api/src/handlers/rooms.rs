//! Room, membership and room bookmark HTTP handlers.
//!
//! All role checks happen in [`crate::services::RoomService`]; these handlers
//! only parse input and shape responses.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use recall_core::{
    Room, RoomBookmark, RoomDetail, RoomMemberWithUser, RoomRole, RoomSummary, UpdateRoomRequest,
};

use crate::error::{nullable, parse_uuid};
use crate::services::InviteTarget;
use crate::{ApiError, AppState, JsonBody, RequireAuth};

#[derive(Debug, Deserialize)]
pub struct CreateRoomBody {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoomBody {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteMemberBody {
    pub email: Option<String>,
    pub user_id: Option<Uuid>,
    /// VIEWER, MEMBER, ADMIN or OWNER; defaults to MEMBER
    pub role: Option<RoomRole>,
}

#[derive(Debug, Deserialize)]
pub struct CreateRoomBookmarkBody {
    pub url: Option<String>,
    pub note: Option<String>,
}

/// Rooms the caller belongs to, with role and member count.
pub async fn list_rooms(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<Vec<RoomSummary>>, ApiError> {
    Ok(Json(state.rooms.list(&auth.principal).await?))
}

/// Create a room; the caller becomes its OWNER.
pub async fn create_room(
    State(state): State<AppState>,
    auth: RequireAuth,
    JsonBody(body): JsonBody<CreateRoomBody>,
) -> Result<(StatusCode, Json<Room>), ApiError> {
    let room = state
        .rooms
        .create(
            &auth.principal,
            body.name.as_deref().unwrap_or_default(),
            body.description,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(room)))
}

/// Room detail with the caller's role. Non-members get 404.
pub async fn get_room(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<RoomDetail>, ApiError> {
    let room_id = parse_uuid(&id, "id")?;
    Ok(Json(state.rooms.detail(&auth.principal, room_id).await?))
}

/// Rename or re-describe a room (ADMIN or OWNER).
pub async fn update_room(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<UpdateRoomBody>,
) -> Result<Json<Room>, ApiError> {
    let room_id = parse_uuid(&id, "id")?;
    let room = state
        .rooms
        .update(
            &auth.principal,
            room_id,
            UpdateRoomRequest {
                name: body.name,
                description: body.description,
            },
        )
        .await?;
    Ok(Json(room))
}

/// Delete a room and everything in it (OWNER only).
pub async fn delete_room(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let room_id = parse_uuid(&id, "id")?;
    state.rooms.delete(&auth.principal, room_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Members ordered OWNER first, then by join time.
pub async fn list_members(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Vec<RoomMemberWithUser>>, ApiError> {
    let room_id = parse_uuid(&id, "id")?;
    Ok(Json(state.rooms.members(&auth.principal, room_id).await?))
}

/// Add a member by `userId` or `email`.
///
/// # Returns
/// - 201 Created with the membership
/// - 400 Bad Request if neither `userId` nor `email` is given
/// - 403 Forbidden if the caller is below ADMIN
/// - 404 Not Found if the caller is not a member or the user does not exist
/// - 409 Conflict if the user is already a member
pub async fn invite_member(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<InviteMemberBody>,
) -> Result<(StatusCode, Json<RoomMemberWithUser>), ApiError> {
    let room_id = parse_uuid(&id, "id")?;
    let member = state
        .rooms
        .invite(
            &auth.principal,
            room_id,
            InviteTarget {
                user_id: body.user_id,
                email: body.email,
            },
            body.role,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(member)))
}

/// Leave a room. An OWNER may only leave as the last member.
pub async fn leave_room(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let room_id = parse_uuid(&id, "id")?;
    state.rooms.leave(&auth.principal, room_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Links shared in the room, newest first.
pub async fn list_room_bookmarks(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
) -> Result<Json<Vec<RoomBookmark>>, ApiError> {
    let room_id = parse_uuid(&id, "id")?;
    Ok(Json(state.rooms.bookmarks(&auth.principal, room_id).await?))
}

/// Share a link in the room.
pub async fn create_room_bookmark(
    State(state): State<AppState>,
    auth: RequireAuth,
    Path(id): Path<String>,
    JsonBody(body): JsonBody<CreateRoomBookmarkBody>,
) -> Result<(StatusCode, Json<RoomBookmark>), ApiError> {
    let room_id = parse_uuid(&id, "id")?;
    let url = body
        .url
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("URL is required".to_string()))?;
    let bookmark = state
        .rooms
        .add_bookmark(
            &auth.principal,
            room_id,
            state.fetcher.as_ref(),
            &url,
            body.note,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(bookmark)))
}

//! HTTP handlers, one module per resource.

pub mod auth;
pub mod bookmarks;
pub mod export;
pub mod notes;
pub mod reminders;
pub mod rooms;
pub mod tags;
pub mod todos;

use serde::Deserialize;
use uuid::Uuid;

use crate::error::parse_uuid;
use crate::ApiError;

/// `?roomId=` selecting room scope; absent means personal scope.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomScopeQuery {
    pub room_id: Option<String>,
}

impl RoomScopeQuery {
    pub fn room_id(&self) -> Result<Option<Uuid>, ApiError> {
        match self.room_id.as_deref().filter(|s| !s.is_empty()) {
            Some(raw) => parse_uuid(raw, "roomId").map(Some),
            None => Ok(None),
        }
    }
}

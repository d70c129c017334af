//! Room lifecycle and membership.
//!
//! Every method resolves the caller's membership first and runs it through
//! [`authorize_room`], so a non-member only ever sees "Room not found".

use tracing::{debug, info};
use uuid::Uuid;

use recall_core::{
    authorize_room, check_leave, defaults, CreateRoomBookmarkRequest, CreateRoomRequest, Error,
    MetadataFetcher, Principal, Result, Room, RoomAction, RoomBookmark, RoomDetail,
    RoomMemberWithUser, RoomRole, RoomSummary, Store, UpdateRoomRequest,
};

/// Who to invite: an explicit user id wins over an email.
#[derive(Debug, Clone, Default)]
pub struct InviteTarget {
    pub user_id: Option<Uuid>,
    pub email: Option<String>,
}

/// Room operations gated by membership role.
#[derive(Clone)]
pub struct RoomService {
    store: Store,
}

impl RoomService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    async fn authorize(
        &self,
        principal: &Principal,
        room_id: Uuid,
        action: RoomAction,
    ) -> Result<RoomRole> {
        let membership = self.store.room_role(principal, room_id).await?;
        let outcome = authorize_room(membership, action);
        debug!(
            subsystem = "api",
            component = "rooms",
            user_id = %principal.user_id,
            room_id = %room_id,
            action = ?action,
            allowed = outcome.is_ok(),
            "Room authorization"
        );
        outcome
    }

    pub async fn list(&self, principal: &Principal) -> Result<Vec<RoomSummary>> {
        self.store.rooms.list_for_user(principal.user_id).await
    }

    /// Create a room owned by the caller.
    pub async fn create(
        &self,
        principal: &Principal,
        name: &str,
        description: Option<String>,
    ) -> Result<Room> {
        let name = validate_room_name(name)?;
        let room = self
            .store
            .rooms
            .create_with_owner(CreateRoomRequest {
                owner_id: principal.user_id,
                name,
                description: normalize_optional(description),
            })
            .await?;
        info!(
            subsystem = "api",
            component = "rooms",
            op = "create",
            room_id = %room.id,
            user_id = %principal.user_id,
            "Room created"
        );
        Ok(room)
    }

    pub async fn detail(&self, principal: &Principal, room_id: Uuid) -> Result<RoomDetail> {
        let role = self.authorize(principal, room_id, RoomAction::Read).await?;
        let room = self.require_room(room_id).await?;
        Ok(RoomDetail {
            room,
            current_user_role: role,
        })
    }

    pub async fn update(
        &self,
        principal: &Principal,
        room_id: Uuid,
        mut req: UpdateRoomRequest,
    ) -> Result<Room> {
        self.authorize(principal, room_id, RoomAction::UpdateRoom)
            .await?;
        if let Some(name) = req.name.take() {
            req.name = Some(validate_room_name(&name)?);
        }
        if let Some(description) = req.description.take() {
            req.description = Some(normalize_optional(description));
        }
        self.store.rooms.update(room_id, req).await
    }

    pub async fn delete(&self, principal: &Principal, room_id: Uuid) -> Result<()> {
        self.authorize(principal, room_id, RoomAction::DeleteRoom)
            .await?;
        if !self.store.rooms.delete(room_id).await? {
            return Err(Error::NotFound("Room not found".to_string()));
        }
        info!(
            subsystem = "api",
            component = "rooms",
            op = "delete",
            room_id = %room_id,
            user_id = %principal.user_id,
            "Room deleted"
        );
        Ok(())
    }

    pub async fn members(
        &self,
        principal: &Principal,
        room_id: Uuid,
    ) -> Result<Vec<RoomMemberWithUser>> {
        self.authorize(principal, room_id, RoomAction::Read).await?;
        self.store.members.list(room_id).await
    }

    /// Add a user to the room. The role defaults to `Member`.
    pub async fn invite(
        &self,
        principal: &Principal,
        room_id: Uuid,
        target: InviteTarget,
        role: Option<RoomRole>,
    ) -> Result<RoomMemberWithUser> {
        self.authorize(principal, room_id, RoomAction::InviteMember)
            .await?;

        let user = match (target.user_id, target.email.as_deref().map(str::trim)) {
            (Some(user_id), _) => self.store.users.get(user_id).await?,
            (None, Some(email)) if !email.is_empty() => {
                self.store.users.find_by_email(email).await?
            }
            _ => {
                return Err(Error::InvalidInput(
                    "userId or email is required".to_string(),
                ))
            }
        }
        .ok_or_else(|| Error::NotFound("User not found".to_string()))?;

        if self.store.members.get(room_id, user.id).await?.is_some() {
            return Err(Error::Conflict("User is already a member".to_string()));
        }

        let role = role.unwrap_or_default();
        let member = self.store.members.add(room_id, user.id, role).await?;
        info!(
            subsystem = "api",
            component = "rooms",
            op = "invite",
            room_id = %room_id,
            user_id = %principal.user_id,
            invitee_id = %user.id,
            role = %role,
            "Member added to room"
        );
        Ok(member)
    }

    /// Remove the caller's own membership.
    pub async fn leave(&self, principal: &Principal, room_id: Uuid) -> Result<()> {
        let role = self.authorize(principal, room_id, RoomAction::Leave).await?;
        let count = self.store.members.count(room_id).await?;
        check_leave(role, count)?;
        self.store.members.remove(room_id, principal.user_id).await?;
        info!(
            subsystem = "api",
            component = "rooms",
            op = "leave",
            room_id = %room_id,
            user_id = %principal.user_id,
            role = %role,
            "Member left room"
        );
        Ok(())
    }

    pub async fn bookmarks(&self, principal: &Principal, room_id: Uuid) -> Result<Vec<RoomBookmark>> {
        self.authorize(principal, room_id, RoomAction::Read).await?;
        self.store.room_bookmarks.list(room_id).await
    }

    /// Share a link in the room. Only the fetched title is kept.
    pub async fn add_bookmark(
        &self,
        principal: &Principal,
        room_id: Uuid,
        fetcher: &dyn MetadataFetcher,
        url: &str,
        note: Option<String>,
    ) -> Result<RoomBookmark> {
        self.authorize(principal, room_id, RoomAction::CreateContent)
            .await?;
        let url = url.trim();
        let metadata = fetcher.fetch(url).await?;
        self.store
            .room_bookmarks
            .insert(CreateRoomBookmarkRequest {
                room_id,
                added_by_id: principal.user_id,
                url: url.to_string(),
                title: metadata.title,
                note: normalize_optional(note),
            })
            .await
    }

    async fn require_room(&self, room_id: Uuid) -> Result<Room> {
        self.store
            .rooms
            .get(room_id)
            .await?
            .ok_or_else(|| Error::NotFound("Room not found".to_string()))
    }
}

fn validate_room_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidInput("Room name is required".to_string()));
    }
    if name.chars().count() > defaults::ROOM_NAME_MAX_LEN {
        return Err(Error::InvalidInput(format!(
            "Room name must be at most {} characters",
            defaults::ROOM_NAME_MAX_LEN
        )));
    }
    Ok(name.to_string())
}

/// Trim an optional text field; blank becomes `None`.
pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_room_name() {
        assert_eq!(validate_room_name("  Alpha ").unwrap(), "Alpha");
        assert!(validate_room_name("   ").is_err());
        assert!(validate_room_name(&"x".repeat(defaults::ROOM_NAME_MAX_LEN + 1)).is_err());
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional(Some("  ".into())), None);
        assert_eq!(normalize_optional(Some(" a ".into())), Some("a".into()));
        assert_eq!(normalize_optional(None), None);
    }
}

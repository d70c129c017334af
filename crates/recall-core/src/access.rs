//! Authorization rules for owned and room-scoped resources.
//!
//! These are pure predicates: callers look up the principal's membership
//! (if any) and hand it in. Room gates fail closed, and a caller who is not a
//! member of a room gets a not-found error so room existence is never
//! confirmed to outsiders.

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::Principal;
use crate::roles::RoomRole;

/// True when `owner_id` is the principal.
pub fn owns_resource(principal: &Principal, owner_id: Uuid) -> bool {
    principal.user_id == owner_id
}

/// Room-scoped operations and the role each requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomAction {
    /// Read room detail, notes, todos, bookmarks, members.
    Read,
    /// Create a note, todo or bookmark inside the room.
    CreateContent,
    /// Add another user to the room.
    InviteMember,
    /// Rename or re-describe the room.
    UpdateRoom,
    /// Delete the room and everything in it.
    DeleteRoom,
    /// Remove one's own membership.
    Leave,
}

impl RoomAction {
    pub fn required_role(&self) -> RoomRole {
        match self {
            RoomAction::Read | RoomAction::CreateContent | RoomAction::Leave => RoomRole::Viewer,
            RoomAction::InviteMember | RoomAction::UpdateRoom => RoomRole::Admin,
            RoomAction::DeleteRoom => RoomRole::Owner,
        }
    }

    fn verb(&self) -> &'static str {
        match self {
            RoomAction::Read => "view this room",
            RoomAction::CreateContent => "add content to this room",
            RoomAction::InviteMember => "invite members",
            RoomAction::UpdateRoom => "update this room",
            RoomAction::DeleteRoom => "delete this room",
            RoomAction::Leave => "leave this room",
        }
    }
}

/// Gate a room-scoped action on the caller's membership.
///
/// Returns the caller's role when permitted. No membership yields
/// [`Error::NotFound`]; an insufficient role yields [`Error::Forbidden`].
pub fn authorize_room(membership: Option<RoomRole>, action: RoomAction) -> Result<RoomRole> {
    let role = membership.ok_or_else(|| Error::NotFound("Room not found".to_string()))?;
    let required = action.required_role();
    if role.at_least(required) {
        Ok(role)
    } else {
        Err(Error::Forbidden(format!(
            "Role {} is required to {}",
            required,
            action.verb()
        )))
    }
}

/// Ownership facts about a note or todo.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentRef {
    pub creator_id: Uuid,
    pub room_id: Option<Uuid>,
}

/// Creator, or any member of the room the content lives in.
///
/// `membership` must be the principal's role in `content.room_id`.
pub fn can_update_content(
    principal: &Principal,
    content: &ContentRef,
    membership: Option<RoomRole>,
) -> bool {
    owns_resource(principal, content.creator_id)
        || (content.room_id.is_some() && membership.is_some())
}

/// Creator, or an ADMIN/OWNER of the room the content lives in.
pub fn can_delete_content(
    principal: &Principal,
    content: &ContentRef,
    membership: Option<RoomRole>,
) -> bool {
    owns_resource(principal, content.creator_id)
        || (content.room_id.is_some()
            && membership.is_some_and(|role| role.at_least(RoomRole::Admin)))
}

/// An owner may only leave when they are the last member.
pub fn check_leave(role: RoomRole, member_count: i64) -> Result<()> {
    if role == RoomRole::Owner && member_count > 1 {
        return Err(Error::Forbidden(
            "Owners cannot leave a room while other members remain; transfer ownership or remove the other members first"
                .to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(id: Uuid) -> Principal {
        Principal {
            user_id: id,
            email: "p@example.com".to_string(),
        }
    }

    #[test]
    fn test_non_member_is_masked_as_not_found() {
        for action in [
            RoomAction::Read,
            RoomAction::CreateContent,
            RoomAction::InviteMember,
            RoomAction::UpdateRoom,
            RoomAction::DeleteRoom,
            RoomAction::Leave,
        ] {
            let err = authorize_room(None, action).unwrap_err();
            assert!(matches!(err, Error::NotFound(_)), "{:?}", action);
        }
    }

    #[test]
    fn test_any_member_can_read_and_create() {
        for role in [
            RoomRole::Viewer,
            RoomRole::Member,
            RoomRole::Admin,
            RoomRole::Owner,
        ] {
            assert_eq!(authorize_room(Some(role), RoomAction::Read).unwrap(), role);
            assert!(authorize_room(Some(role), RoomAction::CreateContent).is_ok());
        }
    }

    #[test]
    fn test_invite_and_update_require_admin() {
        for action in [RoomAction::InviteMember, RoomAction::UpdateRoom] {
            assert!(matches!(
                authorize_room(Some(RoomRole::Member), action),
                Err(Error::Forbidden(_))
            ));
            assert!(authorize_room(Some(RoomRole::Admin), action).is_ok());
            assert!(authorize_room(Some(RoomRole::Owner), action).is_ok());
        }
    }

    #[test]
    fn test_delete_room_requires_owner() {
        assert!(matches!(
            authorize_room(Some(RoomRole::Admin), RoomAction::DeleteRoom),
            Err(Error::Forbidden(_))
        ));
        assert!(authorize_room(Some(RoomRole::Owner), RoomAction::DeleteRoom).is_ok());
    }

    #[test]
    fn test_personal_content_only_creator() {
        let creator = Uuid::new_v4();
        let other = Uuid::new_v4();
        let content = ContentRef {
            creator_id: creator,
            room_id: None,
        };
        assert!(can_update_content(&principal(creator), &content, None));
        assert!(can_delete_content(&principal(creator), &content, None));
        assert!(!can_update_content(&principal(other), &content, None));
        // A stray membership never grants access to personal content.
        assert!(!can_delete_content(
            &principal(other),
            &content,
            Some(RoomRole::Owner)
        ));
    }

    #[test]
    fn test_room_content_update_needs_membership_only() {
        let content = ContentRef {
            creator_id: Uuid::new_v4(),
            room_id: Some(Uuid::new_v4()),
        };
        let other = principal(Uuid::new_v4());
        assert!(can_update_content(&other, &content, Some(RoomRole::Viewer)));
        assert!(!can_update_content(&other, &content, None));
    }

    #[test]
    fn test_room_content_delete_needs_admin() {
        let content = ContentRef {
            creator_id: Uuid::new_v4(),
            room_id: Some(Uuid::new_v4()),
        };
        let other = principal(Uuid::new_v4());
        assert!(!can_delete_content(&other, &content, Some(RoomRole::Member)));
        assert!(can_delete_content(&other, &content, Some(RoomRole::Admin)));
        assert!(can_delete_content(&other, &content, Some(RoomRole::Owner)));
    }

    #[test]
    fn test_last_owner_rule() {
        assert!(check_leave(RoomRole::Owner, 1).is_ok());
        assert!(matches!(
            check_leave(RoomRole::Owner, 2),
            Err(Error::Forbidden(_))
        ));
        assert!(check_leave(RoomRole::Member, 5).is_ok());
        assert!(check_leave(RoomRole::Admin, 2).is_ok());
    }
}

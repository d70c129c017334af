//! Room roles.
//!
//! Roles are totally ordered: `Viewer < Member < Admin < Owner`. Every room
//! gate is expressed as a single [`RoomRole::at_least`] comparison.

use serde::{Deserialize, Serialize};

/// Role a user holds inside a room.
///
/// Variant order is significant: the derived `Ord` is the privilege order.
/// The default (`Member`) is the role granted to an invitee when none is
/// requested.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomRole {
    Viewer,
    #[default]
    Member,
    Admin,
    Owner,
}

impl RoomRole {
    /// True when this role grants at least the privileges of `required`.
    pub fn at_least(self, required: RoomRole) -> bool {
        self >= required
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RoomRole::Viewer => "VIEWER",
            RoomRole::Member => "MEMBER",
            RoomRole::Admin => "ADMIN",
            RoomRole::Owner => "OWNER",
        }
    }
}

impl std::fmt::Display for RoomRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RoomRole {
    type Err = String;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "VIEWER" => Ok(Self::Viewer),
            "MEMBER" => Ok(Self::Member),
            "ADMIN" => Ok(Self::Admin),
            "OWNER" => Ok(Self::Owner),
            _ => Err(format!("Invalid room role: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_ordering() {
        assert!(RoomRole::Viewer < RoomRole::Member);
        assert!(RoomRole::Member < RoomRole::Admin);
        assert!(RoomRole::Admin < RoomRole::Owner);
    }

    #[test]
    fn test_at_least() {
        assert!(RoomRole::Owner.at_least(RoomRole::Admin));
        assert!(RoomRole::Admin.at_least(RoomRole::Admin));
        assert!(!RoomRole::Member.at_least(RoomRole::Admin));
        assert!(RoomRole::Viewer.at_least(RoomRole::Viewer));
        assert!(!RoomRole::Admin.at_least(RoomRole::Owner));
    }

    #[test]
    fn test_default_is_member() {
        assert_eq!(RoomRole::default(), RoomRole::Member);
    }

    #[test]
    fn test_parse_roundtrip_and_case() {
        for role in [
            RoomRole::Viewer,
            RoomRole::Member,
            RoomRole::Admin,
            RoomRole::Owner,
        ] {
            assert_eq!(role.as_str().parse::<RoomRole>().unwrap(), role);
        }
        assert_eq!("admin".parse::<RoomRole>().unwrap(), RoomRole::Admin);
        assert!("superuser".parse::<RoomRole>().is_err());
    }

    #[test]
    fn test_serde_uses_upper_case() {
        let json = serde_json::to_string(&RoomRole::Owner).unwrap();
        assert_eq!(json, "\"OWNER\"");
        let role: RoomRole = serde_json::from_str("\"VIEWER\"").unwrap();
        assert_eq!(role, RoomRole::Viewer);
    }
}

//! Service layer for business logic.

pub mod bookmarks;
pub mod content;
pub mod rooms;

pub use bookmarks::BookmarkService;
pub use content::ContentService;
pub use rooms::{InviteTarget, RoomService};

//! # recall-core
//!
//! Core types, traits, and access rules for the recall library.
//!
//! This crate provides the domain models (bookmarks, reminders, notes, todos,
//! rooms), the repository and collaborator traits the other crates implement,
//! and the room authorization rules every room-scoped operation goes through.
//!
//! ## Log Level Contract
//!
//! Downstream crates log with `tracing`, tagging each event with `subsystem`
//! and `component` fields plus the entity ids involved (`user_id`, `room_id`,
//! `reminder_id`).
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), sweep completions |
//! | DEBUG | Decision points, authorization outcomes, config choices |

pub mod access;
pub mod defaults;
pub mod error;
pub mod export;
pub mod ids;
pub mod models;
pub mod roles;
pub mod traits;

// Re-export commonly used types at crate root
pub use access::{
    authorize_room, can_delete_content, can_update_content, check_leave, owns_resource,
    ContentRef, RoomAction,
};
pub use error::{Error, Result};
pub use export::{bookmarks_to_csv, csv_field, export_filename, ExportFormat};
pub use ids::new_v7;
pub use models::*;
pub use roles::RoomRole;
pub use traits::*;

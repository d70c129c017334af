//! # recall-integrations
//!
//! Outbound HTTP collaborators: the page metadata fetcher used when saving a
//! bookmark, and the notification senders used by the reminder sweep.

pub mod email;
pub mod metadata;

pub use email::{
    notifier_from_env, reminder_html, reminder_subject, LogNotifier, ResendConfig,
    ResendNotifier,
};
pub use metadata::{extract_favicon, extract_title, parse_target, HttpMetadataFetcher};

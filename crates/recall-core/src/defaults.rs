//! Centralized default constants for recall.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// REMINDERS
// =============================================================================

/// Completed reminders older than this many days are purged by the sweep.
pub const REMINDER_RETENTION_DAYS: i64 = 7;

/// A `PROCESSING` reminder whose claim is older than this is reclaimed by
/// the next sweep.
pub const REMINDER_CLAIM_LEASE_SECS: i64 = 600;

/// Sender address used for reminder emails.
pub const REMINDER_FROM_ADDRESS: &str = "Memory <reminders@resend.dev>";

/// Base URL of the Resend-compatible email API.
pub const RESEND_API_URL: &str = "https://api.resend.com";

/// Timeout for a single email delivery request.
pub const EMAIL_TIMEOUT_SECS: u64 = 15;

// =============================================================================
// METADATA FETCH
// =============================================================================

/// Timeout for fetching a page's metadata when a bookmark is created.
pub const METADATA_TIMEOUT_SECS: u64 = 5;

/// User-Agent sent when fetching page metadata.
pub const METADATA_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Favicon service used when a page exposes no icon or cannot be fetched.
pub const FALLBACK_FAVICON_BASE: &str = "https://www.google.com/s2/favicons";

/// Icon size requested from the fallback favicon service.
pub const FALLBACK_FAVICON_SIZE: u32 = 64;

/// Build the fallback favicon URL for a domain.
pub fn fallback_favicon(domain: &str) -> String {
    format!(
        "{}?domain={}&sz={}",
        FALLBACK_FAVICON_BASE, domain, FALLBACK_FAVICON_SIZE
    )
}

// =============================================================================
// SEARCH
// =============================================================================

/// Maximum results returned by the quick bookmark search endpoint.
pub const BOOKMARK_SEARCH_LIMIT: i64 = 20;

// =============================================================================
// AUTH
// =============================================================================

/// Cookie carrying the session token.
pub const SESSION_COOKIE: &str = "recall_session";

/// Default session lifetime in hours (30 days).
pub const SESSION_TTL_HOURS: i64 = 720;

/// Number of random bytes in a session token.
pub const SESSION_TOKEN_BYTES: usize = 32;

/// Minimum accepted password length at signup.
pub const PASSWORD_MIN_LEN: usize = 8;

// =============================================================================
// VALIDATION
// =============================================================================

/// Maximum length of a tag name.
pub const TAG_NAME_MAX_LEN: usize = 64;

/// Maximum length of a room name.
pub const ROOM_NAME_MAX_LEN: usize = 120;

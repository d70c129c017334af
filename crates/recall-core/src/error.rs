//! Error types for recall.

use thiserror::Error;

/// Result type alias using recall's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for recall operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Resource not found, or deliberately masked as not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No principal could be resolved for the request
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Forbidden (authenticated but not authorized)
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Uniqueness violation (duplicate membership, duplicate email)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Notification delivery failed
    #[error("Notification error: {0}")]
    Notification(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// True when the error wraps a PostgreSQL unique-constraint violation.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_not_found() {
        let err = Error::NotFound("Room not found".to_string());
        assert_eq!(err.to_string(), "Not found: Room not found");
    }

    #[test]
    fn test_error_display_forbidden() {
        let err = Error::Forbidden("insufficient role".to_string());
        assert_eq!(err.to_string(), "Forbidden: insufficient role");
    }

    #[test]
    fn test_error_display_conflict() {
        let err = Error::Conflict("User is already a member".to_string());
        assert_eq!(err.to_string(), "Conflict: User is already a member");
    }

    #[test]
    fn test_error_display_notification() {
        let err = Error::Notification("smtp down".to_string());
        assert_eq!(err.to_string(), "Notification error: smtp down");
    }

    #[test]
    fn test_from_serde_json_error() {
        let json_err = serde_json::from_str::<i32>("not a number").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Serialization(_)));
        assert!(err.to_string().starts_with("Serialization error:"));
    }

    #[test]
    fn test_non_database_error_is_not_unique_violation() {
        assert!(!Error::Conflict("dup".into()).is_unique_violation());
        assert!(!Error::Database(sqlx::Error::RowNotFound).is_unique_violation());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}

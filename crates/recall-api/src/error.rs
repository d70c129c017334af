//! HTTP error mapping.

use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::de::DeserializeOwned;

/// Error returned by every handler. Serialized as `{"error": "<message>"}`.
#[derive(Debug)]
pub enum ApiError {
    /// Unexpected failure. The wrapped error is logged, never returned.
    Internal(recall_core::Error),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
}

impl From<recall_core::Error> for ApiError {
    fn from(err: recall_core::Error) -> Self {
        use recall_core::Error;

        if err.is_unique_violation() {
            return ApiError::Conflict("Resource already exists".to_string());
        }
        match err {
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            other => ApiError::Internal(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::Internal(err) => {
                tracing::error!(
                    subsystem = "api",
                    error = %err,
                    "Request failed with internal error"
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

/// JSON body extractor whose rejection is a 400 in the API error shape.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(json_rejection(rejection)),
        }
    }
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::BadRequest(match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "Expected request with `Content-Type: application/json`".to_string()
        }
        other => other.body_text(),
    })
}

/// Parse a UUID from a path or query value.
pub fn parse_uuid(value: &str, field: &str) -> Result<uuid::Uuid, ApiError> {
    uuid::Uuid::parse_str(value.trim())
        .map_err(|_| ApiError::BadRequest(format!("{} must be a valid UUID", field)))
}

/// Deserialize a field that distinguishes "absent" from `null`.
///
/// Use with `#[serde(default, deserialize_with = "nullable")]` on an
/// `Option<Option<T>>`: absent is `None`, `null` is `Some(None)`.
pub fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "nullable")]
        note: Option<Option<String>>,
    }

    #[test]
    fn test_nullable_distinguishes_absent_and_null() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.note, None);
        let null: Patch = serde_json::from_str(r#"{"note": null}"#).unwrap();
        assert_eq!(null.note, Some(None));
        let set: Patch = serde_json::from_str(r#"{"note": "x"}"#).unwrap();
        assert_eq!(set.note, Some(Some("x".to_string())));
    }

    #[test]
    fn test_core_error_mapping() {
        use recall_core::Error;
        assert!(matches!(
            ApiError::from(Error::NotFound("x".into())),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from(Error::InvalidInput("x".into())),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(Error::Conflict("x".into())),
            ApiError::Conflict(_)
        ));
        assert!(matches!(
            ApiError::from(Error::Notification("x".into())),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn test_internal_error_hides_detail() {
        let response =
            ApiError::Internal(recall_core::Error::Internal("secret detail".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_parse_uuid() {
        assert!(parse_uuid("not-a-uuid", "id").is_err());
        let id = uuid::Uuid::new_v4();
        assert_eq!(parse_uuid(&id.to_string(), "id").unwrap(), id);
    }
}

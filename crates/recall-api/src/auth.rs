//! Session authentication.
//!
//! A session token is read from the `recall_session` cookie or from an
//! `Authorization: Bearer` header and resolved to a [`Principal`] through the
//! session repository. Passwords are stored as argon2id PHC strings.

use argon2::password_hash::{
    rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use base64::Engine;
use chrono::Utc;
use rand::RngCore;

use recall_core::{defaults, Principal};

use crate::{ApiError, AppState};

/// Extractor that requires a valid session.
///
/// ```ignore
/// async fn my_handler(auth: RequireAuth) -> impl IntoResponse {
///     let user_id = auth.principal.user_id;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth {
    pub principal: Principal,
    /// The token the session was resolved from.
    pub token: String,
}

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        let principal = state
            .store
            .sessions
            .resolve(&token, Utc::now())
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        Ok(RequireAuth { principal, token })
    }
}

/// Session token from the session cookie, else from a bearer header.
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    cookie_value(headers, defaults::SESSION_COOKIE).or_else(|| bearer_token(headers))
}

/// Token of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Value of the named cookie across all `Cookie` headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == name && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// Generate a fresh opaque session token.
pub fn generate_session_token() -> String {
    let mut bytes = [0u8; defaults::SESSION_TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

/// `Set-Cookie` value carrying a session token.
pub fn session_cookie(token: &str, max_age: chrono::Duration, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        defaults::SESSION_COOKIE,
        token,
        max_age.num_seconds()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// `Set-Cookie` value that removes the session cookie.
pub fn clear_session_cookie(secure: bool) -> String {
    session_cookie("", chrono::Duration::zero(), secure)
}

/// Hash a password with argon2id and a random salt.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(recall_core::Error::Internal(e.to_string())))
}

/// Check a password against a stored PHC hash. Malformed hashes never verify.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Compare two secrets without short-circuiting on the first mismatch.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        diff |= x ^ y;
    }
    diff == 0
}

//! Signup, login, logout and current-user handlers.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, info, warn};

use recall_core::{defaults, NewUser, User};

use crate::auth::{
    clear_session_cookie, generate_session_token, hash_password, session_cookie, verify_password,
    RequireAuth,
};
use crate::{ApiError, AppState, JsonBody};

#[derive(Debug, Deserialize)]
pub struct SignupBody {
    pub email: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Create an account and start a session.
///
/// # Returns
/// - 201 Created with `{user, token}` and the session cookie
/// - 400 Bad Request for a malformed email or a short password
/// - 409 Conflict if the email is already registered
pub async fn signup(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<SignupBody>,
) -> Result<impl IntoResponse, ApiError> {
    let email = body.email.as_deref().map(str::trim).unwrap_or_default();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::BadRequest("A valid email is required".to_string()));
    }
    let password = body.password.unwrap_or_default();
    if password.chars().count() < defaults::PASSWORD_MIN_LEN {
        return Err(ApiError::BadRequest(format!(
            "Password must be at least {} characters",
            defaults::PASSWORD_MIN_LEN
        )));
    }

    let user = state
        .store
        .users
        .create(NewUser {
            email: email.to_string(),
            name: body
                .name
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
            password_hash: hash_password(&password)?,
        })
        .await?;
    info!(subsystem = "api", component = "auth", user_id = %user.id, "User signed up");

    let (token, cookie) = start_session(&state, &user).await?;
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(serde_json::json!({ "user": user, "token": token })),
    ))
}

/// Exchange credentials for a session.
///
/// # Returns
/// - 200 OK with `{user, token}` and the session cookie
/// - 401 Unauthorized for unknown email or wrong password
pub async fn login(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<LoginBody>,
) -> Result<impl IntoResponse, ApiError> {
    let email = body.email.as_deref().map(str::trim).unwrap_or_default();
    let password = body.password.unwrap_or_default();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let credentials = state.store.users.credentials_by_email(email).await?;
    let user = match credentials {
        Some(c) if verify_password(&password, &c.password_hash) => c.user,
        _ => {
            return Err(ApiError::Unauthorized(
                "Invalid email or password".to_string(),
            ))
        }
    };

    let (token, cookie) = start_session(&state, &user).await?;
    Ok((
        [(header::SET_COOKIE, cookie)],
        Json(serde_json::json!({ "user": user, "token": token })),
    ))
}

/// End the current session.
pub async fn logout(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<impl IntoResponse, ApiError> {
    state.store.sessions.delete(&auth.token).await?;
    Ok((
        StatusCode::NO_CONTENT,
        [(
            header::SET_COOKIE,
            clear_session_cookie(state.config.secure_cookies),
        )],
    ))
}

/// The signed-in user.
pub async fn me(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<User>, ApiError> {
    let user = state
        .store
        .users
        .get(auth.principal.user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;
    Ok(Json(user))
}

/// Issue a session for `user`, pruning expired sessions on the way.
async fn start_session(state: &AppState, user: &User) -> Result<(String, String), ApiError> {
    let now = Utc::now();
    match state.store.sessions.delete_expired(now).await {
        Ok(0) => {}
        Ok(removed) => {
            debug!(subsystem = "api", component = "auth", removed, "Pruned expired sessions")
        }
        Err(e) => {
            warn!(subsystem = "api", component = "auth", error = %e, "Failed to prune expired sessions")
        }
    }

    let token = generate_session_token();
    let ttl = state.config.session_ttl;
    state
        .store
        .sessions
        .create(user.id, &token, now + ttl)
        .await?;
    let cookie = session_cookie(&token, ttl, state.config.secure_cookies);
    Ok((token, cookie))
}

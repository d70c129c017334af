//! Reminder HTTP handlers and the sweep trigger.

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use recall_core::{Reminder, ReminderWithBookmark, SweepReport};

use crate::auth::{bearer_token, constant_time_eq};
use crate::{ApiError, AppState, JsonBody, RequireAuth};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertReminderBody {
    pub bookmark_id: Option<Uuid>,
    pub scheduled_at: Option<DateTime<Utc>>,
    pub message: Option<String>,
}

/// List the caller's reminders with their bookmarks, soonest first.
pub async fn list_reminders(
    State(state): State<AppState>,
    auth: RequireAuth,
) -> Result<Json<Vec<ReminderWithBookmark>>, ApiError> {
    Ok(Json(
        state
            .store
            .reminders
            .list_for_user(auth.principal.user_id)
            .await?,
    ))
}

/// Create the bookmark's reminder, or reschedule it and reset it to PENDING.
///
/// # Returns
/// - 201 Created with the reminder
/// - 400 Bad Request if `bookmarkId` or `scheduledAt` is missing
/// - 404 Not Found if the bookmark is not the caller's
pub async fn upsert_reminder(
    State(state): State<AppState>,
    auth: RequireAuth,
    JsonBody(body): JsonBody<UpsertReminderBody>,
) -> Result<(StatusCode, Json<Reminder>), ApiError> {
    let (bookmark_id, scheduled_at) = match (body.bookmark_id, body.scheduled_at) {
        (Some(b), Some(s)) => (b, s),
        _ => {
            return Err(ApiError::BadRequest(
                "bookmarkId and scheduledAt are required".to_string(),
            ))
        }
    };
    let reminder = state
        .bookmarks
        .upsert_reminder(&auth.principal, bookmark_id, scheduled_at, body.message)
        .await?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

/// Run one reminder sweep.
///
/// When `CRON_SECRET` is configured the request must carry
/// `Authorization: Bearer <secret>`; otherwise the trigger is open.
pub async fn process_reminders(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SweepReport>, ApiError> {
    if let Some(secret) = state.config.cron_secret.as_deref() {
        let authorized = bearer_token(&headers)
            .map(|token| constant_time_eq(&token, secret))
            .unwrap_or(false);
        if !authorized {
            tracing::warn!(
                subsystem = "api",
                component = "reminders",
                "Rejected sweep trigger without valid cron secret"
            );
            return Err(ApiError::Unauthorized("Unauthorized".to_string()));
        }
    }
    let report = state.sweeper.sweep(Utc::now()).await?;
    Ok(Json(report))
}

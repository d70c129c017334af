//! # recall-api
//!
//! HTTP surface for recall: session auth, bookmarks, tags, reminders,
//! notes, todos, rooms, export and health. The router is built here so the
//! binary and the integration tests share one definition.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod services;

use std::num::NonZeroU32;
use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use governor::{Quota, RateLimiter};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{AllowOrigin, CorsLayer},
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer},
    trace::TraceLayer,
};
use uuid::Uuid;

use recall_core::{MetadataFetcher, Store};
use recall_jobs::ReminderSweeper;

pub use auth::RequireAuth;
pub use config::{ApiConfig, RateLimitConfig};
pub use error::{ApiError, JsonBody};
pub use services::{BookmarkService, ContentService, RoomService};

// =============================================================================
// REQUEST ID (UUIDv7)
// =============================================================================

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

// =============================================================================
// APPLICATION STATE
// =============================================================================

/// Global rate limiter type (direct quota, no keyed bucketing).
pub type GlobalRateLimiter = RateLimiter<
    governor::state::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub bookmarks: BookmarkService,
    pub content: ContentService,
    pub rooms: RoomService,
    pub fetcher: Arc<dyn MetadataFetcher>,
    pub sweeper: ReminderSweeper,
    pub config: Arc<ApiConfig>,
    /// Global rate limiter (None if rate limiting is disabled).
    pub rate_limiter: Option<Arc<GlobalRateLimiter>>,
}

impl AppState {
    pub fn new(
        store: Store,
        fetcher: Arc<dyn MetadataFetcher>,
        sweeper: ReminderSweeper,
        config: ApiConfig,
    ) -> Self {
        let rate_limiter = config.rate_limit.and_then(build_rate_limiter);
        Self {
            bookmarks: BookmarkService::new(store.clone(), fetcher.clone()),
            content: ContentService::new(store.clone()),
            rooms: RoomService::new(store.clone()),
            store,
            fetcher,
            sweeper,
            config: Arc::new(config),
            rate_limiter,
        }
    }
}

fn build_rate_limiter(limit: RateLimitConfig) -> Option<Arc<GlobalRateLimiter>> {
    let quota = Quota::with_period(std::time::Duration::from_secs(limit.period_secs))?
        .allow_burst(NonZeroU32::new(limit.requests)?);
    Some(Arc::new(RateLimiter::direct(quota)))
}

// =============================================================================
// ROUTER
// =============================================================================

/// Build the full application router.
pub fn build_router(state: AppState) -> Router {
    use handlers::{auth, bookmarks, export, notes, reminders, rooms, tags, todos};

    let api = Router::new()
        // Authentication
        .route("/auth/signup", post(auth::signup))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        // Bookmarks
        .route(
            "/bookmarks",
            get(bookmarks::list_bookmarks)
                .post(bookmarks::create_bookmark)
                .patch(bookmarks::update_bookmark)
                .delete(bookmarks::delete_bookmark),
        )
        .route("/bookmarks/reorder", post(bookmarks::reorder_bookmarks))
        .route("/bookmarks/search", get(bookmarks::search_bookmarks))
        // Tags
        .route(
            "/tags",
            get(tags::list_tags)
                .post(tags::create_tag)
                .delete(tags::delete_tag),
        )
        // Reminders
        .route(
            "/reminders",
            get(reminders::list_reminders).post(reminders::upsert_reminder),
        )
        .route(
            "/reminders/process",
            get(reminders::process_reminders).post(reminders::process_reminders),
        )
        // Notes
        .route("/notes", get(notes::list_notes).post(notes::create_note))
        .route(
            "/notes/:id",
            patch(notes::update_note).delete(notes::delete_note),
        )
        // Todos
        .route("/todos", get(todos::list_todos).post(todos::create_todo))
        .route(
            "/todos/:id",
            patch(todos::update_todo).delete(todos::delete_todo),
        )
        // Rooms
        .route("/rooms", get(rooms::list_rooms).post(rooms::create_room))
        .route(
            "/rooms/:id",
            get(rooms::get_room)
                .patch(rooms::update_room)
                .delete(rooms::delete_room),
        )
        .route(
            "/rooms/:id/members",
            get(rooms::list_members)
                .post(rooms::invite_member)
                .delete(rooms::leave_room),
        )
        .route(
            "/rooms/:id/bookmarks",
            get(rooms::list_room_bookmarks).post(rooms::create_room_bookmark),
        )
        // Export
        .route("/export", get(export::export_bookmarks));

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origin_values(
            &state.config.allowed_origins,
        )))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(3600));
    let body_limit = state.config.body_limit_bytes;

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .layer(cors)
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(CatchPanicLayer::new())
        .with_state(state)
}

/// Parse configured origins into header values, skipping invalid entries.
fn allowed_origin_values(origins: &[String]) -> Vec<HeaderValue> {
    origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!("Invalid CORS origin '{}': {}", origin, e);
                None
            }
        })
        .collect()
}

// =============================================================================
// MIDDLEWARE
// =============================================================================

async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Result<impl IntoResponse, (StatusCode, Json<serde_json::Value>)> {
    if let Some(limiter) = &state.rate_limiter {
        if limiter.check().is_err() {
            tracing::warn!(subsystem = "api", "Rate limit exceeded");
            return Err((
                StatusCode::TOO_MANY_REQUESTS,
                Json(serde_json::json!({
                    "error": "Too many requests. Please wait before retrying."
                })),
            ));
        }
    }
    Ok(next.run(request).await)
}

// =============================================================================
// HEALTH CHECK
// =============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_rejects_zero_quota() {
        assert!(build_rate_limiter(RateLimitConfig {
            requests: 0,
            period_secs: 60
        })
        .is_none());
        assert!(build_rate_limiter(RateLimitConfig {
            requests: 10,
            period_secs: 0
        })
        .is_none());
        assert!(build_rate_limiter(RateLimitConfig {
            requests: 10,
            period_secs: 60
        })
        .is_some());
    }

    #[test]
    fn test_invalid_origins_are_skipped() {
        let values = allowed_origin_values(&[
            "https://ok.example".to_string(),
            "bad\norigin".to_string(),
        ]);
        assert_eq!(values.len(), 1);
    }
}

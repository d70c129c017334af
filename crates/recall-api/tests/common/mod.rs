//! Shared harness: the full router over the in-memory store, with a stub
//! metadata fetcher and a recording notification sender.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use recall_api::{build_router, ApiConfig, AppState};
use recall_core::{
    Error, MetadataFetcher, NotificationSender, PageMetadata, ReminderEmail, Result,
};
use recall_db::InMemoryStore;
use recall_integrations::parse_target;
use recall_jobs::ReminderSweeper;

/// Title every stubbed page reports.
pub const STUB_TITLE: &str = "Stub Page Title";

/// Metadata fetcher that never touches the network.
pub struct StubFetcher;

#[async_trait]
impl MetadataFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<PageMetadata> {
        let (_, domain) = parse_target(url)?;
        Ok(PageMetadata {
            title: Some(STUB_TITLE.to_string()),
            favicon: Some(format!("https://{}/favicon.ico", domain)),
            domain,
        })
    }
}

/// Records every reminder email instead of sending it.
#[derive(Default)]
pub struct RecordingSender {
    pub sent: Mutex<Vec<ReminderEmail>>,
    pub fail: bool,
}

impl RecordingSender {
    pub fn sent(&self) -> Vec<ReminderEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSender for RecordingSender {
    async fn send_reminder(&self, email: &ReminderEmail) -> Result<()> {
        if self.fail {
            return Err(Error::Notification("delivery refused".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text)
            .unwrap_or_else(|e| panic!("body is not JSON ({}): {}", e, self.text))
    }

    pub fn header(&self, name: header::HeaderName) -> Option<String> {
        self.headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub sender: Arc<RecordingSender>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(ApiConfig::default())
    }

    pub fn with_config(config: ApiConfig) -> Self {
        let store = InMemoryStore::new().store();
        let sender = Arc::new(RecordingSender::default());
        let sweeper = ReminderSweeper::new(store.reminders.clone(), sender.clone());
        let state = AppState::new(store, Arc::new(StubFetcher), sweeper, config);
        Self {
            router: build_router(state.clone()),
            state,
            sender,
        }
    }

    /// Send a request, authenticating with `token` as a bearer when given.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            text: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    pub async fn get(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::GET, uri, Some(token), None).await
    }

    pub async fn post(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(token), Some(body)).await
    }

    pub async fn patch(&self, uri: &str, token: &str, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, Some(token), Some(body)).await
    }

    pub async fn delete(&self, uri: &str, token: &str) -> TestResponse {
        self.request(Method::DELETE, uri, Some(token), None).await
    }

    /// Sign up a user and return their session token.
    pub async fn signup(&self, email: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/auth/signup",
                None,
                Some(serde_json::json!({
                    "email": email,
                    "password": "password123",
                    "name": email.split('@').next().unwrap(),
                })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text);
        response.json()["token"].as_str().unwrap().to_string()
    }

    /// Create a bookmark and return its JSON.
    pub async fn bookmark(&self, token: &str, url: &str) -> Value {
        let response = self
            .post("/api/bookmarks", token, serde_json::json!({ "url": url }))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text);
        response.json()
    }

    /// Create a room and return its id.
    pub async fn room(&self, token: &str, name: &str) -> String {
        let response = self
            .post("/api/rooms", token, serde_json::json!({ "name": name }))
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.text);
        response.json()["id"].as_str().unwrap().to_string()
    }
}

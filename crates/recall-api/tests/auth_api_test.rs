//! Sessions, health and the middleware stack.

mod common;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
};
use serde_json::json;

use recall_api::ApiConfig;

use common::TestApp;

async fn signup_raw(app: &TestApp, email: &str, password: &str) -> common::TestResponse {
    app.request(
        Method::POST,
        "/api/auth/signup",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await
}

#[tokio::test]
async fn test_signup_sets_session_cookie() {
    let app = TestApp::new();
    let response = signup_raw(&app, "New@Example.com", "password123").await;
    assert_eq!(response.status, StatusCode::CREATED, "{}", response.text);

    let cookie = response.header(header::SET_COOKIE).unwrap();
    assert!(cookie.starts_with("recall_session="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(!cookie.contains("Secure"));

    let body = response.json();
    assert_eq!(body["user"]["email"], "New@Example.com");
    assert!(body["user"].get("passwordHash").is_none());
    assert_eq!(body["token"].as_str().unwrap().len(), 43);
}

#[tokio::test]
async fn test_signup_validation() {
    let app = TestApp::new();
    assert_eq!(
        signup_raw(&app, "taken@example.com", "password123").await.status,
        StatusCode::CREATED
    );

    let duplicate = signup_raw(&app, "TAKEN@example.com", "password123").await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);

    let short = signup_raw(&app, "short@example.com", "1234567").await;
    assert_eq!(short.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        short.json()["error"],
        "Password must be at least 8 characters"
    );

    let no_email = signup_raw(&app, "not-an-email", "password123").await;
    assert_eq!(no_email.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_checks_password() {
    let app = TestApp::new();
    app.signup("login@example.com").await;

    let ok = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "login@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(ok.status, StatusCode::OK);
    assert!(ok.header(header::SET_COOKIE).is_some());
    let token = ok.json()["token"].as_str().unwrap().to_string();
    let me = app.get("/api/auth/me", &token).await;
    assert_eq!(me.json()["email"], "login@example.com");

    for (email, password) in [
        ("login@example.com", "wrong-password"),
        ("nobody@example.com", "password123"),
    ] {
        let rejected = app
            .request(
                Method::POST,
                "/api/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(rejected.status, StatusCode::UNAUTHORIZED);
        assert_eq!(rejected.json()["error"], "Invalid email or password");
    }
}

#[tokio::test]
async fn test_cookie_authenticates() {
    let app = TestApp::new();
    let token = app.signup("cookie@example.com").await;

    let request = Request::builder()
        .method(Method::GET)
        .uri("/api/auth/me")
        .header(header::COOKIE, format!("theme=dark; recall_session={}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["email"], "cookie@example.com");
}

#[tokio::test]
async fn test_logout_ends_session() {
    let app = TestApp::new();
    let token = app.signup("bye@example.com").await;

    let logout = app
        .request(Method::POST, "/api/auth/logout", Some(&token), None)
        .await;
    assert_eq!(logout.status, StatusCode::NO_CONTENT);
    assert!(logout
        .header(header::SET_COOKIE)
        .unwrap()
        .contains("Max-Age=0"));

    let me = app.get("/api/auth/me", &token).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let app = TestApp::new();
    for uri in [
        "/api/bookmarks",
        "/api/tags",
        "/api/reminders",
        "/api/notes",
        "/api/todos",
        "/api/rooms",
        "/api/export",
    ] {
        let response = app.request(Method::GET, uri, None, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(response.json()["error"], "Authentication required");
    }

    let forged = app.get("/api/bookmarks", "not-a-session").await;
    assert_eq!(forged.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json()["status"], "healthy");
    assert!(response.header(header::HeaderName::from_static("x-request-id")).is_some());
}

#[tokio::test]
async fn test_rate_limit_rejects_burst() {
    let app = TestApp::with_config(ApiConfig::default().with_rate_limit(2, 60));
    for _ in 0..2 {
        let ok = app.request(Method::GET, "/health", None, None).await;
        assert_eq!(ok.status, StatusCode::OK);
    }
    let limited = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(limited.status, StatusCode::TOO_MANY_REQUESTS);
    assert!(limited.json()["error"].is_string());
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = TestApp::new();
    let token = app.signup("json@example.com").await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/bookmarks")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"url\": "))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response.json()["error"].is_string());
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let config = ApiConfig {
        body_limit_bytes: 128,
        ..ApiConfig::default()
    };
    let app = TestApp::with_config(config);
    let token = app.signup("big@example.com").await;

    let body = json!({ "title": "big", "content": "x".repeat(256) }).to_string();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/notes")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, body.len())
        .body(Body::from(body))
        .unwrap();
    let response = app.send(request).await;
    assert_eq!(response.status, StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_login_prunes_expired_sessions() {
    let app = TestApp::new();
    let token = app.signup("stale@example.com").await;
    let user_id: uuid::Uuid = app.get("/api/auth/me", &token).await.json()["id"]
        .as_str()
        .unwrap()
        .parse()
        .unwrap();

    let sessions = &app.state.store.sessions;
    let expired_at = chrono::Utc::now() - chrono::Duration::hours(1);
    sessions.create(user_id, "expired-a", expired_at).await.unwrap();
    sessions.create(user_id, "expired-b", expired_at).await.unwrap();

    let login = app
        .request(
            Method::POST,
            "/api/auth/login",
            None,
            Some(json!({ "email": "stale@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(login.status, StatusCode::OK);

    // Login already removed both; nothing is left to prune.
    assert_eq!(sessions.delete_expired(chrono::Utc::now()).await.unwrap(), 0);
    // Live sessions survive.
    assert_eq!(app.get("/api/auth/me", &token).await.status, StatusCode::OK);
}

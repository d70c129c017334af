//! Room membership and room-scoped content through the HTTP surface.

mod common;

use axum::http::StatusCode;
use serde_json::json;

use common::TestApp;

#[tokio::test]
async fn test_creator_becomes_sole_owner() {
    let app = TestApp::new();
    let u1 = app.signup("u1@example.com").await;

    let room_id = app.room(&u1, "Alpha").await;

    let rooms = app.get("/api/rooms", &u1).await.json();
    assert_eq!(rooms.as_array().unwrap().len(), 1);
    assert_eq!(rooms[0]["id"], room_id.as_str());
    assert_eq!(rooms[0]["name"], "Alpha");
    assert_eq!(rooms[0]["role"], "OWNER");
    assert_eq!(rooms[0]["memberCount"], 1);

    let detail = app.get(&format!("/api/rooms/{}", room_id), &u1).await;
    assert_eq!(detail.status, StatusCode::OK);
    assert_eq!(detail.json()["currentUserRole"], "OWNER");
}

#[tokio::test]
async fn test_invite_by_email_defaults_to_member() {
    let app = TestApp::new();
    let u1 = app.signup("u1@example.com").await;
    let u2 = app.signup("u2@example.com").await;
    let room_id = app.room(&u1, "Alpha").await;

    let invited = app
        .post(
            &format!("/api/rooms/{}/members", room_id),
            &u1,
            json!({ "email": "u2@example.com" }),
        )
        .await;
    assert_eq!(invited.status, StatusCode::CREATED, "{}", invited.text);
    assert_eq!(invited.json()["role"], "MEMBER");
    assert_eq!(invited.json()["user"]["email"], "u2@example.com");

    for token in [&u1, &u2] {
        let members = app
            .get(&format!("/api/rooms/{}/members", room_id), token)
            .await
            .json();
        let members = members.as_array().unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[0]["role"], "OWNER");
        assert_eq!(members[1]["role"], "MEMBER");
    }
}

#[tokio::test]
async fn test_member_cannot_delete_others_room_note() {
    let app = TestApp::new();
    let u1 = app.signup("u1@example.com").await;
    let u2 = app.signup("u2@example.com").await;
    let u3 = app.signup("u3@example.com").await;
    let room_id = app.room(&u1, "Alpha").await;
    for (email, role) in [("u2@example.com", "MEMBER"), ("u3@example.com", "ADMIN")] {
        let r = app
            .post(
                &format!("/api/rooms/{}/members", room_id),
                &u1,
                json!({ "email": email, "role": role }),
            )
            .await;
        assert_eq!(r.status, StatusCode::CREATED);
    }

    let note = app
        .post(
            "/api/notes",
            &u1,
            json!({ "content": "shared plan", "roomId": room_id }),
        )
        .await;
    assert_eq!(note.status, StatusCode::CREATED);
    let note_id = note.json()["id"].as_str().unwrap().to_string();

    // A plain member may edit but not delete.
    let edited = app
        .patch(
            &format!("/api/notes/{}", note_id),
            &u2,
            json!({ "content": "shared plan v2" }),
        )
        .await;
    assert_eq!(edited.status, StatusCode::OK);
    assert_eq!(edited.json()["content"], "shared plan v2");

    let denied = app.delete(&format!("/api/notes/{}", note_id), &u2).await;
    assert_eq!(denied.status, StatusCode::FORBIDDEN);
    assert!(denied.json()["error"].is_string());

    // An admin may delete.
    let deleted = app.delete(&format!("/api/notes/{}", note_id), &u3).await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);

    let notes = app
        .get(&format!("/api/notes?roomId={}", room_id), &u1)
        .await
        .json();
    assert!(notes.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_creator_can_delete_own_room_note() {
    let app = TestApp::new();
    let u1 = app.signup("u1@example.com").await;
    let room_id = app.room(&u1, "Alpha").await;
    let note = app
        .post(
            "/api/notes",
            &u1,
            json!({ "content": "mine", "roomId": room_id }),
        )
        .await
        .json();
    let deleted = app
        .delete(&format!("/api/notes/{}", note["id"].as_str().unwrap()), &u1)
        .await;
    assert_eq!(deleted.status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_owner_cannot_leave_while_others_remain() {
    let app = TestApp::new();
    let u1 = app.signup("u1@example.com").await;
    let u2 = app.signup("u2@example.com").await;
    let room_id = app.room(&u1, "Alpha").await;
    app.post(
        &format!("/api/rooms/{}/members", room_id),
        &u1,
        json!({ "email": "u2@example.com" }),
    )
    .await;

    let rejected = app
        .delete(&format!("/api/rooms/{}/members", room_id), &u1)
        .await;
    assert_eq!(rejected.status, StatusCode::FORBIDDEN);

    // The member leaves, then the sole owner may leave too.
    let left = app
        .delete(&format!("/api/rooms/{}/members", room_id), &u2)
        .await;
    assert_eq!(left.status, StatusCode::NO_CONTENT);

    let owner_left = app
        .delete(&format!("/api/rooms/{}/members", room_id), &u1)
        .await;
    assert_eq!(owner_left.status, StatusCode::NO_CONTENT);
    assert!(app.get("/api/rooms", &u1).await.json().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_invite_conflicts() {
    let app = TestApp::new();
    let u1 = app.signup("u1@example.com").await;
    let _u2 = app.signup("u2@example.com").await;
    let room_id = app.room(&u1, "Alpha").await;
    let uri = format!("/api/rooms/{}/members", room_id);

    let first = app.post(&uri, &u1, json!({ "email": "u2@example.com" })).await;
    assert_eq!(first.status, StatusCode::CREATED);
    let second = app.post(&uri, &u1, json!({ "email": "u2@example.com" })).await;
    assert_eq!(second.status, StatusCode::CONFLICT);

    let members = app.get(&uri, &u1).await.json();
    assert_eq!(members.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_invite_validation() {
    let app = TestApp::new();
    let u1 = app.signup("u1@example.com").await;
    let u2 = app.signup("u2@example.com").await;
    let room_id = app.room(&u1, "Alpha").await;
    let uri = format!("/api/rooms/{}/members", room_id);

    let missing = app.post(&uri, &u1, json!({})).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);

    let unknown = app.post(&uri, &u1, json!({ "email": "ghost@example.com" })).await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);

    app.post(&uri, &u1, json!({ "email": "u2@example.com" })).await;
    app.signup("u3@example.com").await;
    let by_member = app.post(&uri, &u2, json!({ "email": "u3@example.com" })).await;
    assert_eq!(by_member.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_non_member_sees_not_found_everywhere() {
    let app = TestApp::new();
    let owner = app.signup("owner@example.com").await;
    let outsider = app.signup("outsider@example.com").await;
    let room_id = app.room(&owner, "Private").await;

    let reads = [
        format!("/api/rooms/{}", room_id),
        format!("/api/rooms/{}/members", room_id),
        format!("/api/rooms/{}/bookmarks", room_id),
        format!("/api/notes?roomId={}", room_id),
        format!("/api/todos?roomId={}", room_id),
    ];
    for uri in &reads {
        let response = app.get(uri, &outsider).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "GET {}", uri);
    }

    let writes = [
        (format!("/api/rooms/{}/members", room_id), json!({ "email": "outsider@example.com" })),
        (format!("/api/rooms/{}/bookmarks", room_id), json!({ "url": "https://example.com" })),
        ("/api/notes".to_string(), json!({ "content": "x", "roomId": room_id })),
        ("/api/todos".to_string(), json!({ "task": "x", "roomId": room_id })),
    ];
    for (uri, body) in &writes {
        let response = app.post(uri, &outsider, body.clone()).await;
        assert_eq!(response.status, StatusCode::NOT_FOUND, "POST {}", uri);
    }

    let patch = app
        .patch(&format!("/api/rooms/{}", room_id), &outsider, json!({ "name": "Mine" }))
        .await;
    assert_eq!(patch.status, StatusCode::NOT_FOUND);
    let delete = app.delete(&format!("/api/rooms/{}", room_id), &outsider).await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);
    let leave = app
        .delete(&format!("/api/rooms/{}/members", room_id), &outsider)
        .await;
    assert_eq!(leave.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_room_update_and_delete_roles() {
    let app = TestApp::new();
    let owner = app.signup("owner@example.com").await;
    let admin = app.signup("admin@example.com").await;
    let room_id = app.room(&owner, "Alpha").await;
    app.post(
        &format!("/api/rooms/{}/members", room_id),
        &owner,
        json!({ "email": "admin@example.com", "role": "ADMIN" }),
    )
    .await;

    let renamed = app
        .patch(
            &format!("/api/rooms/{}", room_id),
            &admin,
            json!({ "name": "Beta", "description": "team space" }),
        )
        .await;
    assert_eq!(renamed.status, StatusCode::OK);
    assert_eq!(renamed.json()["name"], "Beta");
    assert_eq!(renamed.json()["description"], "team space");

    let cleared = app
        .patch(
            &format!("/api/rooms/{}", room_id),
            &admin,
            json!({ "description": null }),
        )
        .await
        .json();
    assert_eq!(cleared["name"], "Beta");
    assert!(cleared["description"].is_null());

    let admin_delete = app.delete(&format!("/api/rooms/{}", room_id), &admin).await;
    assert_eq!(admin_delete.status, StatusCode::FORBIDDEN);

    let owner_delete = app.delete(&format!("/api/rooms/{}", room_id), &owner).await;
    assert_eq!(owner_delete.status, StatusCode::NO_CONTENT);
    let gone = app.get(&format!("/api/rooms/{}", room_id), &owner).await;
    assert_eq!(gone.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_room_todos_and_bookmarks() {
    let app = TestApp::new();
    let u1 = app.signup("u1@example.com").await;
    let u2 = app.signup("u2@example.com").await;
    let room_id = app.room(&u1, "Alpha").await;
    app.post(
        &format!("/api/rooms/{}/members", room_id),
        &u1,
        json!({ "email": "u2@example.com", "role": "VIEWER" }),
    )
    .await;

    let todo = app
        .post("/api/todos", &u1, json!({ "task": "book venue", "roomId": room_id }))
        .await;
    assert_eq!(todo.status, StatusCode::CREATED);
    let todo_id = todo.json()["id"].as_str().unwrap().to_string();

    // Any member, even a viewer, can tick a room todo.
    let done = app
        .patch(&format!("/api/todos/{}", todo_id), &u2, json!({ "isDone": true }))
        .await;
    assert_eq!(done.status, StatusCode::OK);
    assert_eq!(done.json()["isDone"], true);
    assert_eq!(done.json()["task"], "book venue");

    let shared = app
        .post(
            &format!("/api/rooms/{}/bookmarks", room_id),
            &u2,
            json!({ "url": "https://example.com/venue", "note": "nice" }),
        )
        .await;
    assert_eq!(shared.status, StatusCode::CREATED, "{}", shared.text);
    assert_eq!(shared.json()["title"], common::STUB_TITLE);

    let listed = app
        .get(&format!("/api/rooms/{}/bookmarks", room_id), &u1)
        .await
        .json();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["note"], "nice");

    // Personal scope stays separate from the room.
    let personal = app.get("/api/todos", &u1).await.json();
    assert!(personal.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_personal_content_is_private() {
    let app = TestApp::new();
    let alice = app.signup("alice@example.com").await;
    let bob = app.signup("bob@example.com").await;

    let note = app
        .post("/api/notes", &alice, json!({ "title": "diary", "content": "secret" }))
        .await
        .json();
    let note_uri = format!("/api/notes/{}", note["id"].as_str().unwrap());

    assert!(app.get("/api/notes", &bob).await.json().as_array().unwrap().is_empty());
    assert_eq!(
        app.patch(&note_uri, &bob, json!({ "content": "mine now" })).await.status,
        StatusCode::FORBIDDEN
    );
    assert_eq!(app.delete(&note_uri, &bob).await.status, StatusCode::FORBIDDEN);

    let retitled = app.patch(&note_uri, &alice, json!({ "title": null })).await.json();
    assert!(retitled["title"].is_null());
    assert_eq!(retitled["content"], "secret");

    let empty = app.post("/api/notes", &alice, json!({ "content": "   " })).await;
    assert_eq!(empty.status, StatusCode::BAD_REQUEST);
}

//! API integration tests

use std::time::Duration;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use tokio_stream::StreamExt;

use crate::common::TestApp;

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");

    let (status, body) = app.get("/api/v1/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["backend"], "memory");
    assert_eq!(body["signed_in"], false);
}

#[tokio::test]
async fn test_sign_up_sign_out_sign_in() {
    let app = TestApp::new().await;
    let user_id = app.sign_up("reader@example.com").await;

    let (status, body) = app.get("/api/v1/auth/me").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user_id);
    assert_eq!(body["user_metadata"]["username"], "reader");

    let (status, _) = app.send(Method::POST, "/api/v1/auth/logout", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.get("/api/v1/auth/me").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = app
        .post(
            "/api/v1/auth/login",
            json!({ "email": "reader@example.com", "password": "secret123" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["id"], user_id);
    assert!(body["expires_at"].is_string());
}

#[tokio::test]
async fn test_login_invalid_credentials() {
    let app = TestApp::new().await;
    app.sign_up("reader@example.com").await;

    let (status, body) = app
        .post(
            "/api/v1/auth/login",
            json!({ "email": "reader@example.com", "password": "wrong-password" }),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "NotAuthorized");
}

#[tokio::test]
async fn test_sign_up_rejects_invalid_email() {
    let app = TestApp::new().await;

    let (status, _) = app
        .post(
            "/api/v1/auth/signup",
            json!({ "email": "not-an-email", "password": "secret123" }),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unauthorized_access() {
    let app = TestApp::new().await;

    let (status, _) = app.get("/api/v1/me/books").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app
        .post("/api/v1/books", json!({ "title": "Dune", "author": "Frank Herbert" }))
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Reading the catalog needs no session
    let (status, body) = app.get("/api/v1/books").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn test_create_and_delete_book() {
    let app = TestApp::new().await;
    let user_id = app.sign_up("reader@example.com").await;
    let book_id = app.add_book("Dune", "Frank Herbert").await;

    let (status, body) = app.get(&format!("/api/v1/books/{}", book_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Dune");
    assert_eq!(body["created_by"], user_id);

    let (status, body) = app
        .put(&format!("/api/v1/books/{}", book_id), json!({ "genre": "Science fiction" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["genre"], "Science fiction");
    assert_eq!(body["title"], "Dune");

    let (status, _) = app.delete(&format!("/api/v1/books/{}", book_id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.get(&format!("/api/v1/books/{}", book_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_book_requires_title() {
    let app = TestApp::new().await;
    app.sign_up("reader@example.com").await;

    let (status, body) = app.post("/api/v1/books", json!({ "title": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "BadValue");
}

#[tokio::test]
async fn test_search_and_match() {
    let app = TestApp::new().await;
    app.sign_up("reader@example.com").await;
    app.add_book("Dune", "Frank Herbert").await;
    app.add_book("Hyperion", "Dan Simmons").await;

    let (status, body) = app.get("/api/v1/books/search?q=herb").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["title"], "Dune");

    let (_, body) = app.get("/api/v1/books/search?q=d").await;
    assert_eq!(body, json!([]));

    let (status, body) = app
        .get("/api/v1/books/match?title=dune&author=FRANK%20HERBERT")
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Dune");

    let (status, _) = app.get("/api/v1/books/match?title=Dun&author=Frank%20Herbert").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_match_book_without_author() {
    let app = TestApp::new().await;
    app.sign_up("reader@example.com").await;
    let (status, body) = app.post("/api/v1/books", json!({ "title": "Beowulf" })).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);

    let (status, body) = app.get("/api/v1/books/match?title=beowulf").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "Beowulf");
    assert!(body["author"].is_null());

    let (status, _) = app.get("/api/v1/books/match?title=beowulf&author=Heaney").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_claim_and_release_book() {
    let app = TestApp::new().await;
    let user_id = app.sign_up("reader@example.com").await;
    let book_id = app.add_book("Dune", "Frank Herbert").await;
    let owner_uri = format!("/api/v1/books/{}/owner", book_id);

    let (_, body) = app.get(&owner_uri).await;
    assert_eq!(body["associated"], true);

    let (status, body) = app.delete(&owner_uri).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["created_by"].is_null());

    let (_, body) = app.get(&owner_uri).await;
    assert_eq!(body["associated"], false);
    let (_, body) = app.get(&format!("/api/v1/users/{}/books", user_id)).await;
    assert_eq!(body, json!([]));

    let (status, _) = app.put(&owner_uri, Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = app.get(&format!("/api/v1/users/{}/books", user_id)).await;
    assert_eq!(body[0]["id"], book_id.as_str());
}

#[tokio::test]
async fn test_library_wishlist_and_favorites() {
    let app = TestApp::new().await;
    app.sign_up("reader@example.com").await;
    let dune = app.add_book("Dune", "Frank Herbert").await;
    let hyperion = app.add_book("Hyperion", "Dan Simmons").await;

    let (status, entry) = app
        .post("/api/v1/me/books", json!({ "book_id": dune, "note": 0 }))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(entry["favorite"], false);

    // Adding the same book twice is rejected by the store
    let (status, _) = app.post("/api/v1/me/books", json!({ "book_id": dune })).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);

    let (_, wishlist) = app.get("/api/v1/me/books/wishlist").await;
    assert_eq!(wishlist.as_array().unwrap().len(), 1);
    assert_eq!(wishlist[0]["books"]["title"], "Dune");

    let (_, page) = app.get("/dashboard/wishlist").await;
    assert_eq!(page[0]["stars"], "⭐️");

    // Toggling a book outside the library adds it as a favorite
    let (status, toggled) = app
        .send(Method::POST, &format!("/api/v1/me/books/{}/favorite", hyperion), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(toggled["favorite"], true);

    let (_, favorites) = app.get("/api/v1/me/books/favorites").await;
    assert_eq!(favorites.as_array().unwrap().len(), 1);
    assert_eq!(favorites[0]["book_id"], hyperion.as_str());

    let (_, toggled) = app
        .send(Method::POST, &format!("/api/v1/me/books/{}/favorite", hyperion), None)
        .await;
    assert_eq!(toggled["favorite"], false);

    let (_, all) = app.get("/api/v1/me/books").await;
    assert_eq!(all.as_array().unwrap().len(), 2);
    assert_eq!(all[0]["book_id"], hyperion.as_str());
}

#[tokio::test]
async fn test_update_and_remove_library_entry() {
    let app = TestApp::new().await;
    app.sign_up("reader@example.com").await;
    let book_id = app.add_book("Dune", "Frank Herbert").await;

    let (_, entry) = app.post("/api/v1/me/books", json!({ "book_id": book_id })).await;
    let entry_id = entry["id"].as_str().unwrap().to_string();

    let (status, _) = app
        .put(&format!("/api/v1/user-books/{}", entry_id), json!({ "note": 9 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = app
        .put(
            &format!("/api/v1/user-books/{}", entry_id),
            json!({ "note": 4, "review": "Spice" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["note"], 4);
    assert_eq!(updated["review"], "Spice");

    let (_, exists) = app.get(&format!("/api/v1/me/books/{}/exists", book_id)).await;
    assert_eq!(exists["exists"], true);

    let (status, _) = app.delete(&format!("/api/v1/user-books/{}", entry_id)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, exists) = app.get(&format!("/api/v1/me/books/{}/exists", book_id)).await;
    assert_eq!(exists["exists"], false);
    let (status, _) = app.get(&format!("/api/v1/me/books/{}", book_id)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_read_and_update() {
    let app = TestApp::new().await;
    let user_id = app.sign_up("reader@example.com").await;

    let (status, profile) = app.get("/api/v1/profile").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["id"], user_id);
    assert_eq!(profile["is_premium"], false);

    let (status, profile) = app
        .put("/api/v1/profile", json!({ "username": "bookworm" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["username"], "bookworm");

    let (status, _) = app.put("/api/v1/profile", json!({ "username": "" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_session_stream_starts_with_current_user() {
    let app = TestApp::new().await;

    let response = app.raw(Method::GET, "/api/v1/auth/session/stream", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut frames = response.into_body().into_data_stream();
    let first = tokio::time::timeout(Duration::from_secs(1), frames.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let text = String::from_utf8(first.to_vec()).unwrap();
    assert!(text.contains("event: session"));
    assert!(text.contains("data: null"));
}

#[tokio::test]
async fn test_entries_of_another_user_are_out_of_reach() {
    let app = TestApp::new().await;
    app.sign_up("alice@example.com").await;
    let book_id = app.add_book("Dune", "Frank Herbert").await;
    let (_, entry) = app
        .post("/api/v1/me/books", json!({ "book_id": book_id, "note": 5 }))
        .await;
    let entry_uri = format!("/api/v1/user-books/{}", entry["id"].as_str().unwrap());
    app.send(Method::POST, "/api/v1/auth/logout", None).await;

    app.sign_up("mallory@example.com").await;
    let (status, _) = app
        .put(&entry_uri, json!({ "note": 1, "review": "overwritten" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = app.delete(&entry_uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    app.send(Method::POST, "/api/v1/auth/logout", None).await;
    let (status, _) = app
        .post(
            "/api/v1/auth/login",
            json!({ "email": "alice@example.com", "password": "secret123" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let (_, kept) = app.get(&format!("/api/v1/me/books/{}", book_id)).await;
    assert_eq!(kept["note"], 5);
    assert!(kept["review"].is_null());
}

//! Route guard behavior on the page routes

use axum::http::{header, Method, StatusCode};
use serde_json::json;

use crate::common::TestApp;

#[tokio::test]
async fn test_protected_page_redirects_to_login() {
    let app = TestApp::new().await;

    for path in [
        "/dashboard/library",
        "/dashboard/favorites",
        "/dashboard/wishlist",
        "/dashboard/settings",
    ] {
        let response = app.raw(Method::GET, path, None).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "{}", path);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }
}

#[tokio::test]
async fn test_public_pages_render_without_user() {
    let app = TestApp::new().await;

    let (status, body) = app.get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], "home");
    assert!(body["user"].is_null());

    let (status, body) = app.get("/login").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["page"], "login");
}

#[tokio::test]
async fn test_protected_page_renders_for_signed_in_user() {
    let app = TestApp::new().await;
    let user_id = app.sign_up("reader@example.com").await;

    let (status, body) = app.get("/dashboard/library").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, body) = app.get("/dashboard/settings").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], user_id);
    assert_eq!(body["username"], "reader");
}

#[tokio::test]
async fn test_sign_out_closes_protected_pages() {
    let app = TestApp::new().await;
    app.sign_up("reader@example.com").await;

    let (status, _) = app.send(Method::POST, "/api/v1/auth/logout", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let response = app.raw(Method::GET, "/dashboard/wishlist", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

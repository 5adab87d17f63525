mod common;

use axum::http::StatusCode;

use common::{TestApp, add_message, add_user};

const UID: i64 = 1;

fn setup() -> TestApp {
    let app = TestApp::new();
    add_user(app.db(), UID, "testuser", "test@test.com", "HASHED_PASSWORD");
    add_message(app.db(), Some(7), "trending warble", UID);
    add_message(app.db(), Some(522), "Eating some lunch", UID);
    app
}

#[tokio::test]
async fn add_message_redirects_to_profile() {
    let mut app = setup();
    app.login_as(UID);

    let resp = app.post_form("/messages/new", "text=Hello").await;
    assert_eq!(resp.status, StatusCode::FOUND);
    assert_eq!(resp.location(), Some("/users/1"));

    let messages = app.db().user_messages(UID, 100).unwrap();
    assert!(messages.iter().any(|m| m.text == "Hello"));
}

#[tokio::test]
async fn add_message_requires_login() {
    let mut app = setup();

    let resp = app.post_form("/messages/new", "text=Hello").await;
    let resp = app.follow(resp).await;
    assert!(resp.body.contains("Access unauthorized"));
    assert_eq!(app.db().user_messages(UID, 100).unwrap().len(), 2);
}

#[tokio::test]
async fn overlong_message_is_rejected() {
    let mut app = setup();
    app.login_as(UID);

    let form = format!("text={}", "a".repeat(141));
    let resp = app.post_form("/messages/new", &form).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("between 1 and 140 characters"));
    assert_eq!(app.db().user_messages(UID, 100).unwrap().len(), 2);
}

#[tokio::test]
async fn new_message_form() {
    let mut app = setup();
    app.login_as(UID);

    let resp = app.get("/messages/new").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains(r#"name="text""#));
}

#[tokio::test]
async fn owner_deletes_message() {
    let mut app = setup();
    app.login_as(UID);

    let resp = app.post("/messages/522/delete").await;
    let resp = app.follow(resp).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(app.db().get_message(522).unwrap().is_none());
}

#[tokio::test]
async fn unknown_session_user_cannot_delete() {
    let mut app = setup();
    app.login_as(5);

    let resp = app.post("/messages/522/delete").await;
    let resp = app.follow(resp).await;
    assert!(resp.body.contains("Access unauthorized"));
    assert!(app.db().get_message(522).unwrap().is_some());
}

#[tokio::test]
async fn other_user_cannot_delete() {
    let mut app = setup();
    add_user(app.db(), 5, "test1", "email1@email.com", "password");
    app.login_as(5);

    let resp = app.post("/messages/522/delete").await;
    assert_eq!(resp.status, StatusCode::FOUND);
    let resp = app.follow(resp).await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("Access unauthorized"));
    assert!(app.db().get_message(522).unwrap().is_some());
}

#[tokio::test]
async fn anonymous_cannot_delete() {
    let mut app = setup();

    let resp = app.post("/messages/522/delete").await;
    let resp = app.follow(resp).await;
    assert!(resp.body.contains("Access unauthorized"));
    assert!(app.db().get_message(522).unwrap().is_some());
}

#[tokio::test]
async fn show_message() {
    let mut app = setup();

    let resp = app.get("/messages/7").await;
    assert_eq!(resp.status, StatusCode::OK);
    assert!(resp.body.contains("trending warble"));
    assert!(resp.body.contains("@testuser"));
    assert!(!resp.body.contains("/messages/7/delete"));

    app.login_as(UID);
    let resp = app.get("/messages/7").await;
    assert!(resp.body.contains("/messages/7/delete"));
}

#[tokio::test]
async fn missing_message_is_404() {
    let mut app = setup();
    app.login_as(UID);

    let resp = app.get("/messages/99999999").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    let resp = app.post("/messages/99999999/delete").await;
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn flash_shows_once() {
    let mut app = setup();

    let resp = app.post("/messages/522/delete").await;
    let resp = app.follow(resp).await;
    assert!(resp.body.contains("Access unauthorized"));

    let resp = app.get("/").await;
    assert!(!resp.body.contains("Access unauthorized"));
}

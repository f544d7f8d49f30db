mod common;

use axum::http::{Method, StatusCode};
use pretty_assertions::assert_eq;
use serde_json::json;
use uuid::Uuid;

use common::{id_of, MockDataGenerator, TestApp};

#[tokio::test]
async fn test_health_check_endpoint() {
    let app = TestApp::new();

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "fitcoach");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn test_user_crud_never_exposes_password() {
    let app = TestApp::new();

    let (status, created) = app.post("/users", MockDataGenerator::user()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["role"], "STUDENT");
    let id = id_of(&created);

    let (_, listed) = app.get("/users").await;
    let (_, fetched) = app.get(&format!("/users/{id}")).await;
    let (status, updated) = app
        .patch(&format!("/users/{id}"), json!({ "name": "Renamed", "password": "newpass1" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["name"], "Renamed");

    for user in [&created, &listed[0], &fetched, &updated] {
        let object = user.as_object().unwrap();
        assert!(!object.contains_key("password"));
        assert!(!object.contains_key("passwordHash"));
        assert!(!object.contains_key("password_hash"));
    }

    let (status, _) = app.delete(&format!("/users/{id}")).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app.get(&format!("/users/{id}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], format!("User with ID \"{id}\" not found"));
}

#[tokio::test]
async fn test_duplicate_email_is_conflict_and_not_persisted() {
    let app = TestApp::new();
    let payload = MockDataGenerator::user();

    let (status, _) = app.post("/users", payload.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.post("/users", payload).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Conflict");
    assert_eq!(body["message"], "User with this email already exists");

    let (_, listed) = app.get("/users").await;
    assert_eq!(listed.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_invalid_user_payloads_are_bad_requests() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/users", json!({ "email": "not-an-email", "password": "secret123" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Bad Request");

    let (status, _) = app
        .post("/users", json!({ "email": "short@example.com", "password": "abc" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.get("/users/not-a-uuid").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_missing_user_is_not_found_every_time() {
    let app = TestApp::new();
    let id = Uuid::new_v4();

    for _ in 0..2 {
        let (status, _) = app.delete(&format!("/users/{id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn test_login_returns_bearer_token() {
    let app = TestApp::new();
    let (_, email) = app.create_user().await;

    let (status, body) = app
        .post("/auth/login", json!({ "email": email, "password": "secret123" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 3600);

    let token = body["access_token"].as_str().unwrap().to_string();
    let (status, _) = app
        .send(Method::GET, "/subscriptions", None, Some(&token))
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_login_with_wrong_password_is_unauthorized() {
    let app = TestApp::new();
    let (_, email) = app.create_user().await;

    let (status, body) = app
        .post("/auth/login", json!({ "email": email, "password": "wrong-password" }))
        .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid credentials");
}

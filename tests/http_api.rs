//! End-to-end tests for the HTTP surface, driven through the router with
//! `tower::ServiceExt::oneshot`.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use portcullis::account::{self, AppState};
use portcullis::blobs::InMemoryImageStore;
use portcullis::config::AppConfig;
use portcullis::directory::InMemoryDirectory;

const SECRET: &str = "integration-test-secret-at-least-32-chars";

fn app() -> Router {
    let config = Arc::new(AppConfig {
        jwt_secret: SECRET.to_string(),
        user_table: "users".to_string(),
        profile_images_bucket: "profile-images".to_string(),
        work_factor: 4,
    });
    let directory = Arc::new(InMemoryDirectory::new(config.user_table.clone()));
    let images = Arc::new(InMemoryImageStore::new(
        config.profile_images_bucket.clone(),
    ));
    account::router(AppState::new(config, directory, images))
}

fn post(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

fn post_with_bearer(uri: &str, token: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("JSON body")
}

const SIGNUP: &str = r#"{"email":"ann@example.com","password":"Abcdef1!","name":"Ann"}"#;
const LOGIN: &str = r#"{"email":"ann@example.com","password":"Abcdef1!"}"#;

async fn login_token(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(post("/login", LOGIN))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    body["token"].as_str().expect("token").to_string()
}

#[tokio::test]
async fn test_signup_created() {
    let app = app();
    let response = app.oneshot(post("/signup", SIGNUP)).await.expect("response");
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = json_body(response).await;
    assert_eq!(body["message"], "User created successfully");
    assert_eq!(body["user"]["email"], "ann@example.com");
    assert_eq!(body["user"]["name"], "Ann");

    // No credential material in the response, under any name.
    let user = body["user"].as_object().expect("user object");
    assert!(!user.contains_key("password"));
    assert!(!user.contains_key("passwordHash"));
    assert!(!user.contains_key("password_hash"));
}

#[tokio::test]
async fn test_validation_failure_lists_every_field() {
    let app = app();
    let response = app
        .oneshot(post("/login", r#"{"email":"x","password":"short"}"#))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["message"], "Validation failed");
    let errors = body["errors"].as_array().expect("errors array");
    assert_eq!(errors.len(), 2);
    assert_eq!(errors[0]["field"], "email");
    assert_eq!(errors[1]["field"], "password");
}

#[tokio::test]
async fn test_duplicate_signup_conflicts() {
    let app = app();
    let first = app
        .clone()
        .oneshot(post("/signup", SIGNUP))
        .await
        .expect("response");
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app.oneshot(post("/signup", SIGNUP)).await.expect("response");
    assert_eq!(second.status(), StatusCode::CONFLICT);
    let body = json_body(second).await;
    assert_eq!(body["message"], "User already exists");
}

#[tokio::test]
async fn test_login_returns_a_token() {
    let app = app();
    app.clone()
        .oneshot(post("/signup", SIGNUP))
        .await
        .expect("response");

    let response = app.oneshot(post("/login", LOGIN)).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["user"]["email"], "ann@example.com");
    assert!(body["token"].as_str().expect("token").contains('.'));
}

#[tokio::test]
async fn test_wrong_password_is_unauthorized_without_detail() {
    let app = app();
    app.clone()
        .oneshot(post("/signup", SIGNUP))
        .await
        .expect("response");

    let response = app
        .oneshot(post(
            "/login",
            r#"{"email":"ann@example.com","password":"Wrong12!"}"#,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = json_body(response).await;
    assert_eq!(body["message"], "Invalid credentials");
    assert!(body.get("errors").is_none());
}

#[tokio::test]
async fn test_profile_image_requires_a_bearer_token() {
    let app = app();

    // No Authorization header: rejected before the body is looked at, so the
    // response reveals nothing about the expected schema.
    let response = app
        .clone()
        .oneshot(post("/profile/image", r#"{"wrong":"shape"}"#))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Unauthorized");
    assert!(body.get("errors").is_none());

    // Garbage token: same opaque rejection.
    let response = app
        .oneshot(post_with_bearer(
            "/profile/image",
            "not.a.token",
            r#"{"image":"data:image/png;base64,aGVsbG8="}"#,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Unauthorized");
}

#[tokio::test]
async fn test_profile_image_upload_round_trip() {
    let app = app();
    app.clone()
        .oneshot(post("/signup", SIGNUP))
        .await
        .expect("response");
    let token = login_token(&app).await;

    let response = app
        .oneshot(post_with_bearer(
            "/profile/image",
            &token,
            r#"{"image":"data:image/png;base64,aGVsbG8="}"#,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["message"], "Profile image updated successfully");
    let url = body["user"]["profileImageUrl"].as_str().expect("URL");
    assert!(url.starts_with("https://profile-images.s3.amazonaws.com/"));
    assert!(url.ends_with(".jpg"));
}

#[tokio::test]
async fn test_profile_image_body_is_validated_after_auth() {
    let app = app();
    app.clone()
        .oneshot(post("/signup", SIGNUP))
        .await
        .expect("response");
    let token = login_token(&app).await;

    let response = app
        .oneshot(post_with_bearer(
            "/profile/image",
            &token,
            r#"{"image":"not a data url"}"#,
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["message"], "Validation failed");
    assert_eq!(body["errors"][0]["field"], "image");
}

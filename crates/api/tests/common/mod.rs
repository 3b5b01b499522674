#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use sitedesk_api::auth::jwt::{generate_access_token, JwtConfig, TokenSubject};
use sitedesk_api::auth::password::hash_password;
use sitedesk_api::config::ServerConfig;
use sitedesk_api::router::build_app_router;
use sitedesk_api::state::AppState;
use sitedesk_api::ws::WsManager;
use sitedesk_core::remarks::TransitionPolicy;
use sitedesk_db::models::user::{CreateUser, User};
use sitedesk_db::repositories::UserRepo;
use sqlx::PgPool;
use tower::ServiceExt;

pub const TEST_PASSWORD: &str = "correct-horse-42";

/// Test `ServerConfig` with a fixed JWT secret and strict remark transitions.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:3000".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        upload_dir: std::env::temp_dir().join("sitedesk-test-uploads"),
        remark_transitions: TransitionPolicy::Strict,
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_string(),
            access_token_expiry_mins: 30,
        },
    }
}

/// Full application router (same middleware stack as production).
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with(pool, test_config())
}

pub fn build_test_app_with(pool: PgPool, config: ServerConfig) -> Router {
    build_app_with_manager(pool, config, Arc::new(WsManager::new()))
}

/// Router sharing `ws_manager` with the caller, for push notification checks.
pub fn build_app_with_manager(
    pool: PgPool,
    config: ServerConfig,
    ws_manager: Arc<WsManager>,
) -> Router {
    build_app_router(AppState::new(pool, config, ws_manager))
}

/// Config whose uploads go to `dir`.
pub fn config_with_upload_dir(dir: PathBuf) -> ServerConfig {
    ServerConfig {
        upload_dir: dir,
        ..test_config()
    }
}

// ---------------------------------------------------------------------------
// Users and tokens
// ---------------------------------------------------------------------------

/// Insert a user with [`TEST_PASSWORD`] directly through the repository.
pub async fn create_user(pool: &PgPool, username: &str, is_admin: bool) -> User {
    let password_hash = hash_password(TEST_PASSWORD).expect("hashing should succeed");
    UserRepo::create(
        pool,
        &CreateUser {
            username: username.to_string(),
            email: Some(format!("{username}@sitedesk.test")),
            password_hash,
            full_name: Some(format!("{username} full name")),
            position: None,
            department: None,
            is_admin,
        },
    )
    .await
    .expect("user creation should succeed")
}

/// A valid access token for `user`, signed with the test secret.
pub fn token_for(user: &User) -> String {
    generate_access_token(
        TokenSubject {
            user_id: user.id,
            username: &user.username,
            is_admin: user.is_admin,
            permissions: &user.permissions,
        },
        &test_config().jwt,
    )
    .expect("token generation should succeed")
}

/// Create a user and return it with a token.
pub async fn user_with_token(pool: &PgPool, username: &str, is_admin: bool) -> (User, String) {
    let user = create_user(pool, username, is_admin).await;
    let token = token_for(&user);
    (user, token)
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.expect("request should not fail")
}

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, None, None)).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request(Method::GET, uri, Some(token), None)).await
}

pub async fn post_json(app: Router, uri: &str, body: Value) -> Response<Body> {
    send(app, request(Method::POST, uri, None, Some(body))).await
}

pub async fn post_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, request(Method::POST, uri, Some(token), Some(body))).await
}

/// POST with no body, as used by action endpoints.
pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request(Method::POST, uri, Some(token), None)).await
}

pub async fn put_json_auth(app: Router, uri: &str, token: &str, body: Value) -> Response<Body> {
    send(app, request(Method::PUT, uri, Some(token), Some(body))).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, request(Method::DELETE, uri, Some(token), None)).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body should be JSON")
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Create a project object through the API and return its id.
pub async fn create_project_object(app: Router, token: &str, code: &str) -> i64 {
    let response = post_json_auth(
        app,
        "/api/v1/project-objects",
        token,
        json!({ "object_code": code, "name": format!("Object {code}") }),
    )
    .await;
    assert_eq!(response.status(), 201);
    body_json(response).await["data"]["id"].as_i64().unwrap()
}

/// Create a material and its stock row; returns the material id.
pub async fn create_stocked_material(
    app: Router,
    token: &str,
    name: &str,
    quantity: i32,
    min_threshold: i32,
) -> i64 {
    let response = post_json_auth(
        app.clone(),
        "/api/v1/materials",
        token,
        json!({ "name": name }),
    )
    .await;
    assert_eq!(response.status(), 201);
    let material_id = body_json(response).await["data"]["id"].as_i64().unwrap();

    let response = post_json_auth(
        app,
        "/api/v1/material-stocks",
        token,
        json!({
            "material_id": material_id,
            "quantity": quantity,
            "min_threshold": min_threshold,
        }),
    )
    .await;
    assert_eq!(response.status(), 201);
    material_id
}

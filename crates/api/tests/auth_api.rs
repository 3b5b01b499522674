//! Registration, login, profile, and admin user management over HTTP.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, create_user, delete_auth, get, get_auth, post_auth, post_json, post_json_auth,
    put_json_auth, user_with_token, TEST_PASSWORD,
};
use serde_json::json;
use sitedesk_db::repositories::UserRepo;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_creates_regular_user(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/auth/register",
        json!({
            "username": "foreman",
            "password": "long-enough-pw",
            "email": "foreman@site.test",
            "full_name": "Site Foreman",
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["username"], "foreman");
    assert_eq!(json["data"]["is_admin"], false);
    assert_eq!(json["data"]["is_active"], true);
    assert!(json["data"].get("password_hash").is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_rejects_short_password(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/auth/register",
        json!({ "username": "shorty", "password": "1234567" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn register_rejects_duplicate_username(pool: PgPool) {
    create_user(&pool, "taken", false).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/auth/register",
        json!({ "username": "taken", "password": "long-enough-pw" }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["code"], "CONFLICT");
}

// ---------------------------------------------------------------------------
// Login
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_returns_bearer_token(pool: PgPool) {
    let user = create_user(&pool, "loginuser", false).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app.clone(),
        "/api/v1/auth/login",
        json!({ "username": "loginuser", "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["token_type"], "bearer");
    assert_eq!(json["data"]["expires_in"], 1800);
    assert_eq!(json["data"]["user"]["id"], user.id);

    let token = json["data"]["access_token"].as_str().unwrap();
    let me = get_auth(app, "/api/v1/auth/me", token).await;
    assert_eq!(me.status(), StatusCode::OK);
    assert_eq!(body_json(me).await["data"]["username"], "loginuser");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_with_wrong_password_is_unauthorized(pool: PgPool) {
    create_user(&pool, "wrongpw", false).await;
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "username": "wrongpw", "password": "not-the-password" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn login_to_deactivated_account_is_unauthorized(pool: PgPool) {
    let user = create_user(&pool, "dormant", false).await;
    UserRepo::set_active(&pool, user.id, false).await.unwrap();
    let app = common::build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "username": "dormant", "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(response).await["error"], "Account is deactivated");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn protected_route_requires_token(pool: PgPool) {
    let app = common::build_test_app(pool);
    let response = get(app.clone(), "/api/v1/auth/me").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = get_auth(app, "/api/v1/auth/me", "not-a-jwt").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deactivation_revokes_issued_tokens(pool: PgPool) {
    let (user, token) = user_with_token(&pool, "revoked", false).await;
    UserRepo::set_active(&pool, user.id, false).await.unwrap();
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/v1/auth/me", &token).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn logout_acknowledges(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "leaver", false).await;
    let app = common::build_test_app(pool);

    let response = post_auth(app, "/api/v1/auth/logout", &token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["message"], "Successfully logged out");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn profile_update_changes_fields_and_password(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "profiled", false).await;
    let app = common::build_test_app(pool);

    let response = put_json_auth(
        app.clone(),
        "/api/v1/auth/me",
        &token,
        json!({ "position": "Engineer", "password": "brand-new-password" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["position"], "Engineer");

    let old = post_json(
        app.clone(),
        "/api/v1/auth/login",
        json!({ "username": "profiled", "password": TEST_PASSWORD }),
    )
    .await;
    assert_eq!(old.status(), StatusCode::UNAUTHORIZED);

    let new = post_json(
        app,
        "/api/v1/auth/login",
        json!({ "username": "profiled", "password": "brand-new-password" }),
    )
    .await;
    assert_eq!(new.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Admin user management
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_routes_reject_regular_users(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "worker", false).await;
    let app = common::build_test_app(pool);

    let response = get_auth(app, "/api/v1/admin/users", &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(response).await["code"], "FORBIDDEN");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admin_manages_user_lifecycle(pool: PgPool) {
    let (_admin, admin_token) = user_with_token(&pool, "chief", true).await;
    let worker = create_user(&pool, "worker", false).await;
    let app = common::build_test_app(pool);

    let list = get_auth(app.clone(), "/api/v1/admin/users", &admin_token).await;
    assert_eq!(list.status(), StatusCode::OK);
    assert_eq!(body_json(list).await["data"].as_array().unwrap().len(), 2);

    let uri = format!("/api/v1/admin/users/{}/deactivate", worker.id);
    let response = post_auth(app.clone(), &uri, &admin_token).await;
    assert_eq!(body_json(response).await["data"]["is_active"], false);

    let uri = format!("/api/v1/admin/users/{}/activate", worker.id);
    let response = post_auth(app.clone(), &uri, &admin_token).await;
    assert_eq!(body_json(response).await["data"]["is_active"], true);

    let uri = format!("/api/v1/admin/users/{}/promote-admin", worker.id);
    let response = post_auth(app.clone(), &uri, &admin_token).await;
    assert_eq!(body_json(response).await["data"]["is_admin"], true);

    let uri = format!("/api/v1/admin/users/{}/demote-admin", worker.id);
    let response = post_auth(app.clone(), &uri, &admin_token).await;
    assert_eq!(body_json(response).await["data"]["is_admin"], false);

    let uri = format!("/api/v1/admin/users/{}/permissions", worker.id);
    let response = put_json_auth(
        app.clone(),
        &uri,
        &admin_token,
        json!({ "documents": true, "materials": false }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["permissions"]["documents"], true);

    let response = put_json_auth(app.clone(), &uri, &admin_token, json!(["documents"])).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let uri = format!("/api/v1/admin/users/{}", worker.id);
    let response = delete_auth(app.clone(), &uri, &admin_token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(app, &uri, &admin_token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn admins_are_protected_from_each_other_and_themselves(pool: PgPool) {
    let (admin, admin_token) = user_with_token(&pool, "chief", true).await;
    let other = create_user(&pool, "deputy", true).await;
    let app = common::build_test_app(pool);

    let uri = format!("/api/v1/admin/users/{}", other.id);
    let response = delete_auth(app.clone(), &uri, &admin_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let uri = format!("/api/v1/admin/users/{}/deactivate", other.id);
    let response = post_auth(app.clone(), &uri, &admin_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let uri = format!("/api/v1/admin/users/{}/demote-admin", admin.id);
    let response = post_auth(app.clone(), &uri, &admin_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let uri = format!("/api/v1/admin/users/{}/demote-admin", other.id);
    let response = post_auth(app, &uri, &admin_token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn demoted_admin_loses_access_immediately(pool: PgPool) {
    let (_chief, chief_token) = user_with_token(&pool, "chief", true).await;
    let (deputy, deputy_token) = user_with_token(&pool, "deputy", true).await;
    let app = common::build_test_app(pool);

    let uri = format!("/api/v1/admin/users/{}/demote-admin", deputy.id);
    let response = post_auth(app.clone(), &uri, &chief_token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json_auth(
        app,
        "/api/v1/admin/users/1/activate",
        &deputy_token,
        json!({}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

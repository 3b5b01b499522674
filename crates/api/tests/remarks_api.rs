//! Construction remark lifecycle, audit history, and photo attachments.

mod common;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{
    body_json, create_project_object, delete_auth, get_auth, post_json_auth, put_json_auth,
    send, user_with_token,
};
use serde_json::{json, Value};
use sqlx::PgPool;

async fn create_remark(app: Router, token: &str, object_id: i64, number: &str, extra: Value) -> Value {
    let mut body = json!({
        "remark_number": number,
        "project_object_id": object_id,
        "title": format!("Crack in wall {number}"),
        "description": "Hairline crack near the east window",
    });
    if let (Some(body), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
        body.extend(extra.clone());
    }
    let response = post_json_auth(app, "/api/v1/construction-remarks", token, body).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

async fn set_status(app: Router, token: &str, id: i64, status: &str) -> axum::response::Response {
    put_json_auth(
        app,
        &format!("/api/v1/construction-remarks/{id}"),
        token,
        json!({ "status": status }),
    )
    .await
}

fn multipart_upload(uri: &str, token: &str, filename: &str, content: &[u8], description: &str) -> Request<Body> {
    let boundary = "sitedesk-test-boundary";
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\n\
             Content-Type: image/jpeg\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Disposition: form-data; name=\"description\"\r\n\r\n");
    body.extend_from_slice(description.as_bytes());
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .header(
            "content-type",
            format!("multipart/form-data; boundary={boundary}"),
        )
        .body(Body::from(body))
        .unwrap()
}

// ---------------------------------------------------------------------------
// Lifecycle and history
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn creation_writes_initial_history(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "inspector", false).await;
    let app = common::build_test_app(pool);
    let object_id = create_project_object(app.clone(), &token, "OBJ-1").await;

    let remark = create_remark(app.clone(), &token, object_id, "R-1", json!({})).await;
    assert_eq!(remark["status"], "new");
    assert_eq!(remark["priority"], "normal");
    assert_eq!(remark["created_by"], "inspector");

    let id = remark["id"].as_i64().unwrap();
    let response = get_auth(app, &format!("/api/v1/construction-remarks/{id}/history"), &token).await;
    let json = body_json(response).await;
    let history = json["data"].as_array().unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["old_status"], Value::Null);
    assert_eq!(history[0]["new_status"], "new");
    assert_eq!(history[0]["changed_by"], "inspector");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn legal_status_changes_are_recorded(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "inspector", false).await;
    let app = common::build_test_app(pool);
    let object_id = create_project_object(app.clone(), &token, "OBJ-1").await;
    let id = create_remark(app.clone(), &token, object_id, "R-1", json!({})).await["id"]
        .as_i64()
        .unwrap();

    let response = set_status(app.clone(), &token, id, "in_progress").await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = set_status(app.clone(), &token, id, "fixed").await;
    assert_eq!(response.status(), StatusCode::OK);

    // Same status again is not a transition and adds no history.
    let response = set_status(app.clone(), &token, id, "fixed").await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(app, &format!("/api/v1/construction-remarks/{id}/history"), &token).await;
    let json = body_json(response).await;
    let history = json["data"].as_array().unwrap();
    assert_eq!(history.len(), 3);
    assert_eq!(history[0]["old_status"], "in_progress");
    assert_eq!(history[0]["new_status"], "fixed");
    assert_eq!(history[0]["comment"], "Status changed from in_progress to fixed");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn illegal_transition_is_conflict_and_leaves_no_trace(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "inspector", false).await;
    let app = common::build_test_app(pool);
    let object_id = create_project_object(app.clone(), &token, "OBJ-1").await;
    let id = create_remark(app.clone(), &token, object_id, "R-1", json!({})).await["id"]
        .as_i64()
        .unwrap();

    let response = set_status(app.clone(), &token, id, "closed").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = get_auth(app.clone(), &format!("/api/v1/construction-remarks/{id}"), &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["status"], "new");
    assert_eq!(json["data"]["history"].as_array().unwrap().len(), 1);

    set_status(app.clone(), &token, id, "rejected").await;
    let response = set_status(app, &token, id, "in_progress").await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn permissive_policy_allows_any_jump(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "inspector", false).await;
    let mut config = common::test_config();
    config.remark_transitions = sitedesk_core::remarks::TransitionPolicy::Permissive;
    let app = common::build_test_app_with(pool, config);
    let object_id = create_project_object(app.clone(), &token, "OBJ-1").await;
    let id = create_remark(app.clone(), &token, object_id, "R-1", json!({})).await["id"]
        .as_i64()
        .unwrap();

    let response = set_status(app, &token, id, "closed").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["status"], "closed");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn remark_for_unknown_object_is_not_found(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "inspector", false).await;
    let app = common::build_test_app(pool);

    let response = post_json_auth(
        app,
        "/api/v1/construction-remarks",
        &token,
        json!({
            "remark_number": "R-404",
            "project_object_id": 404,
            "title": "Nowhere",
            "description": "No such object",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn blank_remark_number_or_title_is_rejected(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "inspector", false).await;
    let app = common::build_test_app(pool);
    let object_id = create_project_object(app.clone(), &token, "OBJ-1").await;

    for (number, title) in [("", "Crack"), ("R-1", "")] {
        let response = post_json_auth(
            app.clone(),
            "/api/v1/construction-remarks",
            &token,
            json!({
                "remark_number": number,
                "project_object_id": object_id,
                "title": title,
                "description": "Hairline crack",
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_remark_number_is_conflict(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "inspector", false).await;
    let app = common::build_test_app(pool);
    let object_id = create_project_object(app.clone(), &token, "OBJ-1").await;
    create_remark(app.clone(), &token, object_id, "R-1", json!({})).await;

    let response = post_json_auth(
        app,
        "/api/v1/construction-remarks",
        &token,
        json!({
            "remark_number": "R-1",
            "project_object_id": object_id,
            "title": "Again",
            "description": "Same number",
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn overdue_excludes_resolved_and_future(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "inspector", false).await;
    let app = common::build_test_app(pool);
    let object_id = create_project_object(app.clone(), &token, "OBJ-1").await;

    let past = json!({ "deadline": "2020-01-01T00:00:00Z" });
    let future = json!({ "deadline": "2999-01-01T00:00:00Z" });
    create_remark(app.clone(), &token, object_id, "R-LATE", past.clone()).await;
    create_remark(app.clone(), &token, object_id, "R-SOON", future).await;
    let fixed = create_remark(app.clone(), &token, object_id, "R-DONE", past).await["id"]
        .as_i64()
        .unwrap();
    set_status(app.clone(), &token, fixed, "in_progress").await;
    set_status(app.clone(), &token, fixed, "fixed").await;

    let response = get_auth(app, "/api/v1/construction-remarks/overdue", &token).await;
    let json = body_json(response).await;
    let overdue = json["data"].as_array().unwrap();
    assert_eq!(overdue.len(), 1);
    assert_eq!(overdue[0]["remark_number"], "R-LATE");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn summary_counts_every_status(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "inspector", false).await;
    let app = common::build_test_app(pool);
    let object_id = create_project_object(app.clone(), &token, "OBJ-1").await;
    let first = create_remark(app.clone(), &token, object_id, "R-1", json!({})).await["id"]
        .as_i64()
        .unwrap();
    create_remark(app.clone(), &token, object_id, "R-2", json!({})).await;
    set_status(app.clone(), &token, first, "in_progress").await;

    let uri = format!("/api/v1/construction-remarks/project-object/{object_id}/summary");
    let response = get_auth(app.clone(), &uri, &token).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["total"], 2);
    assert_eq!(json["data"]["by_status"]["new"], 1);
    assert_eq!(json["data"]["by_status"]["in_progress"], 1);
    assert_eq!(json["data"]["by_status"]["closed"], 0);

    let response = get_auth(
        app,
        "/api/v1/construction-remarks/project-object/9999/summary",
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn search_and_status_listing(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "inspector", false).await;
    let app = common::build_test_app(pool);
    let object_id = create_project_object(app.clone(), &token, "OBJ-1").await;
    create_remark(app.clone(), &token, object_id, "R-1", json!({ "priority": "critical" })).await;
    create_remark(app.clone(), &token, object_id, "R-2", json!({})).await;

    let response = get_auth(
        app.clone(),
        "/api/v1/construction-remarks/search?q=R-2",
        &token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["remark_number"], "R-2");

    let response = get_auth(
        app.clone(),
        "/api/v1/construction-remarks/search?priority=critical",
        &token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["data"][0]["remark_number"], "R-1");

    let response = get_auth(app.clone(), "/api/v1/construction-remarks/status/new", &token).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 2);

    let response = get_auth(app, "/api/v1/construction-remarks/status/bogus", &token).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn only_admins_delete_remarks(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "inspector", false).await;
    let (_admin, admin_token) = user_with_token(&pool, "chief", true).await;
    let app = common::build_test_app(pool);
    let object_id = create_project_object(app.clone(), &token, "OBJ-1").await;
    let id = create_remark(app.clone(), &token, object_id, "R-1", json!({})).await["id"]
        .as_i64()
        .unwrap();
    let uri = format!("/api/v1/construction-remarks/{id}");

    let response = delete_auth(app.clone(), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete_auth(app.clone(), &uri, &admin_token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(app, &uri, &token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Photos
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn photo_upload_stores_file_and_row(pool: PgPool) {
    let uploads = tempfile::tempdir().unwrap();
    let (_user, token) = user_with_token(&pool, "inspector", false).await;
    let app = common::build_test_app_with(
        pool,
        common::config_with_upload_dir(uploads.path().to_path_buf()),
    );
    let object_id = create_project_object(app.clone(), &token, "OBJ-1").await;
    let id = create_remark(app.clone(), &token, object_id, "R-1", json!({})).await["id"]
        .as_i64()
        .unwrap();

    let uri = format!("/api/v1/construction-remarks/{id}/photos");
    let request = multipart_upload(&uri, &token, "../../crack.jpg", b"fake-jpeg-bytes", "East wall");
    let response = send(app.clone(), request).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["filename"], "crack.jpg");
    assert_eq!(json["data"]["file_size"], 15);
    assert_eq!(json["data"]["description"], "East wall");

    let stored = json["data"]["file_path"].as_str().unwrap().to_string();
    assert!(stored.starts_with(uploads.path().join("remark_photos").to_str().unwrap()));
    assert_eq!(std::fs::read(&stored).unwrap(), b"fake-jpeg-bytes");

    let response = get_auth(app, &uri, &token).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn same_name_uploads_keep_separate_files(pool: PgPool) {
    let uploads = tempfile::tempdir().unwrap();
    let (_user, token) = user_with_token(&pool, "inspector", false).await;
    let app = common::build_test_app_with(
        pool,
        common::config_with_upload_dir(uploads.path().to_path_buf()),
    );
    let object_id = create_project_object(app.clone(), &token, "OBJ-1").await;
    let id = create_remark(app.clone(), &token, object_id, "R-1", json!({})).await["id"]
        .as_i64()
        .unwrap();

    let uri = format!("/api/v1/construction-remarks/{id}/photos");
    let response = send(app.clone(), multipart_upload(&uri, &token, "crack.jpg", b"first", "")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let first = body_json(response).await;
    let response = send(app.clone(), multipart_upload(&uri, &token, "crack.jpg", b"second", "")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let second = body_json(response).await;

    let first_path = first["data"]["file_path"].as_str().unwrap().to_string();
    let second_path = second["data"]["file_path"].as_str().unwrap().to_string();
    assert_ne!(first_path, second_path);
    assert_eq!(std::fs::read(&first_path).unwrap(), b"first");
    assert_eq!(std::fs::read(&second_path).unwrap(), b"second");

    let first_id = first["data"]["id"].as_i64().unwrap();
    let response = delete_auth(
        app,
        &format!("/api/v1/construction-remarks/photos/{first_id}"),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!std::path::Path::new(&first_path).exists());
    assert_eq!(std::fs::read(&second_path).unwrap(), b"second");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn only_uploader_or_admin_edits_photos(pool: PgPool) {
    let uploads = tempfile::tempdir().unwrap();
    let (_owner, owner_token) = user_with_token(&pool, "inspector", false).await;
    let (_other, other_token) = user_with_token(&pool, "foreman", false).await;
    let (_admin, admin_token) = user_with_token(&pool, "chief", true).await;
    let app = common::build_test_app_with(
        pool,
        common::config_with_upload_dir(uploads.path().to_path_buf()),
    );
    let object_id = create_project_object(app.clone(), &owner_token, "OBJ-1").await;
    let id = create_remark(app.clone(), &owner_token, object_id, "R-1", json!({})).await["id"]
        .as_i64()
        .unwrap();

    let uri = format!("/api/v1/construction-remarks/{id}/photos");
    let response = send(
        app.clone(),
        multipart_upload(&uri, &owner_token, "wall.jpg", b"jpeg", "Before"),
    )
    .await;
    let json = body_json(response).await;
    let photo_id = json["data"]["id"].as_i64().unwrap();
    let stored = json["data"]["file_path"].as_str().unwrap().to_string();
    let photo_uri = format!("/api/v1/construction-remarks/photos/{photo_id}");

    let response = put_json_auth(
        app.clone(),
        &photo_uri,
        &other_token,
        json!({ "description": "Hijacked" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete_auth(app.clone(), &photo_uri, &other_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = put_json_auth(
        app.clone(),
        &photo_uri,
        &owner_token,
        json!({ "description": "After repair" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["description"], "After repair");

    let response = delete_auth(app, &photo_uri, &admin_token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(!std::path::Path::new(&stored).exists());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn upload_without_file_is_bad_request(pool: PgPool) {
    let (_user, token) = user_with_token(&pool, "inspector", false).await;
    let app = common::build_test_app(pool);
    let object_id = create_project_object(app.clone(), &token, "OBJ-1").await;
    let id = create_remark(app.clone(), &token, object_id, "R-1", json!({})).await["id"]
        .as_i64()
        .unwrap();

    let boundary = "b";
    let body = format!(
        "--{boundary}\r\nContent-Disposition: form-data; name=\"description\"\r\n\r\nno file\r\n--{boundary}--\r\n"
    );
    let request = Request::builder()
        .method("POST")
        .uri(format!("/api/v1/construction-remarks/{id}/photos"))
        .header("authorization", format!("Bearer {token}"))
        .header("content-type", format!("multipart/form-data; boundary={boundary}"))
        .body(Body::from(body))
        .unwrap();
    let response = send(app, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["error"], "Missing required 'file' field");
}

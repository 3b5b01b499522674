//! Handlers for the `/construction-remarks` resource.
//!
//! Status changes go through [`RemarkRepo::update`], which appends the audit
//! row in the same transaction. Photos are stored under
//! `{upload_dir}/remark_photos/`.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;
use sitedesk_core::error::CoreError;
use sitedesk_core::remarks::{RemarkPriority, RemarkStatus};
use sitedesk_core::search::{self, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};
use sitedesk_core::types::DbId;
use sitedesk_db::models::remark::{
    CreateRemark, CreateRemarkPhoto, Remark, RemarkDetail, RemarkFilter, RemarkHistory,
    RemarkPhoto, RemarkSummary, UpdateRemark,
};
use sitedesk_db::repositories::{ProjectObjectRepo, RemarkRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::upload::{self, UploadForm};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Directory under the upload root that holds remark photos.
const PHOTO_SUBDIR: &str = "remark_photos";

/// Query parameters for `GET /construction-remarks/search`.
#[derive(Debug, Default, Deserialize)]
pub struct RemarkSearchParams {
    pub q: Option<String>,
    pub project_object_id: Option<DbId>,
    pub status: Option<RemarkStatus>,
    pub priority: Option<RemarkPriority>,
    pub limit: Option<i64>,
}

/// Body for `PUT /construction-remarks/photos/{photo_id}`.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePhotoRequest {
    #[validate(length(max = 1000))]
    pub description: Option<String>,
}

fn remark_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "ConstructionRemark",
        id,
    })
}

fn photo_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "RemarkPhoto",
        id,
    })
}

// ---------------------------------------------------------------------------
// Remarks
// ---------------------------------------------------------------------------

/// POST /api/v1/construction-remarks
pub async fn create(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<CreateRemark>,
) -> AppResult<(StatusCode, Json<DataResponse<Remark>>)> {
    input.validate()?;
    let remark = RemarkRepo::create(&state.pool, &input, &auth.username).await?;
    tracing::info!(
        remark_id = remark.id,
        remark_number = %remark.remark_number,
        user = %auth.username,
        "Construction remark created",
    );
    Ok((StatusCode::CREATED, Json(DataResponse::new(remark))))
}

/// GET /api/v1/construction-remarks
pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<PaginationParams>,
    Query(filter): Query<RemarkFilter>,
) -> AppResult<Json<DataResponse<Vec<Remark>>>> {
    let (limit, offset) = page.resolve();
    let remarks = RemarkRepo::list(&state.pool, &filter, limit, offset).await?;
    Ok(Json(DataResponse::new(remarks)))
}

/// GET /api/v1/construction-remarks/search
pub async fn search(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(params): Query<RemarkSearchParams>,
) -> AppResult<Json<DataResponse<Vec<Remark>>>> {
    let limit = search::clamp_limit(params.limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT);
    let remarks = RemarkRepo::search(
        &state.pool,
        params.q.as_deref(),
        params.project_object_id,
        params.status,
        params.priority,
        limit,
    )
    .await?;
    Ok(Json(DataResponse::new(remarks)))
}

/// GET /api/v1/construction-remarks/overdue
pub async fn list_overdue(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<Remark>>>> {
    let remarks = RemarkRepo::list_overdue(&state.pool, Utc::now()).await?;
    Ok(Json(DataResponse::new(remarks)))
}

/// GET /api/v1/construction-remarks/status/{status}
pub async fn list_by_status(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(status): Path<String>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<Remark>>>> {
    let status: RemarkStatus = status.parse()?;
    let (limit, offset) = page.resolve();
    let filter = RemarkFilter {
        status: Some(status),
        ..Default::default()
    };
    let remarks = RemarkRepo::list(&state.pool, &filter, limit, offset).await?;
    Ok(Json(DataResponse::new(remarks)))
}

/// GET /api/v1/construction-remarks/project-object/{id}
pub async fn list_by_project_object(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(project_object_id): Path<DbId>,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<Remark>>>> {
    let (limit, offset) = page.resolve();
    let filter = RemarkFilter {
        project_object_id: Some(project_object_id),
        ..Default::default()
    };
    let remarks = RemarkRepo::list(&state.pool, &filter, limit, offset).await?;
    Ok(Json(DataResponse::new(remarks)))
}

/// GET /api/v1/construction-remarks/project-object/{id}/summary
pub async fn project_object_summary(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(project_object_id): Path<DbId>,
) -> AppResult<Json<DataResponse<RemarkSummary>>> {
    ProjectObjectRepo::find_by_id(&state.pool, project_object_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "ProjectObject",
            id: project_object_id,
        }))?;
    let summary = RemarkRepo::summary(&state.pool, project_object_id).await?;
    Ok(Json(DataResponse::new(summary)))
}

/// GET /api/v1/construction-remarks/{id}
///
/// Returns the remark with its photos and history.
pub async fn get_by_id(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<RemarkDetail>>> {
    let detail = RemarkRepo::find_detail(&state.pool, id)
        .await?
        .ok_or(remark_not_found(id))?;
    Ok(Json(DataResponse::new(detail)))
}

/// PUT /api/v1/construction-remarks/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateRemark>,
) -> AppResult<Json<DataResponse<Remark>>> {
    let remark = RemarkRepo::update(
        &state.pool,
        id,
        &input,
        &auth.username,
        state.config.remark_transitions,
    )
    .await?;
    Ok(Json(DataResponse::new(remark)))
}

/// DELETE /api/v1/construction-remarks/{id}
///
/// Photos and history rows go with the remark. Stored photo files are
/// removed afterwards.
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let photos = RemarkRepo::list_photos(&state.pool, id).await?;
    if !RemarkRepo::delete(&state.pool, id).await? {
        return Err(remark_not_found(id));
    }
    for photo in &photos {
        upload::remove(&photo.file_path).await;
    }
    tracing::info!(remark_id = id, admin = %admin.username, "Construction remark deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/construction-remarks/{id}/history
///
/// Newest entries first.
pub async fn list_history(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<RemarkHistory>>>> {
    RemarkRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(remark_not_found(id))?;
    let history = RemarkRepo::list_history(&state.pool, id).await?;
    Ok(Json(DataResponse::new(history)))
}

// ---------------------------------------------------------------------------
// Photos
// ---------------------------------------------------------------------------

/// GET /api/v1/construction-remarks/{id}/photos
pub async fn list_photos(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<RemarkPhoto>>>> {
    RemarkRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(remark_not_found(id))?;
    let photos = RemarkRepo::list_photos(&state.pool, id).await?;
    Ok(Json(DataResponse::new(photos)))
}

/// POST /api/v1/construction-remarks/{id}/photos
///
/// Multipart form with a required `file` field and an optional `description`.
pub async fn upload_photo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<RemarkPhoto>>)> {
    RemarkRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(remark_not_found(id))?;

    let mut form = UploadForm::read(multipart).await?;
    let upload = form.take_file()?;
    let description = form.text("description");

    let dir = state.config.upload_dir.join(PHOTO_SUBDIR);
    let file_path = upload::save(
        &dir,
        &upload::stored_name(&format!("remark_{id}"), &upload.filename),
        &upload.data,
    )
    .await?;

    let photo = RemarkRepo::add_photo(
        &state.pool,
        &CreateRemarkPhoto {
            remark_id: id,
            file_path: file_path.to_string_lossy().to_string(),
            filename: upload.filename,
            file_size: upload.data.len() as i64,
            description,
            created_by: auth.username.clone(),
        },
    )
    .await?;

    tracing::info!(remark_id = id, photo_id = photo.id, size = photo.file_size, "Remark photo uploaded");
    Ok((StatusCode::CREATED, Json(DataResponse::new(photo))))
}

/// PUT /api/v1/construction-remarks/photos/{photo_id}
pub async fn update_photo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(photo_id): Path<DbId>,
    Json(input): Json<UpdatePhotoRequest>,
) -> AppResult<Json<DataResponse<RemarkPhoto>>> {
    input.validate()?;
    let photo = RemarkRepo::find_photo(&state.pool, photo_id)
        .await?
        .ok_or(photo_not_found(photo_id))?;
    ensure_photo_owner(&auth, &photo)?;

    let photo = RemarkRepo::update_photo_description(
        &state.pool,
        photo_id,
        input.description.as_deref(),
    )
    .await?
    .ok_or(photo_not_found(photo_id))?;
    Ok(Json(DataResponse::new(photo)))
}

/// DELETE /api/v1/construction-remarks/photos/{photo_id}
pub async fn delete_photo(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(photo_id): Path<DbId>,
) -> AppResult<StatusCode> {
    let photo = RemarkRepo::find_photo(&state.pool, photo_id)
        .await?
        .ok_or(photo_not_found(photo_id))?;
    ensure_photo_owner(&auth, &photo)?;

    if !RemarkRepo::delete_photo(&state.pool, photo_id).await? {
        return Err(photo_not_found(photo_id));
    }
    upload::remove(&photo.file_path).await;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Only the uploader or an administrator may change a photo.
fn ensure_photo_owner(auth: &AuthUser, photo: &RemarkPhoto) -> AppResult<()> {
    if auth.is_admin || photo.created_by == auth.username {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "Only the uploader or an administrator can modify this photo".into(),
        )))
    }
}

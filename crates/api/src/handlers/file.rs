//! Handlers for the `/files` resource: categories and the general file store.
//!
//! Files are written under `{upload_dir}/files/` and served back through
//! `/files/{id}/download` with their original name.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use sitedesk_core::error::CoreError;
use sitedesk_core::types::DbId;
use sitedesk_db::models::file::{
    CreateFileCategory, CreateUploadedFile, FileCategory, UpdateFileCategory, UpdateUploadedFile,
    UploadedFile, UploadedFileFilter,
};
use sitedesk_db::repositories::{FileCategoryRepo, UploadedFileRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::handlers::upload::{self, UploadForm};
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Directory under the upload root that holds general files.
const FILES_SUBDIR: &str = "files";

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

fn category_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "FileCategory",
        id,
    })
}

fn file_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "UploadedFile",
        id,
    })
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// POST /api/v1/files/categories
pub async fn create_category(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(input): Json<CreateFileCategory>,
) -> AppResult<(StatusCode, Json<DataResponse<FileCategory>>)> {
    input.validate()?;
    let category = FileCategoryRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(category))))
}

/// GET /api/v1/files/categories
pub async fn list_categories(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<FileCategory>>>> {
    let (limit, offset) = page.resolve();
    let categories = FileCategoryRepo::list(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse::new(categories)))
}

/// GET /api/v1/files/categories/{id}
pub async fn get_category(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<FileCategory>>> {
    let category = FileCategoryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(category_not_found(id))?;
    Ok(Json(DataResponse::new(category)))
}

/// PUT /api/v1/files/categories/{id}
pub async fn update_category(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateFileCategory>,
) -> AppResult<Json<DataResponse<FileCategory>>> {
    input.validate()?;
    let category = FileCategoryRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(category_not_found(id))?;
    Ok(Json(DataResponse::new(category)))
}

/// DELETE /api/v1/files/categories/{id}
///
/// Refused with 409 while any file still uses the category.
pub async fn delete_category(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if FileCategoryRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(category_not_found(id))
    }
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// GET /api/v1/files
pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<PaginationParams>,
    Query(filter): Query<UploadedFileFilter>,
) -> AppResult<Json<DataResponse<Vec<UploadedFile>>>> {
    let (limit, offset) = page.resolve();
    let files = UploadedFileRepo::list(&state.pool, &filter, limit, offset).await?;
    Ok(Json(DataResponse::new(files)))
}

/// POST /api/v1/files
///
/// Multipart form with a required `file` part and optional `category_id`,
/// `section_id`, `section_name`, `project_id` and `description` fields.
pub async fn upload(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<DataResponse<UploadedFile>>)> {
    let mut form = UploadForm::read(multipart).await?;
    let part = form.take_file()?;
    let category_id = form.id("category_id")?;
    if let Some(category_id) = category_id {
        ensure_category_exists(&state, category_id).await?;
    }

    let stored_name = upload::stored_name("file", &part.filename);
    let dir = state.config.upload_dir.join(FILES_SUBDIR);
    let file_path = upload::save(&dir, &stored_name, &part.data).await?;

    let input = CreateUploadedFile {
        filename: stored_name,
        original_filename: part.filename,
        file_path: file_path.to_string_lossy().to_string(),
        file_size: part.data.len() as i64,
        content_type: part.content_type,
        category_id,
        section_id: form.text("section_id"),
        section_name: form.text("section_name"),
        project_id: form.text("project_id"),
        uploaded_by: auth.username.clone(),
        uploader_id: Some(auth.user_id),
        description: form.text("description"),
    };
    let file = match UploadedFileRepo::create(&state.pool, &input).await {
        Ok(file) => file,
        Err(e) => {
            upload::remove(&input.file_path).await;
            return Err(e.into());
        }
    };

    tracing::info!(
        file_id = file.id,
        size = file.file_size,
        user = %auth.username,
        "File uploaded"
    );
    Ok((StatusCode::CREATED, Json(DataResponse::new(file))))
}

/// GET /api/v1/files/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<UploadedFile>>> {
    let file = UploadedFileRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(file_not_found(id))?;
    Ok(Json(DataResponse::new(file)))
}

/// PUT /api/v1/files/{id}
pub async fn update(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUploadedFile>,
) -> AppResult<Json<DataResponse<UploadedFile>>> {
    let file = UploadedFileRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(file_not_found(id))?;
    ensure_file_owner(&auth, &file)?;
    if let Some(category_id) = input.category_id {
        ensure_category_exists(&state, category_id).await?;
    }

    let file = UploadedFileRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(file_not_found(id))?;
    Ok(Json(DataResponse::new(file)))
}

/// DELETE /api/v1/files/{id}
pub async fn delete(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let file = UploadedFileRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(file_not_found(id))?;
    ensure_file_owner(&auth, &file)?;

    let deleted = UploadedFileRepo::delete(&state.pool, id)
        .await?
        .ok_or(file_not_found(id))?;
    upload::remove(&deleted.file_path).await;
    tracing::info!(file_id = id, user = %auth.username, "File deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/files/{id}/download
///
/// 404 when either the row or the bytes on disk are gone.
pub async fn download(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let file = UploadedFileRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(file_not_found(id))?;

    let bytes = match tokio::fs::read(&file.file_path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(file_id = id, path = %file.file_path, "Stored file is missing on disk");
            return Err(file_not_found(id));
        }
        Err(e) => return Err(AppError::InternalError(e.to_string())),
    };

    let content_type = file
        .content_type
        .clone()
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
    Ok((
        StatusCode::OK,
        [
            (CONTENT_TYPE, content_type),
            (CONTENT_DISPOSITION, attachment(&file.original_filename)),
        ],
        bytes,
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn ensure_category_exists(state: &AppState, id: DbId) -> AppResult<()> {
    FileCategoryRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(category_not_found(id))?;
    Ok(())
}

/// Only the uploader or an administrator may change or delete a file.
fn ensure_file_owner(auth: &AuthUser, file: &UploadedFile) -> AppResult<()> {
    let is_uploader = match file.uploader_id {
        Some(uploader_id) => uploader_id == auth.user_id,
        None => file.uploaded_by == auth.username,
    };
    if auth.is_admin || is_uploader {
        Ok(())
    } else {
        Err(AppError::Core(CoreError::Forbidden(
            "Only the uploader or an administrator can modify this file".into(),
        )))
    }
}

/// `Content-Disposition` value offering `filename` as a download.
///
/// Characters that cannot appear in a quoted ASCII header value become `_`.
fn attachment(filename: &str) -> String {
    let safe: String = filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    format!("attachment; filename=\"{safe}\"")
}

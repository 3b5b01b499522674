//! Handlers for the `/project-objects` resource.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sitedesk_core::error::CoreError;
use sitedesk_core::types::DbId;
use sitedesk_db::models::project_object::{
    CreateProjectObject, ProjectObject, UpdateProjectObject,
};
use sitedesk_db::repositories::ProjectObjectRepo;
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/project-objects
pub async fn create(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(input): Json<CreateProjectObject>,
) -> AppResult<(StatusCode, Json<DataResponse<ProjectObject>>)> {
    input.validate()?;
    let object = ProjectObjectRepo::create(&state.pool, &input).await?;
    tracing::info!(project_object_id = object.id, code = %object.object_code, "Project object created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(object))))
}

/// GET /api/v1/project-objects
pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<ProjectObject>>>> {
    let (limit, offset) = page.resolve();
    let objects = ProjectObjectRepo::list(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse::new(objects)))
}

/// GET /api/v1/project-objects/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<ProjectObject>>> {
    let object = ProjectObjectRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(not_found(id))?;
    Ok(Json(DataResponse::new(object)))
}

/// PUT /api/v1/project-objects/{id}
pub async fn update(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateProjectObject>,
) -> AppResult<Json<DataResponse<ProjectObject>>> {
    let object = ProjectObjectRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(not_found(id))?;
    Ok(Json(DataResponse::new(object)))
}

/// DELETE /api/v1/project-objects/{id}
///
/// Objects still referenced by remarks or GPR records yield 409.
pub async fn delete(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if ProjectObjectRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

fn not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "ProjectObject",
        id,
    })
}

//! Handlers for the `/admin` resource (user management).
//!
//! Every handler requires an administrator via [`RequireAdmin`].

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use sitedesk_core::error::CoreError;
use sitedesk_core::permissions::{self, Principal};
use sitedesk_core::types::DbId;
use sitedesk_db::models::user::{UpdateUser, User, UserResponse};
use sitedesk_db::repositories::UserRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

type UserJson = Json<DataResponse<UserResponse>>;

/// GET /api/v1/admin/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<UserResponse>>>> {
    let (limit, offset) = page.resolve();
    let users = UserRepo::list(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse::new(
        users.into_iter().map(UserResponse::from).collect(),
    )))
}

/// GET /api/v1/admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<UserJson> {
    let user = find_user(&state, id).await?;
    Ok(Json(DataResponse::new(user.into())))
}

/// PUT /api/v1/admin/users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateUser>,
) -> AppResult<UserJson> {
    let user = UserRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    Ok(Json(DataResponse::new(user.into())))
}

/// DELETE /api/v1/admin/users/{id}
///
/// Administrators cannot be deleted, and nobody can delete themselves.
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let target = find_user(&state, id).await?;
    permissions::ensure_can_delete(admin.principal(), principal(&target))?;

    UserRepo::delete(&state.pool, id).await?;
    tracing::info!(user_id = id, admin_id = admin.user_id, "User deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/admin/users/{id}/activate
pub async fn activate_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<UserJson> {
    let user = UserRepo::set_active(&state.pool, id, true)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    tracing::info!(user_id = id, admin_id = admin.user_id, "User activated");
    Ok(Json(DataResponse::new(user.into())))
}

/// POST /api/v1/admin/users/{id}/deactivate
pub async fn deactivate_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<UserJson> {
    let target = find_user(&state, id).await?;
    permissions::ensure_can_deactivate(admin.principal(), principal(&target))?;

    let user = UserRepo::set_active(&state.pool, id, false)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    tracing::info!(user_id = id, admin_id = admin.user_id, "User deactivated");
    Ok(Json(DataResponse::new(user.into())))
}

/// POST /api/v1/admin/users/{id}/promote-admin
pub async fn promote_admin(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<UserJson> {
    let user = UserRepo::set_admin(&state.pool, id, true)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    tracing::info!(user_id = id, admin_id = admin.user_id, "User promoted to admin");
    Ok(Json(DataResponse::new(user.into())))
}

/// POST /api/v1/admin/users/{id}/demote-admin
pub async fn demote_admin(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<UserJson> {
    let target = find_user(&state, id).await?;
    permissions::ensure_can_demote(admin.principal(), principal(&target))?;

    let user = UserRepo::set_admin(&state.pool, id, false)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    tracing::info!(user_id = id, admin_id = admin.user_id, "Admin rights removed");
    Ok(Json(DataResponse::new(user.into())))
}

/// PUT /api/v1/admin/users/{id}/permissions
///
/// Replaces the whole permission map; the body must be a JSON object.
pub async fn set_permissions(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<serde_json::Value>,
) -> AppResult<UserJson> {
    permissions::validate_permissions(&input)?;
    let user = UserRepo::set_permissions(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))?;
    Ok(Json(DataResponse::new(user.into())))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find_user(state: &AppState, id: DbId) -> AppResult<User> {
    UserRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound { entity: "User", id }))
}

fn principal(user: &User) -> Principal {
    Principal {
        id: user.id,
        is_admin: user.is_admin,
    }
}

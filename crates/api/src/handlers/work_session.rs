//! Handlers for the `/work-sessions` resource.
//!
//! "Today" is the current UTC day.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use sitedesk_core::search;
use sitedesk_core::types::{DbId, Timestamp};
use sitedesk_core::work_sessions;
use sitedesk_db::models::work_session::WorkSession;
use sitedesk_db::repositories::{UserRepo, WorkSessionRepo};
use sitedesk_db::DbPool;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

const DEFAULT_SESSIONS_LIMIT: i64 = 30;
const MAX_SESSIONS_LIMIT: i64 = 365;

#[derive(Debug, Default, Deserialize)]
pub struct SessionsParams {
    pub limit: Option<i64>,
}

/// Today's working time for one user.
#[derive(Debug, Serialize)]
pub struct WorkStatus {
    pub user_id: DbId,
    pub is_working: bool,
    pub current_session_start: Option<Timestamp>,
    pub today_hours: f64,
    pub today_formatted: String,
    pub sessions_today: usize,
}

#[derive(Debug, Serialize)]
pub struct EmployeeWorkStatus {
    pub username: String,
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    #[serde(flatten)]
    pub status: WorkStatus,
}

/// POST /api/v1/work-sessions/start
pub async fn start(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<(StatusCode, Json<DataResponse<WorkSession>>)> {
    let session = WorkSessionRepo::start(&state.pool, auth.user_id).await?;
    tracing::info!(user_id = auth.user_id, session_id = session.id, "Work session started");
    Ok((StatusCode::CREATED, Json(DataResponse::new(session))))
}

/// POST /api/v1/work-sessions/end
pub async fn end(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<WorkSession>>> {
    let session = WorkSessionRepo::end(&state.pool, auth.user_id).await?;
    tracing::info!(user_id = auth.user_id, session_id = session.id, "Work session ended");
    Ok(Json(DataResponse::new(session)))
}

/// GET /api/v1/work-sessions/current-status
pub async fn current_status(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<WorkStatus>>> {
    let status = work_status(&state.pool, auth.user_id, Utc::now()).await?;
    Ok(Json(DataResponse::new(status)))
}

/// GET /api/v1/work-sessions/my-sessions
///
/// Newest first.
pub async fn my_sessions(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(params): Query<SessionsParams>,
) -> AppResult<Json<DataResponse<Vec<WorkSession>>>> {
    let limit = search::clamp_limit(params.limit, DEFAULT_SESSIONS_LIMIT, MAX_SESSIONS_LIMIT);
    let sessions = WorkSessionRepo::list_for_user(&state.pool, auth.user_id, limit).await?;
    Ok(Json(DataResponse::new(sessions)))
}

/// GET /api/v1/work-sessions/employees
///
/// Today's status for every active user.
pub async fn employees(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<DataResponse<Vec<EmployeeWorkStatus>>>> {
    let now = Utc::now();
    let users = UserRepo::list_active(&state.pool).await?;

    let mut statuses = Vec::with_capacity(users.len());
    for user in users {
        let status = work_status(&state.pool, user.id, now).await?;
        statuses.push(EmployeeWorkStatus {
            username: user.username,
            full_name: user.full_name,
            position: user.position,
            department: user.department,
            status,
        });
    }
    Ok(Json(DataResponse::new(statuses)))
}

async fn work_status(pool: &DbPool, user_id: DbId, now: Timestamp) -> Result<WorkStatus, AppError> {
    let day_start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|midnight| midnight.and_utc())
        .ok_or_else(|| AppError::InternalError("Invalid start of day".into()))?;
    let day_end = day_start + Duration::days(1);

    let sessions = WorkSessionRepo::list_started_between(pool, user_id, day_start, day_end).await?;
    let active = WorkSessionRepo::find_active(pool, user_id).await?;

    let today_hours =
        work_sessions::total_hours(sessions.iter().map(|s| (s.start_time, s.end_time)), now);
    Ok(WorkStatus {
        user_id,
        is_working: active.is_some(),
        current_session_start: active.map(|s| s.start_time),
        today_hours,
        today_formatted: work_sessions::format_duration(today_hours),
        sessions_today: sessions.len(),
    })
}

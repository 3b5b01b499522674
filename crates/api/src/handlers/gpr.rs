//! Handlers for GPR (work schedule) records, their material checks, and
//! weekly reports.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use sitedesk_core::error::CoreError;
use sitedesk_core::gpr;
use sitedesk_core::types::DbId;
use sitedesk_db::models::gpr::{
    CreateGprRecord, GprFilter, GprRecord, UpdateGprRecord, WeeklyReport,
};
use sitedesk_db::repositories::{GprRepo, WeeklyReportRepo};

use crate::error::{AppError, AppResult};
use crate::material_checker::{WorkMaterialCheck, WorkReservation, WorkUsage};
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for `POST /gpr/records/{id}/usage`.
#[derive(Debug, Deserialize)]
pub struct UsageRequest {
    pub volume: f64,
}

/// Body for `POST /gpr/weekly-report`.
#[derive(Debug, Deserialize)]
pub struct WeeklyReportRequest {
    pub week_start_date: String,
}

fn record_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "GprRecord",
        id,
    })
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// POST /api/v1/gpr/records
pub async fn create_record(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(input): Json<CreateGprRecord>,
) -> AppResult<(StatusCode, Json<DataResponse<GprRecord>>)> {
    let record = GprRepo::create(&state.pool, &input).await?;
    tracing::info!(gpr_record_id = record.id, work_type = %record.work_type, "GPR record created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(record))))
}

/// GET /api/v1/gpr/records
pub async fn list_records(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<PaginationParams>,
    Query(filter): Query<GprFilter>,
) -> AppResult<Json<DataResponse<Vec<GprRecord>>>> {
    let (limit, offset) = page.resolve();
    let records = GprRepo::list(&state.pool, &filter, limit, offset).await?;
    Ok(Json(DataResponse::new(records)))
}

/// GET /api/v1/gpr/records/{id}
pub async fn get_record(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<GprRecord>>> {
    let record = GprRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(record_not_found(id))?;
    Ok(Json(DataResponse::new(record)))
}

/// PUT /api/v1/gpr/records/{id}
///
/// Remainder and progress are recomputed from the merged volumes.
pub async fn update_record(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateGprRecord>,
) -> AppResult<Json<DataResponse<GprRecord>>> {
    let record = GprRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(record_not_found(id))?;
    Ok(Json(DataResponse::new(record)))
}

/// DELETE /api/v1/gpr/records/{id}
pub async fn delete_record(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if GprRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(record_not_found(id))
    }
}

// ---------------------------------------------------------------------------
// Material integration
// ---------------------------------------------------------------------------

/// POST /api/v1/gpr/records/{id}/check-materials
pub async fn check_materials(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<WorkMaterialCheck>>> {
    let check = state.material_checker().check_materials_for_work(id).await?;
    Ok(Json(DataResponse::new(check)))
}

/// POST /api/v1/gpr/records/{id}/reserve-materials
pub async fn reserve_materials(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<WorkReservation>>> {
    let reservation = state.material_checker().reserve_for_work(id).await?;
    tracing::info!(
        gpr_record_id = id,
        reserved = reservation.reserved,
        user = %auth.username,
        "Work material reservation attempted",
    );
    Ok(Json(DataResponse::new(reservation)))
}

/// POST /api/v1/gpr/records/{id}/usage
pub async fn record_usage(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UsageRequest>,
) -> AppResult<Json<DataResponse<WorkUsage>>> {
    let usage = state.material_checker().record_usage(id, input.volume).await?;
    Ok(Json(DataResponse::new(usage)))
}

// ---------------------------------------------------------------------------
// Weekly reports
// ---------------------------------------------------------------------------

/// POST /api/v1/gpr/weekly-report
///
/// Sums plan and fact per catalogue work type across all records.
pub async fn generate_weekly_report(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<WeeklyReportRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<WeeklyReport>>)> {
    let week_start = gpr::parse_week_start(&input.week_start_date)?;

    let volumes = GprRepo::all_volumes(&state.pool).await?;
    let lines = gpr::aggregate_weekly(
        volumes
            .iter()
            .map(|(work_type, plan, fact)| (work_type.as_str(), *plan, *fact)),
    );
    let report_data = serde_json::to_value(&lines)
        .map_err(|e| AppError::InternalError(format!("Report serialization error: {e}")))?;

    let report =
        WeeklyReportRepo::create(&state.pool, week_start, &report_data, &auth.username).await?;
    tracing::info!(report_id = report.id, week = %week_start, "Weekly report generated");
    Ok((StatusCode::CREATED, Json(DataResponse::new(report))))
}

/// GET /api/v1/gpr/weekly-report/{week_start_date}
///
/// The most recent report generated for that week.
pub async fn get_weekly_report(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(week_start_date): Path<String>,
) -> AppResult<Json<DataResponse<WeeklyReport>>> {
    let week_start = gpr::parse_week_start(&week_start_date)?;
    let report = WeeklyReportRepo::find_latest_for_week(&state.pool, week_start)
        .await?
        .ok_or(AppError::Database(sqlx::Error::RowNotFound))?;
    Ok(Json(DataResponse::new(report)))
}

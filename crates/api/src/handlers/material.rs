//! Handlers for materials, stock, purchase requests, and stock checks.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use sitedesk_core::error::CoreError;
use sitedesk_core::materials;
use sitedesk_core::types::DbId;
use sitedesk_db::models::material::{
    CreateMaterial, CreateMaterialRequest, CreateMaterialStock, LowStockMaterial, Material,
    MaterialRequest, MaterialRequestFilter, MaterialStock, UpdateMaterial, UpdateMaterialRequest,
    UpdateMaterialStock,
};
use sitedesk_db::repositories::{MaterialRepo, MaterialRequestRepo, MaterialStockRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::material_checker::MaterialNotification;
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// One line of a reservation or release.
#[derive(Debug, Deserialize, Serialize)]
pub struct MaterialQuantity {
    pub material_id: DbId,
    pub quantity: i32,
}

/// Body for `POST /material-stocks/reserve` and `/release`.
#[derive(Debug, Deserialize, Validate)]
pub struct SectionMaterialsRequest {
    #[validate(length(min = 1, max = 100))]
    pub section_id: String,
    #[validate(length(min = 1))]
    pub materials: Vec<MaterialQuantity>,
}

impl SectionMaterialsRequest {
    fn items(&self) -> Vec<(DbId, i32)> {
        self.materials
            .iter()
            .map(|m| (m.material_id, m.quantity))
            .collect()
    }
}

#[derive(Debug, Serialize)]
pub struct ThresholdCheckResponse {
    pub material_id: DbId,
    pub is_below_threshold: bool,
}

#[derive(Debug, Serialize)]
pub struct LowStockCheckResponse {
    pub created_requests: usize,
    pub notifications: Vec<MaterialNotification>,
}

fn material_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Material",
        id,
    })
}

fn stock_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "MaterialStock",
        id,
    })
}

fn request_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "MaterialRequest",
        id,
    })
}

// ---------------------------------------------------------------------------
// Materials
// ---------------------------------------------------------------------------

/// POST /api/v1/materials
pub async fn create_material(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(input): Json<CreateMaterial>,
) -> AppResult<(StatusCode, Json<DataResponse<Material>>)> {
    input.validate()?;
    let material = MaterialRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(material))))
}

/// GET /api/v1/materials
pub async fn list_materials(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<Material>>>> {
    let (limit, offset) = page.resolve();
    let materials = MaterialRepo::list(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse::new(materials)))
}

/// GET /api/v1/materials/{id}
pub async fn get_material(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Material>>> {
    let material = MaterialRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(material_not_found(id))?;
    Ok(Json(DataResponse::new(material)))
}

/// PUT /api/v1/materials/{id}
pub async fn update_material(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateMaterial>,
) -> AppResult<Json<DataResponse<Material>>> {
    let material = MaterialRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(material_not_found(id))?;
    Ok(Json(DataResponse::new(material)))
}

/// DELETE /api/v1/materials/{id}
///
/// Stock rows and requests for the material are removed with it.
pub async fn delete_material(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if MaterialRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(material_not_found(id))
    }
}

// ---------------------------------------------------------------------------
// Purchase requests
// ---------------------------------------------------------------------------

/// POST /api/v1/material-requests
pub async fn create_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(mut input): Json<CreateMaterialRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<MaterialRequest>>)> {
    if input.requested_quantity <= 0 {
        return Err(AppError::Core(CoreError::Validation(
            "Requested quantity must be positive".into(),
        )));
    }
    MaterialRepo::find_by_id(&state.pool, input.material_id)
        .await?
        .ok_or(material_not_found(input.material_id))?;

    input.requested_by = auth.username.clone();
    input.requester_id = Some(auth.user_id);
    let request = MaterialRequestRepo::create(&state.pool, &input).await?;
    tracing::info!(
        request_id = request.id,
        material_id = request.material_id,
        user = %auth.username,
        "Material request created",
    );
    Ok((StatusCode::CREATED, Json(DataResponse::new(request))))
}

/// GET /api/v1/material-requests
pub async fn list_requests(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<PaginationParams>,
    Query(filter): Query<MaterialRequestFilter>,
) -> AppResult<Json<DataResponse<Vec<MaterialRequest>>>> {
    let (limit, offset) = page.resolve();
    let requests = MaterialRequestRepo::list(&state.pool, &filter, limit, offset).await?;
    Ok(Json(DataResponse::new(requests)))
}

/// GET /api/v1/material-requests/{id}
pub async fn get_request(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<MaterialRequest>>> {
    let request = MaterialRequestRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(request_not_found(id))?;
    Ok(Json(DataResponse::new(request)))
}

/// PUT /api/v1/material-requests/{id}
///
/// Changing the status (approve, fulfil, reject) requires an administrator.
pub async fn update_request(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateMaterialRequest>,
) -> AppResult<Json<DataResponse<MaterialRequest>>> {
    if input.status.is_some() && !auth.is_admin {
        return Err(AppError::Core(CoreError::Forbidden(
            "Administrator rights required to change request status".into(),
        )));
    }
    if input.requested_quantity.is_some_and(|q| q <= 0) {
        return Err(AppError::Core(CoreError::Validation(
            "Requested quantity must be positive".into(),
        )));
    }

    let request = MaterialRequestRepo::update(&state.pool, id, &input, &auth.username)
        .await?
        .ok_or(request_not_found(id))?;
    if let Some(status) = input.status {
        tracing::info!(request_id = id, %status, user = %auth.username, "Material request status changed");
    }
    Ok(Json(DataResponse::new(request)))
}

// ---------------------------------------------------------------------------
// Stock
// ---------------------------------------------------------------------------

/// POST /api/v1/material-stocks
pub async fn create_stock(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(input): Json<CreateMaterialStock>,
) -> AppResult<(StatusCode, Json<DataResponse<MaterialStock>>)> {
    let stock = MaterialStockRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(stock))))
}

/// GET /api/v1/material-stocks
pub async fn list_stocks(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<MaterialStock>>>> {
    let (limit, offset) = page.resolve();
    let stocks = MaterialStockRepo::list(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse::new(stocks)))
}

/// GET /api/v1/material-stocks/{id}
pub async fn get_stock(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<MaterialStock>>> {
    let stock = MaterialStockRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(stock_not_found(id))?;
    Ok(Json(DataResponse::new(stock)))
}

/// GET /api/v1/material-stocks/by-material/{material_id}
pub async fn get_stock_by_material(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(material_id): Path<DbId>,
) -> AppResult<Json<DataResponse<MaterialStock>>> {
    let stock = MaterialStockRepo::find_by_material(&state.pool, material_id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "MaterialStock for material",
            id: material_id,
        }))?;
    Ok(Json(DataResponse::new(stock)))
}

/// PUT /api/v1/material-stocks/{id}
pub async fn update_stock(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateMaterialStock>,
) -> AppResult<Json<DataResponse<MaterialStock>>> {
    let stock = MaterialStockRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(stock_not_found(id))?;
    Ok(Json(DataResponse::new(stock)))
}

/// POST /api/v1/material-stocks/reserve
pub async fn reserve(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<SectionMaterialsRequest>,
) -> AppResult<Json<DataResponse<Vec<MaterialStock>>>> {
    input.validate()?;
    let stocks = state
        .material_checker()
        .reserve(&input.section_id, &input.items())
        .await?;
    tracing::info!(section_id = %input.section_id, user = %auth.username, "Materials reserved");
    Ok(Json(DataResponse::new(stocks)))
}

/// POST /api/v1/material-stocks/release
pub async fn release(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(input): Json<SectionMaterialsRequest>,
) -> AppResult<Json<DataResponse<Vec<MaterialStock>>>> {
    input.validate()?;
    let stocks = state
        .material_checker()
        .release(&input.section_id, &input.items())
        .await?;
    tracing::info!(section_id = %input.section_id, user = %auth.username, "Material reservations released");
    Ok(Json(DataResponse::new(stocks)))
}

/// POST /api/v1/material-stocks/check-section-needs
///
/// Raises purchase requests for whatever the section is short of.
pub async fn check_section_needs(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(input): Json<SectionMaterialsRequest>,
) -> AppResult<Json<DataResponse<Vec<MaterialNotification>>>> {
    input.validate()?;
    let needs = materials::merge_demand(&input.items())?;
    let notifications = state
        .material_checker()
        .check_material_needs_for_section(&input.section_id, &needs)
        .await?;
    Ok(Json(DataResponse::new(notifications)))
}

// ---------------------------------------------------------------------------
// Checks
// ---------------------------------------------------------------------------

/// GET /api/v1/low-stock-materials
pub async fn list_low_stock(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> AppResult<Json<DataResponse<Vec<LowStockMaterial>>>> {
    let materials = MaterialStockRepo::list_low_stock(&state.pool).await?;
    Ok(Json(DataResponse::new(materials)))
}

/// POST /api/v1/check-material-threshold/{material_id}
pub async fn check_threshold(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(material_id): Path<DbId>,
) -> AppResult<Json<DataResponse<ThresholdCheckResponse>>> {
    let is_below_threshold = state.material_checker().check_threshold(material_id).await?;
    Ok(Json(DataResponse::new(ThresholdCheckResponse {
        material_id,
        is_below_threshold,
    })))
}

/// POST /api/v1/material-stocks/check-low-stock
///
/// Raises a reorder request for every low material without an open one.
pub async fn check_low_stock(
    State(state): State<AppState>,
    auth: AuthUser,
) -> AppResult<Json<DataResponse<LowStockCheckResponse>>> {
    let notifications = state.material_checker().check_low_stock_and_notify().await?;
    tracing::info!(
        created = notifications.len(),
        user = %auth.username,
        "Low stock check completed",
    );
    Ok(Json(DataResponse::new(LowStockCheckResponse {
        created_requests: notifications.len(),
        notifications,
    })))
}

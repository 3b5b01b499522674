//! Handlers for the `/documents` resource and its shipment/return ledger.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use sitedesk_core::documents::DocumentStatus;
use sitedesk_core::error::CoreError;
use sitedesk_core::search::{self, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT};
use sitedesk_core::types::DbId;
use sitedesk_db::models::document::{
    CreateDocument, CreateDocumentType, CreateReturn, CreateShipment, Document, DocumentDetail,
    DocumentFilter, DocumentReturn, DocumentShipment, DocumentType, UpdateDocument,
    UpdateDocumentType,
};
use sitedesk_db::repositories::{DocumentRepo, DocumentTypeRepo};
use validator::Validate;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Body for `POST /documents/search`.
#[derive(Debug, Default, Deserialize)]
pub struct DocumentSearchRequest {
    pub query: Option<String>,
    pub project_id: Option<String>,
    pub status: Option<String>,
    pub limit: Option<i64>,
}

/// A shipment or return together with the document it moved.
#[derive(Debug, Serialize)]
pub struct MovementResponse<T: Serialize> {
    pub document: Document,
    #[serde(flatten)]
    pub movement: T,
}

fn document_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Document",
        id,
    })
}

fn type_not_found(id: DbId) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "DocumentType",
        id,
    })
}

/// Reject unknown status filter values instead of silently matching nothing.
fn check_status(status: Option<&str>) -> AppResult<()> {
    if let Some(status) = status {
        status.parse::<DocumentStatus>()?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

/// POST /api/v1/documents/types
pub async fn create_type(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(input): Json<CreateDocumentType>,
) -> AppResult<(StatusCode, Json<DataResponse<DocumentType>>)> {
    input.validate()?;
    let doc_type = DocumentTypeRepo::create(&state.pool, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse::new(doc_type))))
}

/// GET /api/v1/documents/types
pub async fn list_types(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<PaginationParams>,
) -> AppResult<Json<DataResponse<Vec<DocumentType>>>> {
    let (limit, offset) = page.resolve();
    let types = DocumentTypeRepo::list(&state.pool, limit, offset).await?;
    Ok(Json(DataResponse::new(types)))
}

/// GET /api/v1/documents/types/{id}
pub async fn get_type(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DocumentType>>> {
    let doc_type = DocumentTypeRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(type_not_found(id))?;
    Ok(Json(DataResponse::new(doc_type)))
}

/// PUT /api/v1/documents/types/{id}
pub async fn update_type(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateDocumentType>,
) -> AppResult<Json<DataResponse<DocumentType>>> {
    let doc_type = DocumentTypeRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(type_not_found(id))?;
    Ok(Json(DataResponse::new(doc_type)))
}

/// DELETE /api/v1/documents/types/{id}
pub async fn delete_type(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if DocumentTypeRepo::delete(&state.pool, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(type_not_found(id))
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// POST /api/v1/documents
///
/// New documents always start `in_office`.
pub async fn create(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(input): Json<CreateDocument>,
) -> AppResult<(StatusCode, Json<DataResponse<Document>>)> {
    input.validate()?;
    let document = DocumentRepo::create(&state.pool, &input).await?;
    tracing::info!(document_id = document.id, doc_number = %document.doc_number, "Document created");
    Ok((StatusCode::CREATED, Json(DataResponse::new(document))))
}

/// GET /api/v1/documents
pub async fn list(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(page): Query<PaginationParams>,
    Query(filter): Query<DocumentFilter>,
) -> AppResult<Json<DataResponse<Vec<Document>>>> {
    check_status(filter.status.as_deref())?;
    let (limit, offset) = page.resolve();
    let documents = DocumentRepo::list(&state.pool, &filter, limit, offset).await?;
    Ok(Json(DataResponse::new(documents)))
}

/// POST /api/v1/documents/search
pub async fn search(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(input): Json<DocumentSearchRequest>,
) -> AppResult<Json<DataResponse<Vec<Document>>>> {
    check_status(input.status.as_deref())?;
    let limit = search::clamp_limit(input.limit, DEFAULT_SEARCH_LIMIT, MAX_SEARCH_LIMIT);
    let documents = DocumentRepo::search(
        &state.pool,
        input.query.as_deref(),
        input.project_id.as_deref(),
        input.status.as_deref(),
        limit,
    )
    .await?;
    Ok(Json(DataResponse::new(documents)))
}

/// GET /api/v1/documents/{id}
///
/// Returns the document with its type, shipments, and returns.
pub async fn get_by_id(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<DocumentDetail>>> {
    let detail = DocumentRepo::find_detail(&state.pool, id)
        .await?
        .ok_or(document_not_found(id))?;
    Ok(Json(DataResponse::new(detail)))
}

/// PUT /api/v1/documents/{id}
///
/// Status is never changed here; it moves only through shipments and returns.
pub async fn update(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<UpdateDocument>,
) -> AppResult<Json<DataResponse<Document>>> {
    let document = DocumentRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(document_not_found(id))?;
    Ok(Json(DataResponse::new(document)))
}

/// DELETE /api/v1/documents/{id}
pub async fn delete(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    if DocumentRepo::delete(&state.pool, id).await? {
        tracing::info!(document_id = id, "Document deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(document_not_found(id))
    }
}

// ---------------------------------------------------------------------------
// Shipments and returns
// ---------------------------------------------------------------------------

/// POST /api/v1/documents/{id}/shipments
pub async fn ship(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<CreateShipment>,
) -> AppResult<(StatusCode, Json<DataResponse<MovementResponse<DocumentShipment>>>)> {
    let (document, shipment) = DocumentRepo::ship(&state.pool, id, &input).await?;
    tracing::info!(
        document_id = id,
        recipient = %shipment.recipient,
        user = %auth.username,
        "Document shipped",
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(MovementResponse {
            document,
            movement: shipment,
        })),
    ))
}

/// GET /api/v1/documents/{id}/shipments
pub async fn list_shipments(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<DocumentShipment>>>> {
    DocumentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(document_not_found(id))?;
    let shipments = DocumentRepo::list_shipments(&state.pool, id).await?;
    Ok(Json(DataResponse::new(shipments)))
}

/// POST /api/v1/documents/{id}/returns
pub async fn return_document(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<DbId>,
    Json(input): Json<CreateReturn>,
) -> AppResult<(StatusCode, Json<DataResponse<MovementResponse<DocumentReturn>>>)> {
    let (document, returned) = DocumentRepo::return_doc(&state.pool, id, &input).await?;
    tracing::info!(
        document_id = id,
        condition = %returned.condition,
        user = %auth.username,
        "Document returned",
    );
    Ok((
        StatusCode::CREATED,
        Json(DataResponse::new(MovementResponse {
            document,
            movement: returned,
        })),
    ))
}

/// GET /api/v1/documents/{id}/returns
pub async fn list_returns(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Vec<DocumentReturn>>>> {
    DocumentRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(document_not_found(id))?;
    let returns = DocumentRepo::list_returns(&state.pool, id).await?;
    Ok(Json(DataResponse::new(returns)))
}

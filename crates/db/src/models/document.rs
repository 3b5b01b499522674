//! Executive documentation: types, documents, shipments and returns.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sitedesk_core::types::{DbId, Timestamp};
use validator::Validate;

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

/// A row from the `document_types` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocumentType {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDocumentType {
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDocumentType {
    pub name: Option<String>,
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// A row from the `documents` table.
///
/// `status` holds a [`sitedesk_core::documents::DocumentStatus`] string.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Document {
    pub id: DbId,
    pub doc_number: String,
    pub title: String,
    pub project_id: String,
    pub document_type_id: DbId,
    pub status: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a document. Status is always `in_office`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateDocument {
    #[validate(length(min = 1))]
    pub doc_number: String,
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub project_id: String,
    pub document_type_id: DbId,
}

/// Partial update of non-status fields.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateDocument {
    pub doc_number: Option<String>,
    pub title: Option<String>,
    pub project_id: Option<String>,
    pub document_type_id: Option<DbId>,
}

/// Filters for listing documents. Text filters are substring matches.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DocumentFilter {
    pub project_id: Option<String>,
    pub status: Option<String>,
    pub doc_number: Option<String>,
    pub title: Option<String>,
}

/// Document with its type and movement records.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentDetail {
    #[serde(flatten)]
    pub document: Document,
    #[serde(rename = "type")]
    pub document_type: DocumentType,
    pub shipments: Vec<DocumentShipment>,
    pub returns: Vec<DocumentReturn>,
}

// ---------------------------------------------------------------------------
// Shipments and returns (append-only)
// ---------------------------------------------------------------------------

/// A row from the `document_shipments` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocumentShipment {
    pub id: DbId,
    pub document_id: DbId,
    pub recipient: String,
    pub shipment_date: Timestamp,
    pub notes: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateShipment {
    pub recipient: String,
    pub shipment_date: Timestamp,
    pub notes: Option<String>,
}

/// A row from the `document_returns` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DocumentReturn {
    pub id: DbId,
    pub document_id: DbId,
    pub return_date: Timestamp,
    pub condition: String,
    pub notes: Option<String>,
    pub created_at: Timestamp,
}

/// DTO for returning a document. `return_date` defaults to now.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateReturn {
    pub return_date: Option<Timestamp>,
    pub condition: String,
    pub notes: Option<String>,
}

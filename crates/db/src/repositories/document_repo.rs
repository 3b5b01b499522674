//! Repositories for `document_types`, `documents`, `document_shipments` and
//! `document_returns`.
//!
//! Status changes go through [`DocumentRepo::ship`] and
//! [`DocumentRepo::return_doc`], which lock the document row, check the
//! lifecycle rule and append the movement record in one transaction.

use sqlx::PgPool;
use sitedesk_core::documents::{self, DocumentStatus};
use sitedesk_core::error::CoreError;
use sitedesk_core::search::contains_pattern;
use sitedesk_core::types::DbId;

use crate::error::StoreError;
use crate::models::document::{
    CreateDocument, CreateDocumentType, CreateReturn, CreateShipment, Document, DocumentDetail,
    DocumentFilter, DocumentReturn, DocumentShipment, DocumentType, UpdateDocument,
    UpdateDocumentType,
};

const TYPE_COLUMNS: &str = "id, name, description, created_at, updated_at";

const COLUMNS: &str =
    "id, doc_number, title, project_id, document_type_id, status, created_at, updated_at";

const SHIPMENT_COLUMNS: &str = "id, document_id, recipient, shipment_date, notes, created_at";

const RETURN_COLUMNS: &str = "id, document_id, return_date, condition, notes, created_at";

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

/// Provides CRUD operations for document types.
pub struct DocumentTypeRepo;

impl DocumentTypeRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateDocumentType,
    ) -> Result<DocumentType, sqlx::Error> {
        let query = format!(
            "INSERT INTO document_types (name, description)
             VALUES ($1, $2)
             RETURNING {TYPE_COLUMNS}"
        );
        sqlx::query_as::<_, DocumentType>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<DocumentType>, sqlx::Error> {
        let query = format!("SELECT {TYPE_COLUMNS} FROM document_types WHERE id = $1");
        sqlx::query_as::<_, DocumentType>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<DocumentType>, sqlx::Error> {
        let query =
            format!("SELECT {TYPE_COLUMNS} FROM document_types ORDER BY name LIMIT $1 OFFSET $2");
        sqlx::query_as::<_, DocumentType>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateDocumentType,
    ) -> Result<Option<DocumentType>, sqlx::Error> {
        let query = format!(
            "UPDATE document_types SET
                name = COALESCE($2, name),
                description = COALESCE($3, description)
             WHERE id = $1
             RETURNING {TYPE_COLUMNS}"
        );
        sqlx::query_as::<_, DocumentType>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    /// Delete a document type that no document references.
    ///
    /// Returns `Ok(false)` if the type does not exist.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, StoreError> {
        let mut tx = pool.begin().await?;

        let locked: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM document_types WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(false);
        }

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM documents WHERE document_type_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        documents::ensure_type_deletable(count)?;

        sqlx::query("DELETE FROM document_types WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

/// Provides CRUD and lifecycle operations for documents.
pub struct DocumentRepo;

impl DocumentRepo {
    /// Insert a new document in the initial `in_office` status.
    pub async fn create(pool: &PgPool, input: &CreateDocument) -> Result<Document, sqlx::Error> {
        let query = format!(
            "INSERT INTO documents (doc_number, title, project_id, document_type_id, status)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(&input.doc_number)
            .bind(&input.title)
            .bind(&input.project_id)
            .bind(input.document_type_id)
            .bind(DocumentStatus::INITIAL.as_str())
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Document>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM documents WHERE id = $1");
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List documents matching every supplied filter, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &DocumentFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Document>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM documents
             WHERE ($1::text IS NULL OR project_id = $1)
               AND ($2::text IS NULL OR status = $2)
               AND ($3::text IS NULL OR doc_number LIKE $3)
               AND ($4::text IS NULL OR title LIKE $4)
             ORDER BY created_at DESC, id DESC
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(&filter.project_id)
            .bind(&filter.status)
            .bind(filter.doc_number.as_deref().and_then(contains_pattern))
            .bind(filter.title.as_deref().and_then(contains_pattern))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Free-text search over document number and title, optionally narrowed
    /// by project and status.
    pub async fn search(
        pool: &PgPool,
        text: Option<&str>,
        project_id: Option<&str>,
        status: Option<&str>,
        limit: i64,
    ) -> Result<Vec<Document>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM documents
             WHERE ($1::text IS NULL OR doc_number LIKE $1 OR title LIKE $1)
               AND ($2::text IS NULL OR project_id = $2)
               AND ($3::text IS NULL OR status = $3)
             ORDER BY created_at DESC, id DESC
             LIMIT $4"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(text.and_then(contains_pattern))
            .bind(project_id)
            .bind(status)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Update non-status fields. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateDocument,
    ) -> Result<Option<Document>, sqlx::Error> {
        let query = format!(
            "UPDATE documents SET
                doc_number = COALESCE($2, doc_number),
                title = COALESCE($3, title),
                project_id = COALESCE($4, project_id),
                document_type_id = COALESCE($5, document_type_id)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Document>(&query)
            .bind(id)
            .bind(&input.doc_number)
            .bind(&input.title)
            .bind(&input.project_id)
            .bind(input.document_type_id)
            .fetch_optional(pool)
            .await
    }

    /// Delete a document without shipments or returns.
    ///
    /// Returns `Ok(false)` if the document does not exist.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, StoreError> {
        let mut tx = pool.begin().await?;

        let locked: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM documents WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(false);
        }

        let (shipments, returns): (i64, i64) = sqlx::query_as(
            "SELECT
                (SELECT COUNT(*) FROM document_shipments WHERE document_id = $1),
                (SELECT COUNT(*) FROM document_returns WHERE document_id = $1)",
        )
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        documents::ensure_deletable(shipments, returns)?;

        sqlx::query("DELETE FROM documents WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }

    /// Document with its type, shipments and returns.
    pub async fn find_detail(pool: &PgPool, id: DbId) -> Result<Option<DocumentDetail>, sqlx::Error> {
        let Some(document) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let Some(document_type) = DocumentTypeRepo::find_by_id(pool, document.document_type_id).await?
        else {
            return Ok(None);
        };
        let shipments = Self::list_shipments(pool, id).await?;
        let returns = Self::list_returns(pool, id).await?;
        Ok(Some(DocumentDetail {
            document,
            document_type,
            shipments,
            returns,
        }))
    }

    /// Ship a document that is in the office.
    ///
    /// Locks the row, checks the lifecycle rule, appends a shipment and moves
    /// the status to `shipped`, all in one transaction.
    pub async fn ship(
        pool: &PgPool,
        id: DbId,
        input: &CreateShipment,
    ) -> Result<(Document, DocumentShipment), StoreError> {
        let mut tx = pool.begin().await?;

        let current = lock_status(&mut tx, id).await?;
        documents::ensure_can_ship(current)?;

        let shipment_query = format!(
            "INSERT INTO document_shipments (document_id, recipient, shipment_date, notes)
             VALUES ($1, $2, $3, $4)
             RETURNING {SHIPMENT_COLUMNS}"
        );
        let shipment = sqlx::query_as::<_, DocumentShipment>(&shipment_query)
            .bind(id)
            .bind(&input.recipient)
            .bind(input.shipment_date)
            .bind(&input.notes)
            .fetch_one(&mut *tx)
            .await?;

        let document = set_status(&mut tx, id, DocumentStatus::Shipped).await?;
        tx.commit().await?;

        tracing::info!(document_id = id, recipient = %input.recipient, "Document shipped");
        Ok((document, shipment))
    }

    /// Record the return of a shipped document.
    pub async fn return_doc(
        pool: &PgPool,
        id: DbId,
        input: &CreateReturn,
    ) -> Result<(Document, DocumentReturn), StoreError> {
        let mut tx = pool.begin().await?;

        let current = lock_status(&mut tx, id).await?;
        documents::ensure_can_return(current)?;

        let return_query = format!(
            "INSERT INTO document_returns (document_id, return_date, condition, notes)
             VALUES ($1, COALESCE($2, NOW()), $3, $4)
             RETURNING {RETURN_COLUMNS}"
        );
        let returned = sqlx::query_as::<_, DocumentReturn>(&return_query)
            .bind(id)
            .bind(input.return_date)
            .bind(&input.condition)
            .bind(&input.notes)
            .fetch_one(&mut *tx)
            .await?;

        let document = set_status(&mut tx, id, DocumentStatus::Returned).await?;
        tx.commit().await?;

        tracing::info!(document_id = id, condition = %input.condition, "Document returned");
        Ok((document, returned))
    }

    /// Shipments of a document, oldest first.
    pub async fn list_shipments(
        pool: &PgPool,
        document_id: DbId,
    ) -> Result<Vec<DocumentShipment>, sqlx::Error> {
        let query = format!(
            "SELECT {SHIPMENT_COLUMNS} FROM document_shipments
             WHERE document_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, DocumentShipment>(&query)
            .bind(document_id)
            .fetch_all(pool)
            .await
    }

    /// Returns of a document, oldest first.
    pub async fn list_returns(
        pool: &PgPool,
        document_id: DbId,
    ) -> Result<Vec<DocumentReturn>, sqlx::Error> {
        let query = format!(
            "SELECT {RETURN_COLUMNS} FROM document_returns
             WHERE document_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, DocumentReturn>(&query)
            .bind(document_id)
            .fetch_all(pool)
            .await
    }
}

/// Read and lock a document's status for the rest of the transaction.
async fn lock_status(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: DbId,
) -> Result<DocumentStatus, StoreError> {
    let row: Option<(String,)> =
        sqlx::query_as("SELECT status FROM documents WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(&mut **tx)
            .await?;
    let (status,) = row.ok_or(CoreError::NotFound {
        entity: "Document",
        id,
    })?;
    Ok(status.parse()?)
}

async fn set_status(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    id: DbId,
    status: DocumentStatus,
) -> Result<Document, sqlx::Error> {
    let query = format!("UPDATE documents SET status = $2 WHERE id = $1 RETURNING {COLUMNS}");
    sqlx::query_as::<_, Document>(&query)
        .bind(id)
        .bind(status.as_str())
        .fetch_one(&mut **tx)
        .await
}

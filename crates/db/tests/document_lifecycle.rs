//! Integration tests for the document ship/return lifecycle.

use assert_matches::assert_matches;
use chrono::{TimeZone, Utc};
use sitedesk_core::error::CoreError;
use sitedesk_db::models::document::{
    CreateDocument, CreateDocumentType, CreateReturn, CreateShipment, DocumentFilter,
    UpdateDocument,
};
use sitedesk_db::repositories::{DocumentRepo, DocumentTypeRepo};
use sitedesk_db::StoreError;
use sqlx::PgPool;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_type(pool: &PgPool, name: &str) -> i64 {
    DocumentTypeRepo::create(
        pool,
        &CreateDocumentType {
            name: name.to_string(),
            description: None,
        },
    )
    .await
    .unwrap()
    .id
}

fn new_document(doc_number: &str, type_id: i64) -> CreateDocument {
    CreateDocument {
        doc_number: doc_number.to_string(),
        title: "Title".to_string(),
        project_id: "P1".to_string(),
        document_type_id: type_id,
    }
}

fn shipment(recipient: &str) -> CreateShipment {
    CreateShipment {
        recipient: recipient.to_string(),
        shipment_date: Utc.with_ymd_and_hms(2024, 1, 10, 0, 0, 0).unwrap(),
        notes: None,
    }
}

fn returned(condition: &str) -> CreateReturn {
    CreateReturn {
        return_date: None,
        condition: condition.to_string(),
        notes: None,
    }
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_ship_and_return_scenario(pool: PgPool) {
    let type_id = seed_type(&pool, "Act").await;
    let doc = DocumentRepo::create(&pool, &new_document("DOC-1", type_id))
        .await
        .unwrap();
    assert_eq!(doc.status, "in_office");

    let (doc, _) = DocumentRepo::ship(&pool, doc.id, &shipment("Acme")).await.unwrap();
    assert_eq!(doc.status, "shipped");
    assert_eq!(DocumentRepo::list_shipments(&pool, doc.id).await.unwrap().len(), 1);

    let again = DocumentRepo::ship(&pool, doc.id, &shipment("Acme")).await;
    assert_matches!(again, Err(StoreError::Core(CoreError::Conflict(msg))) if msg.contains("already shipped"));
    let unchanged = DocumentRepo::find_by_id(&pool, doc.id).await.unwrap().unwrap();
    assert_eq!(unchanged.status, "shipped");
    assert_eq!(DocumentRepo::list_shipments(&pool, doc.id).await.unwrap().len(), 1);

    let (doc, ret) = DocumentRepo::return_doc(&pool, doc.id, &returned("Good")).await.unwrap();
    assert_eq!(doc.status, "returned");
    assert_eq!(ret.condition, "Good");
    assert_eq!(DocumentRepo::list_returns(&pool, doc.id).await.unwrap().len(), 1);

    assert_matches!(
        DocumentRepo::return_doc(&pool, doc.id, &returned("Good")).await,
        Err(StoreError::Core(CoreError::Conflict(_)))
    );
    assert_matches!(
        DocumentRepo::ship(&pool, doc.id, &shipment("Acme")).await,
        Err(StoreError::Core(CoreError::Conflict(msg))) if msg.contains("cannot ship again")
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_return_requires_shipment(pool: PgPool) {
    let type_id = seed_type(&pool, "Act").await;
    let doc = DocumentRepo::create(&pool, &new_document("DOC-2", type_id))
        .await
        .unwrap();

    assert_matches!(
        DocumentRepo::return_doc(&pool, doc.id, &returned("Good")).await,
        Err(StoreError::Core(CoreError::Conflict(_)))
    );
    assert!(DocumentRepo::list_returns(&pool, doc.id).await.unwrap().is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_lifecycle_on_missing_document(pool: PgPool) {
    assert_matches!(
        DocumentRepo::ship(&pool, 999_999, &shipment("Acme")).await,
        Err(StoreError::Core(CoreError::NotFound { entity: "Document", .. }))
    );
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_update_does_not_touch_status(pool: PgPool) {
    let type_id = seed_type(&pool, "Act").await;
    let doc = DocumentRepo::create(&pool, &new_document("DOC-3", type_id))
        .await
        .unwrap();
    DocumentRepo::ship(&pool, doc.id, &shipment("Acme")).await.unwrap();

    let updated = DocumentRepo::update(
        &pool,
        doc.id,
        &UpdateDocument {
            title: Some("Renamed".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.title, "Renamed");
    assert_eq!(updated.status, "shipped");
    assert_eq!(updated.doc_number, "DOC-3");
}

// ---------------------------------------------------------------------------
// Deletion guards
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_blocked_by_shipments(pool: PgPool) {
    let type_id = seed_type(&pool, "Act").await;
    let shipped = DocumentRepo::create(&pool, &new_document("DOC-4", type_id))
        .await
        .unwrap();
    DocumentRepo::ship(&pool, shipped.id, &shipment("Acme")).await.unwrap();

    assert_matches!(
        DocumentRepo::delete(&pool, shipped.id).await,
        Err(StoreError::Core(CoreError::Conflict(msg))) if msg.contains("dependent records")
    );

    let fresh = DocumentRepo::create(&pool, &new_document("DOC-5", type_id))
        .await
        .unwrap();
    assert!(DocumentRepo::delete(&pool, fresh.id).await.unwrap());
    assert!(!DocumentRepo::delete(&pool, fresh.id).await.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_document_type_delete_and_duplicates(pool: PgPool) {
    let type_id = seed_type(&pool, "Act").await;

    let dup = DocumentTypeRepo::create(
        &pool,
        &CreateDocumentType {
            name: "Act".to_string(),
            description: None,
        },
    )
    .await;
    let err = dup.unwrap_err();
    assert_eq!(
        err.as_database_error().and_then(|e| e.constraint()),
        Some("uq_document_types_name")
    );

    DocumentRepo::create(&pool, &new_document("DOC-6", type_id))
        .await
        .unwrap();
    assert_matches!(
        DocumentTypeRepo::delete(&pool, type_id).await,
        Err(StoreError::Core(CoreError::Conflict(_)))
    );

    let unused = seed_type(&pool, "Drawing").await;
    assert!(DocumentTypeRepo::delete(&pool, unused).await.unwrap());
}

// ---------------------------------------------------------------------------
// Listing and search
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_filters_and_search(pool: PgPool) {
    let type_id = seed_type(&pool, "Act").await;
    let a = DocumentRepo::create(&pool, &new_document("AOSR-001", type_id))
        .await
        .unwrap();
    DocumentRepo::create(
        &pool,
        &CreateDocument {
            doc_number: "ISP-002".to_string(),
            title: "Executive scheme".to_string(),
            project_id: "P2".to_string(),
            document_type_id: type_id,
        },
    )
    .await
    .unwrap();
    DocumentRepo::ship(&pool, a.id, &shipment("Acme")).await.unwrap();

    let by_project = DocumentRepo::list(
        &pool,
        &DocumentFilter {
            project_id: Some("P2".to_string()),
            ..Default::default()
        },
        100,
        0,
    )
    .await
    .unwrap();
    assert_eq!(by_project.len(), 1);
    assert_eq!(by_project[0].doc_number, "ISP-002");

    let shipped = DocumentRepo::list(
        &pool,
        &DocumentFilter {
            status: Some("shipped".to_string()),
            ..Default::default()
        },
        100,
        0,
    )
    .await
    .unwrap();
    assert_eq!(shipped.len(), 1);
    assert_eq!(shipped[0].id, a.id);

    let hits = DocumentRepo::search(&pool, Some("scheme"), None, None, 50)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
    let hits = DocumentRepo::search(&pool, Some("AOSR"), Some("P1"), None, 50)
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);

    let detail = DocumentRepo::find_detail(&pool, a.id).await.unwrap().unwrap();
    assert_eq!(detail.document_type.name, "Act");
    assert_eq!(detail.shipments.len(), 1);
    assert!(detail.returns.is_empty());
}

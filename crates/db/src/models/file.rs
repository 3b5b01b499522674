//! General file store: categories and uploaded files.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sitedesk_core::types::{DbId, Timestamp};
use validator::Validate;

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

/// A row from the `file_categories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FileCategory {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateFileCategory {
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateFileCategory {
    #[validate(length(min = 1))]
    pub name: Option<String>,
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// A row from the `uploaded_files` table.
///
/// `filename` is the unique name on disk; `original_filename` is what the
/// client sent and what downloads are offered as.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UploadedFile {
    pub id: DbId,
    pub filename: String,
    pub original_filename: String,
    pub file_path: String,
    pub file_size: i64,
    pub content_type: Option<String>,
    pub category_id: Option<DbId>,
    pub section_id: Option<String>,
    pub section_name: Option<String>,
    pub project_id: Option<String>,
    pub uploaded_by: String,
    pub uploader_id: Option<DbId>,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Insert DTO, filled in by the upload handler after the file is on disk.
#[derive(Debug, Clone)]
pub struct CreateUploadedFile {
    pub filename: String,
    pub original_filename: String,
    pub file_path: String,
    pub file_size: i64,
    pub content_type: Option<String>,
    pub category_id: Option<DbId>,
    pub section_id: Option<String>,
    pub section_name: Option<String>,
    pub project_id: Option<String>,
    pub uploaded_by: String,
    pub uploader_id: Option<DbId>,
    pub description: Option<String>,
}

/// Metadata a client may change; the stored bytes never change.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUploadedFile {
    pub category_id: Option<DbId>,
    pub section_id: Option<String>,
    pub section_name: Option<String>,
    pub project_id: Option<String>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

/// Listing filters, AND-combined.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadedFileFilter {
    pub section_id: Option<String>,
    pub project_id: Option<String>,
    pub category_id: Option<DbId>,
    pub is_active: Option<bool>,
}

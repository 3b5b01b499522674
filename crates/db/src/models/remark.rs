//! Construction remark, photo and history models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sitedesk_core::remarks::{RemarkPriority, RemarkStatus};
use sitedesk_core::types::{DbId, Timestamp};
use validator::Validate;

/// A row from the `construction_remarks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Remark {
    pub id: DbId,
    pub remark_number: String,
    pub project_object_id: DbId,
    pub title: String,
    pub description: String,
    pub status: String,
    pub priority: String,
    pub assigned_to: Option<String>,
    pub deadline: Option<Timestamp>,
    pub created_by: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a remark. The creator comes from the authenticated user.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRemark {
    #[validate(length(min = 1))]
    pub remark_number: String,
    pub project_object_id: DbId,
    #[validate(length(min = 1))]
    pub title: String,
    pub description: String,
    pub status: Option<RemarkStatus>,
    pub priority: Option<RemarkPriority>,
    pub assigned_to: Option<String>,
    pub deadline: Option<Timestamp>,
}

/// Partial update. A `status` different from the current one is a transition.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRemark {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<RemarkStatus>,
    pub priority: Option<RemarkPriority>,
    pub assigned_to: Option<String>,
    pub deadline: Option<Timestamp>,
}

/// Listing filters, AND-combined.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemarkFilter {
    pub project_object_id: Option<DbId>,
    pub status: Option<RemarkStatus>,
    pub priority: Option<RemarkPriority>,
    pub assigned_to: Option<String>,
}

/// Remark with its photos and history (newest first).
#[derive(Debug, Clone, Serialize)]
pub struct RemarkDetail {
    #[serde(flatten)]
    pub remark: Remark,
    pub photos: Vec<RemarkPhoto>,
    pub history: Vec<RemarkHistory>,
}

/// Per-status counts for one project object.
#[derive(Debug, Clone, Serialize)]
pub struct RemarkSummary {
    pub project_object_id: DbId,
    pub total: i64,
    pub by_status: std::collections::BTreeMap<String, i64>,
}

/// A row from the `remark_photos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RemarkPhoto {
    pub id: DbId,
    pub remark_id: DbId,
    pub file_path: String,
    pub filename: String,
    pub file_size: i64,
    pub description: Option<String>,
    pub created_by: String,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone)]
pub struct CreateRemarkPhoto {
    pub remark_id: DbId,
    pub file_path: String,
    pub filename: String,
    pub file_size: i64,
    pub description: Option<String>,
    pub created_by: String,
}

/// A row from the `remark_history` table. Never updated after insert.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RemarkHistory {
    pub id: DbId,
    pub remark_id: DbId,
    pub old_status: Option<String>,
    pub new_status: String,
    pub comment: Option<String>,
    pub changed_by: String,
    pub changed_at: Timestamp,
}

//! Project object (construction site) model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sitedesk_core::types::{DbId, Timestamp};
use validator::Validate;

/// A row from the `project_objects` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProjectObject {
    pub id: DbId,
    pub object_code: String,
    pub name: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProjectObject {
    #[validate(length(min = 1))]
    pub object_code: String,
    #[validate(length(min = 1))]
    pub name: String,
    pub location: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProjectObject {
    pub object_code: Option<String>,
    pub name: Option<String>,
    pub location: Option<String>,
    pub description: Option<String>,
}

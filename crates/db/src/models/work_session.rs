//! Employee work sessions.

use serde::Serialize;
use sqlx::FromRow;
use sitedesk_core::types::{DbId, Timestamp};

/// A row from the `work_sessions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WorkSession {
    pub id: DbId,
    pub user_id: DbId,
    pub start_time: Timestamp,
    pub end_time: Option<Timestamp>,
    pub is_active: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

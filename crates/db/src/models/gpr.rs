//! GPR (work schedule) records and weekly reports.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sitedesk_core::types::{DbId, Timestamp};

/// A row from the `gpr_records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct GprRecord {
    pub id: DbId,
    pub customer_id: DbId,
    pub object_id: DbId,
    pub work_type: String,
    pub volume_plan: f64,
    pub volume_fact: f64,
    pub volume_remainder: f64,
    pub progress: f64,
    pub daily_data: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateGprRecord {
    pub customer_id: DbId,
    pub object_id: DbId,
    pub work_type: String,
    pub volume_plan: f64,
    #[serde(default)]
    pub volume_fact: f64,
    pub daily_data: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateGprRecord {
    pub customer_id: Option<DbId>,
    pub object_id: Option<DbId>,
    pub work_type: Option<String>,
    pub volume_plan: Option<f64>,
    pub volume_fact: Option<f64>,
    pub daily_data: Option<serde_json::Value>,
}

/// Listing filters for GPR records.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GprFilter {
    pub customer_id: Option<DbId>,
    pub object_id: Option<DbId>,
    pub work_type: Option<String>,
}

/// A row from the `weekly_reports` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct WeeklyReport {
    pub id: DbId,
    pub week_start_date: NaiveDate,
    pub report_data: serde_json::Value,
    pub created_by: String,
    pub created_at: Timestamp,
}

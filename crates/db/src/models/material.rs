//! Materials, warehouse stock and purchase requests.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sitedesk_core::materials::{RequestStatus, StockLevel};
use sitedesk_core::types::{DbId, Timestamp};
use validator::Validate;

// ---------------------------------------------------------------------------
// Materials
// ---------------------------------------------------------------------------

/// A row from the `materials` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Material {
    pub id: DbId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMaterial {
    #[validate(length(min = 1))]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMaterial {
    pub name: Option<String>,
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// Stock
// ---------------------------------------------------------------------------

/// A row from the `material_stocks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MaterialStock {
    pub id: DbId,
    pub material_id: DbId,
    pub quantity: i32,
    pub reserved_quantity: i32,
    pub min_threshold: i32,
    pub location: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl MaterialStock {
    pub fn level(&self) -> StockLevel {
        StockLevel {
            material_id: self.material_id,
            quantity: self.quantity,
            reserved_quantity: self.reserved_quantity,
            min_threshold: self.min_threshold,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateMaterialStock {
    pub material_id: DbId,
    #[serde(default)]
    pub quantity: i32,
    #[serde(default)]
    pub reserved_quantity: i32,
    pub min_threshold: Option<i32>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMaterialStock {
    pub quantity: Option<i32>,
    pub reserved_quantity: Option<i32>,
    pub min_threshold: Option<i32>,
    pub location: Option<String>,
}

/// Stock row joined with its material name, as shown in low-stock listings.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct LowStockMaterial {
    pub material_id: DbId,
    pub material_name: String,
    pub quantity: i32,
    pub reserved_quantity: i32,
    pub available_quantity: i32,
    pub min_threshold: i32,
    pub location: Option<String>,
}

// ---------------------------------------------------------------------------
// Purchase requests
// ---------------------------------------------------------------------------

/// A row from the `material_requests` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct MaterialRequest {
    pub id: DbId,
    pub material_id: DbId,
    pub requested_quantity: i32,
    pub needed_quantity: i32,
    pub available_quantity: i32,
    pub section_id: Option<String>,
    pub section_name: Option<String>,
    pub project_id: Option<String>,
    pub reason: Option<String>,
    pub status: String,
    pub requested_by: String,
    pub requester_id: Option<DbId>,
    pub approved_by: Option<String>,
    pub approved_at: Option<Timestamp>,
    pub fulfilled_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a request. `requested_by` and `requester_id` are filled
/// by the caller (authenticated user or the system checker).
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMaterialRequest {
    pub material_id: DbId,
    pub requested_quantity: i32,
    pub needed_quantity: Option<i32>,
    #[serde(default)]
    pub available_quantity: i32,
    pub section_id: Option<String>,
    pub section_name: Option<String>,
    pub project_id: Option<String>,
    pub reason: Option<String>,
    #[serde(skip)]
    pub requested_by: String,
    #[serde(skip)]
    pub requester_id: Option<DbId>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMaterialRequest {
    pub requested_quantity: Option<i32>,
    pub reason: Option<String>,
    pub status: Option<RequestStatus>,
}

/// Listing filters for purchase requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MaterialRequestFilter {
    pub status: Option<RequestStatus>,
    pub material_id: Option<DbId>,
    pub section_id: Option<String>,
}

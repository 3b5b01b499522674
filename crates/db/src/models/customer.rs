//! Customer model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sitedesk_core::types::{DbId, Timestamp};
use validator::Validate;

/// A row from the `customers` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Customer {
    pub id: DbId,
    pub customer_code: String,
    pub name: String,
    pub contact_info: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCustomer {
    #[validate(length(min = 1))]
    pub customer_code: String,
    #[validate(length(min = 1))]
    pub name: String,
    pub contact_info: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCustomer {
    pub customer_code: Option<String>,
    pub name: Option<String>,
    pub contact_info: Option<String>,
}

//! User entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sitedesk_core::types::{DbId, Timestamp};

/// Full user row from the `users` table.
///
/// Contains the password hash; never serialize it. Use [`UserResponse`] for
/// anything leaving the server.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
    pub permissions: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Safe user representation for API responses (no password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: DbId,
    pub username: String,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub is_active: bool,
    pub is_admin: bool,
    pub permissions: serde_json::Value,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            full_name: user.full_name,
            position: user.position,
            department: user.department,
            is_active: user.is_active,
            is_admin: user.is_admin,
            permissions: user.permissions,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// DTO for inserting a user. The password is already hashed.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
    pub is_admin: bool,
}

/// Profile fields a user or admin may change. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUser {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub position: Option<String>,
    pub department: Option<String>,
}

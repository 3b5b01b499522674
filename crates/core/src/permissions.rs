//! Rules for administrative user management and per-user permission maps.

use serde_json::Value;

use crate::error::CoreError;
use crate::types::DbId;

/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Minimal view of a user for management checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    pub id: DbId,
    pub is_admin: bool,
}

/// Admins cannot be deleted through the management API.
pub fn ensure_can_delete(actor: Principal, target: Principal) -> Result<(), CoreError> {
    if target.is_admin && target.id != actor.id {
        return Err(CoreError::Forbidden("Cannot delete another administrator".into()));
    }
    if target.id == actor.id {
        return Err(CoreError::Forbidden("Cannot delete your own account".into()));
    }
    Ok(())
}

/// Admins cannot be deactivated by other admins, nor can anyone lock themselves out.
pub fn ensure_can_deactivate(actor: Principal, target: Principal) -> Result<(), CoreError> {
    if target.id == actor.id {
        return Err(CoreError::Forbidden("Cannot deactivate your own account".into()));
    }
    if target.is_admin {
        return Err(CoreError::Forbidden(
            "Cannot deactivate another administrator".into(),
        ));
    }
    Ok(())
}

/// An admin may not remove their own admin rights.
pub fn ensure_can_demote(actor: Principal, target: Principal) -> Result<(), CoreError> {
    if target.id == actor.id {
        return Err(CoreError::Forbidden(
            "Cannot remove administrator rights from yourself".into(),
        ));
    }
    Ok(())
}

/// Permission maps are JSON objects keyed by permission name.
pub fn validate_permissions(permissions: &Value) -> Result<(), CoreError> {
    if permissions.is_object() {
        Ok(())
    } else {
        Err(CoreError::Validation("Permissions must be a JSON object".into()))
    }
}

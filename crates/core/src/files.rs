//! Rules for the general file store.

use crate::error::CoreError;

/// A file category may only be deleted while no uploaded file uses it.
pub fn ensure_category_deletable(file_count: i64) -> Result<(), CoreError> {
    if file_count > 0 {
        return Err(CoreError::Conflict(format!(
            "File category is still used by {file_count} files"
        )));
    }
    Ok(())
}

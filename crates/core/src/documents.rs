//! Executive-documentation status lifecycle.
//!
//! A document starts `in_office`, can be shipped to a third party exactly
//! once, and can come back exactly once after that. `returned` is terminal.
//!
//! ```text
//! in_office --ship--> shipped --return--> returned
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Status of an executive document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    InOffice,
    Shipped,
    Returned,
}

impl DocumentStatus {
    /// Status every new document is created with.
    pub const INITIAL: DocumentStatus = DocumentStatus::InOffice;

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::InOffice => "in_office",
            DocumentStatus::Shipped => "shipped",
            DocumentStatus::Returned => "returned",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_office" => Ok(DocumentStatus::InOffice),
            "shipped" => Ok(DocumentStatus::Shipped),
            "returned" => Ok(DocumentStatus::Returned),
            other => Err(CoreError::Validation(format!(
                "Invalid document status '{other}'. Must be one of: in_office, shipped, returned"
            ))),
        }
    }
}

/// Decide whether a document in `current` status may be shipped.
pub fn ensure_can_ship(current: DocumentStatus) -> Result<(), CoreError> {
    match current {
        DocumentStatus::InOffice => Ok(()),
        DocumentStatus::Shipped => Err(CoreError::Conflict("Document is already shipped".into())),
        DocumentStatus::Returned => Err(CoreError::Conflict(
            "Document is already returned, cannot ship again".into(),
        )),
    }
}

/// Decide whether a document in `current` status may be returned.
pub fn ensure_can_return(current: DocumentStatus) -> Result<(), CoreError> {
    match current {
        DocumentStatus::Shipped => Ok(()),
        DocumentStatus::InOffice => Err(CoreError::Conflict(
            "Document was never shipped and cannot be returned".into(),
        )),
        DocumentStatus::Returned => {
            Err(CoreError::Conflict("Document is already returned".into()))
        }
    }
}

/// A document may only be deleted once it has no shipment or return rows.
pub fn ensure_deletable(shipment_count: i64, return_count: i64) -> Result<(), CoreError> {
    if shipment_count > 0 || return_count > 0 {
        return Err(CoreError::Conflict(format!(
            "Document has dependent records ({shipment_count} shipments, {return_count} returns)"
        )));
    }
    Ok(())
}

/// A document type may only be deleted while no document references it.
pub fn ensure_type_deletable(document_count: i64) -> Result<(), CoreError> {
    if document_count > 0 {
        return Err(CoreError::Conflict(format!(
            "Document type has dependent records ({document_count} documents)"
        )));
    }
    Ok(())
}

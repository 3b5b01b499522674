//! Material stock arithmetic and reorder rules.
//!
//! Stock rows carry an on-hand `quantity` and a `reserved_quantity`; only the
//! difference is available for new work. The invariant
//! `0 <= reserved_quantity <= quantity` is checked here before any write and
//! enforced again by a table constraint.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::DbId;

/// Requester name recorded on automatically raised purchase requests.
pub const SYSTEM_REQUESTER: &str = "system";

/// Threshold given to stock rows created implicitly by a demand check.
pub const DEFAULT_MIN_THRESHOLD: i32 = 10;

/// Lifecycle status of a material purchase request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Fulfilled,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Approved => "approved",
            RequestStatus::Fulfilled => "fulfilled",
            RequestStatus::Rejected => "rejected",
        }
    }

    /// Open requests suppress new automatic requests for the same material.
    pub fn is_open(self) -> bool {
        matches!(self, RequestStatus::Pending | RequestStatus::Approved)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RequestStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(RequestStatus::Pending),
            "approved" => Ok(RequestStatus::Approved),
            "fulfilled" => Ok(RequestStatus::Fulfilled),
            "rejected" => Ok(RequestStatus::Rejected),
            other => Err(CoreError::Validation(format!(
                "Invalid request status '{other}'. Must be one of: pending, approved, fulfilled, rejected"
            ))),
        }
    }
}

/// Statuses counted as "open", as stored strings.
pub const OPEN_REQUEST_STATUSES: [&str; 2] = ["pending", "approved"];

/// Closed requests are immutable once fulfilled or rejected.
pub fn ensure_request_status_change(
    from: RequestStatus,
    to: RequestStatus,
) -> Result<(), CoreError> {
    if from == to || from.is_open() {
        return Ok(());
    }
    Err(CoreError::Conflict(format!(
        "Material request is already {from} and cannot become {to}"
    )))
}

/// Point-in-time view of one stock row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockLevel {
    pub material_id: DbId,
    pub quantity: i32,
    pub reserved_quantity: i32,
    pub min_threshold: i32,
}

impl StockLevel {
    /// Units that are on hand and not already promised to other work.
    pub fn available(&self) -> i32 {
        self.quantity - self.reserved_quantity
    }

    /// Below the reorder threshold.
    pub fn is_low(&self) -> bool {
        self.available() < self.min_threshold
    }

    /// Units missing to cover `needed`; zero when stock suffices.
    pub fn shortage(&self, needed: i32) -> i32 {
        (needed - self.available()).max(0)
    }
}

/// Validate stock levels written by create/update operations.
pub fn validate_stock_levels(quantity: i32, reserved: i32, threshold: i32) -> Result<(), CoreError> {
    if quantity < 0 || reserved < 0 || threshold < 0 {
        return Err(CoreError::Validation(
            "Stock quantities and threshold must be non-negative".into(),
        ));
    }
    if reserved > quantity {
        return Err(CoreError::Validation(format!(
            "Reserved quantity {reserved} exceeds on-hand quantity {quantity}"
        )));
    }
    Ok(())
}

/// Collapse a list of `(material_id, quantity)` pairs into per-material totals.
///
/// Every quantity must be strictly positive.
pub fn merge_demand(items: &[(DbId, i32)]) -> Result<BTreeMap<DbId, i32>, CoreError> {
    if items.is_empty() {
        return Err(CoreError::Validation("At least one material is required".into()));
    }
    let mut merged: BTreeMap<DbId, i32> = BTreeMap::new();
    for &(material_id, quantity) in items {
        if quantity <= 0 {
            return Err(CoreError::Validation(format!(
                "Quantity for material {material_id} must be positive, got {quantity}"
            )));
        }
        let total = merged.entry(material_id).or_insert(0);
        *total = total.checked_add(quantity).ok_or_else(|| {
            CoreError::Validation(format!("Total quantity for material {material_id} is too large"))
        })?;
    }
    Ok(merged)
}

/// Check that every entry in `demand` can be reserved from `levels`.
///
/// Nothing is reserved unless everything can be: the first material that is
/// missing or short is reported and the caller applies no increments.
pub fn check_reservation(
    levels: &[StockLevel],
    demand: &BTreeMap<DbId, i32>,
) -> Result<(), CoreError> {
    for (&material_id, &quantity) in demand {
        let level = levels
            .iter()
            .find(|l| l.material_id == material_id)
            .ok_or_else(|| {
                CoreError::Conflict(format!("No stock record for material {material_id}"))
            })?;
        if level.available() < quantity {
            return Err(CoreError::Conflict(format!(
                "Insufficient stock for material {material_id}: requested {quantity}, available {}",
                level.available()
            )));
        }
    }
    Ok(())
}

/// Check that every entry in `demand` can be released from `levels`.
pub fn check_release(levels: &[StockLevel], demand: &BTreeMap<DbId, i32>) -> Result<(), CoreError> {
    for (&material_id, &quantity) in demand {
        let level = levels
            .iter()
            .find(|l| l.material_id == material_id)
            .ok_or_else(|| {
                CoreError::Validation(format!("No stock record for material {material_id}"))
            })?;
        if quantity > level.reserved_quantity {
            return Err(CoreError::Validation(format!(
                "Cannot release {quantity} units of material {material_id}: only {} reserved",
                level.reserved_quantity
            )));
        }
    }
    Ok(())
}

/// Stock levels after `used` units are taken out for completed work.
///
/// Reservations are drawn down first, since reserved units were set aside
/// for exactly this work.
pub fn consume(level: &StockLevel, used: i32) -> Result<StockLevel, CoreError> {
    if used <= 0 {
        return Err(CoreError::Validation(format!(
            "Consumed quantity must be positive, got {used}"
        )));
    }
    if level.quantity < used {
        return Err(CoreError::Conflict(format!(
            "Insufficient stock for material {}: consuming {used}, on hand {}",
            level.material_id, level.quantity
        )));
    }
    let quantity = level.quantity - used;
    let reserved_quantity = (level.reserved_quantity - used).max(0).min(quantity);
    Ok(StockLevel {
        quantity,
        reserved_quantity,
        ..*level
    })
}

/// Reason text for a request raised because stock fell below its threshold.
pub fn low_stock_reason(available: i32, threshold: i32) -> String {
    format!("Automatic reorder: available stock {available} is below minimum threshold {threshold}")
}

/// Reason text for a request raised by a section's demand.
pub fn section_reason(section_id: &str, needed: i32, available: i32) -> String {
    format!("Section {section_id} requires {needed}, available {available}")
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn level(material_id: DbId, quantity: i32, reserved: i32) -> StockLevel {
        StockLevel {
            material_id,
            quantity,
            reserved_quantity: reserved,
            min_threshold: 10,
        }
    }

    #[test]
    fn availability_and_shortage() {
        let l = level(1, 5, 2);
        assert_eq!(l.available(), 3);
        assert_eq!(l.shortage(5), 2);
        assert_eq!(l.shortage(3), 0);
        assert!(l.is_low());
        assert!(!level(1, 20, 0).is_low());
    }

    #[test]
    fn reservation_passes_when_every_item_fits() {
        let levels = [level(1, 5, 0), level(2, 10, 4)];
        let demand = merge_demand(&[(1, 3), (2, 6)]).unwrap();
        assert!(check_reservation(&levels, &demand).is_ok());
    }

    #[test]
    fn reservation_fails_on_first_short_item() {
        let levels = [level(1, 5, 3), level(2, 10, 0)];
        let demand = merge_demand(&[(1, 5), (2, 1)]).unwrap();
        assert_matches!(
            check_reservation(&levels, &demand),
            Err(CoreError::Conflict(msg)) if msg.contains("material 1") && msg.contains("available 2")
        );
    }

    #[test]
    fn reservation_fails_for_missing_stock_row() {
        let demand = merge_demand(&[(7, 1)]).unwrap();
        assert_matches!(check_reservation(&[], &demand), Err(CoreError::Conflict(_)));
    }

    #[test]
    fn duplicate_demand_lines_are_summed() {
        let merged = merge_demand(&[(1, 2), (1, 3), (2, 1)]).unwrap();
        assert_eq!(merged.get(&1), Some(&5));
        assert_eq!(merged.get(&2), Some(&1));
    }

    #[test]
    fn non_positive_demand_rejected() {
        assert_matches!(merge_demand(&[(1, 0)]), Err(CoreError::Validation(_)));
        assert_matches!(merge_demand(&[]), Err(CoreError::Validation(_)));
    }

    #[test]
    fn merged_demand_overflow_rejected() {
        assert_matches!(
            merge_demand(&[(1, i32::MAX), (1, 1)]),
            Err(CoreError::Validation(_))
        );
        assert_eq!(merge_demand(&[(1, i32::MAX), (2, 1)]).unwrap().len(), 2);
    }

    #[test]
    fn release_cannot_exceed_reserved() {
        let levels = [level(1, 5, 3)];
        assert!(check_release(&levels, &merge_demand(&[(1, 3)]).unwrap()).is_ok());
        assert_matches!(
            check_release(&levels, &merge_demand(&[(1, 4)]).unwrap()),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn consumption_draws_down_reservation_first() {
        let after = consume(&level(1, 10, 4), 3).unwrap();
        assert_eq!((after.quantity, after.reserved_quantity), (7, 1));

        let after = consume(&level(1, 10, 2), 5).unwrap();
        assert_eq!((after.quantity, after.reserved_quantity), (5, 0));

        let after = consume(&level(1, 10, 10), 4).unwrap();
        assert_eq!((after.quantity, after.reserved_quantity), (6, 6));

        assert_matches!(consume(&level(1, 2, 0), 3), Err(CoreError::Conflict(_)));
        assert_matches!(consume(&level(1, 2, 0), 0), Err(CoreError::Validation(_)));
    }

    #[test]
    fn stock_levels_validation() {
        assert!(validate_stock_levels(5, 5, 10).is_ok());
        assert!(validate_stock_levels(5, 6, 10).is_err());
        assert!(validate_stock_levels(-1, 0, 10).is_err());
    }

    #[test]
    fn closed_requests_are_immutable() {
        use RequestStatus::*;
        assert!(ensure_request_status_change(Pending, Approved).is_ok());
        assert!(ensure_request_status_change(Approved, Fulfilled).is_ok());
        assert!(ensure_request_status_change(Fulfilled, Fulfilled).is_ok());
        assert_matches!(
            ensure_request_status_change(Fulfilled, Pending),
            Err(CoreError::Conflict(_))
        );
        assert_matches!(
            ensure_request_status_change(Rejected, Approved),
            Err(CoreError::Conflict(_))
        );
    }
}

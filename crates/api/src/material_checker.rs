//! Material threshold checker.
//!
//! Raises automatic purchase requests when stock falls below its threshold or
//! cannot cover a section's demand, and pushes each new request to connected
//! administrators. Reservations and consumption for GPR work go through here
//! so the work-type catalogue is resolved in one place.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use sitedesk_core::error::CoreError;
use sitedesk_core::gpr::{self, WorkType};
use sitedesk_core::materials::{self, SYSTEM_REQUESTER};
use sitedesk_core::types::DbId;
use sitedesk_db::models::gpr::GprRecord;
use sitedesk_db::models::material::{CreateMaterialRequest, Material, MaterialStock};
use sitedesk_db::repositories::{GprRepo, MaterialRepo, MaterialRequestRepo, MaterialStockRepo};
use sitedesk_db::{DbPool, StoreError};

use crate::ws::manager::json_message;
use crate::ws::protocol::ServerMessage;
use crate::ws::WsManager;

/// An automatically raised purchase request, as reported to callers and
/// pushed to administrators.
#[derive(Debug, Clone, Serialize)]
pub struct MaterialNotification {
    pub request_id: DbId,
    pub material_id: DbId,
    pub material_name: String,
    pub section_id: Option<String>,
    pub needed_quantity: i32,
    pub available_quantity: i32,
    pub requested_quantity: i32,
    pub message: String,
}

/// Outcome of checking a GPR record's material requirement.
#[derive(Debug, Clone, Serialize)]
pub struct WorkMaterialCheck {
    pub gpr_record_id: DbId,
    pub work_type: String,
    pub section_id: String,
    /// `None` when the work type consumes no catalogued material.
    pub material_id: Option<DbId>,
    pub material_name: Option<String>,
    pub required_quantity: i32,
    pub available_quantity: i32,
    pub shortage: i32,
    pub needs_order: bool,
    pub notifications: Vec<MaterialNotification>,
    pub message: String,
}

/// Outcome of reserving materials for a GPR record.
#[derive(Debug, Clone, Serialize)]
pub struct WorkReservation {
    pub reserved: bool,
    pub check: WorkMaterialCheck,
}

/// Stock after recording completed GPR work.
#[derive(Debug, Clone, Serialize)]
pub struct WorkUsage {
    pub gpr_record_id: DbId,
    pub volume: f64,
    pub consumed_quantity: i32,
    /// `None` when the work type consumes no catalogued material.
    pub stock: Option<MaterialStock>,
}

/// Runs threshold and demand checks against the database.
pub struct MaterialChecker {
    pool: DbPool,
    ws_manager: Option<Arc<WsManager>>,
}

impl MaterialChecker {
    /// A checker that pushes new requests to admin sockets.
    pub fn new(pool: DbPool, ws_manager: Arc<WsManager>) -> Self {
        Self {
            pool,
            ws_manager: Some(ws_manager),
        }
    }

    /// A checker with nobody to notify, for the standalone check binary.
    pub fn without_notifications(pool: DbPool) -> Self {
        Self {
            pool,
            ws_manager: None,
        }
    }

    /// Raise a request for every low-stock material without an open request.
    ///
    /// Each request asks for `min_threshold` units. Running the check again
    /// before those requests close creates nothing new, including when two
    /// checks run at once.
    pub async fn check_low_stock_and_notify(&self) -> Result<Vec<MaterialNotification>, StoreError> {
        let low = MaterialStockRepo::list_low_stock(&self.pool).await?;

        let mut created = Vec::new();
        for row in low {
            let reason = materials::low_stock_reason(row.available_quantity, row.min_threshold);
            let Some(request) = MaterialRequestRepo::create_unless_open(
                &self.pool,
                &system_request(
                    row.material_id,
                    row.min_threshold,
                    row.min_threshold,
                    row.available_quantity,
                    None,
                    reason,
                ),
            )
            .await?
            else {
                tracing::debug!(material_id = row.material_id, "Open request already exists");
                continue;
            };

            let notification = MaterialNotification {
                request_id: request.id,
                material_id: row.material_id,
                material_name: row.material_name.clone(),
                section_id: None,
                needed_quantity: row.min_threshold,
                available_quantity: row.available_quantity,
                requested_quantity: row.min_threshold,
                message: format!(
                    "Material '{}' needs restocking: available {}, minimum threshold {}",
                    row.material_name, row.available_quantity, row.min_threshold
                ),
            };
            tracing::info!(
                material_id = row.material_id,
                request_id = request.id,
                available = row.available_quantity,
                threshold = row.min_threshold,
                "Raised low-stock purchase request"
            );
            self.notify_admins(&notification).await;
            created.push(notification);
        }
        Ok(created)
    }

    /// Raise requests for the shortfall of each material a section needs.
    ///
    /// A material without a stock row gets an empty one first. No request is
    /// raised when an open one already exists for the same material and
    /// section.
    pub async fn check_material_needs_for_section(
        &self,
        section_id: &str,
        needs: &BTreeMap<DbId, i32>,
    ) -> Result<Vec<MaterialNotification>, StoreError> {
        let mut created = Vec::new();
        for (&material_id, &needed) in needs {
            if needed <= 0 {
                return Err(CoreError::Validation(format!(
                    "Needed quantity for material {material_id} must be positive, got {needed}"
                ))
                .into());
            }
            let material = self.material(material_id).await?;
            let stock = self.stock_for(material_id).await?;
            let available = stock.level().available();
            let shortage = stock.level().shortage(needed);
            if shortage == 0 {
                continue;
            }
            let reason = materials::section_reason(section_id, needed, available);
            let Some(request) = MaterialRequestRepo::create_unless_open(
                &self.pool,
                &system_request(
                    material_id,
                    shortage,
                    needed,
                    available,
                    Some(section_id.to_string()),
                    reason,
                ),
            )
            .await?
            else {
                tracing::debug!(material_id, section_id, "Open section request already exists");
                continue;
            };

            let notification = MaterialNotification {
                request_id: request.id,
                material_id,
                material_name: material.name.clone(),
                section_id: Some(section_id.to_string()),
                needed_quantity: needed,
                available_quantity: available,
                requested_quantity: shortage,
                message: format!(
                    "Section {section_id} needs material '{}': required {needed}, available {available}",
                    material.name
                ),
            };
            tracing::info!(
                material_id,
                section_id,
                request_id = request.id,
                shortage,
                "Raised section purchase request"
            );
            self.notify_admins(&notification).await;
            created.push(notification);
        }
        Ok(created)
    }

    /// Reserve stock for a section, all or nothing.
    pub async fn reserve(
        &self,
        section_id: &str,
        items: &[(DbId, i32)],
    ) -> Result<Vec<MaterialStock>, StoreError> {
        let demand = materials::merge_demand(items)?;
        MaterialStockRepo::reserve(&self.pool, section_id, &demand).await
    }

    /// Release a section's reservations, all or nothing.
    pub async fn release(
        &self,
        section_id: &str,
        items: &[(DbId, i32)],
    ) -> Result<Vec<MaterialStock>, StoreError> {
        let demand = materials::merge_demand(items)?;
        MaterialStockRepo::release(&self.pool, section_id, &demand).await
    }

    /// Whether a material's available stock is below its threshold.
    ///
    /// A material without a stock row is not considered low.
    pub async fn check_threshold(&self, material_id: DbId) -> Result<bool, StoreError> {
        self.material(material_id).await?;
        let stock = MaterialStockRepo::find_by_material(&self.pool, material_id).await?;
        Ok(stock.is_some_and(|s| s.level().is_low()))
    }

    // -- GPR work ------------------------------------------------------------

    /// Compare a GPR record's planned volume with available stock and raise
    /// a section request (section `gpr_{id}`) for any shortfall.
    pub async fn check_materials_for_work(
        &self,
        gpr_record_id: DbId,
    ) -> Result<WorkMaterialCheck, StoreError> {
        let record = self.gpr_record(gpr_record_id).await?;
        let section_id = gpr::section_id(record.id);

        let Some((work_type, material)) = self.work_material(&record).await? else {
            return Ok(WorkMaterialCheck {
                gpr_record_id,
                work_type: record.work_type.clone(),
                section_id,
                material_id: None,
                material_name: None,
                required_quantity: 0,
                available_quantity: 0,
                shortage: 0,
                needs_order: false,
                notifications: Vec::new(),
                message: format!(
                    "Work type '{}' has no material requirements",
                    record.work_type
                ),
            });
        };

        let required = work_type.material_units(record.volume_plan);
        let stock = self.stock_for(material.id).await?;
        let available = stock.level().available();
        let shortage = stock.level().shortage(required);

        let (notifications, message) = if shortage > 0 {
            let needs = BTreeMap::from([(material.id, required)]);
            let notifications = self
                .check_material_needs_for_section(&section_id, &needs)
                .await?;
            (
                notifications,
                format!("Order {shortage} more units of '{}' to perform this work", material.name),
            )
        } else {
            (Vec::new(), "Enough material is available for this work".to_string())
        };

        Ok(WorkMaterialCheck {
            gpr_record_id,
            work_type: record.work_type,
            section_id,
            material_id: Some(material.id),
            material_name: Some(material.name),
            required_quantity: required,
            available_quantity: available,
            shortage,
            needs_order: shortage > 0,
            notifications,
            message,
        })
    }

    /// Reserve the material a GPR record needs when stock covers it.
    ///
    /// When stock is short nothing is reserved and the check (with any
    /// raised requests) is returned instead.
    pub async fn reserve_for_work(&self, gpr_record_id: DbId) -> Result<WorkReservation, StoreError> {
        let check = self.check_materials_for_work(gpr_record_id).await?;
        let reservable = match check.material_id {
            Some(material_id) if !check.needs_order && check.required_quantity > 0 => {
                Some(material_id)
            }
            _ => None,
        };
        let Some(material_id) = reservable else {
            return Ok(WorkReservation {
                reserved: false,
                check,
            });
        };

        self.reserve(&check.section_id, &[(material_id, check.required_quantity)])
            .await?;
        Ok(WorkReservation {
            reserved: true,
            check,
        })
    }

    /// Take material out of stock for `volume` units of completed work.
    pub async fn record_usage(&self, gpr_record_id: DbId, volume: f64) -> Result<WorkUsage, StoreError> {
        if !volume.is_finite() || volume <= 0.0 {
            return Err(CoreError::Validation(format!(
                "Work volume must be positive, got {volume}"
            ))
            .into());
        }
        let record = self.gpr_record(gpr_record_id).await?;

        let Some((work_type, material)) = self.work_material(&record).await? else {
            return Ok(WorkUsage {
                gpr_record_id,
                volume,
                consumed_quantity: 0,
                stock: None,
            });
        };

        let consumed = work_type.material_units(volume);
        let stock = MaterialStockRepo::consume(&self.pool, material.id, consumed).await?;
        tracing::info!(
            gpr_record_id,
            material_id = material.id,
            consumed,
            "Recorded material usage"
        );
        Ok(WorkUsage {
            gpr_record_id,
            volume,
            consumed_quantity: consumed,
            stock: Some(stock),
        })
    }

    // -- helpers -------------------------------------------------------------

    async fn material(&self, material_id: DbId) -> Result<Material, StoreError> {
        MaterialRepo::find_by_id(&self.pool, material_id)
            .await?
            .ok_or_else(|| {
                CoreError::NotFound {
                    entity: "Material",
                    id: material_id,
                }
                .into()
            })
    }

    async fn stock_for(&self, material_id: DbId) -> Result<MaterialStock, StoreError> {
        match MaterialStockRepo::find_by_material(&self.pool, material_id).await? {
            Some(stock) => Ok(stock),
            None => {
                tracing::info!(material_id, "Creating empty stock row");
                Ok(MaterialStockRepo::ensure_for_material(&self.pool, material_id).await?)
            }
        }
    }

    async fn gpr_record(&self, id: DbId) -> Result<GprRecord, StoreError> {
        GprRepo::find_by_id(&self.pool, id).await?.ok_or_else(|| {
            CoreError::NotFound {
                entity: "GprRecord",
                id,
            }
            .into()
        })
    }

    /// Catalogue entry and material row for a record's work type.
    async fn work_material(
        &self,
        record: &GprRecord,
    ) -> Result<Option<(&'static WorkType, Material)>, StoreError> {
        let Some(work_type) = gpr::find_work_type(&record.work_type) else {
            return Ok(None);
        };
        let material = MaterialRepo::find_by_name(&self.pool, work_type.material_name)
            .await?
            .ok_or_else(|| {
                CoreError::Conflict(format!(
                    "Material '{}' for work type '{}' is missing from the catalogue",
                    work_type.material_name, work_type.code
                ))
            })?;
        Ok(Some((work_type, material)))
    }

    async fn notify_admins(&self, notification: &MaterialNotification) {
        let Some(ws_manager) = &self.ws_manager else {
            return;
        };
        let data = match serde_json::to_value(notification) {
            Ok(data) => data,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize material notification");
                return;
            }
        };
        match json_message(&ServerMessage::MaterialRequest { data: &data }) {
            Ok(message) => {
                let delivered = ws_manager.send_to_admins(message).await;
                tracing::debug!(delivered, request_id = notification.request_id, "Pushed material request");
            }
            Err(e) => tracing::error!(error = %e, "Failed to serialize material notification"),
        }
    }
}

fn system_request(
    material_id: DbId,
    requested: i32,
    needed: i32,
    available: i32,
    section_id: Option<String>,
    reason: String,
) -> CreateMaterialRequest {
    CreateMaterialRequest {
        material_id,
        requested_quantity: requested,
        needed_quantity: Some(needed),
        available_quantity: available,
        section_id,
        section_name: None,
        project_id: None,
        reason: Some(reason),
        requested_by: SYSTEM_REQUESTER.to_string(),
        requester_id: None,
    }
}

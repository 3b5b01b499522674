//! Repositories for `materials`, `material_stocks` and `material_requests`.

use std::collections::BTreeMap;

use sqlx::PgPool;
use sitedesk_core::error::CoreError;
use sitedesk_core::materials::{self, RequestStatus, StockLevel, OPEN_REQUEST_STATUSES};
use sitedesk_core::types::DbId;

use crate::error::StoreError;
use crate::models::material::{
    CreateMaterial, CreateMaterialRequest, CreateMaterialStock, LowStockMaterial, Material,
    MaterialRequest, MaterialRequestFilter, MaterialStock, UpdateMaterial, UpdateMaterialRequest,
    UpdateMaterialStock,
};

const MATERIAL_COLUMNS: &str = "id, name, description, created_at, updated_at";

const STOCK_COLUMNS: &str = "id, material_id, quantity, reserved_quantity, min_threshold, \
                             location, created_at, updated_at";

const REQUEST_COLUMNS: &str = "id, material_id, requested_quantity, needed_quantity, \
    available_quantity, section_id, section_name, project_id, reason, status, requested_by, \
    requester_id, approved_by, approved_at, fulfilled_at, created_at, updated_at";

// ---------------------------------------------------------------------------
// Materials
// ---------------------------------------------------------------------------

/// Provides CRUD operations for the material catalogue.
pub struct MaterialRepo;

impl MaterialRepo {
    pub async fn create(pool: &PgPool, input: &CreateMaterial) -> Result<Material, sqlx::Error> {
        let query = format!(
            "INSERT INTO materials (name, description) VALUES ($1, $2) RETURNING {MATERIAL_COLUMNS}"
        );
        sqlx::query_as::<_, Material>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Material>, sqlx::Error> {
        let query = format!("SELECT {MATERIAL_COLUMNS} FROM materials WHERE id = $1");
        sqlx::query_as::<_, Material>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Material>, sqlx::Error> {
        let query = format!("SELECT {MATERIAL_COLUMNS} FROM materials WHERE name = $1");
        sqlx::query_as::<_, Material>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Material>, sqlx::Error> {
        let query =
            format!("SELECT {MATERIAL_COLUMNS} FROM materials ORDER BY id LIMIT $1 OFFSET $2");
        sqlx::query_as::<_, Material>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateMaterial,
    ) -> Result<Option<Material>, sqlx::Error> {
        let query = format!(
            "UPDATE materials SET
                name = COALESCE($2, name),
                description = COALESCE($3, description)
             WHERE id = $1
             RETURNING {MATERIAL_COLUMNS}"
        );
        sqlx::query_as::<_, Material>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    /// Delete a material along with its stock row and requests.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM materials WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

// ---------------------------------------------------------------------------
// Stock
// ---------------------------------------------------------------------------

/// Provides stock bookkeeping: CRUD, threshold queries and reservations.
pub struct MaterialStockRepo;

impl MaterialStockRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateMaterialStock,
    ) -> Result<MaterialStock, StoreError> {
        let threshold = input.min_threshold.unwrap_or(materials::DEFAULT_MIN_THRESHOLD);
        materials::validate_stock_levels(input.quantity, input.reserved_quantity, threshold)?;

        let query = format!(
            "INSERT INTO material_stocks (material_id, quantity, reserved_quantity, min_threshold, location)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {STOCK_COLUMNS}"
        );
        let stock = sqlx::query_as::<_, MaterialStock>(&query)
            .bind(input.material_id)
            .bind(input.quantity)
            .bind(input.reserved_quantity)
            .bind(threshold)
            .bind(&input.location)
            .fetch_one(pool)
            .await?;
        Ok(stock)
    }

    /// Return the stock row of a material, creating an empty one if missing.
    pub async fn ensure_for_material(
        pool: &PgPool,
        material_id: DbId,
    ) -> Result<MaterialStock, sqlx::Error> {
        sqlx::query(
            "INSERT INTO material_stocks (material_id, quantity, min_threshold)
             VALUES ($1, 0, $2)
             ON CONFLICT (material_id) DO NOTHING",
        )
        .bind(material_id)
        .bind(materials::DEFAULT_MIN_THRESHOLD)
        .execute(pool)
        .await?;
        let query = format!("SELECT {STOCK_COLUMNS} FROM material_stocks WHERE material_id = $1");
        sqlx::query_as::<_, MaterialStock>(&query)
            .bind(material_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<MaterialStock>, sqlx::Error> {
        let query = format!("SELECT {STOCK_COLUMNS} FROM material_stocks WHERE id = $1");
        sqlx::query_as::<_, MaterialStock>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_material(
        pool: &PgPool,
        material_id: DbId,
    ) -> Result<Option<MaterialStock>, sqlx::Error> {
        let query = format!("SELECT {STOCK_COLUMNS} FROM material_stocks WHERE material_id = $1");
        sqlx::query_as::<_, MaterialStock>(&query)
            .bind(material_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MaterialStock>, sqlx::Error> {
        let query = format!(
            "SELECT {STOCK_COLUMNS} FROM material_stocks ORDER BY material_id LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, MaterialStock>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Stock rows whose available quantity is below their threshold.
    pub async fn list_low_stock(pool: &PgPool) -> Result<Vec<LowStockMaterial>, sqlx::Error> {
        sqlx::query_as::<_, LowStockMaterial>(
            "SELECT s.material_id, m.name AS material_name, s.quantity, s.reserved_quantity,
                    s.quantity - s.reserved_quantity AS available_quantity,
                    s.min_threshold, s.location
             FROM material_stocks s
             JOIN materials m ON m.id = s.material_id
             WHERE s.quantity - s.reserved_quantity < s.min_threshold
             ORDER BY s.material_id",
        )
        .fetch_all(pool)
        .await
    }

    /// Update stock levels. The merged row is validated before writing.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateMaterialStock,
    ) -> Result<Option<MaterialStock>, StoreError> {
        let mut tx = pool.begin().await?;

        let query = format!("SELECT {STOCK_COLUMNS} FROM material_stocks WHERE id = $1 FOR UPDATE");
        let Some(current) = sqlx::query_as::<_, MaterialStock>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
        else {
            return Ok(None);
        };

        let quantity = input.quantity.unwrap_or(current.quantity);
        let reserved = input.reserved_quantity.unwrap_or(current.reserved_quantity);
        let threshold = input.min_threshold.unwrap_or(current.min_threshold);
        materials::validate_stock_levels(quantity, reserved, threshold)?;

        let query = format!(
            "UPDATE material_stocks SET
                quantity = $2,
                reserved_quantity = $3,
                min_threshold = $4,
                location = COALESCE($5, location)
             WHERE id = $1
             RETURNING {STOCK_COLUMNS}"
        );
        let stock = sqlx::query_as::<_, MaterialStock>(&query)
            .bind(id)
            .bind(quantity)
            .bind(reserved)
            .bind(threshold)
            .bind(&input.location)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(stock))
    }

    /// Reserve every entry of `demand`, or nothing.
    ///
    /// Stock rows are locked in material order, all items are validated, and
    /// only then are the increments applied.
    pub async fn reserve(
        pool: &PgPool,
        section_id: &str,
        demand: &BTreeMap<DbId, i32>,
    ) -> Result<Vec<MaterialStock>, StoreError> {
        let mut tx = pool.begin().await?;

        let levels = lock_levels(&mut tx, demand).await?;
        materials::check_reservation(&levels, demand)?;

        let query = format!(
            "UPDATE material_stocks SET reserved_quantity = reserved_quantity + $2
             WHERE material_id = $1
             RETURNING {STOCK_COLUMNS}"
        );
        let mut updated = Vec::with_capacity(demand.len());
        for (&material_id, &quantity) in demand {
            let stock = sqlx::query_as::<_, MaterialStock>(&query)
                .bind(material_id)
                .bind(quantity)
                .fetch_one(&mut *tx)
                .await?;
            updated.push(stock);
        }
        tx.commit().await?;

        tracing::info!(section_id, materials = demand.len(), "Materials reserved");
        Ok(updated)
    }

    /// Release previously reserved units. Releasing more than is reserved
    /// fails without changing anything.
    pub async fn release(
        pool: &PgPool,
        section_id: &str,
        demand: &BTreeMap<DbId, i32>,
    ) -> Result<Vec<MaterialStock>, StoreError> {
        let mut tx = pool.begin().await?;

        let levels = lock_levels(&mut tx, demand).await?;
        materials::check_release(&levels, demand)?;

        let query = format!(
            "UPDATE material_stocks SET reserved_quantity = reserved_quantity - $2
             WHERE material_id = $1
             RETURNING {STOCK_COLUMNS}"
        );
        let mut updated = Vec::with_capacity(demand.len());
        for (&material_id, &quantity) in demand {
            let stock = sqlx::query_as::<_, MaterialStock>(&query)
                .bind(material_id)
                .bind(quantity)
                .fetch_one(&mut *tx)
                .await?;
            updated.push(stock);
        }
        tx.commit().await?;

        tracing::info!(section_id, materials = demand.len(), "Material reservations released");
        Ok(updated)
    }

    /// Take `used` units out of stock for completed work.
    pub async fn consume(
        pool: &PgPool,
        material_id: DbId,
        used: i32,
    ) -> Result<MaterialStock, StoreError> {
        let mut tx = pool.begin().await?;

        let query =
            format!("SELECT {STOCK_COLUMNS} FROM material_stocks WHERE material_id = $1 FOR UPDATE");
        let current = sqlx::query_as::<_, MaterialStock>(&query)
            .bind(material_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                CoreError::Conflict(format!("No stock record for material {material_id}"))
            })?;
        let next = materials::consume(&current.level(), used)?;

        let query = format!(
            "UPDATE material_stocks SET quantity = $2, reserved_quantity = $3
             WHERE material_id = $1
             RETURNING {STOCK_COLUMNS}"
        );
        let stock = sqlx::query_as::<_, MaterialStock>(&query)
            .bind(material_id)
            .bind(next.quantity)
            .bind(next.reserved_quantity)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(stock)
    }
}

/// Lock the stock rows named in `demand`, in material order.
async fn lock_levels(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    demand: &BTreeMap<DbId, i32>,
) -> Result<Vec<StockLevel>, sqlx::Error> {
    let ids: Vec<DbId> = demand.keys().copied().collect();
    let query = format!(
        "SELECT {STOCK_COLUMNS} FROM material_stocks
         WHERE material_id = ANY($1)
         ORDER BY material_id
         FOR UPDATE"
    );
    let rows = sqlx::query_as::<_, MaterialStock>(&query)
        .bind(&ids)
        .fetch_all(&mut **tx)
        .await?;
    Ok(rows.iter().map(MaterialStock::level).collect())
}

// ---------------------------------------------------------------------------
// Purchase requests
// ---------------------------------------------------------------------------

/// Provides CRUD and approval operations for purchase requests.
pub struct MaterialRequestRepo;

fn insert_request_query() -> String {
    format!(
        "INSERT INTO material_requests
            (material_id, requested_quantity, needed_quantity, available_quantity,
             section_id, section_name, project_id, reason, status, requested_by, requester_id)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
         RETURNING {REQUEST_COLUMNS}"
    )
}

const OPEN_REQUEST_EXISTS: &str = "SELECT EXISTS (
        SELECT 1 FROM material_requests
        WHERE material_id = $1
          AND status = ANY($2)
          AND ($3::text IS NULL OR section_id = $3)
     )";

impl MaterialRequestRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateMaterialRequest,
    ) -> Result<MaterialRequest, sqlx::Error> {
        let query = insert_request_query();
        sqlx::query_as::<_, MaterialRequest>(&query)
            .bind(input.material_id)
            .bind(input.requested_quantity)
            .bind(input.needed_quantity.unwrap_or(input.requested_quantity))
            .bind(input.available_quantity)
            .bind(&input.section_id)
            .bind(&input.section_name)
            .bind(&input.project_id)
            .bind(&input.reason)
            .bind(RequestStatus::Pending.as_str())
            .bind(&input.requested_by)
            .bind(input.requester_id)
            .fetch_one(pool)
            .await
    }

    /// Create a request unless an open one already exists for the same
    /// material (and section, when `input.section_id` is set).
    ///
    /// The check and the insert share one transaction holding a
    /// transaction-scoped advisory lock keyed on the material id, so
    /// concurrent callers for one material are serialised. Returns `None`
    /// when an open request was already present.
    pub async fn create_unless_open(
        pool: &PgPool,
        input: &CreateMaterialRequest,
    ) -> Result<Option<MaterialRequest>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(input.material_id)
            .execute(&mut *tx)
            .await?;

        let (exists,): (bool,) = sqlx::query_as(OPEN_REQUEST_EXISTS)
            .bind(input.material_id)
            .bind(&OPEN_REQUEST_STATUSES[..])
            .bind(input.section_id.as_deref())
            .fetch_one(&mut *tx)
            .await?;
        if exists {
            tx.rollback().await?;
            return Ok(None);
        }

        let query = insert_request_query();
        let request = sqlx::query_as::<_, MaterialRequest>(&query)
            .bind(input.material_id)
            .bind(input.requested_quantity)
            .bind(input.needed_quantity.unwrap_or(input.requested_quantity))
            .bind(input.available_quantity)
            .bind(&input.section_id)
            .bind(&input.section_name)
            .bind(&input.project_id)
            .bind(&input.reason)
            .bind(RequestStatus::Pending.as_str())
            .bind(&input.requested_by)
            .bind(input.requester_id)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(Some(request))
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<MaterialRequest>, sqlx::Error> {
        let query = format!("SELECT {REQUEST_COLUMNS} FROM material_requests WHERE id = $1");
        sqlx::query_as::<_, MaterialRequest>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List requests matching every supplied filter, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &MaterialRequestFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<MaterialRequest>, sqlx::Error> {
        let query = format!(
            "SELECT {REQUEST_COLUMNS} FROM material_requests
             WHERE ($1::text IS NULL OR status = $1)
               AND ($2::bigint IS NULL OR material_id = $2)
               AND ($3::text IS NULL OR section_id = $3)
             ORDER BY created_at DESC, id DESC
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, MaterialRequest>(&query)
            .bind(filter.status.map(RequestStatus::as_str))
            .bind(filter.material_id)
            .bind(&filter.section_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Whether an open (pending or approved) request exists for a material.
    ///
    /// With `section_id`, only requests raised for that section count.
    pub async fn has_open(
        pool: &PgPool,
        material_id: DbId,
        section_id: Option<&str>,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(OPEN_REQUEST_EXISTS)
            .bind(material_id)
            .bind(&OPEN_REQUEST_STATUSES[..])
            .bind(section_id)
            .fetch_one(pool)
            .await?;
        Ok(exists)
    }

    /// Apply an update. Moving to `approved` records `actor` and the time;
    /// moving to `fulfilled` records the time.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateMaterialRequest,
        actor: &str,
    ) -> Result<Option<MaterialRequest>, StoreError> {
        let mut tx = pool.begin().await?;

        let row: Option<(String,)> =
            sqlx::query_as("SELECT status FROM material_requests WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((current,)) = row else {
            return Ok(None);
        };
        let current: RequestStatus = current.parse()?;
        if let Some(next) = input.status {
            materials::ensure_request_status_change(current, next)?;
        }
        let change = input.status.filter(|next| *next != current);

        let query = format!(
            "UPDATE material_requests SET
                requested_quantity = COALESCE($2, requested_quantity),
                reason = COALESCE($3, reason),
                status = COALESCE($4, status),
                approved_by = CASE WHEN $4 = 'approved' THEN $5 ELSE approved_by END,
                approved_at = CASE WHEN $4 = 'approved' THEN NOW() ELSE approved_at END,
                fulfilled_at = CASE WHEN $4 = 'fulfilled' THEN NOW() ELSE fulfilled_at END
             WHERE id = $1
             RETURNING {REQUEST_COLUMNS}"
        );
        let request = sqlx::query_as::<_, MaterialRequest>(&query)
            .bind(id)
            .bind(input.requested_quantity)
            .bind(&input.reason)
            .bind(change.map(RequestStatus::as_str))
            .bind(actor)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(request))
    }
}

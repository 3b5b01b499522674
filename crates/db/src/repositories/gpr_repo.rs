//! Repositories for `gpr_records` and `weekly_reports`.

use chrono::NaiveDate;
use sqlx::PgPool;
use sitedesk_core::gpr;
use sitedesk_core::types::DbId;

use crate::error::StoreError;
use crate::models::gpr::{CreateGprRecord, GprFilter, GprRecord, UpdateGprRecord, WeeklyReport};

const COLUMNS: &str = "id, customer_id, object_id, work_type, volume_plan, volume_fact, \
                       volume_remainder, progress, daily_data, created_at, updated_at";

const REPORT_COLUMNS: &str = "id, week_start_date, report_data, created_by, created_at";

/// Provides CRUD for GPR records. Remainder and progress are always derived
/// from plan and fact on write.
pub struct GprRepo;

impl GprRepo {
    pub async fn create(pool: &PgPool, input: &CreateGprRecord) -> Result<GprRecord, StoreError> {
        gpr::validate_volumes(input.volume_plan, input.volume_fact)?;

        let query = format!(
            "INSERT INTO gpr_records
                (customer_id, object_id, work_type, volume_plan, volume_fact,
                 volume_remainder, progress, daily_data)
             VALUES ($1, $2, $3, $4, $5, $6, $7, COALESCE($8, '{{}}'::jsonb))
             RETURNING {COLUMNS}"
        );
        let record = sqlx::query_as::<_, GprRecord>(&query)
            .bind(input.customer_id)
            .bind(input.object_id)
            .bind(&input.work_type)
            .bind(input.volume_plan)
            .bind(input.volume_fact)
            .bind(gpr::remainder(input.volume_plan, input.volume_fact))
            .bind(gpr::progress_percent(input.volume_plan, input.volume_fact))
            .bind(&input.daily_data)
            .fetch_one(pool)
            .await?;
        Ok(record)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<GprRecord>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM gpr_records WHERE id = $1");
        sqlx::query_as::<_, GprRecord>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &GprFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<GprRecord>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM gpr_records
             WHERE ($1::bigint IS NULL OR customer_id = $1)
               AND ($2::bigint IS NULL OR object_id = $2)
               AND ($3::text IS NULL OR work_type = $3)
             ORDER BY id
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, GprRecord>(&query)
            .bind(filter.customer_id)
            .bind(filter.object_id)
            .bind(&filter.work_type)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// `(work_type, plan, fact)` of every record, for report aggregation.
    pub async fn all_volumes(pool: &PgPool) -> Result<Vec<(String, f64, f64)>, sqlx::Error> {
        sqlx::query_as("SELECT work_type, volume_plan, volume_fact FROM gpr_records")
            .fetch_all(pool)
            .await
    }

    /// Apply a partial update and recompute the derived columns.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateGprRecord,
    ) -> Result<Option<GprRecord>, StoreError> {
        let mut tx = pool.begin().await?;

        let row: Option<(f64, f64)> = sqlx::query_as(
            "SELECT volume_plan, volume_fact FROM gpr_records WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some((plan, fact)) = row else {
            return Ok(None);
        };

        let plan = input.volume_plan.unwrap_or(plan);
        let fact = input.volume_fact.unwrap_or(fact);
        gpr::validate_volumes(plan, fact)?;

        let query = format!(
            "UPDATE gpr_records SET
                customer_id = COALESCE($2, customer_id),
                object_id = COALESCE($3, object_id),
                work_type = COALESCE($4, work_type),
                volume_plan = $5,
                volume_fact = $6,
                volume_remainder = $7,
                progress = $8,
                daily_data = COALESCE($9, daily_data)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let record = sqlx::query_as::<_, GprRecord>(&query)
            .bind(id)
            .bind(input.customer_id)
            .bind(input.object_id)
            .bind(&input.work_type)
            .bind(plan)
            .bind(fact)
            .bind(gpr::remainder(plan, fact))
            .bind(gpr::progress_percent(plan, fact))
            .bind(&input.daily_data)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(Some(record))
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM gpr_records WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Provides storage for generated weekly reports.
pub struct WeeklyReportRepo;

impl WeeklyReportRepo {
    pub async fn create(
        pool: &PgPool,
        week_start_date: NaiveDate,
        report_data: &serde_json::Value,
        created_by: &str,
    ) -> Result<WeeklyReport, sqlx::Error> {
        let query = format!(
            "INSERT INTO weekly_reports (week_start_date, report_data, created_by)
             VALUES ($1, $2, $3)
             RETURNING {REPORT_COLUMNS}"
        );
        sqlx::query_as::<_, WeeklyReport>(&query)
            .bind(week_start_date)
            .bind(report_data)
            .bind(created_by)
            .fetch_one(pool)
            .await
    }

    /// Most recently generated report for a week.
    pub async fn find_latest_for_week(
        pool: &PgPool,
        week_start_date: NaiveDate,
    ) -> Result<Option<WeeklyReport>, sqlx::Error> {
        let query = format!(
            "SELECT {REPORT_COLUMNS} FROM weekly_reports
             WHERE week_start_date = $1
             ORDER BY created_at DESC, id DESC
             LIMIT 1"
        );
        sqlx::query_as::<_, WeeklyReport>(&query)
            .bind(week_start_date)
            .fetch_optional(pool)
            .await
    }
}

//! Repository for `construction_remarks`, `remark_photos` and `remark_history`.
//!
//! Creation and updates write the audit row in the same transaction as the
//! remark itself, so history and status never diverge.

use std::collections::BTreeMap;

use sqlx::PgPool;
use sitedesk_core::error::CoreError;
use sitedesk_core::remarks::{
    self, RemarkPriority, RemarkStatus, TransitionPolicy, ALL_REMARK_STATUSES,
};
use sitedesk_core::search::contains_pattern;
use sitedesk_core::types::{DbId, Timestamp};

use crate::error::StoreError;
use crate::models::remark::{
    CreateRemark, CreateRemarkPhoto, Remark, RemarkDetail, RemarkFilter, RemarkHistory,
    RemarkPhoto, RemarkSummary, UpdateRemark,
};

const COLUMNS: &str = "id, remark_number, project_object_id, title, description, status, \
                       priority, assigned_to, deadline, created_by, created_at, updated_at";

const PHOTO_COLUMNS: &str =
    "id, remark_id, file_path, filename, file_size, description, created_by, created_at";

const HISTORY_COLUMNS: &str =
    "id, remark_id, old_status, new_status, comment, changed_by, changed_at";

/// Provides lifecycle, search and attachment operations for remarks.
pub struct RemarkRepo;

impl RemarkRepo {
    /// Insert a remark and its initial history row.
    ///
    /// Fails with `NotFound` if the project object does not exist.
    pub async fn create(
        pool: &PgPool,
        input: &CreateRemark,
        created_by: &str,
    ) -> Result<Remark, StoreError> {
        let mut tx = pool.begin().await?;

        let object: Option<(DbId,)> = sqlx::query_as("SELECT id FROM project_objects WHERE id = $1")
            .bind(input.project_object_id)
            .fetch_optional(&mut *tx)
            .await?;
        if object.is_none() {
            return Err(CoreError::NotFound {
                entity: "ProjectObject",
                id: input.project_object_id,
            }
            .into());
        }

        let status = input.status.unwrap_or(RemarkStatus::New);
        let priority = input.priority.unwrap_or_default();

        let query = format!(
            "INSERT INTO construction_remarks
                (remark_number, project_object_id, title, description, status, priority,
                 assigned_to, deadline, created_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        let remark = sqlx::query_as::<_, Remark>(&query)
            .bind(&input.remark_number)
            .bind(input.project_object_id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(status.as_str())
            .bind(priority.as_str())
            .bind(&input.assigned_to)
            .bind(input.deadline)
            .bind(created_by)
            .fetch_one(&mut *tx)
            .await?;

        insert_history(&mut tx, remark.id, None, status, remarks::CREATED_COMMENT, created_by)
            .await?;
        tx.commit().await?;

        tracing::info!(remark_id = remark.id, remark_number = %remark.remark_number, "Remark created");
        Ok(remark)
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Remark>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM construction_remarks WHERE id = $1");
        sqlx::query_as::<_, Remark>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Remark with photos and history (newest first).
    pub async fn find_detail(pool: &PgPool, id: DbId) -> Result<Option<RemarkDetail>, sqlx::Error> {
        let Some(remark) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        let photos = Self::list_photos(pool, id).await?;
        let history = Self::list_history(pool, id).await?;
        Ok(Some(RemarkDetail {
            remark,
            photos,
            history,
        }))
    }

    /// List remarks matching every supplied filter, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &RemarkFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Remark>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM construction_remarks
             WHERE ($1::bigint IS NULL OR project_object_id = $1)
               AND ($2::text IS NULL OR status = $2)
               AND ($3::text IS NULL OR priority = $3)
               AND ($4::text IS NULL OR assigned_to = $4)
             ORDER BY created_at DESC, id DESC
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, Remark>(&query)
            .bind(filter.project_object_id)
            .bind(filter.status.map(RemarkStatus::as_str))
            .bind(filter.priority.map(RemarkPriority::as_str))
            .bind(&filter.assigned_to)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Case-sensitive substring search over number, title and description.
    pub async fn search(
        pool: &PgPool,
        text: Option<&str>,
        project_object_id: Option<DbId>,
        status: Option<RemarkStatus>,
        priority: Option<RemarkPriority>,
        limit: i64,
    ) -> Result<Vec<Remark>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM construction_remarks
             WHERE ($1::text IS NULL
                    OR remark_number LIKE $1 OR title LIKE $1 OR description LIKE $1)
               AND ($2::bigint IS NULL OR project_object_id = $2)
               AND ($3::text IS NULL OR status = $3)
               AND ($4::text IS NULL OR priority = $4)
             ORDER BY created_at DESC, id DESC
             LIMIT $5"
        );
        sqlx::query_as::<_, Remark>(&query)
            .bind(text.and_then(contains_pattern))
            .bind(project_object_id)
            .bind(status.map(RemarkStatus::as_str))
            .bind(priority.map(RemarkPriority::as_str))
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Remarks whose deadline is before `now` and which are not yet resolved.
    pub async fn list_overdue(pool: &PgPool, now: Timestamp) -> Result<Vec<Remark>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM construction_remarks
             WHERE deadline IS NOT NULL AND deadline < $1
               AND status <> ALL($2)
             ORDER BY deadline, id"
        );
        sqlx::query_as::<_, Remark>(&query)
            .bind(now)
            .bind(remarks::resolved_status_strs())
            .fetch_all(pool)
            .await
    }

    /// Count remarks of a project object, in total and per status.
    ///
    /// Every status appears in `by_status`, zero when unused.
    pub async fn summary(
        pool: &PgPool,
        project_object_id: DbId,
    ) -> Result<RemarkSummary, sqlx::Error> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM construction_remarks
             WHERE project_object_id = $1
             GROUP BY status",
        )
        .bind(project_object_id)
        .fetch_all(pool)
        .await?;

        let mut by_status: BTreeMap<String, i64> = ALL_REMARK_STATUSES
            .into_iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        let mut total = 0;
        for (status, count) in rows {
            total += count;
            by_status.insert(status, count);
        }
        Ok(RemarkSummary {
            project_object_id,
            total,
            by_status,
        })
    }

    /// Apply a partial update, enforcing `policy` on any status change.
    ///
    /// A status change appends exactly one history row attributed to `actor`;
    /// other updates append none.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateRemark,
        actor: &str,
        policy: TransitionPolicy,
    ) -> Result<Remark, StoreError> {
        let mut tx = pool.begin().await?;

        let row: Option<(String,)> =
            sqlx::query_as("SELECT status FROM construction_remarks WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        let (current,) = row.ok_or(CoreError::NotFound {
            entity: "ConstructionRemark",
            id,
        })?;
        let current: RemarkStatus = current.parse()?;

        let change = match input.status {
            Some(next) if next != current => {
                policy.check(current, next)?;
                Some(next)
            }
            _ => None,
        };

        let query = format!(
            "UPDATE construction_remarks SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                priority = COALESCE($5, priority),
                assigned_to = COALESCE($6, assigned_to),
                deadline = COALESCE($7, deadline)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let remark = sqlx::query_as::<_, Remark>(&query)
            .bind(id)
            .bind(&input.title)
            .bind(&input.description)
            .bind(change.map(RemarkStatus::as_str))
            .bind(input.priority.map(RemarkPriority::as_str))
            .bind(&input.assigned_to)
            .bind(input.deadline)
            .fetch_one(&mut *tx)
            .await?;

        if let Some(next) = change {
            let comment = remarks::status_change_comment(current, next);
            insert_history(&mut tx, id, Some(current), next, &comment, actor).await?;
        }
        tx.commit().await?;

        if let Some(next) = change {
            tracing::info!(remark_id = id, from = %current, to = %next, actor, "Remark status changed");
        }
        Ok(remark)
    }

    /// Delete a remark together with its photos and history rows.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM construction_remarks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // -- history ------------------------------------------------------------

    /// History of a remark, newest first.
    pub async fn list_history(
        pool: &PgPool,
        remark_id: DbId,
    ) -> Result<Vec<RemarkHistory>, sqlx::Error> {
        let query = format!(
            "SELECT {HISTORY_COLUMNS} FROM remark_history
             WHERE remark_id = $1
             ORDER BY changed_at DESC, id DESC"
        );
        sqlx::query_as::<_, RemarkHistory>(&query)
            .bind(remark_id)
            .fetch_all(pool)
            .await
    }

    // -- photos -------------------------------------------------------------

    pub async fn add_photo(
        pool: &PgPool,
        input: &CreateRemarkPhoto,
    ) -> Result<RemarkPhoto, sqlx::Error> {
        let query = format!(
            "INSERT INTO remark_photos
                (remark_id, file_path, filename, file_size, description, created_by)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {PHOTO_COLUMNS}"
        );
        sqlx::query_as::<_, RemarkPhoto>(&query)
            .bind(input.remark_id)
            .bind(&input.file_path)
            .bind(&input.filename)
            .bind(input.file_size)
            .bind(&input.description)
            .bind(&input.created_by)
            .fetch_one(pool)
            .await
    }

    pub async fn find_photo(pool: &PgPool, id: DbId) -> Result<Option<RemarkPhoto>, sqlx::Error> {
        let query = format!("SELECT {PHOTO_COLUMNS} FROM remark_photos WHERE id = $1");
        sqlx::query_as::<_, RemarkPhoto>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Photos of a remark, oldest first.
    pub async fn list_photos(
        pool: &PgPool,
        remark_id: DbId,
    ) -> Result<Vec<RemarkPhoto>, sqlx::Error> {
        let query = format!(
            "SELECT {PHOTO_COLUMNS} FROM remark_photos WHERE remark_id = $1 ORDER BY created_at, id"
        );
        sqlx::query_as::<_, RemarkPhoto>(&query)
            .bind(remark_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update_photo_description(
        pool: &PgPool,
        id: DbId,
        description: Option<&str>,
    ) -> Result<Option<RemarkPhoto>, sqlx::Error> {
        let query = format!(
            "UPDATE remark_photos SET description = $2 WHERE id = $1 RETURNING {PHOTO_COLUMNS}"
        );
        sqlx::query_as::<_, RemarkPhoto>(&query)
            .bind(id)
            .bind(description)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete_photo(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM remark_photos WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

async fn insert_history(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    remark_id: DbId,
    old_status: Option<RemarkStatus>,
    new_status: RemarkStatus,
    comment: &str,
    changed_by: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO remark_history (remark_id, old_status, new_status, comment, changed_by)
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(remark_id)
    .bind(old_status.map(RemarkStatus::as_str))
    .bind(new_status.as_str())
    .bind(comment)
    .bind(changed_by)
    .execute(&mut **tx)
    .await?;
    Ok(())
}

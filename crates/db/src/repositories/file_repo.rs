//! Repositories for `file_categories` and `uploaded_files`.
//!
//! Only metadata lives here. The handlers own the bytes on disk and remove
//! them after a row is deleted.

use sqlx::PgPool;
use sitedesk_core::files;
use sitedesk_core::types::DbId;

use crate::error::StoreError;
use crate::models::file::{
    CreateFileCategory, CreateUploadedFile, FileCategory, UpdateFileCategory, UpdateUploadedFile,
    UploadedFile, UploadedFileFilter,
};

const CATEGORY_COLUMNS: &str = "id, name, description, created_at, updated_at";

const FILE_COLUMNS: &str = "id, filename, original_filename, file_path, file_size, content_type, \
    category_id, section_id, section_name, project_id, uploaded_by, uploader_id, description, \
    is_active, created_at, updated_at";

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

pub struct FileCategoryRepo;

impl FileCategoryRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateFileCategory,
    ) -> Result<FileCategory, sqlx::Error> {
        let query = format!(
            "INSERT INTO file_categories (name, description)
             VALUES ($1, $2)
             RETURNING {CATEGORY_COLUMNS}"
        );
        sqlx::query_as::<_, FileCategory>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<FileCategory>, sqlx::Error> {
        let query = format!("SELECT {CATEGORY_COLUMNS} FROM file_categories WHERE id = $1");
        sqlx::query_as::<_, FileCategory>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FileCategory>, sqlx::Error> {
        let query = format!(
            "SELECT {CATEGORY_COLUMNS} FROM file_categories ORDER BY name LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, FileCategory>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateFileCategory,
    ) -> Result<Option<FileCategory>, sqlx::Error> {
        let query = format!(
            "UPDATE file_categories SET
                name = COALESCE($2, name),
                description = COALESCE($3, description)
             WHERE id = $1
             RETURNING {CATEGORY_COLUMNS}"
        );
        sqlx::query_as::<_, FileCategory>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    /// Delete a category no file uses. `Ok(false)` if it does not exist.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, StoreError> {
        let mut tx = pool.begin().await?;

        let locked: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM file_categories WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Ok(false);
        }

        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM uploaded_files WHERE category_id = $1")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        files::ensure_category_deletable(count)?;

        sqlx::query("DELETE FROM file_categories WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

pub struct UploadedFileRepo;

impl UploadedFileRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateUploadedFile,
    ) -> Result<UploadedFile, sqlx::Error> {
        let query = format!(
            "INSERT INTO uploaded_files
                (filename, original_filename, file_path, file_size, content_type, category_id,
                 section_id, section_name, project_id, uploaded_by, uploader_id, description)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
             RETURNING {FILE_COLUMNS}"
        );
        sqlx::query_as::<_, UploadedFile>(&query)
            .bind(&input.filename)
            .bind(&input.original_filename)
            .bind(&input.file_path)
            .bind(input.file_size)
            .bind(&input.content_type)
            .bind(input.category_id)
            .bind(&input.section_id)
            .bind(&input.section_name)
            .bind(&input.project_id)
            .bind(&input.uploaded_by)
            .bind(input.uploader_id)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<UploadedFile>, sqlx::Error> {
        let query = format!("SELECT {FILE_COLUMNS} FROM uploaded_files WHERE id = $1");
        sqlx::query_as::<_, UploadedFile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Files matching every supplied filter, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &UploadedFileFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<UploadedFile>, sqlx::Error> {
        let query = format!(
            "SELECT {FILE_COLUMNS} FROM uploaded_files
             WHERE ($1::text IS NULL OR section_id = $1)
               AND ($2::text IS NULL OR project_id = $2)
               AND ($3::bigint IS NULL OR category_id = $3)
               AND ($4::boolean IS NULL OR is_active = $4)
             ORDER BY created_at DESC, id DESC
             LIMIT $5 OFFSET $6"
        );
        sqlx::query_as::<_, UploadedFile>(&query)
            .bind(&filter.section_id)
            .bind(&filter.project_id)
            .bind(filter.category_id)
            .bind(filter.is_active)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateUploadedFile,
    ) -> Result<Option<UploadedFile>, sqlx::Error> {
        let query = format!(
            "UPDATE uploaded_files SET
                category_id = COALESCE($2, category_id),
                section_id = COALESCE($3, section_id),
                section_name = COALESCE($4, section_name),
                project_id = COALESCE($5, project_id),
                description = COALESCE($6, description),
                is_active = COALESCE($7, is_active)
             WHERE id = $1
             RETURNING {FILE_COLUMNS}"
        );
        sqlx::query_as::<_, UploadedFile>(&query)
            .bind(id)
            .bind(input.category_id)
            .bind(&input.section_id)
            .bind(&input.section_name)
            .bind(&input.project_id)
            .bind(&input.description)
            .bind(input.is_active)
            .fetch_optional(pool)
            .await
    }

    /// Delete the row. Returns the deleted file so the caller can remove it
    /// from disk.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<Option<UploadedFile>, sqlx::Error> {
        let query = format!("DELETE FROM uploaded_files WHERE id = $1 RETURNING {FILE_COLUMNS}");
        sqlx::query_as::<_, UploadedFile>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

//! Repository for the `project_objects` table.

use sqlx::PgPool;
use sitedesk_core::types::DbId;

use crate::models::project_object::{CreateProjectObject, ProjectObject, UpdateProjectObject};

const COLUMNS: &str = "id, object_code, name, location, description, created_at, updated_at";

/// Provides CRUD operations for project objects.
pub struct ProjectObjectRepo;

impl ProjectObjectRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateProjectObject,
    ) -> Result<ProjectObject, sqlx::Error> {
        let query = format!(
            "INSERT INTO project_objects (object_code, name, location, description)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectObject>(&query)
            .bind(&input.object_code)
            .bind(&input.name)
            .bind(&input.location)
            .bind(&input.description)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<ProjectObject>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM project_objects WHERE id = $1");
        sqlx::query_as::<_, ProjectObject>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProjectObject>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM project_objects ORDER BY id LIMIT $1 OFFSET $2");
        sqlx::query_as::<_, ProjectObject>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Update a project object. Only non-`None` fields in `input` are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProjectObject,
    ) -> Result<Option<ProjectObject>, sqlx::Error> {
        let query = format!(
            "UPDATE project_objects SET
                object_code = COALESCE($2, object_code),
                name = COALESCE($3, name),
                location = COALESCE($4, location),
                description = COALESCE($5, description)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, ProjectObject>(&query)
            .bind(id)
            .bind(&input.object_code)
            .bind(&input.name)
            .bind(&input.location)
            .bind(&input.description)
            .fetch_optional(pool)
            .await
    }

    /// Delete a project object. Fails with a foreign-key violation while
    /// remarks or GPR records reference it.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM project_objects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

//! Repository for the `work_sessions` table.

use sqlx::PgPool;
use sitedesk_core::error::CoreError;
use sitedesk_core::types::{DbId, Timestamp};

use crate::error::StoreError;
use crate::models::work_session::WorkSession;

const COLUMNS: &str = "id, user_id, start_time, end_time, is_active, created_at, updated_at";

/// Provides start/stop and reporting queries for work sessions.
pub struct WorkSessionRepo;

impl WorkSessionRepo {
    /// Open a session for `user_id`.
    ///
    /// Conflicts if the user already has an active session; the partial
    /// unique index backs this up under concurrent starts.
    pub async fn start(pool: &PgPool, user_id: DbId) -> Result<WorkSession, StoreError> {
        if Self::find_active(pool, user_id).await?.is_some() {
            return Err(CoreError::Conflict("You already have an active work session".into()).into());
        }
        let query = format!(
            "INSERT INTO work_sessions (user_id, start_time) VALUES ($1, NOW()) RETURNING {COLUMNS}"
        );
        let session = sqlx::query_as::<_, WorkSession>(&query)
            .bind(user_id)
            .fetch_one(pool)
            .await?;
        Ok(session)
    }

    /// Close the active session of `user_id`.
    pub async fn end(pool: &PgPool, user_id: DbId) -> Result<WorkSession, StoreError> {
        let query = format!(
            "UPDATE work_sessions SET end_time = NOW(), is_active = FALSE
             WHERE user_id = $1 AND is_active
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, WorkSession>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| CoreError::Conflict("You have no active work session".into()).into())
    }

    pub async fn find_active(
        pool: &PgPool,
        user_id: DbId,
    ) -> Result<Option<WorkSession>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM work_sessions WHERE user_id = $1 AND is_active");
        sqlx::query_as::<_, WorkSession>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await
    }

    /// Sessions of a user, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: DbId,
        limit: i64,
    ) -> Result<Vec<WorkSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM work_sessions
             WHERE user_id = $1
             ORDER BY start_time DESC, id DESC
             LIMIT $2"
        );
        sqlx::query_as::<_, WorkSession>(&query)
            .bind(user_id)
            .bind(limit)
            .fetch_all(pool)
            .await
    }

    /// Sessions of a user that started within `[from, to)`.
    pub async fn list_started_between(
        pool: &PgPool,
        user_id: DbId,
        from: Timestamp,
        to: Timestamp,
    ) -> Result<Vec<WorkSession>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM work_sessions
             WHERE user_id = $1 AND start_time >= $2 AND start_time < $3
             ORDER BY start_time"
        );
        sqlx::query_as::<_, WorkSession>(&query)
            .bind(user_id)
            .bind(from)
            .bind(to)
            .fetch_all(pool)
            .await
    }
}

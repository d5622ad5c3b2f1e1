//! Repository for the `form_submissions` table.
//!
//! Submissions are append-only snapshots; there are no update or delete
//! operations. Creation accepts any executor so the engine can snapshot
//! inside the same transaction as the status transition.

use scholaris_core::types::DbId;
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};

use crate::models::submission::{CreateSubmission, Submission};

const COLUMNS: &str = "id, instance_id, submitted_by, submission_data, attachments, notes, \
     submission_type, integrity_hash, created_at";

/// Provides append-only operations for submission snapshots.
pub struct SubmissionRepo;

impl SubmissionRepo {
    /// Insert a new snapshot, returning the created row.
    pub async fn create(
        executor: impl PgExecutor<'_>,
        input: &CreateSubmission,
    ) -> Result<Submission, sqlx::Error> {
        let query = format!(
            "INSERT INTO form_submissions \
                (instance_id, submitted_by, submission_data, attachments, notes, \
                 submission_type, integrity_hash) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Submission>(&query)
            .bind(input.instance_id)
            .bind(input.submitted_by)
            .bind(Json(&input.submission_data))
            .bind(Json(&input.attachments))
            .bind(&input.notes)
            .bind(input.submission_type.as_str())
            .bind(&input.integrity_hash)
            .fetch_one(executor)
            .await
    }

    /// Find a submission by its primary key.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<Submission>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM form_submissions WHERE id = $1");
        sqlx::query_as::<_, Submission>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List submissions for an instance with pagination, newest first.
    pub async fn list_for_instance(
        pool: &PgPool,
        instance_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Submission>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM form_submissions \
             WHERE instance_id = $1 \
             ORDER BY id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Submission>(&query)
            .bind(instance_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Get the most recent submission for an instance (the chain head).
    pub async fn get_latest(
        executor: impl PgExecutor<'_>,
        instance_id: DbId,
    ) -> Result<Option<Submission>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM form_submissions \
             WHERE instance_id = $1 \
             ORDER BY id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Submission>(&query)
            .bind(instance_id)
            .fetch_optional(executor)
            .await
    }

    /// Count the submissions for an instance.
    pub async fn count_for_instance(
        pool: &PgPool,
        instance_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM form_submissions WHERE instance_id = $1")
                .bind(instance_id)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }
}

//! Repository for the `form_template_versions` table.
//!
//! Snapshot creation locks the parent template row so concurrent requests
//! serialize and version numbers never collide. The unique constraint on
//! (template_id, version_number) backstops the lock.

use scholaris_core::types::DbId;
use scholaris_core::versioning;
use sqlx::PgPool;

use crate::models::template_version::{CreateTemplateVersion, TemplateVersion};

const COLUMNS: &str =
    "id, template_id, version_number, changes_summary, template_data, created_by, created_at";

/// Provides append-only operations for template version snapshots.
pub struct TemplateVersionRepo;

impl TemplateVersionRepo {
    /// Create an immutable full-template snapshot.
    ///
    /// Runs in a single transaction: locks the template row, computes the
    /// next version number from the latest snapshot, captures the current
    /// row as JSON, and advances the template's own version string to the
    /// snapshot number.
    ///
    /// Returns `sqlx::Error::RowNotFound` when the template does not exist.
    pub async fn create_snapshot(
        pool: &PgPool,
        input: &CreateTemplateVersion,
    ) -> Result<TemplateVersion, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let locked: Option<(DbId,)> =
            sqlx::query_as("SELECT id FROM form_templates WHERE id = $1 FOR UPDATE")
                .bind(input.template_id)
                .fetch_optional(&mut *tx)
                .await?;
        if locked.is_none() {
            return Err(sqlx::Error::RowNotFound);
        }

        let latest: Option<(String,)> = sqlx::query_as(
            "SELECT version_number FROM form_template_versions \
             WHERE template_id = $1 ORDER BY id DESC LIMIT 1",
        )
        .bind(input.template_id)
        .fetch_optional(&mut *tx)
        .await?;
        let next = versioning::next_version(latest.as_ref().map(|(v,)| v.as_str()));

        let query = format!(
            "INSERT INTO form_template_versions \
                (template_id, version_number, changes_summary, template_data, created_by) \
             SELECT t.id, $2, $3, to_jsonb(t), $4 \
             FROM form_templates t WHERE t.id = $1 \
             RETURNING {COLUMNS}"
        );
        let version = sqlx::query_as::<_, TemplateVersion>(&query)
            .bind(input.template_id)
            .bind(&next)
            .bind(&input.changes_summary)
            .bind(input.created_by)
            .fetch_one(&mut *tx)
            .await?;

        sqlx::query("UPDATE form_templates SET version = $2, updated_at = NOW() WHERE id = $1")
            .bind(input.template_id)
            .bind(&next)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(version)
    }

    /// Find a snapshot by its primary key.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<TemplateVersion>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM form_template_versions WHERE id = $1");
        sqlx::query_as::<_, TemplateVersion>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List snapshots for a template with pagination, newest first.
    pub async fn list_for_template(
        pool: &PgPool,
        template_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<TemplateVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM form_template_versions \
             WHERE template_id = $1 \
             ORDER BY id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, TemplateVersion>(&query)
            .bind(template_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Find a specific snapshot by template and version number.
    pub async fn find_by_version(
        pool: &PgPool,
        template_id: DbId,
        version_number: &str,
    ) -> Result<Option<TemplateVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM form_template_versions \
             WHERE template_id = $1 AND version_number = $2"
        );
        sqlx::query_as::<_, TemplateVersion>(&query)
            .bind(template_id)
            .bind(version_number)
            .fetch_optional(pool)
            .await
    }

    /// Get the most recent snapshot for a template.
    pub async fn get_latest(
        pool: &PgPool,
        template_id: DbId,
    ) -> Result<Option<TemplateVersion>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM form_template_versions \
             WHERE template_id = $1 \
             ORDER BY id DESC \
             LIMIT 1"
        );
        sqlx::query_as::<_, TemplateVersion>(&query)
            .bind(template_id)
            .fetch_optional(pool)
            .await
    }

    /// Count the snapshots for a template.
    pub async fn count_for_template(
        pool: &PgPool,
        template_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM form_template_versions WHERE template_id = $1")
                .bind(template_id)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }
}

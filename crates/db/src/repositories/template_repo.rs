//! Repository for the `form_templates` table.

use scholaris_core::types::DbId;
use scholaris_core::versioning;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::template::{CreateTemplate, Template, UpdateTemplate};

const COLUMNS: &str = "id, tenant_id, name, version, category, methodology_type, is_active, \
     is_default, created_by, steps, workflow_configuration, created_at, updated_at";

/// Provides CRUD operations for form templates.
pub struct TemplateRepo;

impl TemplateRepo {
    /// Insert a new template, returning the created row.
    ///
    /// New templates always start at the initial version; `methodology_type`
    /// defaults to `'universal'`.
    pub async fn create(
        pool: &PgPool,
        tenant_id: DbId,
        created_by: DbId,
        input: &CreateTemplate,
    ) -> Result<Template, sqlx::Error> {
        let query = format!(
            "INSERT INTO form_templates \
                (tenant_id, name, version, category, methodology_type, is_default, \
                 created_by, steps, workflow_configuration) \
             VALUES ($1, $2, $3, $4, COALESCE($5, 'universal'), COALESCE($6, false), \
                     $7, $8, $9) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Template>(&query)
            .bind(tenant_id)
            .bind(&input.name)
            .bind(versioning::INITIAL_VERSION)
            .bind(&input.category)
            .bind(&input.methodology_type)
            .bind(input.is_default)
            .bind(created_by)
            .bind(Json(&input.steps))
            .bind(input.workflow_configuration.as_ref().map(Json))
            .fetch_one(pool)
            .await
    }

    /// Find a template by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Template>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM form_templates WHERE id = $1");
        sqlx::query_as::<_, Template>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List active templates for a tenant, optionally filtered by category.
    pub async fn list_for_tenant(
        pool: &PgPool,
        tenant_id: DbId,
        category: Option<&str>,
    ) -> Result<Vec<Template>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM form_templates \
             WHERE tenant_id = $1 AND is_active = true \
               AND ($2::text IS NULL OR category = $2) \
             ORDER BY name ASC"
        );
        sqlx::query_as::<_, Template>(&query)
            .bind(tenant_id)
            .bind(category)
            .fetch_all(pool)
            .await
    }

    /// Find the default template for a tenant and category, if one is set.
    pub async fn find_default(
        pool: &PgPool,
        tenant_id: DbId,
        category: &str,
    ) -> Result<Option<Template>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM form_templates \
             WHERE tenant_id = $1 AND category = $2 AND is_default AND is_active"
        );
        sqlx::query_as::<_, Template>(&query)
            .bind(tenant_id)
            .bind(category)
            .fetch_optional(pool)
            .await
    }

    /// Update a template. Only non-`None` fields are applied.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateTemplate,
    ) -> Result<Option<Template>, sqlx::Error> {
        let query = format!(
            "UPDATE form_templates SET \
                name = COALESCE($2, name), \
                category = COALESCE($3, category), \
                methodology_type = COALESCE($4, methodology_type), \
                steps = COALESCE($5, steps), \
                workflow_configuration = COALESCE($6, workflow_configuration), \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Template>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.category)
            .bind(&input.methodology_type)
            .bind(input.steps.as_ref().map(Json))
            .bind(input.workflow_configuration.as_ref().map(Json))
            .fetch_optional(pool)
            .await
    }

    /// Make a template the default for its tenant and category, clearing
    /// the previous default in the same transaction.
    pub async fn set_default(
        pool: &PgPool,
        tenant_id: DbId,
        id: DbId,
    ) -> Result<Option<Template>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        sqlx::query(
            "UPDATE form_templates SET is_default = false \
             WHERE tenant_id = $1 AND is_default \
               AND category = (SELECT category FROM form_templates WHERE id = $2) \
               AND id <> $2",
        )
        .bind(tenant_id)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        let query = format!(
            "UPDATE form_templates SET is_default = true, updated_at = NOW() \
             WHERE id = $2 AND tenant_id = $1 \
             RETURNING {COLUMNS}"
        );
        let template = sqlx::query_as::<_, Template>(&query)
            .bind(tenant_id)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(template)
    }

    /// Duplicate a template under a new identity.
    ///
    /// The copy starts back at the initial version with `is_default = false`
    /// and everything else carried over. Returns `None` when the source
    /// template does not exist.
    pub async fn duplicate(
        pool: &PgPool,
        id: DbId,
        created_by: DbId,
        name: &str,
        category: Option<&str>,
    ) -> Result<Option<Template>, sqlx::Error> {
        let query = format!(
            "INSERT INTO form_templates \
                (tenant_id, name, version, category, methodology_type, is_active, \
                 is_default, created_by, steps, workflow_configuration) \
             SELECT tenant_id, $2, $3, COALESCE($4, category), methodology_type, true, \
                    false, $5, steps, workflow_configuration \
             FROM form_templates WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Template>(&query)
            .bind(id)
            .bind(name)
            .bind(versioning::INITIAL_VERSION)
            .bind(category)
            .bind(created_by)
            .fetch_optional(pool)
            .await
    }

    /// Soft-deactivate a template (set is_active = false).
    pub async fn deactivate(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE form_templates SET is_active = false, updated_at = NOW() \
             WHERE id = $1 AND is_active",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Hard-delete a template by ID. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM form_templates WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

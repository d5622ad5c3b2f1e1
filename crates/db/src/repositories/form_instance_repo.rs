//! Repository for the `form_instances` table.
//!
//! Lifecycle transitions are guarded in SQL: the UPDATE's WHERE clause
//! re-checks the current status, so a concurrent double-transition affects
//! zero rows instead of double-applying. The guarded functions accept any
//! executor so the engine can run them inside a transaction together with
//! submission snapshots.

use scholaris_core::instance::WorkflowHistoryEntry;
use scholaris_core::types::DbId;
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::{PgExecutor, PgPool};

use crate::models::form_instance::{CreateFormInstance, FormInstance};

const COLUMNS: &str = "id, tenant_id, template_id, user_id, instance_code, form_data, \
     calculated_fields, status, workflow_state, workflow_history, current_step, \
     completion_percentage, validation_results, compliance_results, submitted_at, \
     completed_at, created_at, updated_at";

/// Provides CRUD and lifecycle operations for form instances.
pub struct FormInstanceRepo;

impl FormInstanceRepo {
    /// Insert a new draft instance, returning the created row.
    pub async fn create(
        pool: &PgPool,
        tenant_id: DbId,
        user_id: DbId,
        input: &CreateFormInstance,
        history: &[WorkflowHistoryEntry],
    ) -> Result<FormInstance, sqlx::Error> {
        let query = format!(
            "INSERT INTO form_instances \
                (tenant_id, template_id, user_id, instance_code, form_data, workflow_history) \
             VALUES ($1, $2, $3, $4, COALESCE($5, '{{}}'::jsonb), $6) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FormInstance>(&query)
            .bind(tenant_id)
            .bind(input.template_id)
            .bind(user_id)
            .bind(&input.instance_code)
            .bind(input.form_data.as_ref().map(Json))
            .bind(Json(history))
            .fetch_one(pool)
            .await
    }

    /// Find an instance by ID.
    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<FormInstance>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM form_instances WHERE id = $1");
        sqlx::query_as::<_, FormInstance>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find an instance by its human-readable code.
    pub async fn find_by_code(
        pool: &PgPool,
        instance_code: &str,
    ) -> Result<Option<FormInstance>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM form_instances WHERE instance_code = $1");
        sqlx::query_as::<_, FormInstance>(&query)
            .bind(instance_code)
            .fetch_optional(pool)
            .await
    }

    /// List a user's instances, optionally filtered by status, newest first.
    pub async fn list_for_user(
        pool: &PgPool,
        tenant_id: DbId,
        user_id: DbId,
        status: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FormInstance>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM form_instances \
             WHERE tenant_id = $1 AND user_id = $2 \
               AND ($3::text IS NULL OR status = $3) \
             ORDER BY id DESC \
             LIMIT $4 OFFSET $5"
        );
        sqlx::query_as::<_, FormInstance>(&query)
            .bind(tenant_id)
            .bind(user_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// List instances created from a template, newest first.
    pub async fn list_for_template(
        pool: &PgPool,
        template_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<FormInstance>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM form_instances \
             WHERE template_id = $1 \
             ORDER BY id DESC \
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, FormInstance>(&query)
            .bind(template_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Replace the instance's form data and recomputed completion.
    ///
    /// A draft instance moves to in_progress on its first edit; later
    /// statuses are left untouched.
    pub async fn update_form_data(
        pool: &PgPool,
        id: DbId,
        form_data: &Map<String, Value>,
        completion_percentage: f64,
    ) -> Result<Option<FormInstance>, sqlx::Error> {
        let query = format!(
            "UPDATE form_instances SET \
                form_data = $2, \
                completion_percentage = $3, \
                status = CASE WHEN status = 'draft' THEN 'in_progress' ELSE status END, \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FormInstance>(&query)
            .bind(id)
            .bind(Json(form_data))
            .bind(completion_percentage)
            .fetch_optional(pool)
            .await
    }

    /// Set the current step after bounded navigation.
    pub async fn set_current_step(
        pool: &PgPool,
        id: DbId,
        current_step: i32,
    ) -> Result<Option<FormInstance>, sqlx::Error> {
        let query = format!(
            "UPDATE form_instances SET current_step = $2, updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FormInstance>(&query)
            .bind(id)
            .bind(current_step)
            .fetch_optional(pool)
            .await
    }

    /// Persist the latest validation and compliance results.
    pub async fn update_results(
        pool: &PgPool,
        id: DbId,
        validation_results: &Value,
        compliance_results: &Value,
    ) -> Result<Option<FormInstance>, sqlx::Error> {
        let query = format!(
            "UPDATE form_instances SET \
                validation_results = $2, \
                compliance_results = $3, \
                updated_at = NOW() \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FormInstance>(&query)
            .bind(id)
            .bind(validation_results)
            .bind(compliance_results)
            .fetch_optional(pool)
            .await
    }

    /// Transition to submitted. Guarded: affects no row unless the current
    /// status is draft or in_progress.
    pub async fn mark_submitted(
        executor: impl PgExecutor<'_>,
        id: DbId,
        entry: &WorkflowHistoryEntry,
    ) -> Result<Option<FormInstance>, sqlx::Error> {
        let query = format!(
            "UPDATE form_instances SET \
                status = 'submitted', \
                submitted_at = NOW(), \
                workflow_history = workflow_history || $2::jsonb, \
                updated_at = NOW() \
             WHERE id = $1 AND status IN ('draft', 'in_progress') \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FormInstance>(&query)
            .bind(id)
            .bind(Json(std::slice::from_ref(entry)))
            .fetch_optional(executor)
            .await
    }

    /// Transition to under_review. Guarded on status = submitted.
    pub async fn mark_under_review(
        executor: impl PgExecutor<'_>,
        id: DbId,
        entry: &WorkflowHistoryEntry,
    ) -> Result<Option<FormInstance>, sqlx::Error> {
        let query = format!(
            "UPDATE form_instances SET \
                status = 'under_review', \
                workflow_history = workflow_history || $2::jsonb, \
                updated_at = NOW() \
             WHERE id = $1 AND status = 'submitted' \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FormInstance>(&query)
            .bind(id)
            .bind(Json(std::slice::from_ref(entry)))
            .fetch_optional(executor)
            .await
    }

    /// Transition to approved. Guarded on the review pipeline statuses.
    pub async fn mark_approved(
        executor: impl PgExecutor<'_>,
        id: DbId,
        entry: &WorkflowHistoryEntry,
    ) -> Result<Option<FormInstance>, sqlx::Error> {
        let query = format!(
            "UPDATE form_instances SET \
                status = 'approved', \
                completed_at = NOW(), \
                workflow_history = workflow_history || $2::jsonb, \
                updated_at = NOW() \
             WHERE id = $1 AND status IN ('submitted', 'under_review') \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FormInstance>(&query)
            .bind(id)
            .bind(Json(std::slice::from_ref(entry)))
            .fetch_optional(executor)
            .await
    }

    /// Transition to rejected. Guarded on the review pipeline statuses.
    pub async fn mark_rejected(
        executor: impl PgExecutor<'_>,
        id: DbId,
        entry: &WorkflowHistoryEntry,
    ) -> Result<Option<FormInstance>, sqlx::Error> {
        let query = format!(
            "UPDATE form_instances SET \
                status = 'rejected', \
                workflow_history = workflow_history || $2::jsonb, \
                updated_at = NOW() \
             WHERE id = $1 AND status IN ('submitted', 'under_review') \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, FormInstance>(&query)
            .bind(id)
            .bind(Json(std::slice::from_ref(entry)))
            .fetch_optional(executor)
            .await
    }

    /// Count the instances created from a template.
    pub async fn count_for_template(
        pool: &PgPool,
        template_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM form_instances WHERE template_id = $1")
                .bind(template_id)
                .fetch_one(pool)
                .await?;
        Ok(row.0)
    }
}

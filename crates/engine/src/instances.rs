//! Form instance lifecycle services.
//!
//! Everything here takes the caller's [`RequestContext`] explicitly and
//! enforces the status machine guards from `scholaris_core::instance`
//! before touching the database. Transitions are additionally guarded in
//! SQL, so a race between two callers fails loudly instead of
//! double-applying.

use chrono::Utc;
use scholaris_core::compliance::{self, MethodologyRegistry};
use scholaris_core::context::RequestContext;
use scholaris_core::error::CoreError;
use scholaris_core::instance::{self, WorkflowHistoryEntry};
use scholaris_core::progress;
use scholaris_core::submission::{self, SubmissionType};
use scholaris_core::template;
use scholaris_core::types::DbId;
use scholaris_core::validation::{evaluator, FieldViolation};
use scholaris_db::models::form_instance::{CreateFormInstance, FormInstance};
use scholaris_db::models::submission::{CreateSubmission, Submission};
use scholaris_db::models::template::Template;
use scholaris_db::repositories::{FormInstanceRepo, SubmissionRepo, TemplateRepo};
use scholaris_events::{event_types, EventBus, PlatformEvent};
use serde_json::{Map, Value};
use sqlx::PgPool;

use crate::error::{EngineError, EngineResult};

/// Attempts at minting a unique instance code before giving up.
const MAX_CODE_ATTEMPTS: usize = 3;

/// Optional payload accompanying a save or submit action.
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct SubmitRequest {
    /// Extra data merged over the instance's form data in the snapshot;
    /// extra values win on key collision.
    #[serde(default)]
    pub extra_data: Map<String, Value>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Validation and compliance results for an instance.
#[derive(Debug, Clone, serde::Serialize)]
pub struct InstanceCheckOutcome {
    pub violations: Vec<FieldViolation>,
    pub compliance: Vec<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn fetch_instance(
    pool: &PgPool,
    ctx: &RequestContext,
    instance_id: DbId,
) -> EngineResult<FormInstance> {
    FormInstanceRepo::find_by_id(pool, instance_id)
        .await?
        .filter(|i| i.tenant_id == ctx.tenant_id)
        .ok_or_else(|| EngineError::not_found("form_instance", instance_id))
}

/// Fetch an instance visible to the caller's tenant.
pub async fn get_instance(
    pool: &PgPool,
    ctx: &RequestContext,
    instance_id: DbId,
) -> EngineResult<FormInstance> {
    fetch_instance(pool, ctx, instance_id).await
}

async fn fetch_template(pool: &PgPool, template_id: DbId) -> EngineResult<Template> {
    TemplateRepo::find_by_id(pool, template_id)
        .await?
        .ok_or_else(|| EngineError::not_found("template", template_id))
}

/// Editability guard shared by every mutating operation.
fn ensure_editable(
    instance: &FormInstance,
    ctx: &RequestContext,
    permissions: &[String],
) -> EngineResult<()> {
    let status = instance.status()?;
    if instance::can_be_edited_by(instance.user_id, status, ctx, permissions) {
        Ok(())
    } else {
        Err(CoreError::Forbidden(format!(
            "Instance {} is not editable by user {}",
            instance.instance_code, ctx.user_id
        ))
        .into())
    }
}

fn is_unique_violation(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation: error code 23505
            db_err.code().as_deref() == Some("23505") && db_err.constraint() == Some(constraint)
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

/// Start filling a template: creates a draft instance with a fresh
/// instance code.
///
/// The code is generated exactly once here and never regenerated. On the
/// (rare) code collision the mint is retried with a new random suffix.
pub async fn start_instance(
    pool: &PgPool,
    ctx: &RequestContext,
    template_id: DbId,
) -> EngineResult<FormInstance> {
    let template = fetch_template(pool, template_id).await?;
    if template.tenant_id != ctx.tenant_id {
        return Err(EngineError::not_found("template", template_id));
    }
    if !template.is_active {
        return Err(CoreError::Conflict(format!(
            "Template '{}' is inactive and cannot be instantiated",
            template.name
        ))
        .into());
    }

    let created = WorkflowHistoryEntry::created(ctx.user_id);
    let mut attempt = 0;
    loop {
        attempt += 1;
        let input = CreateFormInstance {
            template_id,
            instance_code: instance::generate_instance_code(&template.category, Utc::now()),
            form_data: None,
        };
        match FormInstanceRepo::create(
            pool,
            ctx.tenant_id,
            ctx.user_id,
            &input,
            std::slice::from_ref(&created),
        )
        .await
        {
            Ok(instance) => {
                tracing::info!(
                    instance_id = instance.id,
                    code = %instance.instance_code,
                    template_id,
                    "Instance created",
                );
                return Ok(instance);
            }
            Err(e)
                if is_unique_violation(&e, "uq_form_instances_code")
                    && attempt < MAX_CODE_ATTEMPTS =>
            {
                tracing::warn!(template_id, attempt, "Instance code collision, regenerating");
            }
            Err(e) => return Err(e.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// Field updates and navigation
// ---------------------------------------------------------------------------

/// Write a batch of field values and synchronously recompute progress.
///
/// Values for field ids that are not in the template are stored anyway
/// (calculated or migrated data may live there) but logged at warn level.
pub async fn update_field_values(
    pool: &PgPool,
    ctx: &RequestContext,
    instance_id: DbId,
    values: &Map<String, Value>,
    permissions: &[String],
) -> EngineResult<FormInstance> {
    let existing = fetch_instance(pool, ctx, instance_id).await?;
    ensure_editable(&existing, ctx, permissions)?;
    let template = fetch_template(pool, existing.template_id).await?;

    for field_id in values.keys() {
        if template::field_by_id(&template.steps.0, field_id).is_none() {
            tracing::warn!(
                instance_id,
                field_id = %field_id,
                "Storing value for a field not present in the template",
            );
        }
    }

    let mut form_data = existing.form_data.0.clone();
    for (key, value) in values {
        form_data.insert(key.clone(), value.clone());
    }
    let completion = progress::completion_percentage(&template.steps.0, &form_data);

    let updated = FormInstanceRepo::update_form_data(pool, instance_id, &form_data, completion)
        .await?
        .ok_or_else(|| EngineError::not_found("form_instance", instance_id))?;
    Ok(updated)
}

/// Write a single field value.
pub async fn set_field_value(
    pool: &PgPool,
    ctx: &RequestContext,
    instance_id: DbId,
    field_id: &str,
    value: Value,
    permissions: &[String],
) -> EngineResult<FormInstance> {
    let mut values = Map::new();
    values.insert(field_id.to_string(), value);
    update_field_values(pool, ctx, instance_id, &values, permissions).await
}

/// Advance to the next step. Returns `false` (and changes nothing) when
/// already on the last step.
pub async fn move_to_next_step(
    pool: &PgPool,
    ctx: &RequestContext,
    instance_id: DbId,
    permissions: &[String],
) -> EngineResult<bool> {
    let existing = fetch_instance(pool, ctx, instance_id).await?;
    ensure_editable(&existing, ctx, permissions)?;
    let template = fetch_template(pool, existing.template_id).await?;

    let total_steps = template.steps.0.len() as i32;
    match instance::next_step(existing.current_step, total_steps) {
        Some(next) => {
            FormInstanceRepo::set_current_step(pool, instance_id, next)
                .await?
                .ok_or_else(|| EngineError::not_found("form_instance", instance_id))?;
            Ok(true)
        }
        None => Ok(false),
    }
}

/// Go back one step. Returns `false` (and changes nothing) when already on
/// the first step.
pub async fn move_to_previous_step(
    pool: &PgPool,
    ctx: &RequestContext,
    instance_id: DbId,
    permissions: &[String],
) -> EngineResult<bool> {
    let existing = fetch_instance(pool, ctx, instance_id).await?;
    ensure_editable(&existing, ctx, permissions)?;

    match instance::previous_step(existing.current_step) {
        Some(previous) => {
            FormInstanceRepo::set_current_step(pool, instance_id, previous)
                .await?
                .ok_or_else(|| EngineError::not_found("form_instance", instance_id))?;
            Ok(true)
        }
        None => Ok(false),
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Run field validation and methodology compliance for an instance and
/// persist the results on the row.
///
/// Findings are data, not errors: the returned outcome may be non-empty
/// while the call itself succeeds.
pub async fn validate_instance(
    pool: &PgPool,
    ctx: &RequestContext,
    instance_id: DbId,
    registry: &MethodologyRegistry,
) -> EngineResult<InstanceCheckOutcome> {
    let existing = fetch_instance(pool, ctx, instance_id).await?;
    let template = fetch_template(pool, existing.template_id).await?;

    let violations = evaluator::validate_fields(&template.steps.0, &existing.form_data.0);
    let compliance = compliance::validate_compliance(
        &template.methodology_type,
        &template.steps.0,
        registry,
    );

    let validation_json = serde_json::to_value(&violations)
        .map_err(|e| CoreError::Internal(format!("Failed to serialize validation results: {e}")))?;
    let compliance_json = serde_json::to_value(&compliance)
        .map_err(|e| CoreError::Internal(format!("Failed to serialize compliance results: {e}")))?;
    FormInstanceRepo::update_results(pool, instance_id, &validation_json, &compliance_json)
        .await?
        .ok_or_else(|| EngineError::not_found("form_instance", instance_id))?;

    Ok(InstanceCheckOutcome {
        violations,
        compliance,
    })
}

// ---------------------------------------------------------------------------
// Lifecycle transitions
// ---------------------------------------------------------------------------

/// Take an immutable snapshot without changing status.
pub async fn auto_save(
    pool: &PgPool,
    ctx: &RequestContext,
    instance_id: DbId,
    request: &SubmitRequest,
    permissions: &[String],
) -> EngineResult<Submission> {
    let existing = fetch_instance(pool, ctx, instance_id).await?;
    ensure_editable(&existing, ctx, permissions)?;

    let snapshot =
        submission::merge_submission_data(&existing.form_data.0, &request.extra_data);
    let submission =
        snapshot_submission(pool, &existing, ctx, snapshot, request, SubmissionType::AutoSave)
            .await?;
    Ok(submission)
}

/// Submit an instance for review.
///
/// Guarded: submitting an already-submitted, approved, or completed
/// instance fails with a transition error. On success the status becomes
/// `submitted`, a snapshot is captured in the same transaction, and a
/// `form_instance.submitted` event is published.
pub async fn submit(
    pool: &PgPool,
    bus: &EventBus,
    ctx: &RequestContext,
    instance_id: DbId,
    request: &SubmitRequest,
    permissions: &[String],
) -> EngineResult<FormInstance> {
    let existing = fetch_instance(pool, ctx, instance_id).await?;
    ensure_editable(&existing, ctx, permissions)?;
    instance::can_submit(existing.status()?)?;

    let snapshot =
        submission::merge_submission_data(&existing.form_data.0, &request.extra_data);
    let entry = WorkflowHistoryEntry::submitted(ctx.user_id);

    let mut tx = pool.begin().await?;
    let updated = FormInstanceRepo::mark_submitted(&mut *tx, instance_id, &entry)
        .await?
        .ok_or_else(|| {
            EngineError::Core(CoreError::Transition(format!(
                "Instance {instance_id} can no longer be submitted"
            )))
        })?;

    let previous = SubmissionRepo::get_latest(&mut *tx, instance_id).await?;
    let integrity_hash = submission::submission_integrity_hash(
        previous.as_ref().map(|s| s.integrity_hash.as_str()),
        &Value::Object(snapshot.clone()),
    );
    SubmissionRepo::create(
        &mut *tx,
        &CreateSubmission {
            instance_id,
            submitted_by: ctx.user_id,
            submission_data: snapshot,
            attachments: request.attachments.clone(),
            notes: request.notes.clone(),
            submission_type: SubmissionType::Submit,
            integrity_hash,
        },
    )
    .await?;
    tx.commit().await?;

    bus.publish(PlatformEvent::instance_lifecycle(
        event_types::INSTANCE_SUBMITTED,
        instance_id,
        ctx.user_id,
        request.notes.as_deref(),
    ));
    tracing::info!(instance_id, code = %updated.instance_code, "Instance submitted");
    Ok(updated)
}

/// Move a submitted instance into review.
pub async fn start_review(
    pool: &PgPool,
    bus: &EventBus,
    ctx: &RequestContext,
    instance_id: DbId,
) -> EngineResult<FormInstance> {
    let existing = fetch_instance(pool, ctx, instance_id).await?;
    instance::can_start_review(existing.status()?)?;

    let entry = WorkflowHistoryEntry::review_started(ctx.user_id);
    let updated = FormInstanceRepo::mark_under_review(pool, instance_id, &entry)
        .await?
        .ok_or_else(|| {
            EngineError::Core(CoreError::Transition(format!(
                "Instance {instance_id} is no longer awaiting review"
            )))
        })?;

    bus.publish(PlatformEvent::instance_lifecycle(
        event_types::INSTANCE_REVIEW_STARTED,
        instance_id,
        ctx.user_id,
        None,
    ));
    tracing::info!(instance_id, "Instance review started");
    Ok(updated)
}

/// Approve an instance.
///
/// Guarded: only submitted/under_review instances can be approved;
/// double-approval fails. Sets `completed_at` and appends the approval to
/// the workflow history.
pub async fn approve(
    pool: &PgPool,
    bus: &EventBus,
    ctx: &RequestContext,
    instance_id: DbId,
    notes: Option<String>,
) -> EngineResult<FormInstance> {
    let existing = fetch_instance(pool, ctx, instance_id).await?;
    instance::can_approve(existing.status()?)?;

    let entry = WorkflowHistoryEntry::approved(ctx.user_id, notes.clone());
    let updated = FormInstanceRepo::mark_approved(pool, instance_id, &entry)
        .await?
        .ok_or_else(|| {
            EngineError::Core(CoreError::Transition(format!(
                "Instance {instance_id} can no longer be approved"
            )))
        })?;

    bus.publish(PlatformEvent::instance_lifecycle(
        event_types::INSTANCE_APPROVED,
        instance_id,
        ctx.user_id,
        notes.as_deref(),
    ));
    tracing::info!(instance_id, approved_by = ctx.user_id, "Instance approved");
    Ok(updated)
}

/// Reject an instance with a mandatory reason.
pub async fn reject(
    pool: &PgPool,
    bus: &EventBus,
    ctx: &RequestContext,
    instance_id: DbId,
    reason: String,
) -> EngineResult<FormInstance> {
    if reason.trim().is_empty() {
        return Err(CoreError::Validation(
            "Rejections require a reason for the audit trail".to_string(),
        )
        .into());
    }

    let existing = fetch_instance(pool, ctx, instance_id).await?;
    instance::can_reject(existing.status()?)?;

    let entry = WorkflowHistoryEntry::rejected(ctx.user_id, reason.clone());
    let updated = FormInstanceRepo::mark_rejected(pool, instance_id, &entry)
        .await?
        .ok_or_else(|| {
            EngineError::Core(CoreError::Transition(format!(
                "Instance {instance_id} can no longer be rejected"
            )))
        })?;

    bus.publish(PlatformEvent::instance_lifecycle(
        event_types::INSTANCE_REJECTED,
        instance_id,
        ctx.user_id,
        Some(&reason),
    ));
    tracing::info!(instance_id, rejected_by = ctx.user_id, "Instance rejected");
    Ok(updated)
}

// ---------------------------------------------------------------------------
// Snapshot helper
// ---------------------------------------------------------------------------

async fn snapshot_submission(
    pool: &PgPool,
    instance: &FormInstance,
    ctx: &RequestContext,
    snapshot: Map<String, Value>,
    request: &SubmitRequest,
    submission_type: SubmissionType,
) -> EngineResult<Submission> {
    let previous = SubmissionRepo::get_latest(pool, instance.id).await?;
    let integrity_hash = submission::submission_integrity_hash(
        previous.as_ref().map(|s| s.integrity_hash.as_str()),
        &Value::Object(snapshot.clone()),
    );
    let submission = SubmissionRepo::create(
        pool,
        &CreateSubmission {
            instance_id: instance.id,
            submitted_by: ctx.user_id,
            submission_data: snapshot,
            attachments: request.attachments.clone(),
            notes: request.notes.clone(),
            submission_type,
            integrity_hash,
        },
    )
    .await?;
    Ok(submission)
}

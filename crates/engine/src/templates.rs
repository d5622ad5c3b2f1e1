//! Template authoring, duplication, and versioning services.

use scholaris_core::compliance::{self, MethodologyRegistry};
use scholaris_core::context::RequestContext;
use scholaris_core::template::{self, FormStep, METHODOLOGY_UNIVERSAL};
use scholaris_core::template_lint;
use scholaris_core::types::DbId;
use scholaris_core::workflow_config::{self, WorkflowConfiguration};
use scholaris_db::models::template::{
    CreateTemplate, DuplicateTemplateOverrides, Template, UpdateTemplate,
};
use scholaris_db::models::template_version::{CreateTemplateVersion, TemplateVersion};
use scholaris_db::repositories::{TemplateRepo, TemplateVersionRepo};
use scholaris_events::{event_types, EventBus, PlatformEvent};
use sqlx::PgPool;

use crate::error::{EngineError, EngineResult};

/// Non-fatal issues found while checking a template.
///
/// Issues never block a save; callers surface them for authors to fix.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct TemplateIssues {
    pub structure: Vec<String>,
    pub workflow: Vec<String>,
    pub compliance: Vec<String>,
}

impl TemplateIssues {
    pub fn is_clean(&self) -> bool {
        self.structure.is_empty() && self.workflow.is_empty() && self.compliance.is_empty()
    }
}

fn check_schema(
    steps: &[FormStep],
    workflow: Option<&WorkflowConfiguration>,
    methodology_type: &str,
    registry: &MethodologyRegistry,
) -> TemplateIssues {
    TemplateIssues {
        structure: template_lint::lint_template(steps),
        workflow: workflow_config::validate_workflow_configuration(workflow),
        compliance: compliance::validate_compliance(methodology_type, steps, registry),
    }
}

/// Lint a template definition without persisting anything.
pub fn check_template(input: &CreateTemplate, registry: &MethodologyRegistry) -> TemplateIssues {
    let methodology = input
        .methodology_type
        .as_deref()
        .unwrap_or(METHODOLOGY_UNIVERSAL);
    check_schema(
        &input.steps,
        input.workflow_configuration.as_ref(),
        methodology,
        registry,
    )
}

/// Create a template for the caller's tenant.
///
/// Structural/workflow/compliance issues are returned alongside the created
/// row; they never block the save.
pub async fn create_template(
    pool: &PgPool,
    ctx: &RequestContext,
    input: &CreateTemplate,
    registry: &MethodologyRegistry,
) -> EngineResult<(Template, TemplateIssues)> {
    let issues = check_template(input, registry);
    let template = TemplateRepo::create(pool, ctx.tenant_id, ctx.user_id, input).await?;

    if issues.is_clean() {
        tracing::info!(template_id = template.id, tenant_id = ctx.tenant_id, "Template created");
    } else {
        tracing::warn!(
            template_id = template.id,
            tenant_id = ctx.tenant_id,
            structure = issues.structure.len(),
            workflow = issues.workflow.len(),
            compliance = issues.compliance.len(),
            "Template created with outstanding issues",
        );
    }
    Ok((template, issues))
}

/// Fetch a template the caller's tenant can see.
pub async fn get_template(
    pool: &PgPool,
    ctx: &RequestContext,
    template_id: DbId,
) -> EngineResult<Template> {
    let template = TemplateRepo::find_by_id(pool, template_id)
        .await?
        .filter(|t| t.tenant_id == ctx.tenant_id)
        .ok_or_else(|| EngineError::not_found("template", template_id))?;
    Ok(template)
}

/// Update a template and re-check it.
pub async fn update_template(
    pool: &PgPool,
    ctx: &RequestContext,
    template_id: DbId,
    input: &UpdateTemplate,
    registry: &MethodologyRegistry,
) -> EngineResult<(Template, TemplateIssues)> {
    // Ownership check before mutating.
    get_template(pool, ctx, template_id).await?;

    let template = TemplateRepo::update(pool, template_id, input)
        .await?
        .ok_or_else(|| EngineError::not_found("template", template_id))?;

    let issues = check_schema(
        &template.steps.0,
        template.workflow_configuration.as_ref().map(|c| &c.0),
        &template.methodology_type,
        registry,
    );
    tracing::info!(template_id, tenant_id = ctx.tenant_id, "Template updated");
    Ok((template, issues))
}

/// Duplicate a template under a fresh identity.
///
/// The copy starts back at version 1.0, is never the default, and takes
/// the name `"{original} (Copy)"` unless overridden.
pub async fn duplicate_template(
    pool: &PgPool,
    ctx: &RequestContext,
    template_id: DbId,
    overrides: &DuplicateTemplateOverrides,
) -> EngineResult<Template> {
    let source = get_template(pool, ctx, template_id).await?;
    let name = overrides
        .name
        .clone()
        .unwrap_or_else(|| template::duplicate_name(&source.name));

    let copy = TemplateRepo::duplicate(
        pool,
        template_id,
        ctx.user_id,
        &name,
        overrides.category.as_deref(),
    )
    .await?
    .ok_or_else(|| EngineError::not_found("template", template_id))?;

    tracing::info!(
        source_id = template_id,
        copy_id = copy.id,
        tenant_id = ctx.tenant_id,
        "Template duplicated",
    );
    Ok(copy)
}

/// Snapshot a template into its version history.
///
/// The version number advances from the latest snapshot (1.1 for the first
/// one); concurrent snapshot requests for the same template serialize in
/// the repository.
pub async fn create_version(
    pool: &PgPool,
    bus: &EventBus,
    ctx: &RequestContext,
    template_id: DbId,
    changes_summary: Option<String>,
) -> EngineResult<TemplateVersion> {
    get_template(pool, ctx, template_id).await?;

    let input = CreateTemplateVersion {
        template_id,
        changes_summary,
        created_by: ctx.user_id,
    };
    let version = TemplateVersionRepo::create_snapshot(pool, &input)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => EngineError::not_found("template", template_id),
            other => other.into(),
        })?;

    bus.publish(
        PlatformEvent::new(event_types::TEMPLATE_VERSION_CREATED)
            .with_source("form_template", template_id)
            .with_actor(ctx.user_id)
            .with_payload(serde_json::json!({
                "template_id": template_id,
                "version_number": version.version_number,
            })),
    );
    tracing::info!(
        template_id,
        version = %version.version_number,
        "Template version created",
    );
    Ok(version)
}

/// List a template's version history, newest first.
pub async fn list_versions(
    pool: &PgPool,
    ctx: &RequestContext,
    template_id: DbId,
    limit: i64,
    offset: i64,
) -> EngineResult<Vec<TemplateVersion>> {
    get_template(pool, ctx, template_id).await?;
    Ok(TemplateVersionRepo::list_for_template(pool, template_id, limit, offset).await?)
}

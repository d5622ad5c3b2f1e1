//! Integration tests for template CRUD, duplication, and version
//! snapshots against a real database.

use scholaris_core::template::{FormField, FormSection, FormStep};
use scholaris_core::workflow_config::{WorkflowConfiguration, WorkflowStepConfig};
use scholaris_db::models::template::{CreateTemplate, UpdateTemplate};
use scholaris_db::repositories::{TemplateRepo, TemplateVersionRepo};
use scholaris_db::models::template_version::CreateTemplateVersion;
use sqlx::PgPool;

const TENANT: i64 = 1;
const AUTHOR: i64 = 10;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn field(field_id: &str, required: bool) -> FormField {
    FormField {
        field_id: field_id.to_string(),
        field_type: "text".to_string(),
        label: field_id.to_string(),
        required,
        validation_rules: Vec::new(),
        conditional_logic: Vec::new(),
        options: Vec::new(),
        properties: serde_json::Map::new(),
    }
}

fn simple_schema() -> Vec<FormStep> {
    vec![FormStep {
        step_id: "basics".to_string(),
        step_title: "Basics".to_string(),
        sections: vec![FormSection {
            section_id: "identity".to_string(),
            section_title: "Identity".to_string(),
            fields: vec![field("student_name", true), field("notes", false)],
        }],
    }]
}

fn new_template(name: &str) -> CreateTemplate {
    CreateTemplate {
        name: name.to_string(),
        category: "library".to_string(),
        methodology_type: None,
        steps: simple_schema(),
        workflow_configuration: Some(WorkflowConfiguration {
            steps: vec![WorkflowStepConfig {
                step_name: "librarian_review".to_string(),
                required_roles: ["librarian".to_string()].into_iter().collect(),
                required_permissions: Default::default(),
            }],
        }),
        is_default: None,
    }
}

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_and_find_template(pool: PgPool) {
    let created = TemplateRepo::create(&pool, TENANT, AUTHOR, &new_template("Loan Form"))
        .await
        .unwrap();

    assert_eq!(created.version, "1.0");
    assert_eq!(created.methodology_type, "universal");
    assert!(created.is_active);
    assert!(!created.is_default);
    assert_eq!(created.steps.0.len(), 1);

    let found = TemplateRepo::find_by_id(&pool, created.id).await.unwrap();
    assert_eq!(found.unwrap().name, "Loan Form");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_filters_by_tenant_and_category(pool: PgPool) {
    TemplateRepo::create(&pool, TENANT, AUTHOR, &new_template("A"))
        .await
        .unwrap();
    let mut other = new_template("B");
    other.category = "transport".to_string();
    TemplateRepo::create(&pool, TENANT, AUTHOR, &other).await.unwrap();
    TemplateRepo::create(&pool, 999, AUTHOR, &new_template("Other Tenant"))
        .await
        .unwrap();

    let all = TemplateRepo::list_for_tenant(&pool, TENANT, None).await.unwrap();
    assert_eq!(all.len(), 2);

    let library = TemplateRepo::list_for_tenant(&pool, TENANT, Some("library"))
        .await
        .unwrap();
    assert_eq!(library.len(), 1);
    assert_eq!(library[0].name, "A");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_applies_only_provided_fields(pool: PgPool) {
    let created = TemplateRepo::create(&pool, TENANT, AUTHOR, &new_template("Draft"))
        .await
        .unwrap();

    let updated = TemplateRepo::update(
        &pool,
        created.id,
        &UpdateTemplate {
            name: Some("Renamed".to_string()),
            ..Default::default()
        },
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(updated.name, "Renamed");
    assert_eq!(updated.category, "library");
    assert_eq!(updated.steps.0.len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn deactivate_hides_from_listing(pool: PgPool) {
    let created = TemplateRepo::create(&pool, TENANT, AUTHOR, &new_template("Old"))
        .await
        .unwrap();

    assert!(TemplateRepo::deactivate(&pool, created.id).await.unwrap());
    // Second deactivation is a no-op.
    assert!(!TemplateRepo::deactivate(&pool, created.id).await.unwrap());

    let listed = TemplateRepo::list_for_tenant(&pool, TENANT, None).await.unwrap();
    assert!(listed.is_empty());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn set_default_clears_previous_default(pool: PgPool) {
    let first = TemplateRepo::create(&pool, TENANT, AUTHOR, &new_template("First"))
        .await
        .unwrap();
    let second = TemplateRepo::create(&pool, TENANT, AUTHOR, &new_template("Second"))
        .await
        .unwrap();

    TemplateRepo::set_default(&pool, TENANT, first.id).await.unwrap();
    TemplateRepo::set_default(&pool, TENANT, second.id).await.unwrap();

    let default = TemplateRepo::find_default(&pool, TENANT, "library")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(default.id, second.id);

    let first_again = TemplateRepo::find_by_id(&pool, first.id).await.unwrap().unwrap();
    assert!(!first_again.is_default);
}

// ---------------------------------------------------------------------------
// Duplication
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_resets_version_and_default(pool: PgPool) {
    let mut input = new_template("Original");
    input.is_default = Some(true);
    let original = TemplateRepo::create(&pool, TENANT, AUTHOR, &input).await.unwrap();

    let copy = TemplateRepo::duplicate(&pool, original.id, 20, "Original (Copy)", None)
        .await
        .unwrap()
        .unwrap();

    assert_ne!(copy.id, original.id);
    assert_eq!(copy.version, "1.0");
    assert!(!copy.is_default);
    assert_eq!(copy.name, "Original (Copy)");
    assert_eq!(copy.created_by, 20);
    assert_eq!(copy.steps.0, original.steps.0);
    assert_eq!(copy.tenant_id, original.tenant_id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_missing_source_returns_none(pool: PgPool) {
    let copy = TemplateRepo::duplicate(&pool, 424242, AUTHOR, "Ghost (Copy)", None)
        .await
        .unwrap();
    assert!(copy.is_none());
}

// ---------------------------------------------------------------------------
// Version snapshots
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn snapshots_advance_minor_versions(pool: PgPool) {
    let template = TemplateRepo::create(&pool, TENANT, AUTHOR, &new_template("Versioned"))
        .await
        .unwrap();

    let input = CreateTemplateVersion {
        template_id: template.id,
        changes_summary: Some("initial".to_string()),
        created_by: AUTHOR,
    };
    let v1 = TemplateVersionRepo::create_snapshot(&pool, &input).await.unwrap();
    let v2 = TemplateVersionRepo::create_snapshot(&pool, &input).await.unwrap();
    let v3 = TemplateVersionRepo::create_snapshot(&pool, &input).await.unwrap();

    assert_eq!(v1.version_number, "1.1");
    assert_eq!(v2.version_number, "1.2");
    assert_eq!(v3.version_number, "1.3");

    // The template's own version string tracks the latest snapshot.
    let reloaded = TemplateRepo::find_by_id(&pool, template.id).await.unwrap().unwrap();
    assert_eq!(reloaded.version, "1.3");

    let count = TemplateVersionRepo::count_for_template(&pool, template.id)
        .await
        .unwrap();
    assert_eq!(count, 3);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn snapshot_captures_full_template(pool: PgPool) {
    let template = TemplateRepo::create(&pool, TENANT, AUTHOR, &new_template("Captured"))
        .await
        .unwrap();

    let snapshot = TemplateVersionRepo::create_snapshot(
        &pool,
        &CreateTemplateVersion {
            template_id: template.id,
            changes_summary: None,
            created_by: AUTHOR,
        },
    )
    .await
    .unwrap();

    assert_eq!(snapshot.template_data["name"], "Captured");
    assert_eq!(snapshot.template_data["category"], "library");
    assert!(snapshot.template_data["steps"].is_array());

    let latest = TemplateVersionRepo::get_latest(&pool, template.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.id, snapshot.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn snapshot_for_missing_template_is_row_not_found(pool: PgPool) {
    let err = TemplateVersionRepo::create_snapshot(
        &pool,
        &CreateTemplateVersion {
            template_id: 424242,
            changes_summary: None,
            created_by: AUTHOR,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, sqlx::Error::RowNotFound));
}

//! Form template model and DTOs.

use scholaris_core::template::FormStep;
use scholaris_core::types::{DbId, Timestamp};
use scholaris_core::workflow_config::WorkflowConfiguration;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `form_templates` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Template {
    pub id: DbId,
    pub tenant_id: DbId,
    pub name: String,
    /// Dotted `major.minor` version string, kept in sync with the latest
    /// snapshot for this template.
    pub version: String,
    pub category: String,
    pub methodology_type: String,
    pub is_active: bool,
    pub is_default: bool,
    pub created_by: DbId,
    pub steps: Json<Vec<FormStep>>,
    pub workflow_configuration: Option<Json<WorkflowConfiguration>>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a new template.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTemplate {
    pub name: String,
    pub category: String,
    /// Defaults to `'universal'`.
    pub methodology_type: Option<String>,
    pub steps: Vec<FormStep>,
    pub workflow_configuration: Option<WorkflowConfiguration>,
    pub is_default: Option<bool>,
}

/// DTO for updating an existing template. All fields are optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTemplate {
    pub name: Option<String>,
    pub category: Option<String>,
    pub methodology_type: Option<String>,
    pub steps: Option<Vec<FormStep>>,
    pub workflow_configuration: Option<WorkflowConfiguration>,
}

/// Overrides applied when duplicating a template.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DuplicateTemplateOverrides {
    /// Defaults to `"{original name} (Copy)"`.
    pub name: Option<String>,
    pub category: Option<String>,
}

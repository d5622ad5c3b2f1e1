//! Form instance model and DTOs.

use scholaris_core::error::CoreError;
use scholaris_core::instance::{InstanceStatus, WorkflowHistoryEntry};
use scholaris_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `form_instances` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FormInstance {
    pub id: DbId,
    pub tenant_id: DbId,
    pub template_id: DbId,
    pub user_id: DbId,
    /// Human-readable code, generated once at creation.
    pub instance_code: String,
    pub form_data: Json<Map<String, Value>>,
    pub calculated_fields: Json<Map<String, Value>>,
    pub status: String,
    pub workflow_state: Option<String>,
    pub workflow_history: Json<Vec<WorkflowHistoryEntry>>,
    /// 1-indexed, bounded by the template's step count.
    pub current_step: i32,
    pub completion_percentage: f64,
    pub validation_results: Option<Value>,
    pub compliance_results: Option<Value>,
    pub submitted_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl FormInstance {
    /// Parse the stored status string.
    pub fn status(&self) -> Result<InstanceStatus, CoreError> {
        InstanceStatus::from_str_db(&self.status)
    }
}

/// DTO for creating a new instance.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFormInstance {
    pub template_id: DbId,
    /// Pre-generated instance code; the repository never invents one.
    pub instance_code: String,
    pub form_data: Option<Map<String, Value>>,
}

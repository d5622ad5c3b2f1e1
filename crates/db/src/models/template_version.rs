//! Template version snapshot model and DTOs.
//!
//! Rows are append-only: a snapshot is never mutated after creation.

use scholaris_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `form_template_versions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TemplateVersion {
    pub id: DbId,
    pub template_id: DbId,
    /// Dotted `major.minor` version string, unique per template.
    pub version_number: String,
    pub changes_summary: Option<String>,
    /// Full template row captured as JSON at snapshot time.
    pub template_data: serde_json::Value,
    pub created_by: DbId,
    pub created_at: Timestamp,
}

/// Input for creating a new version snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTemplateVersion {
    pub template_id: DbId,
    pub changes_summary: Option<String>,
    pub created_by: DbId,
}

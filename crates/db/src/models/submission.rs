//! Submission snapshot model and DTOs.
//!
//! Rows are append-only snapshots of an instance's data at save/submit
//! time, chained by integrity hash.

use scholaris_core::error::CoreError;
use scholaris_core::submission::SubmissionType;
use scholaris_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `form_submissions` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Submission {
    pub id: DbId,
    pub instance_id: DbId,
    pub submitted_by: DbId,
    pub submission_data: Json<Map<String, Value>>,
    pub attachments: Json<Vec<String>>,
    pub notes: Option<String>,
    pub submission_type: String,
    /// SHA-256 chain hash over the serialized snapshot.
    pub integrity_hash: String,
    pub created_at: Timestamp,
}

impl Submission {
    /// Parse the stored submission type string.
    pub fn submission_type(&self) -> Result<SubmissionType, CoreError> {
        SubmissionType::from_str_db(&self.submission_type)
    }
}

/// Input for creating a submission snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateSubmission {
    pub instance_id: DbId,
    pub submitted_by: DbId,
    pub submission_data: Map<String, Value>,
    pub attachments: Vec<String>,
    pub notes: Option<String>,
    pub submission_type: SubmissionType,
    pub integrity_hash: String,
}

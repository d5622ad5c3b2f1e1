//! Form instance lifecycle: status machine, transition guards, step
//! navigation, instance codes, and the workflow history audit trail.

use chrono::Utc;
use rand::Rng;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::context::RequestContext;
use crate::error::CoreError;
use crate::permissions::has_elevated_form_access;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Lifecycle status of a form instance.
///
/// draft -> in_progress -> submitted -> under_review -> approved|rejected
/// -> completed. `completed` and `rejected` are terminal for workflow
/// purposes; a rejected instance stays owner-editable so its data can be
/// salvaged into a fresh draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstanceStatus {
    Draft,
    InProgress,
    Submitted,
    UnderReview,
    Approved,
    Rejected,
    Completed,
}

impl InstanceStatus {
    /// Parse a status string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "draft" => Ok(Self::Draft),
            "in_progress" => Ok(Self::InProgress),
            "submitted" => Ok(Self::Submitted),
            "under_review" => Ok(Self::UnderReview),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "completed" => Ok(Self::Completed),
            _ => Err(CoreError::Validation(format!(
                "Invalid instance status '{s}'. Must be one of: draft, in_progress, \
                 submitted, under_review, approved, rejected, completed"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::InProgress => "in_progress",
            Self::Submitted => "submitted",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Completed => "completed",
        }
    }

    pub fn is_draft(&self) -> bool {
        matches!(self, Self::Draft)
    }

    /// True once the instance has entered the review pipeline.
    pub fn is_submitted(&self) -> bool {
        matches!(
            self,
            Self::Submitted | Self::UnderReview | Self::Approved | Self::Completed
        )
    }

    /// True once the instance has passed review.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Approved | Self::Completed)
    }
}

// ---------------------------------------------------------------------------
// Transition guards
// ---------------------------------------------------------------------------

/// Guard for submitting an instance. Re-submitting an instance that is
/// already in (or past) review fails explicitly, never silently.
pub fn can_submit(status: InstanceStatus) -> Result<(), CoreError> {
    match status {
        InstanceStatus::Draft | InstanceStatus::InProgress => Ok(()),
        other => Err(CoreError::Transition(format!(
            "Cannot submit an instance with status '{}'. Only draft or in_progress \
             instances can be submitted.",
            other.as_str()
        ))),
    }
}

/// Guard for moving a submitted instance into review.
pub fn can_start_review(status: InstanceStatus) -> Result<(), CoreError> {
    match status {
        InstanceStatus::Submitted => Ok(()),
        other => Err(CoreError::Transition(format!(
            "Cannot start review on an instance with status '{}'. Only submitted \
             instances can enter review.",
            other.as_str()
        ))),
    }
}

/// Guard for approving an instance. Double-approval fails explicitly.
pub fn can_approve(status: InstanceStatus) -> Result<(), CoreError> {
    match status {
        InstanceStatus::Submitted | InstanceStatus::UnderReview => Ok(()),
        other => Err(CoreError::Transition(format!(
            "Cannot approve an instance with status '{}'. Only submitted or \
             under_review instances can be approved.",
            other.as_str()
        ))),
    }
}

/// Guard for rejecting an instance.
pub fn can_reject(status: InstanceStatus) -> Result<(), CoreError> {
    match status {
        InstanceStatus::Submitted | InstanceStatus::UnderReview => Ok(()),
        other => Err(CoreError::Transition(format!(
            "Cannot reject an instance with status '{}'. Only submitted or \
             under_review instances can be rejected.",
            other.as_str()
        ))),
    }
}

/// Editability check.
///
/// The owner can edit while the instance has not passed review. Anyone
/// else needs the elevated `forms.edit` / `forms.admin` permission.
pub fn can_be_edited_by(
    owner_user_id: DbId,
    status: InstanceStatus,
    ctx: &RequestContext,
    permissions: &[String],
) -> bool {
    if ctx.user_id == owner_user_id {
        !status.is_completed()
    } else {
        has_elevated_form_access(permissions)
    }
}

// ---------------------------------------------------------------------------
// Step navigation
// ---------------------------------------------------------------------------

/// Next step number, or `None` at the last step. Steps are 1-indexed.
pub fn next_step(current: i32, total_steps: i32) -> Option<i32> {
    if current >= 1 && current < total_steps {
        Some(current + 1)
    } else {
        None
    }
}

/// Previous step number, or `None` at the first step.
pub fn previous_step(current: i32) -> Option<i32> {
    if current > 1 {
        Some(current - 1)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Instance codes
// ---------------------------------------------------------------------------

/// Length of the random suffix in an instance code.
pub const INSTANCE_CODE_SUFFIX_LEN: usize = 4;

const CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Derive the 3-letter code prefix from a template category.
///
/// Takes the first three ASCII letters, uppercased, padded with `X` for
/// short categories.
pub fn category_prefix(category: &str) -> String {
    let mut prefix: String = category
        .chars()
        .filter(char::is_ascii_alphabetic)
        .take(3)
        .collect::<String>()
        .to_uppercase();
    while prefix.len() < 3 {
        prefix.push('X');
    }
    prefix
}

/// Generate a human-readable instance code.
///
/// Format: `{3-letter category prefix}-{YYMMDD}-{4 random uppercase
/// alphanumerics}`, e.g. `LIB-260807-K3QX`. Generated exactly once at
/// instance creation and never regenerated afterwards.
pub fn generate_instance_code(category: &str, now: Timestamp) -> String {
    let mut rng = rand::rng();
    let suffix: String = (0..INSTANCE_CODE_SUFFIX_LEN)
        .map(|_| CODE_CHARSET[rng.random_range(0..CODE_CHARSET.len())] as char)
        .collect();
    format!("{}-{}-{}", category_prefix(category), now.format("%y%m%d"), suffix)
}

/// Check a code against the canonical format.
pub fn is_valid_instance_code(code: &str) -> bool {
    match Regex::new(r"^[A-Z]{3}-\d{6}-[A-Z0-9]{4}$") {
        Ok(re) => re.is_match(code),
        Err(_) => false,
    }
}

// ---------------------------------------------------------------------------
// Workflow history
// ---------------------------------------------------------------------------

/// Known workflow history actions.
pub mod workflow_actions {
    pub const CREATED: &str = "created";
    pub const SUBMITTED: &str = "submitted";
    pub const REVIEW_STARTED: &str = "review_started";
    pub const APPROVED: &str = "approved";
    pub const REJECTED: &str = "rejected";
}

/// One append-only entry in an instance's workflow audit trail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowHistoryEntry {
    pub action: String,
    pub user_id: DbId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub timestamp: Timestamp,
}

impl WorkflowHistoryEntry {
    fn new(action: &str, user_id: DbId) -> Self {
        Self {
            action: action.to_string(),
            user_id,
            notes: None,
            reason: None,
            timestamp: Utc::now(),
        }
    }

    pub fn created(user_id: DbId) -> Self {
        Self::new(workflow_actions::CREATED, user_id)
    }

    pub fn submitted(user_id: DbId) -> Self {
        Self::new(workflow_actions::SUBMITTED, user_id)
    }

    pub fn review_started(user_id: DbId) -> Self {
        Self::new(workflow_actions::REVIEW_STARTED, user_id)
    }

    pub fn approved(user_id: DbId, notes: Option<String>) -> Self {
        Self {
            notes,
            ..Self::new(workflow_actions::APPROVED, user_id)
        }
    }

    pub fn rejected(user_id: DbId, reason: String) -> Self {
        Self {
            reason: Some(reason),
            ..Self::new(workflow_actions::REJECTED, user_id)
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

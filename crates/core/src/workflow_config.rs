//! Approval workflow configuration attached to a template.
//!
//! Parsed once into explicit structs at save time; the engine never
//! interprets raw JSON workflow settings at read time.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Workflow settings for a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfiguration {
    #[serde(default)]
    pub steps: Vec<WorkflowStepConfig>,
}

/// One approval step in a template's workflow.
///
/// At least one of `required_roles` / `required_permissions` must be
/// non-empty for the step to be actionable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowStepConfig {
    pub step_name: String,
    #[serde(default)]
    pub required_roles: BTreeSet<String>,
    #[serde(default)]
    pub required_permissions: BTreeSet<String>,
}

/// Validate a template's workflow configuration.
///
/// All issues are collected as strings and never thrown; a template without
/// a usable workflow can still be saved, it just cannot route approvals.
pub fn validate_workflow_configuration(config: Option<&WorkflowConfiguration>) -> Vec<String> {
    let Some(config) = config else {
        return vec!["Template has no workflow configuration".to_string()];
    };

    let mut issues = Vec::new();
    if config.steps.is_empty() {
        issues.push("Workflow configuration has no steps".to_string());
    }

    for (index, step) in config.steps.iter().enumerate() {
        if step.step_name.trim().is_empty() {
            issues.push(format!("Workflow step {} is missing step_name", index + 1));
        }
        if step.required_roles.is_empty() && step.required_permissions.is_empty() {
            let name = if step.step_name.trim().is_empty() {
                format!("step {}", index + 1)
            } else {
                step.step_name.clone()
            };
            issues.push(format!(
                "Workflow step '{name}' must define required_roles or required_permissions"
            ));
        }
    }

    issues
}

//! Structural linter for template schemas.
//!
//! Validates the schema itself, independent of any instance data. All
//! findings are collected as human-readable strings and never thrown, so a
//! template can be saved in a rough state and cleaned up iteratively.

use std::collections::HashMap;

use crate::template::{is_registered_field_type, FormStep};

/// Lint a template schema.
///
/// Checks, per level:
/// - step: non-empty `step_id` and `step_title`
/// - section: non-empty `section_id`, `section_title`, and a non-empty
///   fields list
/// - field: non-empty `field_id` and `label`, and a `field_type` present in
///   the configured registry
///
/// Field ids must be unique across the whole template; duplicates are
/// reported here rather than rejected at traversal time.
pub fn lint_template(steps: &[FormStep]) -> Vec<String> {
    let mut issues = Vec::new();
    let mut seen_fields: HashMap<&str, &str> = HashMap::new();

    for (step_index, step) in steps.iter().enumerate() {
        let step_label = if step.step_id.trim().is_empty() {
            issues.push(format!("Step {} is missing step_id", step_index + 1));
            format!("step {}", step_index + 1)
        } else {
            step.step_id.clone()
        };
        if step.step_title.trim().is_empty() {
            issues.push(format!("Step '{step_label}' is missing step_title"));
        }

        for (section_index, section) in step.sections.iter().enumerate() {
            let section_label = if section.section_id.trim().is_empty() {
                issues.push(format!(
                    "Section {} in step '{step_label}' is missing section_id",
                    section_index + 1
                ));
                format!("section {}", section_index + 1)
            } else {
                section.section_id.clone()
            };
            if section.section_title.trim().is_empty() {
                issues.push(format!(
                    "Section '{section_label}' in step '{step_label}' is missing section_title"
                ));
            }
            if section.fields.is_empty() {
                issues.push(format!(
                    "Section '{section_label}' in step '{step_label}' has no fields"
                ));
            }

            for field in &section.fields {
                if field.field_id.trim().is_empty() {
                    issues.push(format!(
                        "A field in section '{section_label}' is missing field_id"
                    ));
                    continue;
                }
                if field.label.trim().is_empty() {
                    issues.push(format!("Field '{}' is missing label", field.field_id));
                }
                if field.field_type.trim().is_empty() {
                    issues.push(format!("Field '{}' is missing field_type", field.field_id));
                } else if !is_registered_field_type(&field.field_type) {
                    issues.push(format!(
                        "Field '{}' has unknown field_type '{}'",
                        field.field_id, field.field_type
                    ));
                }
                if let Some(first_step) = seen_fields.get(field.field_id.as_str()) {
                    issues.push(format!(
                        "Duplicate field_id '{}' (first defined in step '{first_step}')",
                        field.field_id
                    ));
                } else {
                    seen_fields.insert(&field.field_id, &step.step_id);
                }
            }
        }
    }

    issues
}

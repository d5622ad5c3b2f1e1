//! Shared fixtures for engine integration tests.
//!
//! Not every test binary uses every helper.
#![allow(dead_code)]

use scholaris_core::context::RequestContext;
use scholaris_core::template::{FieldRule, FormField, FormSection, FormStep};
use scholaris_db::models::template::CreateTemplate;
use serde_json::{json, Map, Value};

pub const TENANT: i64 = 1;
pub const OWNER: i64 = 10;
pub const REVIEWER: i64 = 30;

pub fn owner_ctx() -> RequestContext {
    RequestContext::new(TENANT, OWNER)
}

pub fn reviewer_ctx() -> RequestContext {
    RequestContext::new(TENANT, REVIEWER)
}

pub fn field(field_id: &str, required: bool) -> FormField {
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

pub fn field_with_rule(field_id: &str, rule_type: &str, value: Value) -> FormField {
    let mut f = field(field_id, false);
    f.validation_rules.push(FieldRule {
        rule_type: rule_type.to_string(),
        value: Some(value),
        message: format!("{field_id}: {rule_type} failed"),
    });
    f
}

/// Three steps with one section each; the first step carries the two
/// required fields.
pub fn three_step_schema() -> Vec<FormStep> {
    let mut steps: Vec<FormStep> = (1..=3)
        .map(|n| FormStep {
            step_id: format!("step_{n}"),
            step_title: format!("Step {n}"),
            sections: vec![FormSection {
                section_id: format!("sec_{n}"),
                section_title: format!("Section {n}"),
                fields: vec![field(&format!("optional_{n}"), false)],
            }],
        })
        .collect();
    steps[0].sections[0].fields = vec![
        field("student_name", true),
        field("grade", true),
        field_with_rule("contact_email", "email", json!(null)),
    ];
    steps
}

pub fn enrollment_template() -> CreateTemplate {
    CreateTemplate {
        name: "Enrollment".to_string(),
        category: "enrollment".to_string(),
        methodology_type: None,
        steps: three_step_schema(),
        workflow_configuration: None,
        is_default: None,
    }
}

pub fn values(pairs: &[(&str, Value)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

//! Form template schema types and traversal.
//!
//! A template is an ordered hierarchy of steps, sections, and fields.
//! Traversal helpers operate on the owned `Vec<FormStep>` body so they can
//! be used against a loaded database row or a freshly built schema alike.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Methodology key meaning "applies under every methodology".
pub const METHODOLOGY_UNIVERSAL: &str = "universal";

/// Field types accepted by the structural linter.
///
/// Adding a new renderer-side field type requires registering it here so
/// templates referencing it pass linting.
pub const FIELD_TYPE_REGISTRY: &[&str] = &[
    "text",
    "textarea",
    "number",
    "date",
    "select",
    "multi_select",
    "checkbox",
    "radio",
    "email",
    "phone",
    "file",
    "signature",
    "rating",
];

/// Check a field type against the registry.
pub fn is_registered_field_type(field_type: &str) -> bool {
    FIELD_TYPE_REGISTRY.contains(&field_type)
}

// ---------------------------------------------------------------------------
// Field-level rule types
// ---------------------------------------------------------------------------

/// A declarative validation rule attached to a field.
///
/// `value` carries the rule's bound where one applies (length limits,
/// numeric bounds, regex pattern, allowed options).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldRule {
    pub rule_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    pub message: String,
}

/// Comparison operator in a conditional-logic entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    GreaterOrEqual,
    LessOrEqual,
    Contains,
}

/// Effect a conditional rule applies to its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionAction {
    Show,
    Hide,
    Require,
}

/// Makes a field's visibility or requiredness depend on another field's
/// current value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionalRule {
    /// `field_id` of the field whose value drives the condition.
    pub field: String,
    pub operator: ConditionOperator,
    pub value: serde_json::Value,
    pub action: ConditionAction,
}

// ---------------------------------------------------------------------------
// Schema hierarchy
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    pub field_id: String,
    pub field_type: String,
    pub label: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub validation_rules: Vec<FieldRule>,
    #[serde(default)]
    pub conditional_logic: Vec<ConditionalRule>,
    /// Allowed choices for select/radio/multi_select fields.
    #[serde(default)]
    pub options: Vec<String>,
    /// Type-specific settings (placeholder, rows, max rating, ...).
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormSection {
    pub section_id: String,
    pub section_title: String,
    #[serde(default)]
    pub fields: Vec<FormField>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormStep {
    pub step_id: String,
    pub step_title: String,
    #[serde(default)]
    pub sections: Vec<FormSection>,
}

// ---------------------------------------------------------------------------
// Traversal
// ---------------------------------------------------------------------------

/// Depth-first search steps -> sections -> fields; first match wins.
pub fn field_by_id<'a>(steps: &'a [FormStep], field_id: &str) -> Option<&'a FormField> {
    steps
        .iter()
        .flat_map(|step| &step.sections)
        .flat_map(|section| &section.fields)
        .find(|field| field.field_id == field_id)
}

/// Flatten a schema to a field_id-keyed map.
///
/// When the same field_id appears more than once, the last occurrence in
/// document order wins. Duplicates are a linting issue, not a hard error.
pub fn all_fields(steps: &[FormStep]) -> HashMap<String, &FormField> {
    let mut map = HashMap::new();
    for field in steps
        .iter()
        .flat_map(|step| &step.sections)
        .flat_map(|section| &section.fields)
    {
        map.insert(field.field_id.clone(), field);
    }
    map
}

/// Iterate every field in document order.
pub fn iter_fields(steps: &[FormStep]) -> impl Iterator<Item = &FormField> {
    steps
        .iter()
        .flat_map(|step| &step.sections)
        .flat_map(|section| &section.fields)
}

/// True when a template with the given methodology_type can be used for
/// the requested methodology.
pub fn is_compatible_with(methodology_type: &str, methodology: &str) -> bool {
    methodology_type == METHODOLOGY_UNIVERSAL || methodology_type == methodology
}

/// Default name for a duplicated template when no override is given.
pub fn duplicate_name(original: &str) -> String {
    format!("{original} (Copy)")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

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

    fn schema(fields_per_section: Vec<Vec<FormField>>) -> Vec<FormStep> {
        vec![FormStep {
            step_id: "step_1".to_string(),
            step_title: "Step 1".to_string(),
            sections: fields_per_section
                .into_iter()
                .enumerate()
                .map(|(i, fields)| FormSection {
                    section_id: format!("sec_{i}"),
                    section_title: format!("Section {i}"),
                    fields,
                })
                .collect(),
        }]
    }

    #[test]
    fn field_by_id_finds_first_match() {
        let mut a = field("dup", false);
        a.label = "first".to_string();
        let mut b = field("dup", false);
        b.label = "second".to_string();
        let steps = schema(vec![vec![a], vec![b]]);

        let found = field_by_id(&steps, "dup").unwrap();
        assert_eq!(found.label, "first");
    }

    #[test]
    fn field_by_id_missing_returns_none() {
        let steps = schema(vec![vec![field("a", false)]]);
        assert!(field_by_id(&steps, "missing").is_none());
    }

    #[test]
    fn all_fields_last_occurrence_wins() {
        let mut a = field("dup", false);
        a.label = "first".to_string();
        let mut b = field("dup", false);
        b.label = "second".to_string();
        let steps = schema(vec![vec![a, field("other", true)], vec![b]]);

        let fields = all_fields(&steps);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields["dup"].label, "second");
        assert!(fields.contains_key("other"));
    }

    #[test]
    fn all_fields_empty_schema() {
        assert!(all_fields(&[]).is_empty());
    }

    #[test]
    fn universal_is_compatible_with_everything() {
        assert!(is_compatible_with(METHODOLOGY_UNIVERSAL, "usaid"));
        assert!(is_compatible_with(METHODOLOGY_UNIVERSAL, "world_bank"));
    }

    #[test]
    fn specific_methodology_only_matches_itself() {
        assert!(is_compatible_with("usaid", "usaid"));
        assert!(!is_compatible_with("usaid", "world_bank"));
    }

    #[test]
    fn duplicate_name_appends_copy_suffix() {
        assert_eq!(duplicate_name("Field Visit Report"), "Field Visit Report (Copy)");
    }

    #[test]
    fn registry_contains_common_field_types() {
        assert!(is_registered_field_type("text"));
        assert!(is_registered_field_type("select"));
        assert!(!is_registered_field_type("hologram"));
    }

    #[test]
    fn field_deserializes_with_defaults() {
        let raw = json!({
            "field_id": "student_name",
            "field_type": "text",
            "label": "Student name"
        });
        let parsed: FormField = serde_json::from_value(raw).unwrap();
        assert!(!parsed.required);
        assert!(parsed.validation_rules.is_empty());
        assert!(parsed.conditional_logic.is_empty());
        assert!(parsed.options.is_empty());
    }
}

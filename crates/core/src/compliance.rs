//! Methodology compliance checks.
//!
//! A methodology (donor or reporting framework such as "usaid" or
//! "world_bank") can impose required fields on any template claiming it.
//! The required-field lists are configured externally and loaded into a
//! [`MethodologyRegistry`] at startup.

use std::collections::HashMap;

use crate::error::CoreError;
use crate::template::{all_fields, FormStep, METHODOLOGY_UNIVERSAL};

/// Externally configured required fields per methodology.
#[derive(Debug, Clone, Default)]
pub struct MethodologyRegistry {
    required_fields: HashMap<String, Vec<String>>,
}

impl MethodologyRegistry {
    /// An empty registry: every template is compliant.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from a JSON object mapping methodology keys to
    /// arrays of required field ids:
    ///
    /// ```json
    /// { "usaid": ["environmental_screening"], "world_bank": ["safeguards_plan"] }
    /// ```
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CoreError> {
        let obj = value.as_object().ok_or_else(|| {
            CoreError::Validation(
                "Methodology config must be a JSON object of field-id arrays".to_string(),
            )
        })?;

        let mut required_fields = HashMap::new();
        for (methodology, fields) in obj {
            let fields = fields.as_array().ok_or_else(|| {
                CoreError::Validation(format!(
                    "Methodology '{methodology}' config must be an array of field ids"
                ))
            })?;
            let ids: Vec<String> = fields
                .iter()
                .filter_map(|f| f.as_str().map(str::to_string))
                .collect();
            required_fields.insert(methodology.clone(), ids);
        }
        Ok(Self { required_fields })
    }

    /// Register or replace the required fields for a methodology.
    pub fn set_required_fields(&mut self, methodology: impl Into<String>, fields: Vec<String>) {
        self.required_fields.insert(methodology.into(), fields);
    }

    /// Required field ids for a methodology; empty when none configured.
    pub fn required_fields(&self, methodology: &str) -> &[String] {
        self.required_fields
            .get(methodology)
            .map_or(&[], Vec::as_slice)
    }
}

/// Check a template's field set against its methodology's required fields.
///
/// Returns one issue string per missing field. Universal templates and
/// methodologies without configured requirements always pass.
pub fn validate_compliance(
    methodology_type: &str,
    steps: &[FormStep],
    registry: &MethodologyRegistry,
) -> Vec<String> {
    if methodology_type == METHODOLOGY_UNIVERSAL {
        return Vec::new();
    }

    let present = all_fields(steps);
    registry
        .required_fields(methodology_type)
        .iter()
        .filter(|field| !present.contains_key(*field))
        .map(|field| {
            format!("Missing required field for {methodology_type} methodology: {field}")
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{FormField, FormSection, FormStep};
    use serde_json::json;

    fn schema(field_ids: &[&str]) -> Vec<FormStep> {
        vec![FormStep {
            step_id: "s1".to_string(),
            step_title: "S1".to_string(),
            sections: vec![FormSection {
                section_id: "sec".to_string(),
                section_title: "Sec".to_string(),
                fields: field_ids
                    .iter()
                    .map(|id| FormField {
                        field_id: id.to_string(),
                        field_type: "text".to_string(),
                        label: id.to_string(),
                        required: false,
                        validation_rules: Vec::new(),
                        conditional_logic: Vec::new(),
                        options: Vec::new(),
                        properties: serde_json::Map::new(),
                    })
                    .collect(),
            }],
        }]
    }

    fn registry() -> MethodologyRegistry {
        let mut r = MethodologyRegistry::new();
        r.set_required_fields("usaid", vec!["environmental_screening".to_string()]);
        r.set_required_fields("world_bank", vec!["safeguards_plan".to_string()]);
        r
    }

    #[test]
    fn universal_templates_always_pass() {
        let issues = validate_compliance("universal", &schema(&[]), &registry());
        assert!(issues.is_empty());
    }

    #[test]
    fn missing_required_field_reported() {
        let issues = validate_compliance("world_bank", &schema(&["other"]), &registry());
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("safeguards_plan"));
        assert!(issues[0].contains("world_bank"));
    }

    #[test]
    fn usaid_scenario() {
        let issues = validate_compliance("usaid", &schema(&["budget"]), &registry());
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("environmental_screening"));
    }

    #[test]
    fn present_field_passes() {
        let issues =
            validate_compliance("usaid", &schema(&["environmental_screening"]), &registry());
        assert!(issues.is_empty());
    }

    #[test]
    fn unconfigured_methodology_passes() {
        let issues = validate_compliance("unicef", &schema(&[]), &registry());
        assert!(issues.is_empty());
    }

    #[test]
    fn from_json_builds_registry() {
        let r = MethodologyRegistry::from_json(&json!({
            "usaid": ["environmental_screening", "budget_narrative"],
        }))
        .unwrap();
        assert_eq!(r.required_fields("usaid").len(), 2);
        assert!(r.required_fields("world_bank").is_empty());
    }

    #[test]
    fn from_json_rejects_non_object() {
        assert!(MethodologyRegistry::from_json(&json!(["usaid"])).is_err());
    }

    #[test]
    fn from_json_rejects_non_array_entry() {
        assert!(MethodologyRegistry::from_json(&json!({"usaid": "nope"})).is_err());
    }
}

//! Instance completion percentage.

use serde_json::{Map, Value};

use crate::template::FormStep;
use crate::validation::rules::is_empty_value;

/// Compute the completion percentage for an instance.
///
/// Counts fields flagged `required: true` across the whole schema and the
/// subset of those with a non-empty value in `form_data`. The count is
/// static: conditionally hidden required fields still count toward the
/// total. Returns 0.0 when the schema has no required fields, otherwise a
/// value in [0.0, 100.0] rounded to two decimals.
pub fn completion_percentage(steps: &[FormStep], form_data: &Map<String, Value>) -> f64 {
    let mut total = 0u32;
    let mut completed = 0u32;

    for field in crate::template::iter_fields(steps) {
        if !field.required {
            continue;
        }
        total += 1;
        if !is_empty_value(form_data.get(&field.field_id)) {
            completed += 1;
        }
    }

    if total == 0 {
        return 0.0;
    }
    let percentage = f64::from(completed) / f64::from(total) * 100.0;
    (percentage * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{FormField, FormSection, FormStep};
    use serde_json::json;

    fn schema(required_ids: &[&str], optional_ids: &[&str]) -> Vec<FormStep> {
        let mut fields = Vec::new();
        for id in required_ids {
            fields.push(field(id, true));
        }
        for id in optional_ids {
            fields.push(field(id, false));
        }
        vec![FormStep {
            step_id: "s1".to_string(),
            step_title: "S1".to_string(),
            sections: vec![FormSection {
                section_id: "sec".to_string(),
                section_title: "Sec".to_string(),
                fields,
            }],
        }]
    }

    fn field(id: &str, required: bool) -> FormField {
        FormField {
            field_id: id.to_string(),
            field_type: "text".to_string(),
            label: id.to_string(),
            required,
            validation_rules: Vec::new(),
            conditional_logic: Vec::new(),
            options: Vec::new(),
            properties: serde_json::Map::new(),
        }
    }

    fn data(pairs: &[(&str, serde_json::Value)]) -> Map<String, serde_json::Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn no_required_fields_yields_zero() {
        let steps = schema(&[], &["comments"]);
        assert_eq!(
            completion_percentage(&steps, &data(&[("comments", json!("hi"))])),
            0.0
        );
    }

    #[test]
    fn half_filled_yields_fifty() {
        let steps = schema(&["a", "b"], &[]);
        assert_eq!(
            completion_percentage(&steps, &data(&[("a", json!("filled"))])),
            50.0
        );
    }

    #[test]
    fn all_filled_yields_hundred() {
        let steps = schema(&["a", "b"], &[]);
        let d = data(&[("a", json!("x")), ("b", json!(3))]);
        assert_eq!(completion_percentage(&steps, &d), 100.0);
    }

    #[test]
    fn optional_fields_do_not_count() {
        let steps = schema(&["a"], &["note"]);
        let d = data(&[("note", json!("ignored"))]);
        assert_eq!(completion_percentage(&steps, &d), 0.0);
    }

    #[test]
    fn empty_values_do_not_count_as_filled() {
        let steps = schema(&["a", "b"], &[]);
        let d = data(&[("a", json!("")), ("b", json!(null))]);
        assert_eq!(completion_percentage(&steps, &d), 0.0);
    }

    #[test]
    fn rounds_to_two_decimals() {
        let steps = schema(&["a", "b", "c"], &[]);
        let d = data(&[("a", json!("x"))]);
        assert_eq!(completion_percentage(&steps, &d), 33.33);
    }
}

//! Field rule evaluator — pure logic, no database access.
//!
//! Evaluates every rule attached to a field against the instance's current
//! form data. All rules are checked (no fail-fast) so callers receive the
//! complete violation list in a single pass.

use regex::Regex;
use serde_json::{Map, Value};
use validator::ValidateEmail;

use crate::template::{FieldRule, FormField, FormStep};
use crate::validation::conditional::resolve_field_state;
use crate::validation::rules::{is_empty_value, rule_types, FieldViolation};

/// Validate one field against the current form data.
///
/// Conditional logic is resolved first: hidden fields are skipped entirely,
/// and a conditional `require` action participates in the requiredness
/// check. Requiredness from the static flag is enforced implicitly unless
/// the field carries an explicit `required` rule, which takes over with its
/// own message.
pub fn validate_field(field: &FormField, form_data: &Map<String, Value>) -> Vec<FieldViolation> {
    let state = resolve_field_state(field, form_data);
    if !state.visible {
        return Vec::new();
    }

    let value = form_data.get(&field.field_id);
    let mut violations = Vec::new();

    let has_required_rule = field
        .validation_rules
        .iter()
        .any(|r| r.rule_type == rule_types::REQUIRED);
    if state.required && !has_required_rule && is_empty_value(value) {
        violations.push(FieldViolation {
            field_id: field.field_id.clone(),
            rule_type: rule_types::REQUIRED.to_string(),
            message: format!("{} is required", field.label),
        });
    }

    for rule in &field.validation_rules {
        if let Some(violation) = evaluate_rule(field, rule, value) {
            violations.push(violation);
        }
    }

    violations
}

/// Validate every field in a schema, collecting all violations.
pub fn validate_fields(
    steps: &[FormStep],
    form_data: &Map<String, Value>,
) -> Vec<FieldViolation> {
    crate::template::iter_fields(steps)
        .flat_map(|field| validate_field(field, form_data))
        .collect()
}

fn evaluate_rule(
    field: &FormField,
    rule: &FieldRule,
    value: Option<&Value>,
) -> Option<FieldViolation> {
    let violated = match rule.rule_type.as_str() {
        rule_types::REQUIRED => is_empty_value(value),
        rule_types::MIN_LENGTH => check_min_length(rule, value),
        rule_types::MAX_LENGTH => check_max_length(rule, value),
        rule_types::PATTERN => check_pattern(rule, value),
        rule_types::MIN_VALUE => check_min_value(rule, value),
        rule_types::MAX_VALUE => check_max_value(rule, value),
        rule_types::EMAIL => check_email(value),
        rule_types::OPTIONS => check_options(field, rule, value),
        // Unknown rule types silently pass
        _ => false,
    };

    violated.then(|| FieldViolation {
        field_id: field.field_id.clone(),
        rule_type: rule.rule_type.clone(),
        message: rule.message.clone(),
    })
}

fn check_min_length(rule: &FieldRule, value: Option<&Value>) -> bool {
    let Some(s) = value.and_then(|v| v.as_str()) else {
        return false;
    };
    let min = rule
        .value
        .as_ref()
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as usize;
    s.chars().count() < min
}

fn check_max_length(rule: &FieldRule, value: Option<&Value>) -> bool {
    let Some(s) = value.and_then(|v| v.as_str()) else {
        return false;
    };
    let max = rule
        .value
        .as_ref()
        .and_then(|v| v.as_u64())
        .unwrap_or(u64::MAX) as usize;
    s.chars().count() > max
}

fn check_pattern(rule: &FieldRule, value: Option<&Value>) -> bool {
    let Some(s) = value.and_then(|v| v.as_str()) else {
        return false;
    };
    let Some(pattern) = rule.value.as_ref().and_then(|v| v.as_str()) else {
        return false;
    };
    match Regex::new(pattern) {
        Ok(re) => !re.is_match(s),
        // Invalid patterns silently pass
        Err(_) => false,
    }
}

fn check_min_value(rule: &FieldRule, value: Option<&Value>) -> bool {
    let Some(num) = value.and_then(|v| v.as_f64()) else {
        return false;
    };
    let min = rule
        .value
        .as_ref()
        .and_then(|v| v.as_f64())
        .unwrap_or(f64::NEG_INFINITY);
    num < min
}

fn check_max_value(rule: &FieldRule, value: Option<&Value>) -> bool {
    let Some(num) = value.and_then(|v| v.as_f64()) else {
        return false;
    };
    let max = rule
        .value
        .as_ref()
        .and_then(|v| v.as_f64())
        .unwrap_or(f64::INFINITY);
    num > max
}

fn check_email(value: Option<&Value>) -> bool {
    let Some(s) = value.and_then(|v| v.as_str()) else {
        return false;
    };
    !s.is_empty() && !s.validate_email()
}

/// Allowed values come from the rule's own list when present, otherwise
/// from the field's `options`. Array values (multi_select) require every
/// element to be allowed.
fn check_options(field: &FormField, rule: &FieldRule, value: Option<&Value>) -> bool {
    let value = match value {
        Some(v) if !v.is_null() => v,
        _ => return false,
    };

    let rule_allowed: Option<Vec<String>> = rule.value.as_ref().and_then(|v| {
        v.as_array().map(|items| {
            items
                .iter()
                .filter_map(|i| i.as_str().map(str::to_string))
                .collect()
        })
    });
    let allowed: &[String] = rule_allowed.as_deref().unwrap_or(&field.options);
    if allowed.is_empty() {
        return false;
    }

    let is_allowed = |v: &Value| v.as_str().is_some_and(|s| allowed.iter().any(|a| a == s));
    match value {
        Value::Array(items) => !items.iter().all(is_allowed),
        other => !is_allowed(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::{ConditionAction, ConditionOperator, ConditionalRule};
    use serde_json::json;

    fn field(field_id: &str, required: bool, rules: Vec<FieldRule>) -> FormField {
        FormField {
            field_id: field_id.to_string(),
            field_type: "text".to_string(),
            label: field_id.to_string(),
            required,
            validation_rules: rules,
            conditional_logic: Vec::new(),
            options: Vec::new(),
            properties: serde_json::Map::new(),
        }
    }

    fn rule(rule_type: &str, value: Option<Value>) -> FieldRule {
        FieldRule {
            rule_type: rule_type.to_string(),
            value,
            message: format!("{rule_type} failed"),
        }
    }

    fn data(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn required_flag_reports_missing_value() {
        let f = field("student_name", true, vec![]);
        let violations = validate_field(&f, &data(&[]));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule_type, "required");
        assert!(violations[0].message.contains("student_name"));
    }

    #[test]
    fn explicit_required_rule_replaces_implicit_check() {
        let f = field(
            "student_name",
            true,
            vec![rule("required", None)],
        );
        let violations = validate_field(&f, &data(&[]));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].message, "required failed");
    }

    #[test]
    fn all_rules_evaluated_no_fail_fast() {
        let f = field(
            "code",
            false,
            vec![
                rule("min_length", Some(json!(10))),
                rule("pattern", Some(json!("^[0-9]+$"))),
            ],
        );
        let violations = validate_field(&f, &data(&[("code", json!("abc"))]));
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].rule_type, "min_length");
        assert_eq!(violations[1].rule_type, "pattern");
    }

    #[test]
    fn hidden_field_skips_all_rules() {
        let mut f = field("guardian_phone", true, vec![rule("min_length", Some(json!(8)))]);
        f.conditional_logic.push(ConditionalRule {
            field: "has_guardian".to_string(),
            operator: ConditionOperator::Equals,
            value: json!(true),
            action: ConditionAction::Show,
        });
        let violations = validate_field(&f, &data(&[("has_guardian", json!(false))]));
        assert!(violations.is_empty());
    }

    #[test]
    fn conditional_require_enforced() {
        let mut f = field("guardian_phone", false, vec![]);
        f.conditional_logic.push(ConditionalRule {
            field: "age".to_string(),
            operator: ConditionOperator::LessThan,
            value: json!(18),
            action: ConditionAction::Require,
        });
        let violations = validate_field(&f, &data(&[("age", json!(12))]));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].rule_type, "required");
    }

    #[test]
    fn min_and_max_length() {
        let f = field(
            "nick",
            false,
            vec![
                rule("min_length", Some(json!(2))),
                rule("max_length", Some(json!(4))),
            ],
        );
        assert!(validate_field(&f, &data(&[("nick", json!("ab"))])).is_empty());
        assert_eq!(validate_field(&f, &data(&[("nick", json!("a"))])).len(), 1);
        assert_eq!(
            validate_field(&f, &data(&[("nick", json!("abcde"))])).len(),
            1
        );
    }

    #[test]
    fn numeric_bounds() {
        let f = field(
            "grade",
            false,
            vec![
                rule("min_value", Some(json!(1))),
                rule("max_value", Some(json!(12))),
            ],
        );
        assert!(validate_field(&f, &data(&[("grade", json!(7))])).is_empty());
        assert_eq!(validate_field(&f, &data(&[("grade", json!(0))])).len(), 1);
        assert_eq!(validate_field(&f, &data(&[("grade", json!(13))])).len(), 1);
    }

    #[test]
    fn pattern_rule() {
        let f = field("postcode", false, vec![rule("pattern", Some(json!("^[0-9]{4}$")))]);
        assert!(validate_field(&f, &data(&[("postcode", json!("1234"))])).is_empty());
        assert_eq!(
            validate_field(&f, &data(&[("postcode", json!("12a4"))])).len(),
            1
        );
    }

    #[test]
    fn invalid_pattern_silently_passes() {
        let f = field("postcode", false, vec![rule("pattern", Some(json!("[unclosed")))]);
        assert!(validate_field(&f, &data(&[("postcode", json!("anything"))])).is_empty());
    }

    #[test]
    fn email_rule() {
        let f = field("contact", false, vec![rule("email", None)]);
        assert!(validate_field(&f, &data(&[("contact", json!("a@school.edu"))])).is_empty());
        assert_eq!(
            validate_field(&f, &data(&[("contact", json!("not-an-email"))])).len(),
            1
        );
    }

    #[test]
    fn email_rule_ignores_empty_value() {
        let f = field("contact", false, vec![rule("email", None)]);
        assert!(validate_field(&f, &data(&[("contact", json!(""))])).is_empty());
    }

    #[test]
    fn options_from_field_definition() {
        let mut f = field("meal", false, vec![rule("options", None)]);
        f.options = vec!["veg".to_string(), "halal".to_string()];
        assert!(validate_field(&f, &data(&[("meal", json!("veg"))])).is_empty());
        assert_eq!(
            validate_field(&f, &data(&[("meal", json!("beef"))])).len(),
            1
        );
    }

    #[test]
    fn options_array_requires_every_element_allowed() {
        let mut f = field("days", false, vec![rule("options", None)]);
        f.options = vec!["mon".to_string(), "tue".to_string()];
        assert!(validate_field(&f, &data(&[("days", json!(["mon", "tue"]))])).is_empty());
        assert_eq!(
            validate_field(&f, &data(&[("days", json!(["mon", "sun"]))])).len(),
            1
        );
    }

    #[test]
    fn unknown_rule_type_passes() {
        let f = field("anything", false, vec![rule("lunar_phase", None)]);
        assert!(validate_field(&f, &data(&[("anything", json!("x"))])).is_empty());
    }

    #[test]
    fn validate_fields_collects_across_schema() {
        use crate::template::{FormSection, FormStep};
        let steps = vec![FormStep {
            step_id: "s1".to_string(),
            step_title: "S1".to_string(),
            sections: vec![FormSection {
                section_id: "sec".to_string(),
                section_title: "Sec".to_string(),
                fields: vec![field("a", true, vec![]), field("b", true, vec![])],
            }],
        }];
        let violations = validate_fields(&steps, &data(&[("a", json!("filled"))]));
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field_id, "b");
    }
}

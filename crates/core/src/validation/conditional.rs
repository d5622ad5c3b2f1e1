//! Conditional-logic resolution for form fields.
//!
//! A field's visibility and requiredness can depend on another field's
//! current value. Rules are evaluated in declaration order; when several
//! rules affect the same property, the last one evaluated wins.

use serde_json::{Map, Value};

use crate::template::{ConditionAction, ConditionOperator, ConditionalRule, FormField};

/// Effective presentation state of a field after conditional rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldState {
    pub visible: bool,
    pub required: bool,
}

/// Resolve a field's visibility and requiredness against current form data.
///
/// Semantics per action:
/// - `show`: the field is visible exactly when the condition holds
/// - `hide`: the field is visible exactly when the condition does NOT hold
/// - `require`: while the condition holds the field is required; otherwise
///   the field's static `required` flag applies
pub fn resolve_field_state(field: &FormField, form_data: &Map<String, Value>) -> FieldState {
    let mut visible = true;
    let mut required = field.required;

    for rule in &field.conditional_logic {
        let holds = condition_holds(rule, form_data);
        match rule.action {
            ConditionAction::Show => visible = holds,
            ConditionAction::Hide => visible = !holds,
            ConditionAction::Require => required = holds || field.required,
        }
    }

    FieldState { visible, required }
}

/// Evaluate a single rule's condition against the referenced field's value.
fn condition_holds(rule: &ConditionalRule, form_data: &Map<String, Value>) -> bool {
    let actual = form_data.get(&rule.field).unwrap_or(&Value::Null);
    match rule.operator {
        ConditionOperator::Equals => *actual == rule.value,
        ConditionOperator::NotEquals => *actual != rule.value,
        ConditionOperator::GreaterThan => compare_numeric(actual, &rule.value, |a, b| a > b),
        ConditionOperator::LessThan => compare_numeric(actual, &rule.value, |a, b| a < b),
        ConditionOperator::GreaterOrEqual => compare_numeric(actual, &rule.value, |a, b| a >= b),
        ConditionOperator::LessOrEqual => compare_numeric(actual, &rule.value, |a, b| a <= b),
        ConditionOperator::Contains => contains(actual, &rule.value),
    }
}

/// Ordering comparisons apply to numeric values only; anything else fails
/// the condition rather than guessing a coercion.
fn compare_numeric(actual: &Value, expected: &Value, cmp: impl Fn(f64, f64) -> bool) -> bool {
    match (actual.as_f64(), expected.as_f64()) {
        (Some(a), Some(b)) => cmp(a, b),
        _ => false,
    }
}

/// `contains` matches substrings for strings and membership for arrays.
fn contains(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::String(s) => expected.as_str().is_some_and(|e| s.contains(e)),
        Value::Array(items) => items.contains(expected),
        _ => false,
    }
}

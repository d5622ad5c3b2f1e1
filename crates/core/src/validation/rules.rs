//! Violation types and rule-type name constants.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rule type names understood by the evaluator.
///
/// Unknown rule types pass silently so old templates keep validating after
/// a rule type is retired.
pub mod rule_types {
    pub const REQUIRED: &str = "required";
    pub const MIN_LENGTH: &str = "min_length";
    pub const MAX_LENGTH: &str = "max_length";
    pub const PATTERN: &str = "pattern";
    pub const MIN_VALUE: &str = "min_value";
    pub const MAX_VALUE: &str = "max_value";
    pub const EMAIL: &str = "email";
    pub const OPTIONS: &str = "options";
}

/// A single field-level rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field_id: String,
    pub rule_type: String,
    pub message: String,
}

/// True when a submitted value counts as "not provided".
///
/// Missing keys, JSON null, empty strings, and empty arrays/objects are all
/// treated as empty, both here and by the progress calculator.
pub fn is_empty_value(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(Value::Object(map)) => map.is_empty(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_and_null_are_empty() {
        assert!(is_empty_value(None));
        assert!(is_empty_value(Some(&Value::Null)));
    }

    #[test]
    fn empty_containers_are_empty() {
        assert!(is_empty_value(Some(&json!(""))));
        assert!(is_empty_value(Some(&json!([]))));
        assert!(is_empty_value(Some(&json!({}))));
    }

    #[test]
    fn values_are_not_empty() {
        assert!(!is_empty_value(Some(&json!("x"))));
        assert!(!is_empty_value(Some(&json!(0))));
        assert!(!is_empty_value(Some(&json!(false))));
        assert!(!is_empty_value(Some(&json!(["a"]))));
    }
}

//! Submission snapshot helpers.
//!
//! Every save/submit action captures an immutable snapshot of the
//! instance's data. Snapshots are chained with SHA-256 integrity hashes so
//! the log is tamper-evident.

use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::hashing::sha256_hex;

/// Known seed value for the first snapshot in an instance's hash chain.
const CHAIN_SEED: &str = "SUBMISSION_CHAIN_SEED_V1";

/// How a snapshot came to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionType {
    AutoSave,
    Submit,
}

impl SubmissionType {
    /// Parse a submission type string from the database.
    pub fn from_str_db(s: &str) -> Result<Self, CoreError> {
        match s {
            "auto_save" => Ok(Self::AutoSave),
            "submit" => Ok(Self::Submit),
            _ => Err(CoreError::Validation(format!(
                "Invalid submission type '{s}'. Must be one of: auto_save, submit"
            ))),
        }
    }

    /// Convert to a database-compatible string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutoSave => "auto_save",
            Self::Submit => "submit",
        }
    }
}

/// Build the snapshot payload for a submission.
///
/// The extra payload is merged over the instance's form data; on key
/// collision the extra value wins.
pub fn merge_submission_data(
    form_data: &Map<String, Value>,
    extra: &Map<String, Value>,
) -> Map<String, Value> {
    let mut merged = form_data.clone();
    for (key, value) in extra {
        merged.insert(key.clone(), value.clone());
    }
    merged
}

/// Compute the integrity hash for a snapshot.
///
/// `prev_hash` is the hash of the instance's previous submission, or `None`
/// for the first one (which chains from a known seed).
pub fn submission_integrity_hash(prev_hash: Option<&str>, snapshot: &Value) -> String {
    let prev = prev_hash.unwrap_or(CHAIN_SEED);
    let combined = format!("{prev}|{snapshot}");
    sha256_hex(combined.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn submission_type_roundtrip() {
        for t in [SubmissionType::AutoSave, SubmissionType::Submit] {
            assert_eq!(SubmissionType::from_str_db(t.as_str()).unwrap(), t);
        }
        assert!(SubmissionType::from_str_db("manual").is_err());
    }

    #[test]
    fn merge_without_extra_is_identity() {
        let form = map(&[("a", json!(1))]);
        let merged = merge_submission_data(&form, &Map::new());
        assert_eq!(merged, form);
    }

    #[test]
    fn extra_values_win_on_collision() {
        let form = map(&[("a", json!(1)), ("b", json!("keep"))]);
        let extra = map(&[("a", json!(2)), ("c", json!(true))]);
        let merged = merge_submission_data(&form, &extra);
        assert_eq!(merged["a"], json!(2));
        assert_eq!(merged["b"], json!("keep"));
        assert_eq!(merged["c"], json!(true));
    }

    #[test]
    fn first_hash_chains_from_seed() {
        let snapshot = json!({"a": 1});
        let first = submission_integrity_hash(None, &snapshot);
        let again = submission_integrity_hash(None, &snapshot);
        assert_eq!(first, again);
        assert_eq!(first.len(), 64);
    }

    #[test]
    fn hash_depends_on_previous_link() {
        let snapshot = json!({"a": 1});
        let first = submission_integrity_hash(None, &snapshot);
        let second = submission_integrity_hash(Some(&first), &snapshot);
        assert_ne!(first, second);
    }

    #[test]
    fn hash_depends_on_snapshot_content() {
        let a = submission_integrity_hash(None, &json!({"a": 1}));
        let b = submission_integrity_hash(None, &json!({"a": 2}));
        assert_ne!(a, b);
    }
}

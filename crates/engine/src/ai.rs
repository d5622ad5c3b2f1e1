//! Advisory AI suggestion service seam.
//!
//! Everything an AI provider returns is advisory: suggestions and findings
//! never gate validation or workflow transitions. [`NullAiService`] is the
//! default wiring when no provider is configured, and core behavior is
//! identical with or without a real backend.

use async_trait::async_trait;
use scholaris_core::template::FormStep;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EngineResult;

/// A suggested value for a single field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldSuggestion {
    pub field_id: String,
    pub suggestion: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// A non-binding observation about submitted data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdvisoryFinding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<String>,
    pub message: String,
}

/// Provider interface for AI-assisted form features.
#[async_trait]
pub trait AiSuggestionService: Send + Sync {
    /// Whether the backing provider is currently reachable.
    async fn is_available(&self) -> bool;

    /// Suggest values for one field given the surrounding context.
    async fn generate_field_suggestions(
        &self,
        field_id: &str,
        context: &Value,
    ) -> EngineResult<Vec<FieldSuggestion>>;

    /// Review submitted data and return advisory findings.
    async fn validate_form_data(
        &self,
        form_data: &Map<String, Value>,
        steps: &[FormStep],
    ) -> EngineResult<Vec<AdvisoryFinding>>;

    /// Propose initial values for a fresh instance.
    async fn auto_populate_fields(
        &self,
        steps: &[FormStep],
        context: &Value,
    ) -> EngineResult<Map<String, Value>>;
}

/// No-op provider used when no AI backend is configured.
pub struct NullAiService;

#[async_trait]
impl AiSuggestionService for NullAiService {
    async fn is_available(&self) -> bool {
        false
    }

    async fn generate_field_suggestions(
        &self,
        _field_id: &str,
        _context: &Value,
    ) -> EngineResult<Vec<FieldSuggestion>> {
        Ok(Vec::new())
    }

    async fn validate_form_data(
        &self,
        _form_data: &Map<String, Value>,
        _steps: &[FormStep],
    ) -> EngineResult<Vec<AdvisoryFinding>> {
        Ok(Vec::new())
    }

    async fn auto_populate_fields(
        &self,
        _steps: &[FormStep],
        _context: &Value,
    ) -> EngineResult<Map<String, Value>> {
        Ok(Map::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn null_service_reports_unavailable() {
        assert!(!NullAiService.is_available().await);
    }

    #[tokio::test]
    async fn null_service_returns_empty_results() {
        let service = NullAiService;
        let suggestions = service
            .generate_field_suggestions("student_name", &json!({}))
            .await
            .unwrap();
        assert!(suggestions.is_empty());

        let findings = service
            .validate_form_data(&Map::new(), &[])
            .await
            .unwrap();
        assert!(findings.is_empty());

        let populated = service.auto_populate_fields(&[], &json!({})).await.unwrap();
        assert!(populated.is_empty());
    }
}

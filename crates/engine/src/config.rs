//! Engine configuration loaded from environment variables.

use scholaris_core::compliance::MethodologyRegistry;
use scholaris_core::error::CoreError;

/// Engine configuration.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Path to the methodology required-fields JSON file, if configured.
    pub methodology_config_path: Option<String>,
    /// Capacity of the in-process event bus channel (default: `1024`).
    pub event_bus_capacity: usize,
}

impl EngineConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `METHODOLOGY_CONFIG_PATH` | unset   |
    /// | `EVENT_BUS_CAPACITY`      | `1024`  |
    pub fn from_env() -> Self {
        // Tolerates a missing .env file.
        dotenvy::dotenv().ok();

        let methodology_config_path = std::env::var("METHODOLOGY_CONFIG_PATH").ok();

        let event_bus_capacity: usize = std::env::var("EVENT_BUS_CAPACITY")
            .unwrap_or_else(|_| "1024".into())
            .parse()
            .expect("EVENT_BUS_CAPACITY must be a valid usize");

        Self {
            methodology_config_path,
            event_bus_capacity,
        }
    }

    /// Load the methodology registry from the configured JSON file.
    ///
    /// Returns an empty registry (every template compliant) when no path is
    /// configured.
    pub fn load_methodology_registry(&self) -> Result<MethodologyRegistry, CoreError> {
        let Some(path) = &self.methodology_config_path else {
            return Ok(MethodologyRegistry::new());
        };
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Internal(format!("Failed to read methodology config {path}: {e}"))
        })?;
        let value: serde_json::Value = serde_json::from_str(&raw).map_err(|e| {
            CoreError::Validation(format!("Methodology config {path} is not valid JSON: {e}"))
        })?;
        MethodologyRegistry::from_json(&value)
    }
}

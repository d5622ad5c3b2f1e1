//! Engine-level error type.

use scholaris_core::error::CoreError;
use scholaris_core::types::DbId;

/// Error type returned by engine services.
///
/// Wraps [`CoreError`] for domain errors and adds the repository layer's
/// database errors. Controllers map this onto their transport of choice;
/// non-fatal findings (lint issues, rule violations, compliance gaps) are
/// never errors — they travel as lists in regular return values.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A domain-level error from `scholaris_core`.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A database error from sqlx.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Convenience type alias for service return values.
pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    /// Shorthand for a missing-target error.
    pub fn not_found(entity: &'static str, id: DbId) -> Self {
        Self::Core(CoreError::NotFound { entity, id })
    }
}

//! Field validation engine.
//!
//! Pure evaluation of declarative field rules and conditional logic against
//! an instance's current form data.

pub mod conditional;
pub mod evaluator;
pub mod rules;

pub use conditional::{resolve_field_state, FieldState};
pub use evaluator::{validate_field, validate_fields};
pub use rules::FieldViolation;

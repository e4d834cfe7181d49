//! Threshold constraints and their evaluation.
//!
//! The pieces compose in one direction: definitions are checked by the
//! [`ConstraintValidator`], held by the [`ConstraintRegistry`], and run by
//! the [`engine`] against a metric batch. Severity assigned on a
//! constraint travels unchanged into every violation it produces.

pub mod engine;
mod registry;
mod types;
mod validator;

pub use engine::{evaluate, format_value};
pub use registry::{ConstraintRegistry, RegistryStats};
pub use types::{
    Constraint, ConstraintId, ConstraintUpdate, EvaluationResult, Operator, OperatorParseError,
    Severity, SeverityParseError, Violation,
};
pub use validator::{ConstraintValidationError, ConstraintValidator, ValidationReport};

//! Constraint well-formedness validation.
//!
//! Validation is deliberately separate from registration: the registry
//! accepts anything, and callers decide when to gate on `validate`.
//! A report carries every failed check, not just the first.

use super::types::Constraint;
use thiserror::Error;

/// Errors from constraint validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConstraintValidationError {
    /// Id is empty
    #[error("constraint id cannot be empty")]
    EmptyId,

    /// Name is empty
    #[error("constraint '{id}' has an empty name")]
    EmptyName { id: String },

    /// No metric named
    #[error("constraint '{id}' does not name a metric")]
    EmptyMetric { id: String },

    /// Message is empty
    #[error("constraint '{id}' has an empty message")]
    EmptyMessage { id: String },

    /// Threshold is NaN or infinite
    #[error("constraint '{id}' threshold must be finite, got {value}")]
    NonFiniteThreshold { id: String, value: f64 },
}

/// Outcome of validating one constraint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    /// Every check that failed, in declaration order
    pub errors: Vec<ConstraintValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validates constraint definitions before they are trusted for evaluation.
///
/// Operator and severity membership need no runtime check: both are closed
/// enums, so malformed symbols already fail at parse or deserialize time.
///
/// # Example
///
/// ```
/// use finwatch_common::constraints::{
///     Constraint, ConstraintValidator, Operator, Severity,
/// };
///
/// let validator = ConstraintValidator::new();
/// let constraint = Constraint::new(
///     "max_pe", "Max P/E", "pe_ratio", Operator::Lt, 20.0, Severity::Warning,
/// )
/// .with_message("Review valuation.");
/// assert!(validator.validate(&constraint).is_valid());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConstraintValidator;

impl ConstraintValidator {
    pub fn new() -> Self {
        Self
    }

    /// Validate a constraint, collecting all failed checks.
    pub fn validate(&self, constraint: &Constraint) -> ValidationReport {
        let mut errors = Vec::new();
        let id = constraint.id.as_str();

        if id.is_empty() {
            errors.push(ConstraintValidationError::EmptyId);
        }

        if constraint.name.is_empty() {
            errors.push(ConstraintValidationError::EmptyName { id: id.to_string() });
        }

        if constraint.metric.is_empty() {
            errors.push(ConstraintValidationError::EmptyMetric { id: id.to_string() });
        }

        if constraint.message.is_empty() {
            errors.push(ConstraintValidationError::EmptyMessage { id: id.to_string() });
        }

        if !constraint.value.is_finite() {
            errors.push(ConstraintValidationError::NonFiniteThreshold {
                id: id.to_string(),
                value: constraint.value,
            });
        }

        ValidationReport { errors }
    }

    /// Check if a constraint is valid (convenience method).
    pub fn is_valid(&self, constraint: &Constraint) -> bool {
        self.validate(constraint).is_valid()
    }
}

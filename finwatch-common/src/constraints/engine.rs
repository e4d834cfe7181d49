//! Pure constraint evaluation.
//!
//! Evaluation is a deterministic function of its inputs: no clock, no
//! randomness, no stored state. Callers decide which constraints to pass
//! in; the engine does not consult active flags or re-validate
//! definitions.

use super::types::{Constraint, EvaluationResult, Violation};
use crate::metrics::MetricSet;
use tracing::debug;

/// Evaluate a constraint set against a metric batch.
///
/// Every metric whose name matches a constraint is checked independently,
/// so a metric reported for several periods can violate the same
/// constraint several times. Constraints whose metric is absent from the
/// batch still count toward `total_constraints` but produce nothing.
///
/// Violations appear in constraint order, then batch order within one
/// constraint.
pub fn evaluate(metrics: &MetricSet, constraints: &[Constraint]) -> EvaluationResult {
    let mut violations = Vec::new();

    for constraint in constraints {
        for metric in metrics.by_name(&constraint.metric) {
            if !metric.value.is_finite() {
                debug!(
                    metric = %metric.name,
                    value = metric.value,
                    constraint = %constraint.id,
                    "skipping non-finite metric value"
                );
                continue;
            }
            if constraint.operator.violated_by(metric.value, constraint.value) {
                violations.push(build_violation(constraint, metric.value));
            }
        }
    }

    EvaluationResult::from_violations(constraints.len(), violations)
}

fn build_violation(constraint: &Constraint, actual: f64) -> Violation {
    let message = format!(
        "{}: {} is {}, expected {} {}. {}",
        constraint.name,
        constraint.metric,
        format_value(actual),
        constraint.operator.text(),
        format_value(constraint.value),
        constraint.message
    );

    Violation {
        constraint_id: constraint.id.clone(),
        metric: constraint.metric.clone(),
        actual_value: actual,
        expected_value: constraint.value,
        operator: constraint.operator,
        severity: constraint.severity,
        message,
    }
}

/// Format a finite value for messages: whole numbers lose the trailing
/// ".0", everything else keeps its shortest form.
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

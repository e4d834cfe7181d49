//! Constraint types and the operator comparison table.
//!
//! This module defines the severity model, the closed operator set, and the
//! records produced by evaluation. Severity is assigned once on the
//! constraint and carried verbatim through violations and alerts.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Severity classification for constraints, violations and alerts.
///
/// Ordinal: info < warning < critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational - no action expected
    Info,
    /// Warning level - worth a look
    Warning,
    /// Critical level - immediate attention required
    Critical,
}

impl Severity {
    /// Bracketed tag used as a message prefix and log marker.
    pub fn tag(&self) -> &'static str {
        match self {
            Severity::Info => "[INFO]",
            Severity::Warning => "[WARNING]",
            Severity::Critical => "[CRITICAL]",
        }
    }

    /// Check if this severity warrants escalation
    pub fn requires_attention(&self) -> bool {
        *self >= Severity::Warning
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Info => write!(f, "INFO"),
            Severity::Warning => write!(f, "WARNING"),
            Severity::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Error from parsing a severity label.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown severity '{0}', expected one of: critical, warning, info")]
pub struct SeverityParseError(pub String);

impl FromStr for Severity {
    type Err = SeverityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "info" => Ok(Severity::Info),
            "warning" => Ok(Severity::Warning),
            "critical" => Ok(Severity::Critical),
            other => Err(SeverityParseError(other.to_string())),
        }
    }
}

/// Comparison operator attached to a constraint threshold.
///
/// The wire form is the comparison symbol itself. The set is closed:
/// anything outside these six symbols is rejected when parsed or
/// deserialized, so evaluation never sees an unknown operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = "!=")]
    Ne,
}

impl Operator {
    /// The comparison symbol as written in constraint definitions.
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Lt => "<",
            Operator::Gt => ">",
            Operator::Eq => "=",
            Operator::Le => "<=",
            Operator::Ge => ">=",
            Operator::Ne => "!=",
        }
    }

    /// Spelled-out form used when composing violation messages.
    pub fn text(&self) -> &'static str {
        match self {
            Operator::Lt => "less than",
            Operator::Gt => "greater than",
            Operator::Eq => "equal to",
            Operator::Le => "less than or equal to",
            Operator::Ge => "greater than or equal to",
            Operator::Ne => "not equal to",
        }
    }

    /// Whether `actual <op> threshold` holds.
    ///
    /// `Eq`/`Ne` compare literally; no epsilon is applied.
    pub fn holds(&self, actual: f64, threshold: f64) -> bool {
        match self {
            Operator::Lt => actual < threshold,
            Operator::Gt => actual > threshold,
            Operator::Eq => actual == threshold,
            Operator::Le => actual <= threshold,
            Operator::Ge => actual >= threshold,
            Operator::Ne => actual != threshold,
        }
    }

    /// Whether an observed value violates the bound `<op> threshold`.
    ///
    /// For finite inputs this is the negation of [`holds`](Self::holds).
    /// Callers screen non-finite values before asking; see the evaluation
    /// engine.
    pub fn violated_by(&self, actual: f64, threshold: f64) -> bool {
        match self {
            Operator::Lt => actual >= threshold,
            Operator::Gt => actual <= threshold,
            Operator::Eq => actual != threshold,
            Operator::Le => actual > threshold,
            Operator::Ge => actual < threshold,
            Operator::Ne => actual == threshold,
        }
    }

    /// Whether a comparison outcome satisfies the operator.
    ///
    /// Used for ordinal comparisons like severity levels and counts, where
    /// the operands already know how to order themselves.
    pub fn holds_ord(&self, ord: Ordering) -> bool {
        match self {
            Operator::Lt => ord.is_lt(),
            Operator::Gt => ord.is_gt(),
            Operator::Eq => ord.is_eq(),
            Operator::Le => ord.is_le(),
            Operator::Ge => ord.is_ge(),
            Operator::Ne => ord.is_ne(),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Error from parsing an operator symbol.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown operator '{0}', expected one of: <, >, =, <=, >=, !=")]
pub struct OperatorParseError(pub String);

impl FromStr for Operator {
    type Err = OperatorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(Operator::Lt),
            ">" => Ok(Operator::Gt),
            "=" => Ok(Operator::Eq),
            "<=" => Ok(Operator::Le),
            ">=" => Ok(Operator::Ge),
            "!=" => Ok(Operator::Ne),
            other => Err(OperatorParseError(other.to_string())),
        }
    }
}

/// Unique constraint identifier, supplied by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstraintId(pub String);

impl ConstraintId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for ConstraintId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for ConstraintId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A user-defined threshold rule over one named metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Constraint {
    /// Identity; registering a second constraint with the same id replaces
    /// the first
    pub id: ConstraintId,
    /// Human-readable label, leads the violation message
    pub name: String,
    /// Name of the metric this constraint applies to
    pub metric: String,
    /// Comparison the metric value is expected to satisfy
    pub operator: Operator,
    /// Threshold value
    pub value: f64,
    /// Severity stamped onto violations of this constraint
    pub severity: Severity,
    /// Explanatory text appended to violation messages
    pub message: String,
    /// Inactive constraints are kept but not evaluated by default
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

impl Constraint {
    /// Create an active constraint with an empty message.
    pub fn new(
        id: impl Into<ConstraintId>,
        name: impl Into<String>,
        metric: impl Into<String>,
        operator: Operator,
        value: f64,
        severity: Severity,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            metric: metric.into(),
            operator,
            value,
            severity,
            message: String::new(),
            is_active: true,
        }
    }

    /// Builder method for the explanatory message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Builder method for the active flag
    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }
}

/// Partial update for an existing constraint.
///
/// `None` fields keep their current value; identity cannot change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintUpdate {
    pub name: Option<String>,
    pub metric: Option<String>,
    pub operator: Option<Operator>,
    pub value: Option<f64>,
    pub severity: Option<Severity>,
    pub message: Option<String>,
    pub is_active: Option<bool>,
}

impl ConstraintUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_metric(mut self, metric: impl Into<String>) -> Self {
        self.metric = Some(metric.into());
        self
    }

    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = Some(operator);
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = Some(active);
        self
    }

    /// Apply the present fields onto a constraint.
    pub fn apply(&self, constraint: &mut Constraint) {
        if let Some(name) = &self.name {
            constraint.name = name.clone();
        }
        if let Some(metric) = &self.metric {
            constraint.metric = metric.clone();
        }
        if let Some(operator) = self.operator {
            constraint.operator = operator;
        }
        if let Some(value) = self.value {
            constraint.value = value;
        }
        if let Some(severity) = self.severity {
            constraint.severity = severity;
        }
        if let Some(message) = &self.message {
            constraint.message = message.clone();
        }
        if let Some(active) = self.is_active {
            constraint.is_active = active;
        }
    }
}

/// A single failed (constraint, metric) check from one evaluation pass.
///
/// Violations are derived values: they are rebuilt from scratch on every
/// evaluation and never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Constraint that failed
    pub constraint_id: ConstraintId,
    /// Name of the metric that was checked
    pub metric: String,
    /// Observed metric value
    pub actual_value: f64,
    /// Constraint threshold
    pub expected_value: f64,
    /// Comparison that did not hold
    pub operator: Operator,
    /// Severity copied from the constraint
    pub severity: Severity,
    /// Synthesized description, see the evaluation engine
    pub message: String,
}

/// Aggregate outcome of evaluating a metric batch against a constraint set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationResult {
    /// Constraints evaluated, whether or not any metric matched them
    pub total_constraints: usize,
    pub violations_count: usize,
    pub critical_count: usize,
    pub warning_count: usize,
    pub info_count: usize,
    pub violations: Vec<Violation>,
}

impl EvaluationResult {
    /// Build a result from collected violations, tallying severities.
    pub fn from_violations(total_constraints: usize, violations: Vec<Violation>) -> Self {
        let mut critical_count = 0;
        let mut warning_count = 0;
        let mut info_count = 0;
        for violation in &violations {
            match violation.severity {
                Severity::Critical => critical_count += 1,
                Severity::Warning => warning_count += 1,
                Severity::Info => info_count += 1,
            }
        }
        Self {
            total_constraints,
            violations_count: violations.len(),
            critical_count,
            warning_count,
            info_count,
            violations,
        }
    }

    /// Check if any constraint was violated
    pub fn has_violations(&self) -> bool {
        !self.violations.is_empty()
    }

    /// Check if any violation is critical
    pub fn has_critical(&self) -> bool {
        self.critical_count > 0
    }
}

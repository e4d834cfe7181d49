// service/types.rs - Request and outcome types for the monitoring service

use crate::alerting::Alert;
use finwatch_common::constraints::{Constraint, EvaluationResult};
use serde::{Deserialize, Serialize};

/// Selects which constraints an evaluation runs against.
///
/// Resolution order: explicit `constraints` win over `constraint_ids`,
/// which win over the default of every active registered constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateRequest {
    /// Replace the registry with exactly these constraints, then evaluate
    /// them all, active or not
    #[serde(default)]
    pub constraints: Option<Vec<Constraint>>,
    /// Evaluate only these registered constraints, active or not; unknown
    /// ids are skipped
    #[serde(default)]
    pub constraint_ids: Option<Vec<String>>,
}

impl EvaluateRequest {
    /// Evaluate every active registered constraint.
    pub fn active() -> Self {
        Self::default()
    }

    /// Replace the registry and evaluate the replacement.
    pub fn replace(constraints: Vec<Constraint>) -> Self {
        Self {
            constraints: Some(constraints),
            constraint_ids: None,
        }
    }

    /// Evaluate a selection of registered constraints by id.
    pub fn for_ids(ids: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            constraints: None,
            constraint_ids: Some(ids.into_iter().map(Into::into).collect()),
        }
    }
}

/// Result of one full pipeline run: the evaluation plus the alert batch
/// it produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineOutcome {
    pub result: EvaluationResult,
    pub alerts: Vec<Alert>,
}

impl PipelineOutcome {
    pub fn has_alerts(&self) -> bool {
        !self.alerts.is_empty()
    }
}

//! In-memory constraint registry.
//!
//! Owns the constraint set for one monitoring context. Insertion order is
//! preserved so evaluation output is stable across runs: registering,
//! replacing or bulk-loading constraints always yields the same iteration
//! order for the same sequence of calls.

use super::types::{Constraint, ConstraintId, ConstraintUpdate, Severity};
use super::validator::{ConstraintValidator, ValidationReport};
use serde::Serialize;
use std::collections::HashMap;

/// Registry statistics snapshot, recomputed on demand.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistryStats {
    pub total_constraints: usize,
    pub active_constraints: usize,
    pub inactive_constraints: usize,
    /// Constraint counts per metric name
    pub by_metric: HashMap<String, usize>,
    /// Constraint counts per severity
    pub by_severity: HashMap<Severity, usize>,
}

/// Registry of threshold constraints.
///
/// Mirrors the upstream contract: adding an existing id replaces the
/// definition in place, and unknown-id updates or removals report `false`
/// instead of failing.
#[derive(Debug, Clone, Default)]
pub struct ConstraintRegistry {
    constraints: Vec<Constraint>,
    validator: ConstraintValidator,
}

impl ConstraintRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry seeded with the given constraints.
    pub fn with_constraints(constraints: impl IntoIterator<Item = Constraint>) -> Self {
        let mut registry = Self::new();
        for constraint in constraints {
            registry.add(constraint);
        }
        registry
    }

    /// Insert or replace by id. A replacement keeps the original slot, so
    /// redefining a constraint does not reorder evaluation.
    ///
    /// No validation is applied here; call [`validate`](Self::validate)
    /// first when the definition is untrusted.
    pub fn add(&mut self, constraint: Constraint) {
        match self.position(&constraint.id) {
            Some(pos) => self.constraints[pos] = constraint,
            None => self.constraints.push(constraint),
        }
    }

    /// Validate a constraint definition, collecting all failed checks.
    pub fn validate(&self, constraint: &Constraint) -> ValidationReport {
        self.validator.validate(constraint)
    }

    /// Apply a partial update to an existing constraint.
    ///
    /// Returns `false` when the id is unknown.
    pub fn update(&mut self, id: &ConstraintId, update: &ConstraintUpdate) -> bool {
        match self.position(id) {
            Some(pos) => {
                update.apply(&mut self.constraints[pos]);
                true
            }
            None => false,
        }
    }

    /// Remove a constraint. Returns `false` when the id is unknown.
    pub fn remove(&mut self, id: &ConstraintId) -> bool {
        match self.position(id) {
            Some(pos) => {
                self.constraints.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &ConstraintId) -> Option<&Constraint> {
        self.position(id).map(|pos| &self.constraints[pos])
    }

    pub fn contains(&self, id: &ConstraintId) -> bool {
        self.position(id).is_some()
    }

    /// Snapshot of every constraint, in registration order.
    pub fn all(&self) -> Vec<Constraint> {
        self.constraints.clone()
    }

    /// Snapshot of the active constraints, in registration order.
    pub fn active(&self) -> Vec<Constraint> {
        self.constraints
            .iter()
            .filter(|c| c.is_active)
            .cloned()
            .collect()
    }

    /// Snapshot of the constraints matching the given ids, in id-list
    /// order. Unknown ids are skipped; the active flag is ignored, the
    /// caller's list is authoritative.
    pub fn by_ids(&self, ids: &[ConstraintId]) -> Vec<Constraint> {
        ids.iter()
            .filter_map(|id| self.get(id))
            .cloned()
            .collect()
    }

    /// Replace the whole constraint set. Duplicate ids in the incoming
    /// list collapse to the last definition, same as sequential adds.
    pub fn load(&mut self, constraints: Vec<Constraint>) {
        self.constraints.clear();
        for constraint in constraints {
            self.add(constraint);
        }
    }

    pub fn len(&self) -> usize {
        self.constraints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.constraints.is_empty()
    }

    /// Compute registry statistics. Walks the whole set every call; no
    /// incremental counters to drift out of sync.
    pub fn statistics(&self) -> RegistryStats {
        let mut by_metric: HashMap<String, usize> = HashMap::new();
        let mut by_severity: HashMap<Severity, usize> = HashMap::new();
        let mut active_constraints = 0;

        for constraint in &self.constraints {
            if constraint.is_active {
                active_constraints += 1;
            }
            *by_metric.entry(constraint.metric.clone()).or_insert(0) += 1;
            *by_severity.entry(constraint.severity).or_insert(0) += 1;
        }

        RegistryStats {
            total_constraints: self.constraints.len(),
            active_constraints,
            inactive_constraints: self.constraints.len() - active_constraints,
            by_metric,
            by_severity,
        }
    }

    fn position(&self, id: &ConstraintId) -> Option<usize> {
        self.constraints.iter().position(|c| &c.id == id)
    }
}

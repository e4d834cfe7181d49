// service/monitor.rs - Monitoring service facade

use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::info;

use super::errors::{ServiceError, ServiceResult};
use super::types::{EvaluateRequest, PipelineOutcome};
use crate::alerting::{
    Alert, AlertContext, AlertFilter, AlertGenerator, AlertId, AlertRule, AlertStats, AlertStore,
    NotificationSink, QueuedSink,
};
use crate::config::Settings;
use finwatch_common::constraints::{
    evaluate, Constraint, ConstraintId, ConstraintRegistry, ConstraintUpdate, EvaluationResult,
    RegistryStats, ValidationReport, Violation,
};
use finwatch_common::metrics::MetricSet;

/// Facade over the constraint registry, the evaluation engine, the alert
/// generator and the alert store.
///
/// All pipeline state lives here. Methods take `&self`; wrap the service
/// in an `Arc` to share it across threads.
pub struct MonitorService {
    /// Registered constraints, the default evaluation set
    registry: RwLock<ConstraintRegistry>,
    /// Alerts persisted from generated batches
    store: RwLock<AlertStore>,
    /// Violation-to-alert conversion and notification rules
    generator: AlertGenerator,
}

impl std::fmt::Debug for MonitorService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MonitorService").finish_non_exhaustive()
    }
}

impl MonitorService {
    pub fn new(generator: AlertGenerator) -> Self {
        Self {
            registry: RwLock::new(ConstraintRegistry::new()),
            store: RwLock::new(AlertStore::new()),
            generator,
        }
    }

    /// Build a service from settings, dispatching through a background
    /// queue into `sink`.
    ///
    /// Constraints from the settings are validated before seeding the
    /// registry; the first invalid one aborts construction.
    pub fn from_settings(
        settings: &Settings,
        sink: Arc<dyn NotificationSink>,
    ) -> ServiceResult<Self> {
        if settings.alerting.queue_capacity == 0 {
            return Err(ServiceError::Config(
                "alerting.queue_capacity must be positive".to_string(),
            ));
        }

        let queued = QueuedSink::new(sink, settings.alerting.queue_capacity);
        let generator = AlertGenerator::new(Arc::new(queued))
            .with_enabled(settings.alerting.enabled)
            .with_cooldown(Duration::from_secs(settings.alerting.cooldown_secs));

        let service = Self::new(generator);
        {
            let mut registry = service.registry.write().unwrap();
            for constraint in &settings.constraints {
                let report = registry.validate(constraint);
                if !report.is_valid() {
                    return Err(ServiceError::InvalidConstraint {
                        id: constraint.id.to_string(),
                        reasons: report
                            .errors
                            .iter()
                            .map(|e| e.to_string())
                            .collect::<Vec<_>>()
                            .join("; "),
                    });
                }
                registry.add(constraint.clone());
            }
        }

        info!(
            constraints = settings.constraints.len(),
            alerting_enabled = settings.alerting.enabled,
            "monitoring service configured"
        );
        Ok(service)
    }

    /// Build a service from `Settings::new()`.
    pub fn from_env(sink: Arc<dyn NotificationSink>) -> ServiceResult<Self> {
        let settings = Settings::new()?;
        Self::from_settings(&settings, sink)
    }

    /// Register a notification rule. Rules are consulted on every
    /// generated batch.
    pub fn add_rule(&mut self, rule: AlertRule) {
        self.generator.add_rule(rule);
    }

    // ------------------------------------------------------------------
    // Pipeline
    // ------------------------------------------------------------------

    /// Evaluate a metric batch against the constraints the request
    /// selects.
    pub fn evaluate(&self, metrics: &MetricSet, request: &EvaluateRequest) -> EvaluationResult {
        let constraints = self.select_constraints(request);
        let result = evaluate(metrics, &constraints);
        info!(
            metrics = metrics.len(),
            constraints = result.total_constraints,
            violations = result.violations_count,
            critical = result.critical_count,
            "evaluated metric batch"
        );
        result
    }

    /// Generate alerts from violations, persist them, return the batch.
    pub fn generate_alerts(&self, violations: &[Violation], context: &AlertContext) -> Vec<Alert> {
        let alerts = self.generator.generate(violations, context);
        if !alerts.is_empty() {
            let mut store = self.store.write().unwrap();
            store.insert_batch(alerts.iter().cloned());
            info!(
                alerts = alerts.len(),
                analysis = %context.analysis_id,
                "stored alert batch"
            );
        }
        alerts
    }

    /// Full pipeline: evaluate, then generate and persist alerts for
    /// every violation.
    pub fn process(
        &self,
        metrics: &MetricSet,
        request: &EvaluateRequest,
        context: &AlertContext,
    ) -> PipelineOutcome {
        let result = self.evaluate(metrics, request);
        let alerts = self.generate_alerts(&result.violations, context);
        PipelineOutcome { result, alerts }
    }

    fn select_constraints(&self, request: &EvaluateRequest) -> Vec<Constraint> {
        if let Some(constraints) = &request.constraints {
            let mut registry = self.registry.write().unwrap();
            registry.load(constraints.clone());
            return registry.all();
        }

        let registry = self.registry.read().unwrap();
        match &request.constraint_ids {
            Some(ids) => {
                let ids: Vec<ConstraintId> =
                    ids.iter().map(|id| ConstraintId::from(id.as_str())).collect();
                registry.by_ids(&ids)
            }
            None => registry.active(),
        }
    }

    // ------------------------------------------------------------------
    // Constraint management
    // ------------------------------------------------------------------

    /// Add or replace a constraint.
    pub fn add_constraint(&self, constraint: Constraint) {
        self.registry.write().unwrap().add(constraint);
    }

    /// Validate a constraint without registering it.
    pub fn validate_constraint(&self, constraint: &Constraint) -> ValidationReport {
        self.registry.read().unwrap().validate(constraint)
    }

    /// Apply a partial update. Returns `false` for an unknown id.
    pub fn update_constraint(&self, id: &str, update: &ConstraintUpdate) -> bool {
        self.registry
            .write()
            .unwrap()
            .update(&ConstraintId::from(id), update)
    }

    /// Remove a constraint. Returns `false` for an unknown id.
    pub fn remove_constraint(&self, id: &str) -> bool {
        self.registry.write().unwrap().remove(&ConstraintId::from(id))
    }

    pub fn constraint(&self, id: &str) -> Option<Constraint> {
        self.registry
            .read()
            .unwrap()
            .get(&ConstraintId::from(id))
            .cloned()
    }

    /// Every registered constraint, in registration order.
    pub fn constraints(&self) -> Vec<Constraint> {
        self.registry.read().unwrap().all()
    }

    /// Active constraints only, in registration order.
    pub fn active_constraints(&self) -> Vec<Constraint> {
        self.registry.read().unwrap().active()
    }

    /// Replace the whole registry.
    pub fn load_constraints(&self, constraints: Vec<Constraint>) {
        self.registry.write().unwrap().load(constraints);
    }

    pub fn registry_statistics(&self) -> RegistryStats {
        self.registry.read().unwrap().statistics()
    }

    // ------------------------------------------------------------------
    // Alert management
    // ------------------------------------------------------------------

    pub fn alert(&self, id: &str) -> Option<Alert> {
        self.store.read().unwrap().get(&AlertId::from(id)).cloned()
    }

    /// Alerts matching the filter, newest first.
    pub fn alerts(&self, filter: &AlertFilter) -> Vec<Alert> {
        self.store.read().unwrap().list(filter)
    }

    /// Acknowledge one alert. Returns `false` for an unknown id.
    pub fn acknowledge_alert(&self, id: &str, user: &str) -> bool {
        self.store
            .write()
            .unwrap()
            .acknowledge(&AlertId::from(id), user)
    }

    /// Acknowledge a set of alerts; returns how many ids existed.
    pub fn bulk_acknowledge_alerts(&self, ids: &[String], user: &str) -> usize {
        let ids: Vec<AlertId> = ids.iter().map(|id| AlertId::from(id.as_str())).collect();
        self.store.write().unwrap().bulk_acknowledge(&ids, user)
    }

    /// Delete one alert. Returns `false` for an unknown id.
    pub fn delete_alert(&self, id: &str) -> bool {
        self.store.write().unwrap().delete(&AlertId::from(id))
    }

    pub fn clear_alerts(&self) {
        self.store.write().unwrap().clear();
    }

    /// Alert statistics, optionally scoped to one user.
    pub fn alert_statistics(&self, user_id: Option<&str>) -> AlertStats {
        self.store.read().unwrap().statistics(user_id)
    }
}

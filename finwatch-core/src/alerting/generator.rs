// alerting/generator.rs - Alert generation and notification rule sweep

use super::rules::AlertRule;
use super::sink::NotificationSink;
use super::types::{Alert, AlertContext, AlertId};
use chrono::{DateTime, Utc};
use finwatch_common::constraints::Violation;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Default cooldown between repeated firings of one rule.
const DEFAULT_COOLDOWN: Duration = Duration::from_secs(300);

/// Turns violations into enriched alerts and runs notification rules.
///
/// Generation is strictly one alert per violation, in violation order.
/// Rules and their actions only decide what gets dispatched; they never
/// change the returned batch, and an action failure is logged and
/// contained.
pub struct AlertGenerator {
    rules: Vec<AlertRule>,
    sink: Arc<dyn NotificationSink>,
    /// Master switch for dispatch; generation itself is unaffected
    enabled: bool,
    /// Minimum gap between two firings of the same rule
    cooldown: Duration,
    last_fired: Mutex<HashMap<String, SystemTime>>,
}

impl AlertGenerator {
    pub fn new(sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            rules: Vec::new(),
            sink,
            enabled: true,
            cooldown: DEFAULT_COOLDOWN,
            last_fired: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_rule(mut self, rule: AlertRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn with_rules(mut self, rules: impl IntoIterator<Item = AlertRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Zero disables suppression entirely.
    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn add_rule(&mut self, rule: AlertRule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[AlertRule] {
        &self.rules
    }

    /// Generate one alert per violation, in order, then run the
    /// notification rules against the batch.
    pub fn generate(&self, violations: &[Violation], context: &AlertContext) -> Vec<Alert> {
        let created_at = Utc::now();
        let alerts: Vec<Alert> = violations
            .iter()
            .map(|violation| self.build_alert(violation, context, created_at))
            .collect();

        debug!(
            violations = violations.len(),
            analysis = %context.analysis_id,
            "generated alert batch"
        );

        self.run_rules(&alerts, context);
        alerts
    }

    fn build_alert(
        &self,
        violation: &Violation,
        context: &AlertContext,
        created_at: DateTime<Utc>,
    ) -> Alert {
        Alert {
            id: AlertId::generate(),
            severity: violation.severity,
            metric: violation.metric.clone(),
            message: enrich_message(violation, context),
            actual_value: violation.actual_value,
            expected_value: violation.expected_value,
            is_acknowledged: false,
            acknowledged_at: None,
            acknowledged_by: None,
            created_at,
            analysis_id: context.analysis_id.clone(),
            constraint_id: violation.constraint_id.clone(),
            user_id: context.user_id.clone(),
        }
    }

    fn run_rules(&self, alerts: &[Alert], context: &AlertContext) {
        if !self.enabled || alerts.is_empty() {
            return;
        }

        for rule in &self.rules {
            if !rule.is_active {
                continue;
            }
            let subset = rule.matching_subset(alerts);
            if subset.is_empty() {
                continue;
            }
            if self.is_in_cooldown(&rule.id) {
                debug!(rule = %rule.id, "rule in cooldown, skipping actions");
                continue;
            }
            debug!(
                rule = %rule.id,
                conditions = %rule.description(),
                matched = subset.len(),
                "notification rule fired"
            );
            self.execute_actions(rule, &subset, context);
            self.mark_fired(&rule.id);
        }
    }

    fn execute_actions(&self, rule: &AlertRule, subset: &[&Alert], context: &AlertContext) {
        let matched: Vec<Alert> = subset.iter().map(|alert| (*alert).clone()).collect();
        for action in &rule.actions {
            if !action.enabled {
                continue;
            }
            if let Err(e) = self
                .sink
                .send(action.channel, &action.config, &matched, context)
            {
                warn!(
                    rule = %rule.id,
                    channel = %action.channel,
                    error = %e,
                    "notification action failed"
                );
            }
        }
    }

    fn is_in_cooldown(&self, rule_id: &str) -> bool {
        let last_fired = self.last_fired.lock().unwrap();
        match last_fired.get(rule_id) {
            Some(last) => match last.elapsed() {
                Ok(elapsed) => elapsed < self.cooldown,
                // clock moved backwards; stay in cooldown
                Err(_) => true,
            },
            None => false,
        }
    }

    fn mark_fired(&self, rule_id: &str) {
        let mut last_fired = self.last_fired.lock().unwrap();
        last_fired.insert(rule_id.to_string(), SystemTime::now());
    }
}

/// Build the outward-facing alert message: severity tag, optional company
/// prefix, the violation text, then a difference suffix.
pub(crate) fn enrich_message(violation: &Violation, context: &AlertContext) -> String {
    let mut message = String::new();
    message.push_str(violation.severity.tag());
    message.push(' ');
    if let Some(company) = &context.company_name {
        message.push('[');
        message.push_str(company);
        message.push_str("] ");
    }
    message.push_str(&violation.message);
    message.push(' ');
    message.push_str(&difference_suffix(
        violation.actual_value,
        violation.expected_value,
    ));
    message
}

/// `(Difference: {signed diff}, {percent}%)`.
///
/// The percentage is relative to the expected value and falls back to
/// `N/A` when that is zero, so the text never carries `inf` or `NaN`.
fn difference_suffix(actual: f64, expected: f64) -> String {
    let diff = actual - expected;
    if !diff.is_finite() {
        return "(Difference: N/A)".to_string();
    }

    let percent = diff / expected * 100.0;
    if percent.is_finite() {
        format!("(Difference: {}, {:.1}%)", format_signed(diff), percent)
    } else {
        format!("(Difference: {}, N/A)", format_signed(diff))
    }
}

/// Signed counterpart of `format_value`: whole numbers keep no decimal
/// point, everything else is rounded to two places.
fn format_signed(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:+.0}")
    } else {
        format!("{value:+.2}")
    }
}

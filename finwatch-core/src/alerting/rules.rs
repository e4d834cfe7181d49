// alerting/rules.rs - Notification rule definitions and conditions

use super::types::Alert;
use finwatch_common::constraints::{Operator, Severity};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Numeric alert field a value condition reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionField {
    ActualValue,
    ExpectedValue,
}

/// Condition that decides whether a rule applies.
///
/// `Value` and `Severity` are checked per alert; `ViolationCount` is
/// checked once against the whole generated batch and gates the rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum RuleCondition {
    /// Compare a numeric alert field against a fixed value
    #[serde(rename_all = "camelCase")]
    Value {
        field: ConditionField,
        operator: Operator,
        value: f64,
    },
    /// Compare the alert severity against a level, ordinally
    #[serde(rename_all = "camelCase")]
    Severity {
        operator: Operator,
        level: Severity,
    },
    /// Compare the size of the generated batch
    #[serde(rename_all = "camelCase")]
    ViolationCount {
        operator: Operator,
        count: usize,
    },
}

impl RuleCondition {
    /// Check one alert. Batch-level conditions always pass here; they are
    /// checked once per batch in [`matches_batch`](Self::matches_batch).
    pub fn matches_alert(&self, alert: &Alert) -> bool {
        match self {
            RuleCondition::Value {
                field,
                operator,
                value,
            } => {
                let actual = match field {
                    ConditionField::ActualValue => alert.actual_value,
                    ConditionField::ExpectedValue => alert.expected_value,
                };
                operator.holds(actual, *value)
            }
            RuleCondition::Severity { operator, level } => {
                operator.holds_ord(alert.severity.cmp(level))
            }
            RuleCondition::ViolationCount { .. } => true,
        }
    }

    /// Check the batch as a whole. Per-alert conditions always pass here.
    pub fn matches_batch(&self, batch_size: usize) -> bool {
        match self {
            RuleCondition::ViolationCount { operator, count } => {
                operator.holds_ord(batch_size.cmp(count))
            }
            _ => true,
        }
    }

    /// Human-readable description for logs and admin views.
    pub fn description(&self) -> String {
        match self {
            RuleCondition::Value {
                field,
                operator,
                value,
            } => {
                let field = match field {
                    ConditionField::ActualValue => "actual value",
                    ConditionField::ExpectedValue => "expected value",
                };
                format!("{} {} {}", field, operator, value)
            }
            RuleCondition::Severity { operator, level } => {
                format!("severity {} {}", operator, level)
            }
            RuleCondition::ViolationCount { operator, count } => {
                format!("violation count {} {}", operator, count)
            }
        }
    }
}

/// Delivery channel for a rule action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionChannel {
    Email,
    Webhook,
    Sms,
    Chat,
}

impl fmt::Display for ActionChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionChannel::Email => write!(f, "email"),
            ActionChannel::Webhook => write!(f, "webhook"),
            ActionChannel::Sms => write!(f, "sms"),
            ActionChannel::Chat => write!(f, "chat"),
        }
    }
}

/// Channel-specific settings passed through to the sink verbatim
/// (recipients, URLs, templates). The pipeline never inspects these.
pub type ActionConfig = Map<String, Value>;

/// One notification action attached to a rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleAction {
    pub channel: ActionChannel,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub config: ActionConfig,
}

fn default_enabled() -> bool {
    true
}

impl RuleAction {
    pub fn new(channel: ActionChannel) -> Self {
        Self {
            channel,
            enabled: true,
            config: Map::new(),
        }
    }

    pub fn with_config(mut self, config: ActionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// Notification rule: all conditions must hold for the rule to fire.
///
/// A rule with no conditions matches every alert in a non-empty batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRule {
    pub id: String,
    pub name: String,
    /// The rule's own importance, for routing and logs
    pub severity: Severity,
    pub conditions: Vec<RuleCondition>,
    pub actions: Vec<RuleAction>,
    #[serde(default = "default_enabled")]
    pub is_active: bool,
}

impl AlertRule {
    pub fn new(id: impl Into<String>, name: impl Into<String>, severity: Severity) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            severity,
            conditions: Vec::new(),
            actions: Vec::new(),
            is_active: true,
        }
    }

    pub fn with_condition(mut self, condition: RuleCondition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_action(mut self, action: RuleAction) -> Self {
        self.actions.push(action);
        self
    }

    pub fn with_active(mut self, active: bool) -> Self {
        self.is_active = active;
        self
    }

    /// Rule that fires on any critical alert.
    pub fn critical_alerts() -> Self {
        Self::new("critical_alerts", "Critical alerts", Severity::Critical).with_condition(
            RuleCondition::Severity {
                operator: Operator::Ge,
                level: Severity::Critical,
            },
        )
    }

    /// Rule that fires on any alert warranting attention.
    pub fn attention_alerts() -> Self {
        Self::new("attention_alerts", "Warning and critical alerts", Severity::Warning)
            .with_condition(RuleCondition::Severity {
                operator: Operator::Ge,
                level: Severity::Warning,
            })
    }

    /// Rule that fires when one batch produces at least `count` violations.
    pub fn violation_flood(count: usize) -> Self {
        Self::new("violation_flood", "Violation flood", Severity::Warning).with_condition(
            RuleCondition::ViolationCount {
                operator: Operator::Ge,
                count,
            },
        )
    }

    /// The subset of a batch this rule applies to.
    ///
    /// Batch-level conditions gate the whole rule; per-alert conditions
    /// select the matching alerts. An empty result means the rule does not
    /// fire.
    pub fn matching_subset<'a>(&self, batch: &'a [Alert]) -> Vec<&'a Alert> {
        if !self
            .conditions
            .iter()
            .all(|condition| condition.matches_batch(batch.len()))
        {
            return Vec::new();
        }
        batch
            .iter()
            .filter(|alert| {
                self.conditions
                    .iter()
                    .all(|condition| condition.matches_alert(alert))
            })
            .collect()
    }

    /// Human-readable description of all conditions.
    pub fn description(&self) -> String {
        if self.conditions.is_empty() {
            return "matches every alert".to_string();
        }
        self.conditions
            .iter()
            .map(RuleCondition::description)
            .collect::<Vec<_>>()
            .join(" and ")
    }
}

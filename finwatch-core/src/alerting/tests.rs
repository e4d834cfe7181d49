// alerting/tests.rs - Behavioral tests for the alert pipeline

use super::*;
use chrono::{Duration as ChronoDuration, Utc};
use crossbeam_channel::{unbounded, Receiver, Sender};
use finwatch_common::constraints::{ConstraintId, Operator, Severity, Violation};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Test sink that records every dispatch, optionally failing one channel.
#[derive(Clone, Default)]
struct RecordingSink {
    dispatches: Arc<Mutex<Vec<RecordedDispatch>>>,
    failing: Option<ActionChannel>,
}

#[derive(Clone)]
struct RecordedDispatch {
    channel: ActionChannel,
    alerts: Vec<Alert>,
    context: AlertContext,
}

impl RecordingSink {
    fn new() -> Self {
        Self::default()
    }

    fn failing_on(channel: ActionChannel) -> Self {
        Self {
            dispatches: Arc::new(Mutex::new(Vec::new())),
            failing: Some(channel),
        }
    }

    fn dispatches(&self) -> Vec<RecordedDispatch> {
        self.dispatches.lock().unwrap().clone()
    }

    fn record(
        &self,
        channel: ActionChannel,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        if self.failing == Some(channel) {
            return Err(NotifyError::delivery(channel, "transport down"));
        }
        self.dispatches.lock().unwrap().push(RecordedDispatch {
            channel,
            alerts: alerts.to_vec(),
            context: context.clone(),
        });
        Ok(())
    }
}

impl NotificationSink for RecordingSink {
    fn send_email(
        &self,
        _config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        self.record(ActionChannel::Email, alerts, context)
    }

    fn send_webhook(
        &self,
        _config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        self.record(ActionChannel::Webhook, alerts, context)
    }

    fn send_sms(
        &self,
        _config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        self.record(ActionChannel::Sms, alerts, context)
    }

    fn send_chat(
        &self,
        _config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        self.record(ActionChannel::Chat, alerts, context)
    }
}

fn violation(constraint_id: &str, metric: &str, severity: Severity, actual: f64) -> Violation {
    Violation {
        constraint_id: ConstraintId::from(constraint_id),
        metric: metric.to_string(),
        actual_value: actual,
        expected_value: 20.0,
        operator: Operator::Lt,
        severity,
        message: format!("{metric} out of bounds."),
    }
}

fn context() -> AlertContext {
    AlertContext::new("analysis-1", "user-1")
}

#[test]
fn test_generates_one_alert_per_violation_in_order() {
    // Given three violations of mixed severity
    let sink = RecordingSink::new();
    let generator = AlertGenerator::new(Arc::new(sink));
    let violations = vec![
        violation("c1", "pe_ratio", Severity::Critical, 25.0),
        violation("c2", "debt_ratio", Severity::Warning, 0.8),
        violation("c3", "cash_ratio", Severity::Info, 0.1),
    ];

    // When generating alerts
    let alerts = generator.generate(&violations, &context());

    // Then each violation maps to one alert, in order
    assert_eq!(alerts.len(), 3);
    assert_eq!(alerts[0].constraint_id, ConstraintId::from("c1"));
    assert_eq!(alerts[1].constraint_id, ConstraintId::from("c2"));
    assert_eq!(alerts[2].constraint_id, ConstraintId::from("c3"));
    assert_eq!(alerts[0].severity, Severity::Critical);
    assert_eq!(alerts[1].severity, Severity::Warning);
    assert_eq!(alerts[2].severity, Severity::Info);

    // And each alert starts unacknowledged with fresh identity and context
    for alert in &alerts {
        assert!(!alert.is_acknowledged);
        assert!(alert.acknowledged_at.is_none());
        assert_eq!(alert.analysis_id, "analysis-1");
        assert_eq!(alert.user_id, "user-1");
    }
    assert_ne!(alerts[0].id, alerts[1].id);
    assert_ne!(alerts[1].id, alerts[2].id);
}

#[test]
fn test_alert_message_carries_severity_tag() {
    let sink = RecordingSink::new();
    let generator = AlertGenerator::new(Arc::new(sink));
    let violations = vec![
        violation("c1", "pe_ratio", Severity::Critical, 25.0),
        violation("c2", "debt_ratio", Severity::Info, 0.8),
    ];

    let alerts = generator.generate(&violations, &context());

    assert!(alerts[0].message.starts_with("[CRITICAL] "));
    assert!(alerts[1].message.starts_with("[INFO] "));
    assert!(alerts[0].message.contains("pe_ratio out of bounds."));
    assert!(alerts[0].message.contains("(Difference: "));
}

#[test]
fn test_empty_violations_produce_empty_batch() {
    let sink = RecordingSink::new();
    let recorder = sink.clone();
    let generator = AlertGenerator::new(Arc::new(sink)).with_rule(
        AlertRule::violation_flood(0).with_action(RuleAction::new(ActionChannel::Email)),
    );

    let alerts = generator.generate(&[], &context());

    assert!(alerts.is_empty());
    // no alerts means no dispatch, whatever the rules say
    assert!(recorder.dispatches().is_empty());
}

#[test]
fn test_rule_dispatches_matching_subset_only() {
    // Given a rule that matches critical alerts and sends email
    let sink = RecordingSink::new();
    let recorder = sink.clone();
    let generator = AlertGenerator::new(Arc::new(sink)).with_rule(
        AlertRule::critical_alerts().with_action(RuleAction::new(ActionChannel::Email)),
    );

    // When a mixed batch is generated
    let violations = vec![
        violation("c1", "pe_ratio", Severity::Critical, 25.0),
        violation("c2", "debt_ratio", Severity::Info, 0.8),
    ];
    let context = AlertContext::new("analysis-1", "user-1").with_document("doc-9");
    let alerts = generator.generate(&violations, &context);

    // Then the whole batch is returned but only the critical alert ships
    assert_eq!(alerts.len(), 2);
    let dispatches = recorder.dispatches();
    assert_eq!(dispatches.len(), 1);
    assert_eq!(dispatches[0].channel, ActionChannel::Email);
    assert_eq!(dispatches[0].alerts.len(), 1);
    assert_eq!(dispatches[0].alerts[0].severity, Severity::Critical);

    // the sink sees the full batch context
    assert_eq!(dispatches[0].context.analysis_id, "analysis-1");
    assert_eq!(dispatches[0].context.document_id.as_deref(), Some("doc-9"));
}

#[test]
fn test_batch_condition_sends_whole_batch() {
    // Given a flood rule that triggers at three violations
    let sink = RecordingSink::new();
    let recorder = sink.clone();
    let generator = AlertGenerator::new(Arc::new(sink)).with_rule(
        AlertRule::violation_flood(3).with_action(RuleAction::new(ActionChannel::Webhook)),
    );

    // When the batch reaches the threshold
    let violations = vec![
        violation("c1", "pe_ratio", Severity::Info, 25.0),
        violation("c2", "debt_ratio", Severity::Info, 0.8),
        violation("c3", "cash_ratio", Severity::Info, 0.1),
    ];
    generator.generate(&violations, &context());

    // Then every alert in the batch is dispatched together
    let dispatches = recorder.dispatches();
    assert_eq!(dispatches.len(), 1);
    assert_eq!(dispatches[0].alerts.len(), 3);
}

#[test]
fn test_batch_condition_below_threshold_gates_rule() {
    let sink = RecordingSink::new();
    let recorder = sink.clone();
    let generator = AlertGenerator::new(Arc::new(sink)).with_rule(
        AlertRule::violation_flood(5).with_action(RuleAction::new(ActionChannel::Webhook)),
    );

    let violations = vec![
        violation("c1", "pe_ratio", Severity::Critical, 25.0),
        violation("c2", "debt_ratio", Severity::Critical, 0.8),
    ];
    let alerts = generator.generate(&violations, &context());

    assert_eq!(alerts.len(), 2);
    assert!(recorder.dispatches().is_empty());
}

#[test]
fn test_action_failure_is_contained() {
    // Given a rule with a failing email action and a healthy webhook action
    let sink = RecordingSink::failing_on(ActionChannel::Email);
    let recorder = sink.clone();
    let generator = AlertGenerator::new(Arc::new(sink)).with_rule(
        AlertRule::critical_alerts()
            .with_action(RuleAction::new(ActionChannel::Email))
            .with_action(RuleAction::new(ActionChannel::Webhook)),
    );

    // When a critical batch is generated
    let violations = vec![violation("c1", "pe_ratio", Severity::Critical, 25.0)];
    let alerts = generator.generate(&violations, &context());

    // Then the batch is intact and the surviving action still ran
    assert_eq!(alerts.len(), 1);
    let dispatches = recorder.dispatches();
    assert_eq!(dispatches.len(), 1);
    assert_eq!(dispatches[0].channel, ActionChannel::Webhook);
}

#[test]
fn test_disabled_action_is_skipped() {
    let sink = RecordingSink::new();
    let recorder = sink.clone();
    let generator = AlertGenerator::new(Arc::new(sink)).with_rule(
        AlertRule::critical_alerts()
            .with_action(RuleAction::new(ActionChannel::Email).disabled())
            .with_action(RuleAction::new(ActionChannel::Sms)),
    );

    generator.generate(
        &[violation("c1", "pe_ratio", Severity::Critical, 25.0)],
        &context(),
    );

    let dispatches = recorder.dispatches();
    assert_eq!(dispatches.len(), 1);
    assert_eq!(dispatches[0].channel, ActionChannel::Sms);
}

#[test]
fn test_inactive_rule_never_fires() {
    let sink = RecordingSink::new();
    let recorder = sink.clone();
    let generator = AlertGenerator::new(Arc::new(sink)).with_rule(
        AlertRule::critical_alerts()
            .with_action(RuleAction::new(ActionChannel::Email))
            .with_active(false),
    );

    generator.generate(
        &[violation("c1", "pe_ratio", Severity::Critical, 25.0)],
        &context(),
    );

    assert!(recorder.dispatches().is_empty());
}

#[test]
fn test_disabled_generator_still_returns_alerts() {
    // Given dispatch is switched off entirely
    let sink = RecordingSink::new();
    let recorder = sink.clone();
    let generator = AlertGenerator::new(Arc::new(sink))
        .with_enabled(false)
        .with_rule(AlertRule::critical_alerts().with_action(RuleAction::new(ActionChannel::Email)));

    // When generating
    let alerts = generator.generate(
        &[violation("c1", "pe_ratio", Severity::Critical, 25.0)],
        &context(),
    );

    // Then alerts are still produced, nothing is dispatched
    assert_eq!(alerts.len(), 1);
    assert!(recorder.dispatches().is_empty());
}

#[test]
fn test_cooldown_suppresses_repeat_dispatch() {
    // Given a rule with a one-minute cooldown
    let sink = RecordingSink::new();
    let recorder = sink.clone();
    let generator = AlertGenerator::new(Arc::new(sink))
        .with_cooldown(Duration::from_secs(60))
        .with_rule(
            AlertRule::attention_alerts().with_action(RuleAction::new(ActionChannel::Email)),
        );
    let violations = vec![violation("c1", "pe_ratio", Severity::Critical, 25.0)];

    // When two batches arrive back to back
    generator.generate(&violations, &context());
    generator.generate(&violations, &context());

    // Then only the first one is dispatched
    assert_eq!(recorder.dispatches().len(), 1);
}

#[test]
fn test_zero_cooldown_disables_suppression() {
    let sink = RecordingSink::new();
    let recorder = sink.clone();
    let generator = AlertGenerator::new(Arc::new(sink))
        .with_cooldown(Duration::ZERO)
        .with_rule(
            AlertRule::critical_alerts().with_action(RuleAction::new(ActionChannel::Email)),
        );
    let violations = vec![violation("c1", "pe_ratio", Severity::Critical, 25.0)];

    generator.generate(&violations, &context());
    generator.generate(&violations, &context());

    assert_eq!(recorder.dispatches().len(), 2);
}

#[test]
fn test_rule_with_no_conditions_matches_whole_batch() {
    let violations = vec![
        violation("c1", "pe_ratio", Severity::Critical, 25.0),
        violation("c2", "debt_ratio", Severity::Info, 0.8),
    ];
    let sink = RecordingSink::new();
    let generator = AlertGenerator::new(Arc::new(sink));
    let alerts = generator.generate(&violations, &context());

    let rule = AlertRule::new("all", "Everything", Severity::Info);
    assert_eq!(rule.matching_subset(&alerts).len(), 2);
}

#[test]
fn test_value_condition_reads_selected_field() {
    let sink = RecordingSink::new();
    let generator = AlertGenerator::new(Arc::new(sink));
    let alerts = generator.generate(
        &[violation("c1", "pe_ratio", Severity::Warning, 25.0)],
        &context(),
    );

    let on_actual = AlertRule::new("big", "Large actuals", Severity::Info).with_condition(
        RuleCondition::Value {
            field: ConditionField::ActualValue,
            operator: Operator::Gt,
            value: 24.0,
        },
    );
    let on_expected = AlertRule::new("small", "Small expectations", Severity::Info)
        .with_condition(RuleCondition::Value {
            field: ConditionField::ExpectedValue,
            operator: Operator::Gt,
            value: 24.0,
        });

    assert_eq!(on_actual.matching_subset(&alerts).len(), 1);
    assert!(on_expected.matching_subset(&alerts).is_empty());
}

#[test]
fn test_rule_condition_wire_form() {
    let condition = RuleCondition::Severity {
        operator: Operator::Ge,
        level: Severity::Critical,
    };
    let json = serde_json::to_value(&condition).unwrap();
    assert_eq!(json["type"], "severity");
    assert_eq!(json["operator"], ">=");
    assert_eq!(json["level"], "critical");

    let parsed: RuleCondition = serde_json::from_str(
        r#"{"type":"violationCount","operator":">=","count":3}"#,
    )
    .unwrap();
    assert_eq!(
        parsed,
        RuleCondition::ViolationCount {
            operator: Operator::Ge,
            count: 3,
        }
    );

    // actions default to enabled with an empty config bag
    let action: RuleAction = serde_json::from_str(r#"{"channel":"webhook"}"#).unwrap();
    assert!(action.enabled);
    assert!(action.config.is_empty());
}

#[test]
fn test_rule_descriptions_read_naturally() {
    assert_eq!(
        AlertRule::critical_alerts().description(),
        "severity >= CRITICAL"
    );
    assert_eq!(
        AlertRule::violation_flood(5).description(),
        "violation count >= 5"
    );
    let value = RuleCondition::Value {
        field: ConditionField::ActualValue,
        operator: Operator::Gt,
        value: 2.5,
    };
    assert_eq!(value.description(), "actual value > 2.5");
    assert_eq!(
        AlertRule::new("all", "Everything", Severity::Info).description(),
        "matches every alert"
    );
}

#[test]
fn test_multi_sink_fans_out_to_every_sink() {
    let first = RecordingSink::new();
    let second = RecordingSink::failing_on(ActionChannel::Email);
    let third = RecordingSink::new();
    let multi = MultiSink::new()
        .add_sink(first.clone())
        .add_sink(second)
        .add_sink(third.clone());

    let generator = AlertGenerator::new(Arc::new(LogSink::new()));
    let alerts = generator.generate(
        &[violation("c1", "pe_ratio", Severity::Critical, 25.0)],
        &context(),
    );

    // the middle sink fails but the others still receive the dispatch
    let result = multi.send_email(&ActionConfig::new(), &alerts, &context());
    assert!(matches!(result, Err(NotifyError::Delivery { .. })));
    assert_eq!(first.dispatches().len(), 1);
    assert_eq!(third.dispatches().len(), 1);
}

/// Inner sink that signals entry and then blocks until released, to make
/// queue saturation deterministic.
struct GateSink {
    started: Sender<()>,
    gate: Receiver<()>,
    inner: RecordingSink,
}

impl NotificationSink for GateSink {
    fn send_email(
        &self,
        config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        self.started.send(()).unwrap();
        self.gate.recv().unwrap();
        self.inner.send_email(config, alerts, context)
    }

    fn send_webhook(
        &self,
        config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        self.inner.send_webhook(config, alerts, context)
    }

    fn send_sms(
        &self,
        config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        self.inner.send_sms(config, alerts, context)
    }

    fn send_chat(
        &self,
        config: &ActionConfig,
        alerts: &[Alert],
        context: &AlertContext,
    ) -> Result<(), NotifyError> {
        self.inner.send_chat(config, alerts, context)
    }
}

#[test]
fn test_queued_sink_delivers_before_shutdown_returns() {
    let recorder = RecordingSink::new();
    let queued = QueuedSink::new(Arc::new(recorder.clone()), 16);

    let generator = AlertGenerator::new(Arc::new(LogSink::new()));
    let alerts = generator.generate(
        &[violation("c1", "pe_ratio", Severity::Critical, 25.0)],
        &context(),
    );

    queued
        .send_email(&ActionConfig::new(), &alerts, &context())
        .unwrap();
    queued
        .send_chat(&ActionConfig::new(), &alerts, &context())
        .unwrap();
    queued.shutdown();

    let dispatches = recorder.dispatches();
    assert_eq!(dispatches.len(), 2);
    assert_eq!(dispatches[0].channel, ActionChannel::Email);
    assert_eq!(dispatches[1].channel, ActionChannel::Chat);
}

#[test]
fn test_queued_sink_reports_saturation_instead_of_blocking() {
    let recorder = RecordingSink::new();
    let (started_tx, started_rx) = unbounded();
    let (release_tx, release_rx) = unbounded();
    let gate = GateSink {
        started: started_tx,
        gate: release_rx,
        inner: recorder.clone(),
    };
    let queued = QueuedSink::new(Arc::new(gate), 1);

    let generator = AlertGenerator::new(Arc::new(LogSink::new()));
    let alerts = generator.generate(
        &[violation("c1", "pe_ratio", Severity::Critical, 25.0)],
        &context(),
    );
    let config = ActionConfig::new();

    // first dispatch is picked up by the worker, which blocks in the gate
    queued.send_email(&config, &alerts, &context()).unwrap();
    started_rx.recv().unwrap();

    // second fills the single queue slot, third must be rejected
    queued.send_email(&config, &alerts, &context()).unwrap();
    let overflow = queued.send_email(&config, &alerts, &context());
    assert!(matches!(overflow, Err(NotifyError::QueueFull { .. })));

    release_tx.send(()).unwrap();
    release_tx.send(()).unwrap();
    queued.shutdown();
    assert_eq!(recorder.dispatches().len(), 2);
}

#[test]
fn test_store_round_trip_and_listing_order() {
    let mut store = AlertStore::new();
    let generator = AlertGenerator::new(Arc::new(LogSink::new()));

    let first_batch = generator.generate(
        &[violation("c1", "pe_ratio", Severity::Critical, 25.0)],
        &context(),
    );
    let mut second_batch = generator.generate(
        &[violation("c2", "debt_ratio", Severity::Warning, 0.8)],
        &context(),
    );
    // make the second batch strictly newer
    for alert in &mut second_batch {
        alert.created_at = alert.created_at + ChronoDuration::seconds(10);
    }

    store.insert_batch(first_batch.clone());
    store.insert_batch(second_batch.clone());
    assert_eq!(store.len(), 2);

    let listed = store.list(&AlertFilter::new());
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].id, second_batch[0].id);
    assert_eq!(listed[1].id, first_batch[0].id);

    assert!(store.delete(&first_batch[0].id));
    assert!(!store.delete(&first_batch[0].id));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_store_acknowledge_is_idempotent() {
    let mut store = AlertStore::new();
    let generator = AlertGenerator::new(Arc::new(LogSink::new()));
    let alerts = generator.generate(
        &[violation("c1", "pe_ratio", Severity::Critical, 25.0)],
        &context(),
    );
    let id = alerts[0].id.clone();
    store.insert_batch(alerts);

    assert!(store.acknowledge(&id, "analyst-a"));
    let first_ack = store.get(&id).unwrap().acknowledged_at;
    assert!(first_ack.is_some());
    assert_eq!(
        store.get(&id).unwrap().acknowledged_by.as_deref(),
        Some("analyst-a")
    );

    // a second acknowledgement overwrites who and when
    assert!(store.acknowledge(&id, "analyst-b"));
    assert_eq!(
        store.get(&id).unwrap().acknowledged_by.as_deref(),
        Some("analyst-b")
    );
    assert!(store.get(&id).unwrap().is_acknowledged);

    assert!(!store.acknowledge(&AlertId::from("missing"), "analyst-a"));
}

#[test]
fn test_store_bulk_acknowledge_counts_known_ids() {
    let mut store = AlertStore::new();
    let generator = AlertGenerator::new(Arc::new(LogSink::new()));
    let alerts = generator.generate(
        &[
            violation("c1", "pe_ratio", Severity::Critical, 25.0),
            violation("c2", "debt_ratio", Severity::Warning, 0.8),
        ],
        &context(),
    );
    let ids = vec![
        alerts[0].id.clone(),
        alerts[1].id.clone(),
        AlertId::from("missing"),
    ];
    store.insert_batch(alerts);

    assert_eq!(store.bulk_acknowledge(&ids, "analyst-a"), 2);
    let unacknowledged = store.list(&AlertFilter::new().acknowledged(false));
    assert!(unacknowledged.is_empty());
}

#[test]
fn test_store_statistics_scoped_by_user() {
    let mut store = AlertStore::new();
    let generator = AlertGenerator::new(Arc::new(LogSink::new()));

    let mine = generator.generate(
        &[
            violation("c1", "pe_ratio", Severity::Critical, 25.0),
            violation("c2", "pe_ratio", Severity::Warning, 24.0),
            violation("c3", "debt_ratio", Severity::Info, 0.8),
        ],
        &AlertContext::new("analysis-1", "user-1"),
    );
    let theirs = generator.generate(
        &[violation("c4", "cash_ratio", Severity::Critical, 0.1)],
        &AlertContext::new("analysis-2", "user-2"),
    );
    let acked = mine[1].id.clone();
    store.insert_batch(mine);
    store.insert_batch(theirs);
    store.acknowledge(&acked, "user-1");

    let stats = store.statistics(Some("user-1"));
    assert_eq!(stats.total_alerts, 3);
    assert_eq!(stats.critical_alerts, 1);
    assert_eq!(stats.warning_alerts, 1);
    assert_eq!(stats.info_alerts, 1);
    assert_eq!(stats.acknowledged_alerts, 1);
    assert_eq!(stats.unacknowledged_alerts, 2);
    assert_eq!(stats.alerts_by_metric.get("pe_ratio"), Some(&2));

    // the daily histogram always spans exactly the trailing week
    assert_eq!(stats.alerts_by_day.len(), 7);
    let today = Utc::now().date_naive().format("%Y-%m-%d").to_string();
    assert_eq!(stats.alerts_by_day.get(&today), Some(&3));
    assert_eq!(stats.alerts_by_day.values().sum::<usize>(), 3);

    let everyone = store.statistics(None);
    assert_eq!(everyone.total_alerts, 4);
    assert_eq!(everyone.critical_alerts, 2);
}

#[test]
fn test_store_statistics_ignore_old_alerts_in_daily_histogram() {
    let mut store = AlertStore::new();
    let generator = AlertGenerator::new(Arc::new(LogSink::new()));
    let mut alerts = generator.generate(
        &[violation("c1", "pe_ratio", Severity::Critical, 25.0)],
        &context(),
    );
    alerts[0].created_at = Utc::now() - ChronoDuration::days(30);
    store.insert_batch(alerts);

    let stats = store.statistics(None);
    // still counted in totals, absent from the 7-day histogram
    assert_eq!(stats.total_alerts, 1);
    assert_eq!(stats.alerts_by_day.values().sum::<usize>(), 0);
}

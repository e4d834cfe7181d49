// alerting/store.rs - In-memory alert store with filtered queries

use super::types::{Alert, AlertFilter, AlertId, AlertStats};
use chrono::{Duration, Utc};
use finwatch_common::constraints::Severity;
use std::collections::{BTreeMap, HashMap};

/// In-memory alert store.
///
/// Owns alert records after generation; queries return owned clones so
/// callers never hold references into the store. Durability stays with
/// the embedding application.
#[derive(Debug, Clone, Default)]
pub struct AlertStore {
    alerts: HashMap<AlertId, Alert>,
}

impl AlertStore {
    pub fn new() -> Self {
        Self {
            alerts: HashMap::new(),
        }
    }

    /// Insert or replace one alert.
    pub fn insert(&mut self, alert: Alert) {
        self.alerts.insert(alert.id.clone(), alert);
    }

    /// Insert a whole generated batch.
    pub fn insert_batch(&mut self, alerts: impl IntoIterator<Item = Alert>) {
        for alert in alerts {
            self.insert(alert);
        }
    }

    pub fn get(&self, id: &AlertId) -> Option<&Alert> {
        self.alerts.get(id)
    }

    /// Alerts matching the filter, newest first. Ties on `created_at`
    /// (alerts from one batch share a timestamp) order by id so repeated
    /// queries agree.
    pub fn list(&self, filter: &AlertFilter) -> Vec<Alert> {
        let mut matching: Vec<Alert> = self
            .alerts
            .values()
            .filter(|alert| filter.matches(alert))
            .cloned()
            .collect();
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        matching
    }

    /// Mark an alert acknowledged.
    ///
    /// Re-acknowledging refreshes the timestamp and the acknowledging
    /// user. Returns `false` for an unknown id.
    pub fn acknowledge(&mut self, id: &AlertId, user: impl Into<String>) -> bool {
        match self.alerts.get_mut(id) {
            Some(alert) => {
                alert.is_acknowledged = true;
                alert.acknowledged_at = Some(Utc::now());
                alert.acknowledged_by = Some(user.into());
                true
            }
            None => false,
        }
    }

    /// Acknowledge a set of alerts; returns how many ids existed.
    pub fn bulk_acknowledge(&mut self, ids: &[AlertId], user: &str) -> usize {
        let mut acknowledged = 0;
        for id in ids {
            if self.acknowledge(id, user) {
                acknowledged += 1;
            }
        }
        acknowledged
    }

    /// Remove one alert. Returns `false` for an unknown id.
    pub fn delete(&mut self, id: &AlertId) -> bool {
        self.alerts.remove(id).is_some()
    }

    pub fn clear(&mut self) {
        self.alerts.clear();
    }

    pub fn len(&self) -> usize {
        self.alerts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alerts.is_empty()
    }

    /// Compute store statistics, optionally scoped to one user.
    ///
    /// `alerts_by_day` always carries exactly the last 7 calendar days
    /// including today, zero-filled; older alerts still count toward the
    /// totals.
    pub fn statistics(&self, user_id: Option<&str>) -> AlertStats {
        let today = Utc::now().date_naive();
        let mut alerts_by_day = BTreeMap::new();
        for offset in 0..7i64 {
            let day = today - Duration::days(offset);
            alerts_by_day.insert(day.format("%Y-%m-%d").to_string(), 0);
        }

        let mut stats = AlertStats {
            alerts_by_day,
            ..AlertStats::default()
        };

        for alert in self.alerts.values() {
            if let Some(user) = user_id {
                if alert.user_id != user {
                    continue;
                }
            }

            stats.total_alerts += 1;
            match alert.severity {
                Severity::Critical => stats.critical_alerts += 1,
                Severity::Warning => stats.warning_alerts += 1,
                Severity::Info => stats.info_alerts += 1,
            }
            if alert.is_acknowledged {
                stats.acknowledged_alerts += 1;
            } else {
                stats.unacknowledged_alerts += 1;
            }

            let day = alert.created_at.date_naive().format("%Y-%m-%d").to_string();
            if let Some(count) = stats.alerts_by_day.get_mut(&day) {
                *count += 1;
            }
            *stats
                .alerts_by_metric
                .entry(alert.metric.clone())
                .or_insert(0) += 1;
        }

        stats
    }
}

// alerting/types.rs - Alert records, query filters, and statistics

use chrono::{DateTime, Utc};
use finwatch_common::constraints::{ConstraintId, Severity};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Unique alert identifier (UUID v4).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AlertId(pub String);

impl AlertId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AlertId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for AlertId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for AlertId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// A persistent record of one constraint violation.
///
/// Alerts carry the enriched message plus enough of the source violation
/// to be read on their own, without going back to the evaluation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: AlertId,
    pub severity: Severity,
    /// Metric name copied from the violation
    pub metric: String,
    /// Enriched message: severity tag, optional company prefix,
    /// violation text, difference suffix
    pub message: String,
    pub actual_value: f64,
    pub expected_value: f64,
    pub is_acknowledged: bool,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub acknowledged_by: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Analysis run this alert came from
    pub analysis_id: String,
    /// Constraint whose violation produced this alert
    pub constraint_id: ConstraintId,
    /// Owner of the analysis run
    pub user_id: String,
}

/// Caller-supplied context for one generation batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertContext {
    pub analysis_id: String,
    pub user_id: String,
    pub document_id: Option<String>,
    pub company_name: Option<String>,
}

impl AlertContext {
    pub fn new(analysis_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            analysis_id: analysis_id.into(),
            user_id: user_id.into(),
            document_id: None,
            company_name: None,
        }
    }

    pub fn with_document(mut self, document_id: impl Into<String>) -> Self {
        self.document_id = Some(document_id.into());
        self
    }

    pub fn with_company(mut self, company_name: impl Into<String>) -> Self {
        self.company_name = Some(company_name.into());
        self
    }
}

/// Filter for alert queries. `None` fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertFilter {
    pub user_id: Option<String>,
    pub severity: Option<Severity>,
    pub is_acknowledged: Option<bool>,
    pub analysis_id: Option<String>,
    /// Inclusive lower bound on `created_at`
    pub from_date: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`
    pub to_date: Option<DateTime<Utc>>,
}

impl AlertFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    pub fn acknowledged(mut self, acknowledged: bool) -> Self {
        self.is_acknowledged = Some(acknowledged);
        self
    }

    pub fn for_analysis(mut self, analysis_id: impl Into<String>) -> Self {
        self.analysis_id = Some(analysis_id.into());
        self
    }

    pub fn from_date(mut self, from: DateTime<Utc>) -> Self {
        self.from_date = Some(from);
        self
    }

    pub fn to_date(mut self, to: DateTime<Utc>) -> Self {
        self.to_date = Some(to);
        self
    }

    /// Check whether an alert passes every set field.
    pub fn matches(&self, alert: &Alert) -> bool {
        if let Some(user_id) = &self.user_id {
            if &alert.user_id != user_id {
                return false;
            }
        }
        if let Some(severity) = self.severity {
            if alert.severity != severity {
                return false;
            }
        }
        if let Some(is_acknowledged) = self.is_acknowledged {
            if alert.is_acknowledged != is_acknowledged {
                return false;
            }
        }
        if let Some(analysis_id) = &self.analysis_id {
            if &alert.analysis_id != analysis_id {
                return false;
            }
        }
        if let Some(from) = self.from_date {
            if alert.created_at < from {
                return false;
            }
        }
        if let Some(to) = self.to_date {
            if alert.created_at > to {
                return false;
            }
        }
        true
    }
}

/// Alert store statistics snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertStats {
    pub total_alerts: usize,
    pub critical_alerts: usize,
    pub warning_alerts: usize,
    pub info_alerts: usize,
    pub acknowledged_alerts: usize,
    pub unacknowledged_alerts: usize,
    /// Counts for the last 7 calendar days keyed by ISO date,
    /// zero-filled so charts always get a full week
    pub alerts_by_day: BTreeMap<String, usize>,
    /// Counts per metric name
    pub alerts_by_metric: HashMap<String, usize>,
}

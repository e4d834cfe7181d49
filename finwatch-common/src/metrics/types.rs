//! Metric and metric-batch types.

use serde::{Deserialize, Serialize};

/// Canonical unit labels emitted by the metric extractors.
///
/// `Metric::unit` stays a free string so unknown units pass through
/// untouched; these constants cover the vocabulary the extractors use.
pub mod units {
    pub const BILLIONS: &str = "billions";
    pub const MILLIONS: &str = "millions";
    pub const THOUSANDS: &str = "thousands";
    pub const PERCENTAGE: &str = "percentage";
    pub const RATIO: &str = "ratio";
    pub const UNITS: &str = "units";
}

/// A single extracted financial metric.
///
/// The same metric name can appear several times in one batch, once per
/// reporting period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metric {
    /// Metric identifier, e.g. "pe_ratio" or "revenue"
    pub name: String,
    /// Numeric value at the scale given by `unit`
    pub value: f64,
    /// Scale or kind of the value (see [`units`])
    pub unit: String,
    /// Reporting period the value refers to, e.g. "FY2024" or "Q3 2024"
    pub period: String,
    /// Where the value was extracted from, e.g. "income_statement"
    pub source: String,
    /// Extraction confidence, clamped to [0.0, 1.0]
    pub confidence: f64,
}

impl Metric {
    /// Create a metric with full confidence and empty provenance fields.
    pub fn new(name: impl Into<String>, value: f64, unit: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            unit: unit.into(),
            period: String::new(),
            source: String::new(),
            confidence: 1.0,
        }
    }

    /// Builder method for the reporting period
    pub fn with_period(mut self, period: impl Into<String>) -> Self {
        self.period = period.into();
        self
    }

    /// Builder method for the extraction source
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Builder method for confidence; values outside [0, 1] are clamped
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        self
    }

    /// Check if the value is expressed as a percentage
    pub fn is_percentage(&self) -> bool {
        self.unit == units::PERCENTAGE
    }
}

/// A read-only batch of metrics from one analysis run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    metrics: Vec<Metric>,
}

impl MetricSet {
    /// Create a batch from already-extracted metrics.
    pub fn new(metrics: Vec<Metric>) -> Self {
        Self { metrics }
    }

    /// All metrics carrying the given name, in batch order.
    pub fn by_name<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Metric> + 'a {
        self.metrics.iter().filter(move |m| m.name == name)
    }

    /// Check if any metric with the given name is present.
    pub fn contains(&self, name: &str) -> bool {
        self.metrics.iter().any(|m| m.name == name)
    }

    /// Iterate over the whole batch.
    pub fn iter(&self) -> std::slice::Iter<'_, Metric> {
        self.metrics.iter()
    }

    pub fn as_slice(&self) -> &[Metric] {
        &self.metrics
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }
}

impl From<Vec<Metric>> for MetricSet {
    fn from(metrics: Vec<Metric>) -> Self {
        Self::new(metrics)
    }
}

impl FromIterator<Metric> for MetricSet {
    fn from_iter<I: IntoIterator<Item = Metric>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_builder() {
        let metric = Metric::new("pe_ratio", 24.5, units::RATIO)
            .with_period("FY2024")
            .with_source("income_statement")
            .with_confidence(0.9);

        assert_eq!(metric.name, "pe_ratio");
        assert_eq!(metric.value, 24.5);
        assert_eq!(metric.period, "FY2024");
        assert_eq!(metric.confidence, 0.9);
        assert!(!metric.is_percentage());
    }

    #[test]
    fn test_confidence_clamped() {
        assert_eq!(Metric::new("roe", 0.18, units::RATIO).with_confidence(1.7).confidence, 1.0);
        assert_eq!(Metric::new("roe", 0.18, units::RATIO).with_confidence(-0.2).confidence, 0.0);
        assert_eq!(
            Metric::new("roe", 0.18, units::RATIO).with_confidence(f64::NAN).confidence,
            0.0
        );
    }

    #[test]
    fn test_by_name_returns_all_periods() {
        let set = MetricSet::new(vec![
            Metric::new("revenue", 394.3, units::BILLIONS).with_period("FY2024"),
            Metric::new("revenue", 365.8, units::BILLIONS).with_period("FY2023"),
            Metric::new("net_income", 97.0, units::BILLIONS).with_period("FY2024"),
        ]);

        let revenues: Vec<_> = set.by_name("revenue").collect();
        assert_eq!(revenues.len(), 2);
        assert_eq!(revenues[0].period, "FY2024");
        assert_eq!(revenues[1].period, "FY2023");

        assert!(set.contains("net_income"));
        assert!(!set.contains("eps"));
        assert_eq!(set.by_name("eps").count(), 0);
    }

    #[test]
    fn test_from_iterator() {
        let set: MetricSet = (1..=3)
            .map(|q| Metric::new("eps", q as f64, units::UNITS).with_period(format!("Q{q} 2024")))
            .collect();
        assert_eq!(set.len(), 3);
    }
}

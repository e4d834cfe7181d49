//! Financial metric data points.
//!
//! Metrics arrive already extracted and normalized from upstream document
//! analysis. The evaluation core treats them as read-only input: nothing in
//! this crate mutates a metric after construction.

mod types;

pub use types::{units, Metric, MetricSet};

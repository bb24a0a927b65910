//! In-memory snapshot storage backing the dashboard charts.
//!
//! A [`Snapshot`] is one timestamped reading of a metric set. Each view
//! owns a [`SlidingWindow`] of recent snapshots, fed by a poll session and
//! seeded with synthetic backfill so charts are never empty on first load.

mod backfill;
mod sanitize;
mod window;

pub use backfill::synthesize;
pub use sanitize::sanitize;
pub use window::SlidingWindow;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One timestamped reading of a metric set. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Unix timestamp in milliseconds.
    pub timestamp: u64,
    /// Metric name to sanitized value.
    pub values: BTreeMap<String, f64>,
}

impl Snapshot {
    pub fn new(timestamp: u64, values: BTreeMap<String, f64>) -> Self {
        Self { timestamp, values }
    }

    pub fn value(&self, metric: &str) -> Option<f64> {
        self.values.get(metric).copied()
    }
}

/// Value range and backfill jitter for one metric.
///
/// The jitter amplitude is configuration rather than a constant so that
/// per-metric tuning does not require code changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSpec {
    pub name: String,
    pub min: f64,
    pub max: f64,
    /// Uniform jitter amplitude applied when synthesizing backfill points.
    pub jitter: f64,
}

impl MetricSpec {
    /// A metric expressed in percent, clamped to `[0, 100]`.
    pub fn percentage(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min: 0.0,
            max: 100.0,
            jitter: 2.5,
        }
    }

    /// A bounded gauge with jitter scaled to the range span.
    pub fn gauge(name: impl Into<String>, min: f64, max: f64) -> Self {
        let span = max - min;
        let jitter = if span.is_finite() {
            (span / 1000.0).abs()
        } else {
            1.0
        };
        Self {
            name: name.into(),
            min,
            max,
            jitter,
        }
    }

    /// A metric with no meaningful bounds. Non-finite readings still
    /// collapse to zero.
    pub fn unbounded(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
            jitter: 1.0,
        }
    }

    pub fn sanitize(&self, value: Option<f64>) -> f64 {
        sanitize(value, self.min, self.max)
    }
}

/// Find the spec for a metric, if one was configured.
pub fn spec_for<'a>(specs: &'a [MetricSpec], name: &str) -> Option<&'a MetricSpec> {
    specs.iter().find(|s| s.name == name)
}

/// Current wall clock as Unix milliseconds.
pub fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

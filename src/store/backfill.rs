use rand::Rng;

use super::{spec_for, MetricSpec, Snapshot};

/// Synthesize a plausible history leading up to `latest`.
///
/// On first load only a single real reading exists, which would render as
/// an empty chart until the window fills. The synthesized points carry the
/// latest real value plus bounded uniform jitter and are indistinguishable
/// from real samples in storage; FIFO eviction flushes them out after
/// `count` real polls.
///
/// Timestamps are strictly increasing, spaced `interval_ms` apart, and all
/// precede the latest reading. Values are not reproducible between calls.
pub fn synthesize(
    latest: &Snapshot,
    specs: &[MetricSpec],
    count: usize,
    interval_ms: u64,
) -> Vec<Snapshot> {
    let interval_ms = interval_ms.max(1);
    let mut rng = rand::thread_rng();
    let mut out = Vec::with_capacity(count);

    for i in 0..count {
        let age = (count - i) as u64 * interval_ms;
        let timestamp = latest.timestamp.saturating_sub(age);

        let values = latest
            .values
            .iter()
            .map(|(name, value)| {
                let spec = spec_for(specs, name)
                    .cloned()
                    .unwrap_or_else(|| MetricSpec::unbounded(name.clone()));
                let amplitude = if spec.jitter.is_finite() {
                    spec.jitter.abs()
                } else {
                    0.0
                };
                let jittered = value + rng.gen_range(-amplitude..=amplitude);
                (name.clone(), spec.sanitize(Some(jittered)))
            })
            .collect();

        out.push(Snapshot::new(timestamp, values));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn latest() -> Snapshot {
        let mut values = BTreeMap::new();
        values.insert("cpu_percent".to_string(), 50.0);
        values.insert("request_rate".to_string(), 900.0);
        Snapshot::new(1_700_000_000_000, values)
    }

    fn specs() -> Vec<MetricSpec> {
        vec![
            MetricSpec::percentage("cpu_percent"),
            MetricSpec::gauge("request_rate", 0.0, 1000.0),
        ]
    }

    #[test]
    fn produces_requested_count() {
        let points = synthesize(&latest(), &specs(), 19, 5000);
        assert_eq!(points.len(), 19);
    }

    #[test]
    fn timestamps_are_strictly_increasing_and_precede_latest() {
        let base = latest();
        let points = synthesize(&base, &specs(), 10, 5000);

        for pair in points.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
        assert!(points.last().unwrap().timestamp < base.timestamp);
        assert_eq!(
            base.timestamp - points.last().unwrap().timestamp,
            5000,
            "newest synthetic point sits one interval before the reading"
        );
    }

    #[test]
    fn values_stay_within_metric_bounds() {
        // Jitter near a bound must not escape the metric's range.
        let mut values = BTreeMap::new();
        values.insert("cpu_percent".to_string(), 99.9);
        let base = Snapshot::new(1_700_000_000_000, values);

        let points = synthesize(&base, &specs(), 100, 1000);
        for point in points {
            let v = point.value("cpu_percent").unwrap();
            assert!((0.0..=100.0).contains(&v), "value {v} escaped bounds");
        }
    }

    #[test]
    fn metrics_without_a_spec_are_carried() {
        let mut values = BTreeMap::new();
        values.insert("queue_depth".to_string(), 12.0);
        let base = Snapshot::new(1_700_000_000_000, values);

        let points = synthesize(&base, &[], 5, 1000);
        assert_eq!(points.len(), 5);
        for point in points {
            assert!(point.value("queue_depth").is_some());
        }
    }

    #[test]
    fn zero_count_yields_empty_history() {
        assert!(synthesize(&latest(), &specs(), 0, 1000).is_empty());
    }
}

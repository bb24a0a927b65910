use std::collections::VecDeque;

use super::Snapshot;

/// Bounded FIFO buffer of snapshots backing a chart.
///
/// Insertion order is chronological order; the oldest snapshot is evicted
/// first once the window is full. Each view owns its window exclusively,
/// so appends for one window are never interleaved with appends from
/// another caller.
#[derive(Debug, Clone, Default)]
pub struct SlidingWindow {
    points: VecDeque<Snapshot>,
    capacity: usize,
}

impl SlidingWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a snapshot, evicting from the front until the capacity
    /// invariant holds. A zero capacity degenerates to an always-empty
    /// window.
    pub fn push(&mut self, snapshot: Snapshot) {
        self.points.push_back(snapshot);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    /// Change the capacity in place, evicting the oldest points if the
    /// window shrinks. Existing points survive a grow.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn latest(&self) -> Option<&Snapshot> {
        self.points.back()
    }

    pub fn oldest(&self) -> Option<&Snapshot> {
        self.points.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot> {
        self.points.iter()
    }

    pub fn to_vec(&self) -> Vec<Snapshot> {
        self.points.iter().cloned().collect()
    }

    /// Min and max of one metric over the entire current window. Band
    /// charts draw these as reference lines spanning the full loaded
    /// window rather than a trailing sub-window.
    pub fn span(&self, metric: &str) -> Option<(f64, f64)> {
        let mut bounds: Option<(f64, f64)> = None;

        for point in &self.points {
            if let Some(v) = point.value(metric) {
                bounds = Some(match bounds {
                    Some((lo, hi)) => (lo.min(v), hi.max(v)),
                    None => (v, v),
                });
            }
        }

        bounds
    }
}

//! Periodic fetch-sanitize-append lifecycle for one view.
//!
//! A [`PollSession`] describes the parameters of one periodic-fetch
//! lifecycle. Starting a session performs one cycle immediately so the
//! first data point does not wait a full interval, then repeats on a
//! fixed tick. A [`PollController`] owns at most one live session per
//! logical view and always stops the old session before starting a
//! replacement.

pub(crate) mod stats;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::RwLock;
use ringlog::*;
use tokio::task::JoinHandle;

use crate::store::{spec_for, synthesize, MetricSpec, SlidingWindow, Snapshot};

use stats::*;

/// Boundary for retrieving the current snapshot for a target. Implemented
/// by the backend client and by test doubles.
#[async_trait]
pub trait SnapshotFetcher: Send + Sync + 'static {
    async fn fetch(&self, target: &str) -> anyhow::Result<Snapshot>;
}

/// Parameters of one periodic-fetch lifecycle.
#[derive(Debug, Clone)]
pub struct PollSession {
    /// Application or service identifier passed to the fetcher.
    pub target: String,
    /// Tick spacing. Zero means fetch once and do not schedule repeats.
    pub interval: Duration,
    /// Window capacity for this view.
    pub capacity: usize,
    /// Ranges and jitter configuration for the target's metrics.
    pub specs: Vec<MetricSpec>,
}

/// Handle to a live poll task.
///
/// Stopping is idempotent. Results of fetches already in flight when the
/// session stops are discarded rather than appended.
pub struct PollHandle {
    cancelled: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    pub fn stop(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        self.task.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Start a poll session feeding the given window. The first cycle runs
/// immediately; on its success the window is backfilled to capacity with
/// synthetic history before the real sample lands.
pub fn start(
    session: PollSession,
    fetcher: Arc<dyn SnapshotFetcher>,
    window: Arc<RwLock<SlidingWindow>>,
) -> PollHandle {
    let cancelled = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&cancelled);

    let task = tokio::spawn(async move {
        cycle(&session, fetcher.as_ref(), &window, &flag, true).await;

        if session.interval.is_zero() {
            return;
        }

        let mut ticker = tokio::time::interval(session.interval);
        // the first tick completes immediately and the initial cycle above
        // already covered it
        ticker.tick().await;

        loop {
            ticker.tick().await;
            if flag.load(Ordering::SeqCst) {
                break;
            }
            cycle(&session, fetcher.as_ref(), &window, &flag, false).await;
        }
    });

    PollHandle { cancelled, task }
}

/// One fetch-sanitize-append cycle. A failed fetch is logged and skipped;
/// the window keeps its previous contents and the schedule continues.
async fn cycle(
    session: &PollSession,
    fetcher: &dyn SnapshotFetcher,
    window: &RwLock<SlidingWindow>,
    cancelled: &AtomicBool,
    initial: bool,
) {
    match fetcher.fetch(&session.target).await {
        Ok(raw) => {
            if cancelled.load(Ordering::SeqCst) {
                // the session was stopped or replaced while this fetch was
                // in flight
                POLL_DISCARDED.increment();
                return;
            }

            let snapshot = sanitize_snapshot(raw, &session.specs);
            let mut window = window.write();

            if initial && window.is_empty() && session.capacity > 1 {
                let interval_ms = (session.interval.as_millis() as u64).max(1000);
                for point in synthesize(
                    &snapshot,
                    &session.specs,
                    session.capacity - 1,
                    interval_ms,
                ) {
                    window.push(point);
                }
            }

            window.push(snapshot);
            POLL_CYCLES.increment();
        }
        Err(e) => {
            POLL_FAILURES.increment();
            warn!("poll for {} failed: {e}", session.target);
        }
    }
}

fn sanitize_snapshot(raw: Snapshot, specs: &[MetricSpec]) -> Snapshot {
    let values = raw
        .values
        .into_iter()
        .map(|(name, value)| {
            let sanitized = match spec_for(specs, &name) {
                Some(spec) => spec.sanitize(Some(value)),
                None => crate::store::sanitize(Some(value), f64::NEG_INFINITY, f64::INFINITY),
            };
            (name, sanitized)
        })
        .collect();

    Snapshot::new(raw.timestamp, values)
}

/// Owns at most one live poll task for a logical view.
pub struct PollController {
    fetcher: Arc<dyn SnapshotFetcher>,
    window: Arc<RwLock<SlidingWindow>>,
    handle: Option<PollHandle>,
}

impl PollController {
    pub fn new(fetcher: Arc<dyn SnapshotFetcher>, window: Arc<RwLock<SlidingWindow>>) -> Self {
        Self {
            fetcher,
            window,
            handle: None,
        }
    }

    pub fn window(&self) -> Arc<RwLock<SlidingWindow>> {
        Arc::clone(&self.window)
    }

    /// Replace the running session with one using the new parameters. The
    /// old timer is always stopped before the new one starts, so a view
    /// never has two live timers. Existing window contents are retained
    /// across the restart; only capacity is adjusted.
    pub fn restart(&mut self, session: PollSession) {
        self.stop();
        self.window.write().set_capacity(session.capacity);
        self.handle = Some(start(
            session,
            Arc::clone(&self.fetcher),
            Arc::clone(&self.window),
        ));
    }

    /// Stop polling. Calling this twice, or before any session started,
    /// is a no-op.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.stop();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|h| !h.is_finished())
            .unwrap_or(false)
    }
}

impl Drop for PollController {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::BTreeMap;
    use std::sync::atomic::AtomicUsize;

    struct MockFetcher {
        calls: AtomicUsize,
        delay: Duration,
        /// Calls (1-based) that should fail.
        failures: Mutex<Vec<usize>>,
    }

    impl MockFetcher {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
                failures: Mutex::new(Vec::new()),
            }
        }

        fn with_delay(delay: Duration) -> Self {
            Self {
                delay,
                ..Self::new()
            }
        }

        fn failing_on(calls: Vec<usize>) -> Self {
            Self {
                failures: Mutex::new(calls),
                ..Self::new()
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl SnapshotFetcher for MockFetcher {
        async fn fetch(&self, _target: &str) -> anyhow::Result<Snapshot> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.failures.lock().contains(&call) {
                anyhow::bail!("simulated fetch failure");
            }
            let mut values = BTreeMap::new();
            values.insert("cpu_percent".to_string(), call as f64);
            Ok(Snapshot::new(crate::store::now_ms(), values))
        }
    }

    fn session(interval: Duration, capacity: usize) -> PollSession {
        PollSession {
            target: "overview".to_string(),
            interval,
            capacity,
            specs: vec![MetricSpec::percentage("cpu_percent")],
        }
    }

    fn window(capacity: usize) -> Arc<RwLock<SlidingWindow>> {
        Arc::new(RwLock::new(SlidingWindow::new(capacity)))
    }

    #[tokio::test]
    async fn first_cycle_runs_immediately() {
        let fetcher = Arc::new(MockFetcher::new());
        let window = window(10);

        let handle = start(
            session(Duration::from_secs(60), 10),
            fetcher.clone(),
            Arc::clone(&window),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(fetcher.calls(), 1);
        assert!(!window.read().is_empty());

        handle.stop();
    }

    #[tokio::test]
    async fn zero_interval_fetches_once() {
        let fetcher = Arc::new(MockFetcher::new());
        let window = window(5);

        let handle = start(
            session(Duration::ZERO, 5),
            fetcher.clone(),
            Arc::clone(&window),
        );

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(fetcher.calls(), 1);
        assert!(handle.is_finished());
    }

    #[tokio::test]
    async fn backfills_to_capacity_on_first_success() {
        let fetcher = Arc::new(MockFetcher::new());
        let window = window(10);

        let handle = start(
            session(Duration::from_secs(60), 10),
            fetcher.clone(),
            Arc::clone(&window),
        );

        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.stop();

        let window = window.read();
        assert_eq!(window.len(), 10);

        let timestamps: Vec<u64> = window.iter().map(|s| s.timestamp).collect();
        for pair in timestamps.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[tokio::test]
    async fn stop_is_idempotent_and_halts_polling() {
        let fetcher = Arc::new(MockFetcher::new());
        let window = window(100);

        let handle = start(
            session(Duration::from_millis(20), 100),
            fetcher.clone(),
            Arc::clone(&window),
        );

        tokio::time::sleep(Duration::from_millis(70)).await;
        handle.stop();
        handle.stop();

        let after_stop = fetcher.calls();
        assert!(after_stop >= 1);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(fetcher.calls(), after_stop);
    }

    #[tokio::test]
    async fn failed_cycle_keeps_window_and_schedule() {
        let fetcher = Arc::new(MockFetcher::failing_on(vec![2]));
        let window = window(3);

        let handle = start(
            session(Duration::from_millis(30), 3),
            fetcher.clone(),
            Arc::clone(&window),
        );

        // wait for the initial success plus the failing second cycle
        tokio::time::sleep(Duration::from_millis(45)).await;
        let len_after_failure = window.read().len();
        let latest_after_failure = window.read().latest().cloned();

        assert_eq!(len_after_failure, 3);
        assert_eq!(
            latest_after_failure.and_then(|s| s.value("cpu_percent")),
            Some(1.0),
            "failed cycle must not disturb the previous snapshot"
        );

        // the schedule continues and later cycles append again
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert!(fetcher.calls() >= 3);
        let latest = window.read().latest().and_then(|s| s.value("cpu_percent"));
        assert!(latest.unwrap() > 1.0);

        handle.stop();
    }

    #[tokio::test]
    async fn in_flight_result_is_discarded_after_stop() {
        let fetcher = Arc::new(MockFetcher::with_delay(Duration::from_millis(100)));
        let window = window(10);

        let handle = start(
            session(Duration::from_secs(60), 10),
            fetcher.clone(),
            Arc::clone(&window),
        );

        // stop while the initial fetch is still sleeping
        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.stop();

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(
            window.read().is_empty(),
            "stale in-flight result must not be appended"
        );
    }

    #[tokio::test]
    async fn restart_replaces_the_previous_session() {
        let fetcher = Arc::new(MockFetcher::new());
        let mut controller =
            PollController::new(fetcher.clone(), window(10));

        controller.restart(session(Duration::from_millis(25), 10));
        tokio::time::sleep(Duration::from_millis(10)).await;
        controller.restart(session(Duration::from_millis(25), 4));

        assert!(controller.is_running());
        assert_eq!(controller.window().read().capacity(), 4);

        // exactly one timer remains: calls advance at single-session pace
        let before = fetcher.calls();
        tokio::time::sleep(Duration::from_millis(60)).await;
        let advanced = fetcher.calls() - before;
        assert!(
            (1..=4).contains(&advanced),
            "expected single-session pacing, saw {advanced} fetches"
        );

        controller.stop();
        controller.stop();
        assert!(!controller.is_running());
    }
}

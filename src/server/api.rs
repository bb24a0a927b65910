use std::collections::BTreeMap;
use std::convert::Infallible;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::Stream;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::AppState;
use crate::dashboard::{self, Dashboard};
use crate::poller::PollSession;
use crate::store::Snapshot;
use crate::workbench::{HistoryEntry, QueryExample};

/// API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            status: "success".to_string(),
            data: Some(data),
            error: None,
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Display range selectable per view. Capacity stays within 20 to 144
/// points regardless of span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Range {
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "15m")]
    FifteenMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "24h")]
    OneDay,
}

impl Range {
    pub fn capacity(&self) -> usize {
        match self {
            Range::FiveMinutes => 20,
            Range::FifteenMinutes => 30,
            Range::OneHour => 60,
            Range::SixHours => 144,
            Range::OneDay => 144,
        }
    }

    pub fn interval(&self) -> Duration {
        match self {
            Range::FiveMinutes => Duration::from_secs(15),
            Range::FifteenMinutes => Duration::from_secs(30),
            Range::OneHour => Duration::from_secs(60),
            Range::SixHours => Duration::from_secs(150),
            Range::OneDay => Duration::from_secs(600),
        }
    }
}

impl FromStr for Range {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "5m" => Ok(Range::FiveMinutes),
            "15m" => Ok(Range::FifteenMinutes),
            "1h" => Ok(Range::OneHour),
            "6h" => Ok(Range::SixHours),
            "24h" => Ok(Range::OneDay),
            other => Err(format!("unknown range '{other}'")),
        }
    }
}

/// Full-window min/max reference values for one metric.
#[derive(Debug, Serialize)]
pub struct Band {
    pub min: f64,
    pub max: f64,
}

/// Window contents plus chart metadata for one target.
#[derive(Debug, Serialize)]
pub struct RangePayload {
    pub target: String,
    pub interval_ms: u64,
    pub points: Vec<Snapshot>,
    /// Min/max per metric spanning the entire loaded window.
    pub bands: BTreeMap<String, Band>,
}

fn build_payload(name: &str, state: &AppState) -> Option<RangePayload> {
    let handle = state.targets.get(name)?;
    let window = handle.window.read();

    let mut bands = BTreeMap::new();
    if let Some(latest) = window.latest() {
        for metric in latest.values.keys() {
            if let Some((min, max)) = window.span(metric) {
                bands.insert(metric.clone(), Band { min, max });
            }
        }
    }

    Some(RangePayload {
        target: name.to_string(),
        interval_ms: handle.interval().as_millis() as u64,
        points: window.to_vec(),
        bands,
    })
}

/// Latest window for the overview target
pub async fn overview(State(state): State<Arc<AppState>>) -> Json<ApiResponse<RangePayload>> {
    match build_payload("overview", &state) {
        Some(payload) => Json(ApiResponse::success(payload)),
        None => Json(ApiResponse::error("no overview target configured")),
    }
}

/// Health-check window
pub async fn health(State(state): State<Arc<AppState>>) -> Json<ApiResponse<RangePayload>> {
    match build_payload("health", &state) {
        Some(payload) => Json(ApiResponse::success(payload)),
        None => Json(ApiResponse::error("no health target configured")),
    }
}

#[derive(Debug, Deserialize)]
pub struct RangeParams {
    pub target: String,
    /// Optional display range; selecting a new one restarts the target's
    /// poll session with matching capacity and interval.
    pub range: Option<String>,
}

/// Window contents for a target, optionally switching its display range
pub async fn metrics_range(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RangeParams>,
) -> Json<ApiResponse<RangePayload>> {
    let Some(handle) = state.targets.get(&params.target) else {
        return Json(ApiResponse::error(format!(
            "unknown target '{}'",
            params.target
        )));
    };

    if let Some(range) = &params.range {
        let range = match range.parse::<Range>() {
            Ok(range) => range,
            Err(e) => return Json(ApiResponse::error(e)),
        };

        let mut active = handle.active_range.lock();
        if *active != Some(range) {
            *active = Some(range);
            // the old session is stopped before the replacement starts, so
            // the view never runs two timers
            handle.controller.lock().restart(PollSession {
                target: params.target.clone(),
                interval: range.interval(),
                capacity: range.capacity(),
                specs: handle.specs.clone(),
            });
        }
    }

    match build_payload(&params.target, &state) {
        Some(payload) => Json(ApiResponse::success(payload)),
        None => Json(ApiResponse::error("target disappeared")),
    }
}

#[derive(Debug, Serialize)]
pub struct DashboardInfo {
    pub name: String,
    pub title: String,
}

/// List available dashboards
pub async fn list_dashboards() -> Json<ApiResponse<Vec<DashboardInfo>>> {
    let dashboards = dashboard::all_dashboards()
        .into_iter()
        .map(|d| DashboardInfo {
            name: d.name.to_lowercase(),
            title: d.name,
        })
        .collect();

    Json(ApiResponse::success(dashboards))
}

/// Get a specific dashboard definition
pub async fn get_dashboard(Path(name): Path<String>) -> Json<ApiResponse<Dashboard>> {
    match dashboard::get_dashboard(&name) {
        Some(dashboard) => Json(ApiResponse::success(dashboard)),
        None => Json(ApiResponse::error(format!("dashboard '{name}' not found"))),
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct QueryResponse {
    pub data: Value,
    pub latency_ms: u64,
}

/// Execute an ad hoc query through the workbench
pub async fn execute_query(
    State(state): State<Arc<AppState>>,
    Json(request): Json<QueryRequest>,
) -> Json<ApiResponse<QueryResponse>> {
    match state.workbench.execute(&request.query).await {
        Ok(outcome) => Json(ApiResponse::success(QueryResponse {
            data: outcome.data,
            latency_ms: outcome.latency_ms,
        })),
        Err(e) => Json(ApiResponse::error(e.to_string())),
    }
}

/// The capped execution log, newest first
pub async fn query_history(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<Vec<HistoryEntry>>> {
    Json(ApiResponse::success(state.workbench.history()))
}

/// Wipe the execution log
pub async fn clear_query_history(State(state): State<Arc<AppState>>) -> Json<ApiResponse<()>> {
    state.workbench.clear_history();
    Json(ApiResponse::success(()))
}

/// The example library
pub async fn list_examples(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<Vec<QueryExample>>> {
    Json(ApiResponse::success(
        state.examples.lock().examples().to_vec(),
    ))
}

/// Insert or replace an example
pub async fn save_example(
    State(state): State<Arc<AppState>>,
    Json(example): Json<QueryExample>,
) -> Json<ApiResponse<()>> {
    if example.id.trim().is_empty() || example.query.trim().is_empty() {
        return Json(ApiResponse::error("example id and query are required"));
    }
    state.examples.lock().upsert(example);
    Json(ApiResponse::success(()))
}

/// Restore the shipped example set
pub async fn reset_examples(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<Vec<QueryExample>>> {
    let mut examples = state.examples.lock();
    examples.reset();
    Json(ApiResponse::success(examples.examples().to_vec()))
}

/// Push the latest overview snapshot once per second
pub async fn stream(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let window = state.targets.get("overview").map(|h| Arc::clone(&h.window));

    let stream = futures::stream::unfold(window, |window| async move {
        tokio::time::sleep(Duration::from_secs(1)).await;

        let latest: Option<Snapshot> = window.as_ref().and_then(|w| w.read().latest().cloned());
        let event = Event::default().json_data(&latest).unwrap_or_default();

        Some((Ok::<_, Infallible>(event), window))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Internal counters for the poll and query paths
pub async fn runtime_stats() -> Json<ApiResponse<BTreeMap<String, u64>>> {
    use crate::poller::stats::{POLL_CYCLES, POLL_DISCARDED, POLL_FAILURES};
    use crate::workbench::stats::{QUERY_EXECUTIONS, QUERY_FAILURES};

    let mut stats = BTreeMap::new();
    stats.insert("poll_cycles".to_string(), POLL_CYCLES.value());
    stats.insert("poll_failures".to_string(), POLL_FAILURES.value());
    stats.insert("poll_discarded".to_string(), POLL_DISCARDED.value());
    stats.insert("query_executions".to_string(), QUERY_EXECUTIONS.value());
    stats.insert("query_failures".to_string(), QUERY_FAILURES.value());

    Json(ApiResponse::success(stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ClientError;
    use crate::poller::{PollController, SnapshotFetcher};
    use crate::store::{MetricSpec, SlidingWindow};
    use crate::workbench::{ExampleCatalog, KvStore, MemoryStore, QueryExecutor, Workbench};
    use async_trait::async_trait;
    use parking_lot::{Mutex, RwLock};
    use std::collections::{BTreeMap as Map, HashMap};

    struct StubFetcher;

    #[async_trait]
    impl SnapshotFetcher for StubFetcher {
        async fn fetch(&self, _target: &str) -> anyhow::Result<Snapshot> {
            let mut values = Map::new();
            values.insert("cpu_percent".to_string(), 50.0);
            Ok(Snapshot::new(crate::store::now_ms(), values))
        }
    }

    struct StubExecutor;

    #[async_trait]
    impl QueryExecutor for StubExecutor {
        async fn execute(&self, _query: &str) -> Result<Value, ClientError> {
            Ok(serde_json::json!({ "resultType": "vector" }))
        }
    }

    fn test_state() -> Arc<AppState> {
        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
        let fetcher: Arc<dyn SnapshotFetcher> = Arc::new(StubFetcher);

        let mut targets = HashMap::new();
        let window = Arc::new(RwLock::new(SlidingWindow::new(10)));
        targets.insert(
            "overview".to_string(),
            super::super::TargetHandle {
                controller: Mutex::new(PollController::new(fetcher, Arc::clone(&window))),
                window,
                specs: vec![MetricSpec::percentage("cpu_percent")],
                base_interval: Duration::from_secs(5),
                active_range: Mutex::new(None),
            },
        );

        Arc::new(AppState {
            targets,
            workbench: Workbench::new(Arc::new(StubExecutor), Arc::clone(&store)),
            examples: Mutex::new(ExampleCatalog::load(store)),
        })
    }

    #[test]
    fn range_presets_parse_and_bound_capacity() {
        for raw in ["5m", "15m", "1h", "6h", "24h"] {
            let range: Range = raw.parse().unwrap();
            assert!((20..=144).contains(&range.capacity()));
            assert!(!range.interval().is_zero());
        }
        assert!("2w".parse::<Range>().is_err());
    }

    #[tokio::test]
    async fn unknown_target_is_an_error_response() {
        let state = test_state();
        let response = metrics_range(
            State(state),
            Query(RangeParams {
                target: "nope".to_string(),
                range: None,
            }),
        )
        .await;

        assert_eq!(response.0.status, "error");
    }

    #[tokio::test]
    async fn selecting_a_range_restarts_with_matching_capacity() {
        let state = test_state();

        let response = metrics_range(
            State(Arc::clone(&state)),
            Query(RangeParams {
                target: "overview".to_string(),
                range: Some("5m".to_string()),
            }),
        )
        .await;

        assert_eq!(response.0.status, "success");
        let handle = state.targets.get("overview").unwrap();
        assert_eq!(handle.window.read().capacity(), 20);
        assert!(handle.controller.lock().is_running());
        assert_eq!(handle.interval(), Duration::from_secs(15));
    }

    #[tokio::test]
    async fn empty_query_surfaces_validation_error_without_history() {
        let state = test_state();

        let response = execute_query(
            State(Arc::clone(&state)),
            Json(QueryRequest {
                query: "  ".to_string(),
            }),
        )
        .await;

        assert_eq!(response.0.status, "error");
        assert_eq!(response.0.error.as_deref(), Some("query is empty"));
        assert!(state.workbench.history().is_empty());
    }

    #[tokio::test]
    async fn executed_query_lands_in_history() {
        let state = test_state();

        let response = execute_query(
            State(Arc::clone(&state)),
            Json(QueryRequest {
                query: "up".to_string(),
            }),
        )
        .await;

        assert_eq!(response.0.status, "success");
        assert_eq!(state.workbench.history().len(), 1);
    }

    #[tokio::test]
    async fn dashboard_routes_resolve_definitions() {
        let listed = list_dashboards().await;
        let names: Vec<String> = listed
            .0
            .data
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert!(names.contains(&"overview".to_string()));

        let found = get_dashboard(Path("overview".to_string())).await;
        assert_eq!(found.0.status, "success");

        let missing = get_dashboard(Path("nope".to_string())).await;
        assert_eq!(missing.0.status, "error");
    }
}

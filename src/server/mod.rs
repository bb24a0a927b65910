//! HTTP surface of the viewer.
//!
//! One poll session runs per configured target, feeding a sliding window
//! that the API reads. The workbench and example catalog share the same
//! durable store as the poll layer's session credential.

pub mod api;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::routing::{get, post};
use axum::Router;
use parking_lot::{Mutex, RwLock};
use ringlog::*;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::decompression::RequestDecompressionLayer;

use crate::client::ApiClient;
use crate::config::Config;
use crate::poller::{PollController, PollSession, SnapshotFetcher};
use crate::store::{MetricSpec, SlidingWindow};
use crate::workbench::{ExampleCatalog, FileStore, KvStore, QueryExecutor, Workbench};

use api::Range;

/// Shared application state behind the router.
pub struct AppState {
    pub targets: HashMap<String, TargetHandle>,
    pub workbench: Workbench,
    pub examples: Mutex<ExampleCatalog>,
}

/// Poll session plus window for one logical view.
pub struct TargetHandle {
    pub controller: Mutex<PollController>,
    pub window: Arc<RwLock<SlidingWindow>>,
    pub specs: Vec<MetricSpec>,
    pub base_interval: Duration,
    /// Display range last selected through the API, if any.
    pub active_range: Mutex<Option<Range>>,
}

impl TargetHandle {
    pub fn interval(&self) -> Duration {
        let active = *self.active_range.lock();
        active.map(|r| r.interval()).unwrap_or(self.base_interval)
    }
}

/// Run the viewer until the server exits.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let store: Arc<dyn KvStore> = Arc::new(FileStore::new(&config.storage.dir)?);
    let client = Arc::new(ApiClient::new(&config.backend.base_url, Arc::clone(&store)));

    let mut targets = HashMap::new();

    for target in &config.targets {
        let interval = target.interval()?;
        let specs = target.specs();
        let window = Arc::new(RwLock::new(SlidingWindow::new(target.capacity)));

        let mut controller = PollController::new(
            Arc::clone(&client) as Arc<dyn SnapshotFetcher>,
            Arc::clone(&window),
        );
        controller.restart(PollSession {
            target: target.name.clone(),
            interval,
            capacity: target.capacity,
            specs: specs.clone(),
        });

        info!(
            "polling {} every {}",
            target.name,
            humantime::format_duration(interval)
        );

        targets.insert(
            target.name.clone(),
            TargetHandle {
                controller: Mutex::new(controller),
                window,
                specs,
                base_interval: interval,
                active_range: Mutex::new(None),
            },
        );
    }

    let state = Arc::new(AppState {
        targets,
        workbench: Workbench::new(
            Arc::clone(&client) as Arc<dyn QueryExecutor>,
            Arc::clone(&store),
        ),
        examples: Mutex::new(ExampleCatalog::load(Arc::clone(&store))),
    });

    let app = router(Arc::clone(&state));

    let listener = TcpListener::bind(config.general.listen)
        .await
        .context("failed to bind listener")?;
    let addr = listener.local_addr().context("failed to get local addr")?;

    info!("pulseboard listening on: http://{addr}");

    if config.general.open_browser {
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            if open::that(format!("http://{addr}")).is_err() {
                info!("use your browser to view: http://{addr}");
            }
        });
    }

    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}

/// Create the API router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/overview", get(api::overview))
        .route("/api/metrics/range", get(api::metrics_range))
        .route("/api/health", get(api::health))
        .route("/api/dashboards", get(api::list_dashboards))
        .route("/api/dashboard/{name}", get(api::get_dashboard))
        .route("/api/query", post(api::execute_query))
        .route(
            "/api/query/history",
            get(api::query_history).delete(api::clear_query_history),
        )
        .route(
            "/api/query/examples",
            get(api::list_examples).post(api::save_example),
        )
        .route("/api/query/examples/reset", post(api::reset_examples))
        .route("/api/stream", get(api::stream))
        .route("/api/admin/stats", get(api::runtime_stats))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(RequestDecompressionLayer::new())
                .layer(CompressionLayer::new()),
        )
}

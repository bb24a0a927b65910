use std::sync::Arc;

use lazy_static::lazy_static;
use ringlog::*;
use serde::{Deserialize, Serialize};

use super::kv::KvStore;

pub(crate) const EXAMPLES_KEY: &str = "pulseboard.query_examples";

/// One entry in the workbench's example library.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryExample {
    pub id: String,
    pub name: String,
    pub query: String,
    pub description: String,
}

lazy_static! {
    static ref DEFAULT_EXAMPLES: Vec<QueryExample> = vec![
        QueryExample {
            id: "request-rate".to_string(),
            name: "Request rate".to_string(),
            query: "sum(irate(http_requests_total[1m]))".to_string(),
            description: "Requests per second across all instances".to_string(),
        },
        QueryExample {
            id: "error-rate".to_string(),
            name: "Error rate".to_string(),
            query: "sum(irate(http_requests_total{status=~\"5..\"}[1m])) / sum(irate(http_requests_total[1m])) * 100".to_string(),
            description: "Share of requests answered with a 5xx, in percent".to_string(),
        },
        QueryExample {
            id: "p99-latency".to_string(),
            name: "P99 latency".to_string(),
            query: "histogram_quantile(0.99, http_request_duration_seconds[5m])".to_string(),
            description: "Tail latency for request handling".to_string(),
        },
        QueryExample {
            id: "cpu-busy".to_string(),
            name: "CPU busy".to_string(),
            query: "avg(cpu_percent)".to_string(),
            description: "Mean CPU utilization across hosts".to_string(),
        },
        QueryExample {
            id: "heap-used".to_string(),
            name: "Heap used".to_string(),
            query: "jvm_heap_used_bytes / jvm_heap_max_bytes * 100".to_string(),
            description: "Heap occupancy of the monitored application".to_string(),
        },
        QueryExample {
            id: "gc-pause".to_string(),
            name: "GC pause time".to_string(),
            query: "sum(irate(jvm_gc_pause_seconds_sum[5m]))".to_string(),
            description: "Seconds per second spent in garbage collection".to_string(),
        },
    ];
}

/// Seed set shipped with the workbench.
pub fn default_examples() -> Vec<QueryExample> {
    DEFAULT_EXAMPLES.clone()
}

/// User-editable example library, persisted separately from the history
/// log and resettable to the shipped defaults.
pub struct ExampleCatalog {
    store: Arc<dyn KvStore>,
    examples: Vec<QueryExample>,
}

impl ExampleCatalog {
    /// Load the persisted catalog, falling back to the defaults when the
    /// stored value is absent or unparseable.
    pub fn load(store: Arc<dyn KvStore>) -> Self {
        let examples = store
            .get(EXAMPLES_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_else(default_examples);

        Self { store, examples }
    }

    pub fn examples(&self) -> &[QueryExample] {
        &self.examples
    }

    /// Insert or replace an example by id.
    pub fn upsert(&mut self, example: QueryExample) {
        match self.examples.iter_mut().find(|e| e.id == example.id) {
            Some(existing) => *existing = example,
            None => self.examples.push(example),
        }
        self.persist();
    }

    /// Remove an example by id. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.examples.len();
        self.examples.retain(|e| e.id != id);
        let removed = self.examples.len() != before;
        if removed {
            self.persist();
        }
        removed
    }

    /// Restore the shipped default set.
    pub fn reset(&mut self) {
        self.examples = default_examples();
        self.persist();
    }

    fn persist(&self) {
        match serde_json::to_string(&self.examples) {
            Ok(raw) => {
                if let Err(e) = self.store.set(EXAMPLES_KEY, &raw) {
                    warn!("failed to persist query examples: {e}");
                }
            }
            Err(e) => warn!("failed to serialize query examples: {e}"),
        }
    }
}

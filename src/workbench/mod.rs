//! Ad hoc query workbench: execution, capped history log, example library.
//!
//! This is a side path next to the polling loop. Executions are
//! user-triggered and sequential; the only durable state is two
//! independent key-value entries, one for the history log and one for the
//! example catalog.

pub mod catalog;
pub mod history;
pub mod kv;
pub(crate) mod stats;

pub use catalog::{default_examples, ExampleCatalog, QueryExample};
pub use history::{HistoryEntry, QueryHistory, MAX_HISTORY};
pub use kv::{FileStore, KvStore, MemoryStore};

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use thiserror::Error;

use crate::client::ClientError;

use stats::*;

/// Boundary that actually evaluates a query. The production implementation
/// posts to the backend with a bounded wait; tests substitute doubles.
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn execute(&self, query: &str) -> Result<Value, ClientError>;
}

#[derive(Debug, Error)]
pub enum WorkbenchError {
    /// Caught before any network call; not recorded in the history log.
    #[error("query is empty")]
    EmptyQuery,
    #[error(transparent)]
    Execution(#[from] ClientError),
}

/// Successful execution result handed back for rendering.
#[derive(Debug, Clone)]
pub struct QueryOutcome {
    pub data: Value,
    pub latency_ms: u64,
}

pub struct Workbench {
    executor: Arc<dyn QueryExecutor>,
    history: Mutex<QueryHistory>,
}

impl Workbench {
    pub fn new(executor: Arc<dyn QueryExecutor>, store: Arc<dyn KvStore>) -> Self {
        Self {
            executor,
            history: Mutex::new(QueryHistory::load(store)),
        }
    }

    /// Run an ad hoc query, recording outcome and wall time in the capped
    /// history log. Success and failure both count toward the log; an
    /// empty query is rejected up front and leaves no entry.
    pub async fn execute(&self, query: &str) -> Result<QueryOutcome, WorkbenchError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(WorkbenchError::EmptyQuery);
        }

        QUERY_EXECUTIONS.increment();

        let start = Instant::now();
        let result = self.executor.execute(query).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        if result.is_err() {
            QUERY_FAILURES.increment();
        }

        self.history.lock().record(query, result.is_ok(), latency_ms);

        match result {
            Ok(data) => Ok(QueryOutcome { data, latency_ms }),
            Err(e) => Err(e.into()),
        }
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.history.lock().entries().to_vec()
    }

    pub fn clear_history(&self) {
        self.history.lock().clear();
    }
}

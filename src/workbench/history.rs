use std::sync::Arc;

use ringlog::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::kv::KvStore;
use crate::store::now_ms;

/// Capped length of the persisted execution log.
pub const MAX_HISTORY: usize = 20;

pub(crate) const HISTORY_KEY: &str = "pulseboard.query_history";

/// A record of one ad hoc query execution. Failed executions are recorded
/// too; they are audit trail, not noise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub query: String,
    /// Unix timestamp in milliseconds.
    pub submitted_at: u64,
    pub succeeded: bool,
    pub latency_ms: u64,
}

/// Newest-first execution log, capped at [`MAX_HISTORY`] entries and
/// mirrored to the key-value store under a fixed key.
pub struct QueryHistory {
    store: Arc<dyn KvStore>,
    entries: Vec<HistoryEntry>,
}

impl QueryHistory {
    /// Load the persisted log. Missing or unparseable data degrades to an
    /// empty log.
    pub fn load(store: Arc<dyn KvStore>) -> Self {
        let entries = store
            .get(HISTORY_KEY)
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();

        Self { store, entries }
    }

    /// Prepend an entry, evict past the cap, persist.
    pub fn record(&mut self, query: &str, succeeded: bool, latency_ms: u64) -> HistoryEntry {
        let entry = HistoryEntry {
            id: Uuid::new_v4(),
            query: query.to_string(),
            submitted_at: now_ms(),
            succeeded,
            latency_ms,
        };

        self.entries.insert(0, entry.clone());
        self.entries.truncate(MAX_HISTORY);
        self.persist();

        entry
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Wipe the in-memory mirror and the persisted key. Idempotent.
    pub fn clear(&mut self) {
        self.entries.clear();
        if let Err(e) = self.store.remove(HISTORY_KEY) {
            warn!("failed to clear persisted query history: {e}");
        }
    }

    fn persist(&self) {
        match serde_json::to_string(&self.entries) {
            Ok(raw) => {
                if let Err(e) = self.store.set(HISTORY_KEY, &raw) {
                    warn!("failed to persist query history: {e}");
                }
            }
            Err(e) => warn!("failed to serialize query history: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workbench::kv::MemoryStore;

    #[test]
    fn record_prepends_newest_first() {
        let store = Arc::new(MemoryStore::new());
        let mut history = QueryHistory::load(store);

        history.record("sum(irate(http_requests_total[1m]))", true, 12);
        history.record("avg(cpu_percent)", false, 30_000);

        let entries = history.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].query, "avg(cpu_percent)");
        assert!(!entries[0].succeeded);
        assert_eq!(entries[1].query, "sum(irate(http_requests_total[1m]))");
    }

    #[test]
    fn cap_evicts_oldest_entries() {
        let store = Arc::new(MemoryStore::new());
        let mut history = QueryHistory::load(store);

        for i in 0..30 {
            history.record(&format!("query_{i}"), true, i);
        }

        assert_eq!(history.entries().len(), MAX_HISTORY);
        assert_eq!(history.entries()[0].query, "query_29");
        assert_eq!(history.entries()[MAX_HISTORY - 1].query, "query_10");
    }

    #[test]
    fn persists_and_reloads_across_instances() {
        let store = Arc::new(MemoryStore::new());

        {
            let mut history = QueryHistory::load(Arc::clone(&store) as Arc<dyn KvStore>);
            history.record("up", true, 5);
        }

        let reloaded = QueryHistory::load(store);
        assert_eq!(reloaded.entries().len(), 1);
        assert_eq!(reloaded.entries()[0].query, "up");
    }

    #[test]
    fn corrupt_persisted_data_loads_as_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(HISTORY_KEY, "{not json").unwrap();

        let history = QueryHistory::load(store);
        assert!(history.entries().is_empty());
    }

    #[test]
    fn clear_wipes_memory_and_store() {
        let store = Arc::new(MemoryStore::new());
        let mut history = QueryHistory::load(Arc::clone(&store) as Arc<dyn KvStore>);

        history.record("up", true, 5);
        history.clear();
        history.clear();

        assert!(history.entries().is_empty());
        assert!(store.get(HISTORY_KEY).is_none());
    }
}

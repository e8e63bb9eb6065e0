//! Flat in-memory store of scalar metric records across runs.
//!
//! Pure storage with a composite key and last-write-wins semantics; no
//! computation happens here. Concurrent writers must serialize access
//! externally.

use crate::metrics::MetricName;
use serde::{Deserialize, Serialize};

/// Composite key identifying one scalar metric of one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MetricKey {
    /// Task name
    pub task: String,
    /// Few-shot count condition
    pub num_fewshot: u32,
    /// Stratification flag condition
    pub stratified: bool,
    /// Metric name
    pub metric: MetricName,
}

/// One stored metric value with its full key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRecord {
    pub key: MetricKey,
    pub value: f64,
}

/// Flat collection of metric records, keyed by [`MetricKey`].
///
/// Insertion order is preserved for records with distinct keys, which makes
/// first-seen orderings downstream deterministic.
#[derive(Debug, Default)]
pub struct ResultStore {
    records: Vec<MetricRecord>,
}

impl ResultStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert one record. A record with an identical key overwrites the
    /// earlier value in place, keeping its original position.
    pub fn put(&mut self, key: MetricKey, value: f64) {
        if let Some(existing) = self.records.iter_mut().find(|r| r.key == key) {
            existing.value = value;
        } else {
            self.records.push(MetricRecord { key, value });
        }
    }

    /// All records matching the optional task and metric filters, each
    /// carrying its full key, in insertion order.
    #[must_use]
    pub fn query(&self, task: Option<&str>, metric: Option<MetricName>) -> Vec<&MetricRecord> {
        self.records
            .iter()
            .filter(|r| task.map_or(true, |t| r.key.task == t))
            .filter(|r| metric.map_or(true, |m| r.key.metric == m))
            .collect()
    }

    /// Total number of stored records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in insertion order.
    #[must_use]
    pub fn records(&self) -> &[MetricRecord] {
        &self.records
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    fn key(task: &str, num_fewshot: u32, stratified: bool, metric: MetricName) -> MetricKey {
        MetricKey {
            task: task.to_string(),
            num_fewshot,
            stratified,
            metric,
        }
    }

    #[test]
    fn test_put_and_query_by_task_and_metric() {
        let mut store = ResultStore::new();
        store.put(key("germeval2017", 0, false, MetricName::Acc), 0.5);
        store.put(key("germeval2017", 5, false, MetricName::Acc), 0.6);
        store.put(key("germeval2017", 5, true, MetricName::Acc), 0.7);
        store.put(key("germeval2017", 5, true, MetricName::F1), 0.4);
        store.put(key("other", 5, true, MetricName::Acc), 0.9);

        let records = store.query(Some("germeval2017"), Some(MetricName::Acc));
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.key.task == "germeval2017"));
        assert!(records.iter().all(|r| r.key.metric == MetricName::Acc));
    }

    #[test]
    fn test_query_without_filters_returns_all() {
        let mut store = ResultStore::new();
        store.put(key("a", 0, false, MetricName::Acc), 0.1);
        store.put(key("b", 0, false, MetricName::F1), 0.2);

        assert_eq!(store.query(None, None).len(), 2);
        assert_eq!(store.query(Some("a"), None).len(), 1);
        assert_eq!(store.query(None, Some(MetricName::F1)).len(), 1);
    }

    #[test]
    fn test_duplicate_key_overwrites() {
        let mut store = ResultStore::new();
        let k = key("germeval2017", 5, true, MetricName::F1);
        store.put(k.clone(), 0.41);
        store.put(k.clone(), 0.47);

        assert_eq!(store.len(), 1);
        let records = store.query(Some("germeval2017"), Some(MetricName::F1));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].value, 0.47);
        // The old value is gone entirely.
        assert!(!store.records().iter().any(|r| r.value == 0.41));
    }

    #[test]
    fn test_overwrite_keeps_insertion_position() {
        let mut store = ResultStore::new();
        store.put(key("a", 0, false, MetricName::Acc), 0.1);
        store.put(key("b", 0, false, MetricName::Acc), 0.2);
        store.put(key("a", 0, false, MetricName::Acc), 0.3);

        let tasks: Vec<_> = store.records().iter().map(|r| r.key.task.as_str()).collect();
        assert_eq!(tasks, ["a", "b"]);
        assert_eq!(store.records()[0].value, 0.3);
    }

    #[test]
    fn test_keys_differing_in_one_field_are_distinct() {
        let mut store = ResultStore::new();
        store.put(key("t", 5, false, MetricName::Acc), 0.1);
        store.put(key("t", 5, true, MetricName::Acc), 0.2);
        store.put(key("t", 10, false, MetricName::Acc), 0.3);
        store.put(key("t", 5, false, MetricName::F1), 0.4);

        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_empty_store() {
        let store = ResultStore::new();
        assert!(store.is_empty());
        assert!(store.query(Some("missing"), None).is_empty());
    }
}

//! Result persistence and report exploration.
//!
//! A results file is a top-level JSON mapping from composite run identifier
//! to a mapping of metric name to scalar value. The pipeline is pure and
//! parameterized end to end: `load -> normalize -> series -> render`, so
//! every stage is testable without an interactive surface.

use crate::metrics::{MetricName, UnknownMetric};
use crate::store::{MetricKey, ResultStore};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tabled::{Table, Tabled};
use thiserror::Error;

/// Errors that can occur while loading or normalizing results
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Results file not found: {0}")]
    NotFound(String),

    #[error("Failed to parse results file: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Malformed run identifier: {0}")]
    MalformedRunId(String),

    #[error("Run {run}: {source}")]
    UnknownMetric {
        run: String,
        source: UnknownMetric,
    },

    #[error("Non-finite metric value for {run}/{metric}")]
    NonFiniteValue { run: String, metric: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Run-identifier token marking a stratified run. Its absence in the final
/// token position means an unstratified (random-shot) run.
const STRATIFIED_TOKEN: &str = "stratified";
const RANDOM_TOKEN: &str = "random";

/// Composite run identifier: task name plus experiment condition.
///
/// The `_`-delimited wire form is load-bearing: task name is the first
/// token, the few-shot count is the third token from the end, and the
/// stratification flag is the last token. The canonical encoding
/// `{task}_{n}_shots_{stratified|random}` satisfies all three positions.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RunId {
    pub task: String,
    pub num_fewshot: u32,
    pub stratified: bool,
}

impl RunId {
    /// Build a run id for a task under an experiment condition.
    #[must_use]
    pub fn new(task: &str, num_fewshot: u32, stratified: bool) -> Self {
        Self {
            task: task.to_string(),
            num_fewshot,
            stratified,
        }
    }

    /// Expand into one metric key per metric value.
    #[must_use]
    pub fn metric_key(&self, metric: MetricName) -> MetricKey {
        MetricKey {
            task: self.task.clone(),
            num_fewshot: self.num_fewshot,
            stratified: self.stratified,
            metric,
        }
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let flag = if self.stratified {
            STRATIFIED_TOKEN
        } else {
            RANDOM_TOKEN
        };
        write!(f, "{}_{}_shots_{}", self.task, self.num_fewshot, flag)
    }
}

impl FromStr for RunId {
    type Err = ReportError;

    /// Positional parse: first token, third-from-last token, last token.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tokens: Vec<&str> = s.split('_').collect();
        if tokens.len() < 4 {
            return Err(ReportError::MalformedRunId(s.to_string()));
        }

        let task = tokens[0].to_string();
        let num_fewshot = tokens[tokens.len() - 3]
            .parse::<u32>()
            .map_err(|_| ReportError::MalformedRunId(s.to_string()))?;
        let stratified = tokens[tokens.len() - 1] == STRATIFIED_TOKEN;

        Ok(Self {
            task,
            num_fewshot,
            stratified,
        })
    }
}

/// Persisted results: run identifier -> (metric name -> value).
///
/// `BTreeMap` keeps the file layout stable across writes; first-seen
/// ordering for the report comes from normalization order, which is the
/// map's sorted key order and therefore deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResultsFile {
    pub runs: BTreeMap<String, BTreeMap<String, f64>>,
}

impl ResultsFile {
    /// Load a results file from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or not valid JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ReportError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ReportError::NotFound(path.display().to_string()));
        }
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write the results file as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error on serialization or IO failure.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ReportError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Insert one run's metric values, replacing any earlier run with the
    /// same identifier wholesale.
    pub fn insert(&mut self, run_id: &RunId, values: BTreeMap<String, f64>) {
        self.runs.insert(run_id.to_string(), values);
    }

    /// Flatten into a [`ResultStore`], parsing each run identifier.
    ///
    /// # Errors
    ///
    /// Returns an error on a malformed run identifier, an unknown metric
    /// name, or a non-finite value.
    pub fn normalize(&self) -> Result<ResultStore, ReportError> {
        let mut store = ResultStore::new();

        for (run, metrics) in &self.runs {
            let run_id: RunId = run.parse()?;
            for (name, &value) in metrics {
                let metric =
                    name.parse::<MetricName>()
                        .map_err(|source| ReportError::UnknownMetric {
                            run: run.clone(),
                            source,
                        })?;
                if !value.is_finite() {
                    return Err(ReportError::NonFiniteValue {
                        run: run.clone(),
                        metric: name.clone(),
                    });
                }
                store.put(run_id.metric_key(metric), value);
            }
        }

        Ok(store)
    }
}

/// One rendered line: a stratification flag with its (few-shot, value)
/// points sorted by few-shot count ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub stratified: bool,
    pub points: Vec<(u32, f64)>,
}

/// Read-side view over a [`ResultStore`] driving the two cascading
/// selections (task, then metric) and the per-condition series.
#[derive(Debug)]
pub struct ReportView {
    store: ResultStore,
}

impl ReportView {
    /// Wrap a normalized store.
    #[must_use]
    pub fn new(store: ResultStore) -> Self {
        Self { store }
    }

    /// Distinct task names, in first-seen order.
    #[must_use]
    pub fn tasks(&self) -> Vec<String> {
        let mut tasks = Vec::new();
        for record in self.store.records() {
            if !tasks.contains(&record.key.task) {
                tasks.push(record.key.task.clone());
            }
        }
        tasks
    }

    /// Distinct metric names present for a task, in first-seen order.
    #[must_use]
    pub fn metrics(&self, task: &str) -> Vec<MetricName> {
        let mut metrics = Vec::new();
        for record in self.store.query(Some(task), None) {
            if !metrics.contains(&record.key.metric) {
                metrics.push(record.key.metric);
            }
        }
        metrics
    }

    /// Series for one (task, metric) selection.
    ///
    /// Records group by stratification flag (unstratified first); within a
    /// group, points sort by few-shot count ascending. Missing conditions
    /// simply produce no point; nothing is interpolated or imputed. An empty
    /// selection yields an empty set.
    #[must_use]
    pub fn series(&self, task: &str, metric: MetricName) -> Vec<Series> {
        let records = self.store.query(Some(task), Some(metric));

        let mut series = Vec::new();
        for stratified in [false, true] {
            let mut points: Vec<(u32, f64)> = records
                .iter()
                .filter(|r| r.key.stratified == stratified)
                .map(|r| (r.key.num_fewshot, r.value))
                .collect();
            if points.is_empty() {
                continue;
            }
            points.sort_by_key(|&(num_fewshot, _)| num_fewshot);
            series.push(Series { stratified, points });
        }

        series
    }

    /// Underlying store.
    #[must_use]
    pub fn store(&self) -> &ResultStore {
        &self.store
    }
}

/// Table row for terminal series rendering
#[derive(Tabled)]
struct SeriesTableRow {
    #[tabled(rename = "Few-shot")]
    num_fewshot: u32,
    #[tabled(rename = "random")]
    random: String,
    #[tabled(rename = "stratified")]
    stratified: String,
}

/// Render one (task, metric) selection as a terminal table.
///
/// One row per few-shot count, one column per stratification flag; a
/// missing condition renders as `-`. An empty selection degrades to a
/// "no data" line instead of failing.
#[must_use]
pub fn render_series(task: &str, metric: MetricName, series: &[Series]) -> String {
    if series.is_empty() {
        return format!("{task} / {metric}: no data\n");
    }

    let mut counts: Vec<u32> = series
        .iter()
        .flat_map(|s| s.points.iter().map(|&(n, _)| n))
        .collect();
    counts.sort_unstable();
    counts.dedup();

    let value_at = |stratified: bool, num_fewshot: u32| -> String {
        series
            .iter()
            .find(|s| s.stratified == stratified)
            .and_then(|s| s.points.iter().find(|&&(n, _)| n == num_fewshot))
            .map_or_else(|| "-".to_string(), |&(_, v)| format!("{v:.4}"))
    };

    let rows: Vec<SeriesTableRow> = counts
        .iter()
        .map(|&n| SeriesTableRow {
            num_fewshot: n,
            random: value_at(false, n),
            stratified: value_at(true, n),
        })
        .collect();

    let table = Table::new(rows).to_string();
    format!("{task} / {metric}\n{table}\n")
}

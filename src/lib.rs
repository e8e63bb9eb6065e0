//! # Sentiment Eval
//!
//! Few-shot evaluation harness for a fixed three-way sentiment
//! classification benchmark, with corpus-level macro metrics and a
//! condition-comparison report.
//!
//! ## Protocol
//!
//! ```text
//! Documents (train/test JSONL)
//!        ↓
//! Task views (train: relevant + labeled; test: labeled only)
//!        ↓
//! Few-shot context + prompt per test document
//!        ↓
//! 3 log-likelihood requests per document (one per label)
//!        ↓
//! Decision rule (ties fall to neutral)
//!        ↓
//! Outcome set → accuracy + macro precision/recall/F1 (one reduction per run)
//!        ↓
//! Metric records keyed by (task, few-shot count, stratified, metric)
//!        ↓
//! Report: metric vs. few-shot count, one series per stratification flag
//! ```

pub mod config;
pub mod corpus;
pub mod label;
pub mod metrics;
pub mod report;
pub mod runner;
pub mod scorer;
pub mod store;
pub mod task;

pub use config::{ConfigError, EvalConfig};
pub use corpus::{Corpus, CorpusError, CorpusStats, Document};
pub use label::{Label, UnknownLabel};
pub use metrics::{MetricAggregator, MetricName, Outcome, RunMetrics, UnknownMetric};
pub use report::{render_series, ReportError, ReportView, ResultsFile, RunId, Series};
pub use runner::{
    Condition, EvalRunner, RunReport, RunnerConfig, RunnerError, SimulatedBackend,
};
pub use scorer::{BackendError, LabelScores, LmBackend, Request, Score, Scorer};
pub use store::{MetricKey, MetricRecord, ResultStore};
pub use task::{GermEval2017, Task};

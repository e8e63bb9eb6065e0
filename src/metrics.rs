//! Outcome accumulation and corpus-level metric reduction.
//!
//! One [`MetricAggregator`] per run, single writer. Macro precision, recall
//! and F1 are computed directly against the collected outcome set rather
//! than delegated to an external metrics routine: the zero-division
//! convention and the equal per-label weighting are load-bearing and must be
//! testable here.

use crate::label::Label;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error for metric names outside the reported set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown metric name: {0}")]
pub struct UnknownMetric(pub String);

/// The four metrics reported per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricName {
    /// Fraction of documents predicted correctly
    Acc,
    /// Macro-averaged one-vs-rest precision
    Precision,
    /// Macro-averaged one-vs-rest recall
    Recall,
    /// Macro-averaged one-vs-rest F1
    F1,
}

impl MetricName {
    /// All metrics in reporting order.
    pub const ALL: [Self; 4] = [Self::Acc, Self::Precision, Self::Recall, Self::F1];

    /// Wire name used in results files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Acc => "acc",
            Self::Precision => "precision",
            Self::Recall => "recall",
            Self::F1 => "f1",
        }
    }

    /// All four metrics improve as they grow.
    #[must_use]
    pub const fn higher_is_better(self) -> bool {
        true
    }
}

impl fmt::Display for MetricName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricName {
    type Err = UnknownMetric;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "acc" => Ok(Self::Acc),
            "precision" => Ok(Self::Precision),
            "recall" => Ok(Self::Recall),
            "f1" => Ok(Self::F1),
            other => Err(UnknownMetric(other.to_string())),
        }
    }
}

/// One scored document: true label and predicted label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub truth: Label,
    pub predicted: Label,
}

/// Scalar metric values for one completed run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RunMetrics {
    pub acc: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
}

impl RunMetrics {
    /// Value of a metric by name.
    #[must_use]
    pub const fn get(&self, metric: MetricName) -> f64 {
        match metric {
            MetricName::Acc => self.acc,
            MetricName::Precision => self.precision,
            MetricName::Recall => self.recall,
            MetricName::F1 => self.f1,
        }
    }
}

/// Accumulates per-document outcomes for one run and reduces them once.
#[derive(Debug, Default)]
pub struct MetricAggregator {
    outcomes: Vec<Outcome>,
}

impl MetricAggregator {
    /// Create an empty aggregator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one document's outcome.
    pub fn record(&mut self, truth: Label, predicted: Label) {
        self.outcomes.push(Outcome { truth, predicted });
    }

    /// Number of recorded outcomes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    /// Whether no outcomes were recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    /// Recorded outcomes, in scoring order.
    #[must_use]
    pub fn outcomes(&self) -> &[Outcome] {
        &self.outcomes
    }

    /// Accuracy: matches / total. `None` for an empty outcome set.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn accuracy(&self) -> Option<f64> {
        if self.outcomes.is_empty() {
            return None;
        }
        let matches = self
            .outcomes
            .iter()
            .filter(|o| o.truth == o.predicted)
            .count();
        Some(matches as f64 / self.outcomes.len() as f64)
    }

    /// Macro-averaged one-vs-rest precision. `None` for an empty set.
    #[must_use]
    pub fn macro_precision(&self) -> Option<f64> {
        self.macro_average(|c| c.precision())
    }

    /// Macro-averaged one-vs-rest recall. `None` for an empty set.
    #[must_use]
    pub fn macro_recall(&self) -> Option<f64> {
        self.macro_average(|c| c.recall())
    }

    /// Macro-averaged one-vs-rest F1. `None` for an empty set.
    #[must_use]
    pub fn macro_f1(&self) -> Option<f64> {
        self.macro_average(|c| c.f1())
    }

    /// Reduce to all four metrics at once. `None` for an empty run.
    #[must_use]
    pub fn compute(&self) -> Option<RunMetrics> {
        Some(RunMetrics {
            acc: self.accuracy()?,
            precision: self.macro_precision()?,
            recall: self.macro_recall()?,
            f1: self.macro_f1()?,
        })
    }

    /// Unweighted mean of a per-label statistic over the three labels.
    ///
    /// Computed once over the full outcome set; never an average of
    /// per-document values.
    #[allow(clippy::cast_precision_loss)]
    fn macro_average(&self, stat: impl Fn(&BinaryCounts) -> f64) -> Option<f64> {
        if self.outcomes.is_empty() {
            return None;
        }
        let sum: f64 = Label::ALL
            .iter()
            .map(|&label| stat(&BinaryCounts::for_label(&self.outcomes, label)))
            .sum();
        Some(sum / Label::ALL.len() as f64)
    }
}

/// One-vs-rest confusion counts for a single label.
#[derive(Debug, Clone, Copy, Default)]
struct BinaryCounts {
    tp: usize,
    fp: usize,
    fn_: usize,
}

impl BinaryCounts {
    fn for_label(outcomes: &[Outcome], label: Label) -> Self {
        let mut counts = Self::default();
        for outcome in outcomes {
            match (outcome.truth == label, outcome.predicted == label) {
                (true, true) => counts.tp += 1,
                (false, true) => counts.fp += 1,
                (true, false) => counts.fn_ += 1,
                (false, false) => {}
            }
        }
        counts
    }

    /// TP / (TP + FP), with the zero-division-to-zero convention.
    #[allow(clippy::cast_precision_loss)]
    fn precision(&self) -> f64 {
        let denom = self.tp + self.fp;
        if denom == 0 {
            0.0
        } else {
            self.tp as f64 / denom as f64
        }
    }

    /// TP / (TP + FN), with the zero-division-to-zero convention.
    #[allow(clippy::cast_precision_loss)]
    fn recall(&self) -> f64 {
        let denom = self.tp + self.fn_;
        if denom == 0 {
            0.0
        } else {
            self.tp as f64 / denom as f64
        }
    }

    /// Harmonic mean of precision and recall; 0 when both are 0.
    fn f1(&self) -> f64 {
        let p = self.precision();
        let r = self.recall();
        if p + r == 0.0 {
            0.0
        } else {
            2.0 * p * r / (p + r)
        }
    }
}

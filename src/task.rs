//! Benchmark task contract.
//!
//! A [`Task`] owns everything benchmark-specific: which documents are
//! eligible for the train and test views, how a document becomes prompt and
//! target text, how three label scores collapse into one predicted label,
//! and which metrics the run reports. New benchmarks add an implementing
//! type, not a conditional branch.

use crate::corpus::Document;
use crate::label::Label;
use crate::metrics::MetricName;
use crate::scorer::LabelScores;

/// A single-label classification benchmark over a closed three-way label set.
pub trait Task {
    /// Task name, used as the leading token of run identifiers.
    fn name(&self) -> &str;

    /// Training view: relevant documents with text and an in-set label.
    ///
    /// Relevance keeps the few-shot pool on-topic. Documents whose sentiment
    /// string falls outside the label set are filtered, not rejected.
    fn training_view<'a>(&self, docs: &'a [Document]) -> Vec<&'a Document> {
        docs.iter()
            .filter(|d| d.relevance && d.text.is_some() && d.label().is_some())
            .collect()
    }

    /// Test view: documents with text and an in-set label.
    ///
    /// Relevance is deliberately NOT applied here. The scored set must
    /// reflect the full label distribution, while the training pool stays
    /// on-topic; collapsing the two filters changes aggregate metrics.
    fn test_view<'a>(&self, docs: &'a [Document]) -> Vec<&'a Document> {
        docs.iter()
            .filter(|d| d.text.is_some() && d.label().is_some())
            .collect()
    }

    /// Evaluation prompt for a document: text, blank line, fixed cue.
    fn prompt(&self, doc: &Document) -> String;

    /// Canonical continuation string for a label.
    ///
    /// One fixed token per label, each with a leading space so the
    /// continuation aligns with tokenizer conventions.
    fn target(&self, label: Label) -> &'static str;

    /// Collapse the three per-label log-likelihoods into a prediction.
    fn decide(&self, scores: &LabelScores) -> Label;

    /// Metrics reported by this task.
    fn metrics(&self) -> &[MetricName];

    /// Whether a larger value of the metric is better.
    fn higher_is_better(&self, metric: MetricName) -> bool;
}

/// GermEval 2017 aspect-based sentiment task (document-level polarity).
#[derive(Debug, Clone, Copy, Default)]
pub struct GermEval2017;

impl GermEval2017 {
    const METRICS: [MetricName; 4] = [
        MetricName::Acc,
        MetricName::Precision,
        MetricName::Recall,
        MetricName::F1,
    ];
}

impl Task for GermEval2017 {
    fn name(&self) -> &str {
        "germeval2017"
    }

    fn prompt(&self, doc: &Document) -> String {
        let text = doc.text.as_deref().unwrap_or_default();
        format!("{text}\n\nBewertung:")
    }

    fn target(&self, label: Label) -> &'static str {
        match label {
            Label::Positive => " gut",
            Label::Negative => " schlecht",
            Label::Neutral => " neutral",
        }
    }

    /// Asymmetric fallback, not an argmax.
    ///
    /// Positive wins only if strictly above both others, then negative, and
    /// every remaining case falls to neutral. A two-way positive/negative tie
    /// above neutral still predicts neutral. The rule is preserved exactly
    /// because it shifts aggregate metrics at tie boundaries.
    fn decide(&self, scores: &LabelScores) -> Label {
        if scores.positive > scores.negative && scores.positive > scores.neutral {
            Label::Positive
        } else if scores.negative > scores.positive && scores.negative > scores.neutral {
            Label::Negative
        } else {
            Label::Neutral
        }
    }

    fn metrics(&self) -> &[MetricName] {
        &Self::METRICS
    }

    fn higher_is_better(&self, _metric: MetricName) -> bool {
        true
    }
}

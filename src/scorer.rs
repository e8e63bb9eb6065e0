//! Prompt scoring against a language-model backend.
//!
//! The scorer turns one evaluation context into exactly three log-likelihood
//! requests (one per label, label-identified), issues them sequentially to
//! the backend, and applies the task's decision rule to the returned scores.
//! Backend failures are fatal for the run and propagate; there is no retry
//! or partial-result handling here.

use crate::label::Label;
use crate::task::Task;
use thiserror::Error;

/// Errors surfaced by a language-model backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Backend request failed: {0}")]
    RequestFailed(String),

    #[error("Backend returned non-finite log-likelihood for label {0}")]
    NonFiniteScore(Label),
}

/// Scalar result of one log-likelihood request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Score {
    /// Log-likelihood of the continuation given the context
    pub loglikelihood: f64,
    /// Whether the continuation was the backend's greedy completion.
    /// Carried through from the backend but unused by the decision rule.
    pub is_greedy: bool,
}

/// One scoring request: context plus a candidate label continuation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// The label this request scores
    pub label: Label,
    /// Full evaluation context (few-shot examples plus prompt)
    pub context: String,
    /// Canonical continuation string for the label
    pub continuation: String,
}

/// Per-label log-likelihoods for one document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelScores {
    pub positive: f64,
    pub negative: f64,
    pub neutral: f64,
}

impl LabelScores {
    /// Get the score for a label.
    #[must_use]
    pub const fn get(&self, label: Label) -> f64 {
        match label {
            Label::Positive => self.positive,
            Label::Negative => self.negative,
            Label::Neutral => self.neutral,
        }
    }

    fn set(&mut self, label: Label, value: f64) {
        match label {
            Label::Positive => self.positive = value,
            Label::Negative => self.negative = value,
            Label::Neutral => self.neutral = value,
        }
    }
}

/// Language-model backend seam.
///
/// One blocking call per (document, label) pair. The core makes no
/// assumption about batching or parallelism behind this trait.
pub trait LmBackend {
    /// Score a candidate continuation of a context.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot produce a score; the caller
    /// treats this as fatal for the run.
    fn loglikelihood(&self, context: &str, continuation: &str) -> Result<Score, BackendError>;
}

/// Builds requests and converts backend scores into label decisions.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scorer;

impl Scorer {
    /// Build the three scoring requests for one evaluation context.
    ///
    /// Always exactly one request per label, in [`Label::ALL`] order.
    #[must_use]
    pub fn build_requests<T: Task + ?Sized>(task: &T, context: &str) -> Vec<Request> {
        Label::ALL
            .iter()
            .map(|&label| Request {
                label,
                context: context.to_string(),
                continuation: task.target(label).to_string(),
            })
            .collect()
    }

    /// Score one context and decide its label.
    ///
    /// Requests are issued sequentially in [`Label::ALL`] order.
    ///
    /// # Errors
    ///
    /// Propagates the first backend failure; no retries.
    pub fn classify<T: Task + ?Sized, B: LmBackend>(
        task: &T,
        backend: &B,
        context: &str,
    ) -> Result<Label, BackendError> {
        let mut scores = LabelScores {
            positive: f64::NEG_INFINITY,
            negative: f64::NEG_INFINITY,
            neutral: f64::NEG_INFINITY,
        };

        for &label in &Label::ALL {
            let score = backend.loglikelihood(context, task.target(label))?;
            if !score.loglikelihood.is_finite() && score.loglikelihood != f64::NEG_INFINITY {
                return Err(BackendError::NonFiniteScore(label));
            }
            scores.set(label, score.loglikelihood);
        }

        Ok(task.decide(&scores))
    }
}

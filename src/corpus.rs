//! Document corpus loading for sentiment evaluation.
//!
//! The corpus is the narrow seam to the dataset collaborator: a train split
//! and a test split of flat [`Document`] records, loaded from JSON Lines
//! files (one document per line). Acquisition and caching of the raw dataset
//! live outside this crate.

use crate::label::Label;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during corpus loading
#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Corpus file not found: {0}")]
    NotFound(String),

    #[error("Malformed document at {path}:{line}: {source}")]
    MalformedLine {
        path: String,
        line: usize,
        source: serde_json::Error,
    },

    #[error("No documents in split: {0}")]
    EmptySplit(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A single dataset record.
///
/// `sentiment` stays a raw string here; only the task views interpret it, so
/// that documents with labels outside the label set filter out silently
/// instead of failing the load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Stable document identifier
    pub id: String,
    /// Document text; absent text excludes the document from every view
    pub text: Option<String>,
    /// On-topic flag, applied to the training view only
    #[serde(default)]
    pub relevance: bool,
    /// Raw sentiment label string
    pub sentiment: String,
}

impl Document {
    /// Parsed label, if the sentiment string is in the label set.
    #[must_use]
    pub fn label(&self) -> Option<Label> {
        self.sentiment.parse().ok()
    }
}

/// Train and test splits of an evaluation corpus
#[derive(Debug)]
pub struct Corpus {
    /// Training documents (few-shot example pool)
    pub train: Vec<Document>,
    /// Test documents (scored set)
    pub test: Vec<Document>,
}

impl Corpus {
    /// Load a corpus from two JSON Lines files.
    ///
    /// # Errors
    ///
    /// Returns an error if either file is missing or contains a line that
    /// does not parse as a document, or if either split comes back empty.
    pub fn load<P: AsRef<Path>>(train_path: P, test_path: P) -> Result<Self, CorpusError> {
        let train = load_split(train_path.as_ref())?;
        let test = load_split(test_path.as_ref())?;

        if train.is_empty() {
            return Err(CorpusError::EmptySplit(
                train_path.as_ref().display().to_string(),
            ));
        }
        if test.is_empty() {
            return Err(CorpusError::EmptySplit(
                test_path.as_ref().display().to_string(),
            ));
        }

        Ok(Self { train, test })
    }

    /// Build a corpus from already-loaded documents.
    #[must_use]
    pub fn from_documents(train: Vec<Document>, test: Vec<Document>) -> Self {
        Self { train, test }
    }

    /// Compute per-split statistics.
    #[must_use]
    pub fn stats(&self) -> CorpusStats {
        CorpusStats {
            train_documents: self.train.len(),
            test_documents: self.test.len(),
            train_labeled: count_labeled(&self.train),
            test_labeled: count_labeled(&self.test),
        }
    }
}

fn count_labeled(docs: &[Document]) -> usize {
    docs.iter().filter(|d| d.label().is_some()).count()
}

fn load_split(path: &Path) -> Result<Vec<Document>, CorpusError> {
    if !path.exists() {
        return Err(CorpusError::NotFound(path.display().to_string()));
    }

    let content = std::fs::read_to_string(path)?;
    let mut documents = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let doc: Document =
            serde_json::from_str(line).map_err(|source| CorpusError::MalformedLine {
                path: path.display().to_string(),
                line: idx + 1,
                source,
            })?;
        documents.push(doc);
    }

    Ok(documents)
}

/// Statistics about a loaded corpus
#[derive(Debug, Clone)]
pub struct CorpusStats {
    /// Total training documents
    pub train_documents: usize,
    /// Total test documents
    pub test_documents: usize,
    /// Training documents with a label inside the label set
    pub train_labeled: usize,
    /// Test documents with a label inside the label set
    pub test_labeled: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn write_split(dir: &TempDir, name: &str, lines: &[&str]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    #[test]
    fn test_load_corpus() {
        let dir = TempDir::new().unwrap();
        let train = write_split(
            &dir,
            "train.jsonl",
            &[
                r#"{"id":"t1","text":"Der Zug war puenktlich.","relevance":true,"sentiment":"positive"}"#,
                "",
                r#"{"id":"t2","text":"Alles kaputt.","relevance":true,"sentiment":"negative"}"#,
            ],
        );
        let test = write_split(
            &dir,
            "test.jsonl",
            &[r#"{"id":"s1","text":"Geht so.","relevance":false,"sentiment":"neutral"}"#],
        );

        let corpus = Corpus::load(&train, &test).unwrap();
        assert_eq!(corpus.train.len(), 2);
        assert_eq!(corpus.test.len(), 1);
        assert_eq!(corpus.train[0].label(), Some(Label::Positive));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let test = write_split(
            &dir,
            "test.jsonl",
            &[r#"{"id":"s1","text":"x","sentiment":"neutral"}"#],
        );
        let missing = dir.path().join("train.jsonl");

        let result = Corpus::load(&missing, &test);
        assert!(matches!(result, Err(CorpusError::NotFound(_))));
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let dir = TempDir::new().unwrap();
        let train = write_split(
            &dir,
            "train.jsonl",
            &[
                r#"{"id":"t1","text":"ok","relevance":true,"sentiment":"positive"}"#,
                "not json",
            ],
        );
        let test = write_split(
            &dir,
            "test.jsonl",
            &[r#"{"id":"s1","text":"x","sentiment":"neutral"}"#],
        );

        let err = Corpus::load(&train, &test).unwrap_err();
        match err {
            CorpusError::MalformedLine { line, .. } => assert_eq!(line, 2),
            other => panic!("expected MalformedLine, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_split_rejected() {
        let dir = TempDir::new().unwrap();
        let train = write_split(&dir, "train.jsonl", &[""]);
        let test = write_split(
            &dir,
            "test.jsonl",
            &[r#"{"id":"s1","text":"x","sentiment":"neutral"}"#],
        );

        let result = Corpus::load(&train, &test);
        assert!(matches!(result, Err(CorpusError::EmptySplit(_))));
    }

    #[test]
    fn test_unknown_sentiment_loads_without_label() {
        let doc = Document {
            id: "d".into(),
            text: Some("x".into()),
            relevance: true,
            sentiment: "mixed".into(),
        };
        assert!(doc.label().is_none());
    }

    #[test]
    fn test_stats_counts_labeled_documents() {
        let train = vec![
            Document {
                id: "a".into(),
                text: Some("x".into()),
                relevance: true,
                sentiment: "positive".into(),
            },
            Document {
                id: "b".into(),
                text: Some("y".into()),
                relevance: true,
                sentiment: "unknown".into(),
            },
        ];
        let corpus = Corpus::from_documents(train, Vec::new());
        let stats = corpus.stats();
        assert_eq!(stats.train_documents, 2);
        assert_eq!(stats.train_labeled, 1);
        assert_eq!(stats.test_documents, 0);
    }
}

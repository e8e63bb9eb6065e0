//! The closed three-way label set for sentiment classification.
//!
//! Every scored document carries exactly one of these labels; documents with
//! any other label string are filtered out of both dataset views rather than
//! treated as errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a dataset label string is outside the label set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown sentiment label: {0}")]
pub struct UnknownLabel(pub String);

/// One of the three sentiment classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Positive,
    Neutral,
    Negative,
}

impl Label {
    /// All labels in request-issuance order: positive, negative, neutral.
    ///
    /// The order is fixed and matters for reproducing per-document request
    /// sequences; it is not the tie-break order (ties always resolve to
    /// neutral, see the task decision rule).
    pub const ALL: [Self; 3] = [Self::Positive, Self::Negative, Self::Neutral];

    /// Signed integer mapping of the label: positive=+1, neutral=0, negative=-1.
    #[must_use]
    pub const fn polarity(self) -> i8 {
        match self {
            Self::Positive => 1,
            Self::Neutral => 0,
            Self::Negative => -1,
        }
    }

    /// Canonical dataset string for the label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Label {
    type Err = UnknownLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "positive" => Ok(Self::Positive),
            "neutral" => Ok(Self::Neutral),
            "negative" => Ok(Self::Negative),
            other => Err(UnknownLabel(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_polarity_mapping() {
        assert_eq!(Label::Positive.polarity(), 1);
        assert_eq!(Label::Neutral.polarity(), 0);
        assert_eq!(Label::Negative.polarity(), -1);
    }

    #[test]
    fn test_all_has_three_distinct_labels() {
        assert_eq!(Label::ALL.len(), 3);
        assert_ne!(Label::ALL[0], Label::ALL[1]);
        assert_ne!(Label::ALL[1], Label::ALL[2]);
        assert_ne!(Label::ALL[0], Label::ALL[2]);
    }

    #[test]
    fn test_from_str_known_labels() {
        assert_eq!("positive".parse::<Label>().unwrap(), Label::Positive);
        assert_eq!("neutral".parse::<Label>().unwrap(), Label::Neutral);
        assert_eq!("negative".parse::<Label>().unwrap(), Label::Negative);
    }

    #[test]
    fn test_from_str_unknown_label() {
        let err = "mixed".parse::<Label>().unwrap_err();
        assert_eq!(err, UnknownLabel("mixed".to_string()));
        // Case-sensitive on purpose: dataset labels are lowercase.
        assert!("Positive".parse::<Label>().is_err());
    }

    #[test]
    fn test_display_round_trip() {
        for label in Label::ALL {
            assert_eq!(label.to_string().parse::<Label>().unwrap(), label);
        }
    }
}

//! Evaluation configuration loaded from YAML.
//!
//! One config file describes the whole condition grid for a benchmark:
//! corpus file locations, the few-shot counts to sweep, whether to run the
//! stratified variant, the sampling seed and the output directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML configuration: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("No few-shot counts configured")]
    EmptyFewshotGrid,
}

/// Full evaluation configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalConfig {
    /// Training split JSONL path
    pub train_path: PathBuf,
    /// Test split JSONL path
    pub test_path: PathBuf,
    /// Few-shot counts to sweep
    #[serde(default = "default_fewshot_counts")]
    pub fewshot_counts: Vec<u32>,
    /// Stratification flags to sweep (both variants by default)
    #[serde(default = "default_stratified_flags")]
    pub stratified: Vec<bool>,
    /// RNG seed for few-shot sampling
    #[serde(default = "default_seed")]
    pub seed: u64,
    /// Optional cap on scored test documents per run
    #[serde(default)]
    pub limit: Option<usize>,
    /// Directory for results files
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_fewshot_counts() -> Vec<u32> {
    vec![0, 1, 5]
}

fn default_stratified_flags() -> Vec<bool> {
    vec![false, true]
}

const fn default_seed() -> u64 {
    42
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

impl EvalConfig {
    /// Load configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// few-shot grid is empty.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the YAML doesn't parse or the grid is empty.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        if config.fewshot_counts.is_empty() {
            return Err(ConfigError::EmptyFewshotGrid);
        }
        Ok(config)
    }

    /// All (few-shot count, stratified) pairs in sweep order.
    #[must_use]
    pub fn condition_grid(&self) -> Vec<(u32, bool)> {
        let mut grid = Vec::new();
        for &stratified in &self.stratified {
            for &num_fewshot in &self.fewshot_counts {
                grid.push((num_fewshot, stratified));
            }
        }
        grid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_gets_defaults() {
        let config = EvalConfig::from_yaml(
            "train_path: data/train.jsonl\ntest_path: data/test.jsonl\n",
        )
        .unwrap();

        assert_eq!(config.fewshot_counts, [0, 1, 5]);
        assert_eq!(config.stratified, [false, true]);
        assert_eq!(config.seed, 42);
        assert_eq!(config.limit, None);
        assert_eq!(config.output_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_full_config_round_trip() {
        let config = EvalConfig {
            train_path: PathBuf::from("train.jsonl"),
            test_path: PathBuf::from("test.jsonl"),
            fewshot_counts: vec![0, 10],
            stratified: vec![true],
            seed: 7,
            limit: Some(100),
            output_dir: PathBuf::from("results"),
        };

        let yaml = serde_yaml::to_string(&config).expect("serialize");
        let parsed = EvalConfig::from_yaml(&yaml).expect("deserialize");
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_empty_fewshot_grid_rejected() {
        let yaml = "train_path: a\ntest_path: b\nfewshot_counts: []\n";
        assert!(matches!(
            EvalConfig::from_yaml(yaml),
            Err(ConfigError::EmptyFewshotGrid)
        ));
    }

    #[test]
    fn test_condition_grid_order() {
        let config = EvalConfig::from_yaml(
            "train_path: a\ntest_path: b\nfewshot_counts: [0, 5]\nstratified: [false, true]\n",
        )
        .unwrap();

        assert_eq!(
            config.condition_grid(),
            [(0, false), (5, false), (0, true), (5, true)]
        );
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            EvalConfig::from_yaml(": not yaml"),
            Err(ConfigError::YamlError(_))
        ));
    }
}

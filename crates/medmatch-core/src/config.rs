//! Matcher configuration.
//!
//! Retrieval budgets and the name-similarity strategy.
//! Confidence values are fixed per match branch and deliberately not
//! configurable.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// How two letters-only name signatures are compared.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SimilarityStrategy {
    /// Prefix / positional-equality heuristic tolerant of trailing OCR loss
    #[default]
    Positional,
    /// Levenshtein distance up to `max_distance`
    BoundedLevenshtein { max_distance: usize },
}

/// Tunables for candidate retrieval and matching.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MatcherConfig {
    /// Per-query result limit used when looking for an exact match
    pub exact_per_pattern: usize,
    /// Retrieval stops once this many times the per-pattern limit is collected
    pub candidate_multiplier: usize,
    /// Below this many candidates the first-token fallback tier runs
    pub fallback_floor: usize,
    /// Similar-medicine per-pattern budget is `limit` times this
    pub similar_budget_multiplier: usize,
    /// Max reference entries fetched per reference lookup
    pub reference_lookup_limit: usize,
    pub similarity: SimilarityStrategy,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            exact_per_pattern: 10,
            candidate_multiplier: 3,
            fallback_floor: 10,
            similar_budget_multiplier: 5,
            reference_lookup_limit: 20,
            similarity: SimilarityStrategy::Positional,
        }
    }
}

impl MatcherConfig {
    /// Parse and validate a JSON configuration. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: MatcherConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = [
            ("exact_per_pattern", self.exact_per_pattern),
            ("candidate_multiplier", self.candidate_multiplier),
            ("similar_budget_multiplier", self.similar_budget_multiplier),
            ("reference_lookup_limit", self.reference_lookup_limit),
        ];
        for (name, value) in limits {
            if value == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        if let SimilarityStrategy::BoundedLevenshtein { max_distance: 0 } = self.similarity {
            return Err(ConfigError::Invalid(
                "max_distance must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Early-stop threshold for a given per-pattern limit.
    pub fn candidate_target(&self, per_pattern: usize) -> usize {
        per_pattern.saturating_mul(self.candidate_multiplier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_valid() {
        let config = MatcherConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.candidate_target(config.exact_per_pattern), 30);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = MatcherConfig::from_json_str(r#"{"fallback_floor": 4}"#).unwrap();
        assert_eq!(config.fallback_floor, 4);
        assert_eq!(config.exact_per_pattern, 10);
        assert_eq!(config.similarity, SimilarityStrategy::Positional);
    }

    #[test]
    fn test_levenshtein_strategy_from_json() {
        let config = MatcherConfig::from_json_str(
            r#"{"similarity": {"kind": "bounded_levenshtein", "max_distance": 2}}"#,
        )
        .unwrap();
        assert_eq!(
            config.similarity,
            SimilarityStrategy::BoundedLevenshtein { max_distance: 2 }
        );
    }

    #[test]
    fn test_rejects_zero_limit() {
        let result = MatcherConfig::from_json_str(r#"{"exact_per_pattern": 0}"#);
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_default_strategy_is_positional() {
        assert_eq!(SimilarityStrategy::default(), SimilarityStrategy::Positional);
        let config = MatcherConfig::from_json_str("{}").unwrap();
        assert_eq!(config, MatcherConfig::default());
    }

    #[test]
    fn test_rejects_zero_distance() {
        let config = MatcherConfig {
            similarity: SimilarityStrategy::BoundedLevenshtein { max_distance: 0 },
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        let result = MatcherConfig::from_json_str("{not json");
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"reference_lookup_limit": 5}}"#).unwrap();

        let config = MatcherConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.reference_lookup_limit, 5);
    }

    #[test]
    fn test_missing_file() {
        let result = MatcherConfig::from_json_file("/nonexistent/medmatch.json");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}

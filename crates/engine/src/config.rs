//! Engine configuration.
//!
//! Every field has a default, so a JSON config file only needs the keys it
//! overrides:
//!
//! ```json
//! { "max_candidates": 5, "vectorizer": { "max_features": 2000 } }
//! ```

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use sources::VectorizerConfig;
use sources::rating::DEFAULT_REVIEW_PERCENTILE;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Cap on name-search candidates handed back for disambiguation
    pub max_candidates: usize,
    /// Result count used when a caller does not ask for one
    pub default_top_n: usize,
    /// Quantile of per-product review counts used as the volume floor `m`
    pub review_percentile: f64,
    pub vectorizer: VectorizerConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_candidates: 3,
            default_top_n: 10,
            review_percentile: DEFAULT_REVIEW_PERCENTILE,
            vectorizer: VectorizerConfig::default(),
        }
    }
}

impl EngineConfig {
    /// Load and validate a JSON config file
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Configure the name-search candidate cap (default: 3)
    pub fn with_max_candidates(mut self, max_candidates: usize) -> Self {
        self.max_candidates = max_candidates;
        self
    }

    /// Configure the default result count (default: 10)
    pub fn with_default_top_n(mut self, top_n: usize) -> Self {
        self.default_top_n = top_n;
        self
    }

    /// Configure the review-count quantile for `m` (default: 0.75)
    pub fn with_review_percentile(mut self, percentile: f64) -> Self {
        self.review_percentile = percentile;
        self
    }

    pub fn with_vectorizer(mut self, vectorizer: VectorizerConfig) -> Self {
        self.vectorizer = vectorizer;
        self
    }

    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: &str| {
            Err(EngineError::Config {
                reason: reason.to_string(),
            })
        };

        if self.max_candidates == 0 {
            return invalid("max_candidates must be at least 1");
        }
        if !(0.0..=1.0).contains(&self.review_percentile) {
            return invalid("review_percentile must lie in [0, 1]");
        }
        let (min_n, max_n) = self.vectorizer.ngram_range;
        if min_n == 0 || min_n > max_n {
            return invalid("ngram_range must satisfy 1 <= min <= max");
        }
        if self.vectorizer.max_features == 0 {
            return invalid("vectorizer.max_features must be at least 1");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_candidates, 3);
        assert_eq!(config.default_top_n, 10);
        assert_eq!(config.review_percentile, 0.75);
        assert_eq!(config.vectorizer.max_features, 5000);
        assert_eq!(config.vectorizer.min_df, 2);
        assert_eq!(config.vectorizer.ngram_range, (1, 2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let json = r#"{ "max_candidates": 5, "vectorizer": { "min_df": 1 } }"#;
        let config: EngineConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.max_candidates, 5);
        assert_eq!(config.vectorizer.min_df, 1);
        assert_eq!(config.vectorizer.max_features, 5000);
        assert_eq!(config.vectorizer.field_weights.tags, 3);
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(EngineConfig::default().with_review_percentile(1.5).validate().is_err());
        assert!(EngineConfig::default().with_max_candidates(0).validate().is_err());

        let mut config = EngineConfig::default();
        config.vectorizer.ngram_range = (2, 1);
        assert!(matches!(config.validate(), Err(EngineError::Config { .. })));
    }
}

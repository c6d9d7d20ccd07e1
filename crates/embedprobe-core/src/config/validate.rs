//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.embedding.batch_size == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.batch_size must be > 0".into(),
            ));
        }
        if self.embedding.sentence_max_length == 0 || self.embedding.clip_max_length == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.sentence_max_length and embedding.clip_max_length must be > 0".into(),
            ));
        }
        if self.tfidf.max_df <= 0.0 || self.tfidf.max_df > 1.0 {
            return Err(ConfigError::ValidationError(
                "tfidf.max_df must be in (0.0, 1.0]".into(),
            ));
        }
        if self.tfidf.ngram_min == 0 || self.tfidf.ngram_min > self.tfidf.ngram_max {
            return Err(ConfigError::ValidationError(
                "tfidf.ngram_min must be > 0 and <= tfidf.ngram_max".into(),
            ));
        }
        if self.tfidf.max_features == 0 {
            return Err(ConfigError::ValidationError(
                "tfidf.max_features must be > 0".into(),
            ));
        }
        if self.evaluation.n_folds < 2 {
            return Err(ConfigError::ValidationError(
                "evaluation.n_folds must be >= 2".into(),
            ));
        }
        if self.evaluation.n_trees == 0 {
            return Err(ConfigError::ValidationError(
                "evaluation.n_trees must be > 0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_passes_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_batch_size() {
        let mut config = Config::default();
        config.embedding.batch_size = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("batch_size"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_max_df() {
        let mut config = Config::default();
        config.tfidf.max_df = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("max_df"));

        config.tfidf.max_df = 1.2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_ngram_range() {
        let mut config = Config::default();
        config.tfidf.ngram_min = 3;
        config.tfidf.ngram_max = 2;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("ngram_min"));
    }

    #[test]
    fn test_validate_rejects_single_fold() {
        let mut config = Config::default();
        config.evaluation.n_folds = 1;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("n_folds"));
    }
}

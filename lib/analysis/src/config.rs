use crate::embedder::{IndexerConfig, DEFAULT_BATCH_SIZE, DEFAULT_EMBEDDING_DIM, DEFAULT_MAX_TOKENS};
use grantlens_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Run-wide analysis settings. Every field has a default, so `{}` is a valid file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub high_similarity_threshold: f32,
    pub medium_similarity_threshold: f32,
    pub low_similarity_threshold: f32,
    pub max_tokens: usize,
    pub embedding_dim: usize,
    pub batch_size: usize,
    pub top_organizations: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            high_similarity_threshold: 0.8,
            medium_similarity_threshold: 0.6,
            low_similarity_threshold: 0.4,
            max_tokens: DEFAULT_MAX_TOKENS,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            batch_size: DEFAULT_BATCH_SIZE,
            top_organizations: 5,
        }
    }
}

impl AnalysisConfig {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)
            .map_err(|e| Error::config("analysis", format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Thresholds must be finite and ordered high >= medium >= low
    pub fn validate(&self) -> Result<()> {
        let thresholds = [
            self.high_similarity_threshold,
            self.medium_similarity_threshold,
            self.low_similarity_threshold,
        ];
        if thresholds.iter().any(|t| !t.is_finite()) {
            return Err(Error::config("analysis", "similarity thresholds must be finite"));
        }
        if self.high_similarity_threshold < self.medium_similarity_threshold
            || self.medium_similarity_threshold < self.low_similarity_threshold
        {
            return Err(Error::config(
                "analysis",
                "expected high >= medium >= low similarity thresholds",
            ));
        }
        if self.embedding_dim == 0 {
            return Err(Error::config("analysis", "embedding_dim must be positive"));
        }
        Ok(())
    }

    pub fn indexer_config(&self) -> IndexerConfig {
        IndexerConfig {
            max_tokens: self.max_tokens,
            batch_size: self.batch_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config: AnalysisConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.high_similarity_threshold, 0.8);
        assert_eq!(config.embedding_dim, 256);
    }

    #[test]
    fn test_partial_override() {
        let config: AnalysisConfig =
            serde_json::from_str(r#"{"high_similarity_threshold": 0.9, "batch_size": 8}"#).unwrap();
        assert_eq!(config.high_similarity_threshold, 0.9);
        assert_eq!(config.batch_size, 8);
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.indexer_config().batch_size, 8);
    }

    #[test]
    fn test_validate_threshold_order() {
        let config = AnalysisConfig {
            medium_similarity_threshold: 0.95,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
        assert!(AnalysisConfig::default().validate().is_ok());
    }
}

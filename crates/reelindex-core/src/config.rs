use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ReelError, Result};
use crate::types::EMBEDDING_DIM;

/// Top-level configuration for the Reelindex pipeline.
///
/// Loaded from a TOML file. Each section corresponds to one stage of the
/// pipeline; missing sections fall back to deployment defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReelConfig {
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub similarity: SimilarityConfig,
}

impl ReelConfig {
    /// Load configuration from a TOML file.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ReelConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults if the
    /// file does not exist or cannot be parsed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the current configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| ReelError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }
}

/// Metadata-ingestion scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Maximum number of ingestion operations simultaneously in flight.
    pub concurrency_limit: usize,
    /// Seconds after a pass completes during which new passes are suppressed.
    pub cooldown_secs: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 10,
            cooldown_secs: 2,
        }
    }
}

/// Embedding-storage step settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Dimensionality of the vector store.
    pub dimensions: usize,
    /// Maximum attempts for storing a video embedding.
    pub max_store_attempts: u32,
    /// Base delay between attempts; attempt `n` waits `n * base_delay`.
    pub store_base_delay_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            dimensions: EMBEDDING_DIM,
            max_store_attempts: 3,
            store_base_delay_ms: 500,
        }
    }
}

/// Similarity-matcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarityConfig {
    /// Clip matches requested when expanding the source video.
    pub source_top_k: usize,
    /// Neighbors requested per fan-out query.
    pub fanout_top_k: usize,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            source_top_k: 100,
            fanout_top_k: 5,
        }
    }
}

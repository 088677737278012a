//! Configuration for the document Q&A engine

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Main engine configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Provider and credential settings
    #[serde(default)]
    pub provider: ProviderSettings,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,
    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,
    /// Processing configuration
    #[serde(default)]
    pub processing: ProcessingConfig,
}

impl RagConfig {
    /// Load configuration from a TOML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        toml::from_str(&raw).map_err(|e| crate::error::Error::Config(e.to_string()))
    }
}

/// Provider identity and credential sources
///
/// Only the resolution order over these fields is part of the core
/// contract; how the values got here (environment, secret files, a
/// deployment tool) belongs to the configuration-loading layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderSettings {
    /// Provider identifier (openai, deepseek, zhipu); defaults to openai
    #[serde(default)]
    pub provider: Option<String>,
    /// Chat model override
    #[serde(default)]
    pub chat_model: Option<String>,
    /// Embedding model override
    #[serde(default)]
    pub embedding_model: Option<String>,
    /// API base URL override
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Credential source 1: unified API key
    #[serde(default)]
    pub api_key: Option<String>,
    /// Credential source 2: legacy provider-specific key, kept for
    /// backward compatibility with historical OpenAI-only deployments
    #[serde(default)]
    pub openai_api_key: Option<String>,
    /// Credential source 3: path to a file whose first line is the key
    #[serde(default)]
    pub api_key_file: Option<PathBuf>,
    /// Credential source 4: Base64-encoded key
    #[serde(default)]
    pub api_key_base64: Option<String>,
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Default number of sources retrieved per question
    pub max_sources: usize,
    /// Minimum normalized similarity for a chunk to qualify as a source
    pub similarity_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            max_sources: 3,
            similarity_threshold: 0.7,
        }
    }
}

/// HTTP client configuration for provider endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request time budget in seconds; exceeding it surfaces as a
    /// timeout error distinct from generic provider failure
    pub timeout_secs: u64,
    /// Generation temperature
    pub temperature: f32,
    /// Maximum tokens per generated answer
    pub max_tokens: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            temperature: 0.1,
            max_tokens: 1000,
        }
    }
}

/// Upload storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory for raw uploads, partitioned by date below it
    pub upload_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("./data/uploads"),
        }
    }
}

/// Background processing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Number of concurrent ingestion workers
    pub workers: usize,
    /// Chunks per embedding request
    pub embed_batch_size: usize,
    /// Queue capacity before submit backpressures
    pub queue_capacity: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            embed_batch_size: 32,
            queue_capacity: 256,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = RagConfig::default();
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.retrieval.max_sources, 3);
        assert!((config.retrieval.similarity_threshold - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn parses_partial_toml() {
        let config: RagConfig = toml::from_str(
            r#"
            [provider]
            provider = "deepseek"
            api_key = "sk-test"

            [chunking]
            chunk_size = 400
            chunk_overlap = 40
            "#,
        )
        .unwrap();
        assert_eq!(config.provider.provider.as_deref(), Some("deepseek"));
        assert_eq!(config.chunking.chunk_size, 400);
        // Unspecified sections fall back to defaults
        assert_eq!(config.retrieval.max_sources, 3);
    }
}

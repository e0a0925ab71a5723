use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::llm::LlmConfig;

/// Configuration for the transcript QA engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Chunk construction settings
    pub chunking: ChunkingConfig,

    /// Retrieval settings
    pub retrieval: RetrievalConfig,

    /// Chapter timeline settings
    pub chapters: ChapterConfig,

    /// LLM provider settings
    pub llm: LlmConfig,

    /// Storage settings
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Words accumulated per retrieval chunk (floor of 80 applies)
    pub words_per_chunk: usize,

    /// Caption language priority for fetched transcripts
    pub languages: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Chunks retrieved per question
    pub top_k: usize,

    /// Previous Q/A turns replayed into the prompt
    pub history_turns: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChapterConfig {
    /// Upper bound on generated chapters (clamped to 3..=24 on the model path)
    pub max_chapters: usize,

    /// Timeout for watch-page requests in seconds
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Local data directory holding the transcript cache
    pub data_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig {
                words_per_chunk: 220,
                languages: "en,en-US".to_string(),
            },
            retrieval: RetrievalConfig {
                top_k: 6,
                history_turns: 3,
            },
            chapters: ChapterConfig {
                max_chapters: 10,
                request_timeout_seconds: 20,
            },
            llm: LlmConfig::default(),
            storage: StorageConfig {
                data_dir: PathBuf::from(".transcript-qa"),
            },
        }
    }
}

impl Config {
    /// Load configuration from the first readable candidate path, falling
    /// back to environment overrides on defaults.
    pub fn load() -> Result<Self> {
        let config_paths = [
            "transcript-qa.toml",
            "config/transcript-qa.toml",
            "~/.config/transcript-qa/config.toml",
        ];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str(&config_str) {
                    Ok(config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Defaults with environment variable overrides applied.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(words) = std::env::var("TRANSCRIPT_QA_CHUNK_WORDS") {
            config.chunking.words_per_chunk = words.parse().unwrap_or(220);
        }

        if let Ok(top_k) = std::env::var("TRANSCRIPT_QA_TOP_K") {
            config.retrieval.top_k = top_k.parse().unwrap_or(6);
        }

        if let Ok(base_url) = std::env::var("TRANSCRIPT_QA_BASE_URL") {
            config.llm.base_url = base_url;
        }

        if let Ok(model) = std::env::var("TRANSCRIPT_QA_MODEL") {
            config.llm.model = model;
        }

        if let Ok(data_dir) = std::env::var("TRANSCRIPT_QA_DATA_DIR") {
            config.storage.data_dir = PathBuf::from(data_dir);
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: &str) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path, config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path);
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(anyhow!("top_k must be greater than 0"));
        }

        if self.chapters.max_chapters < 2 {
            return Err(anyhow!("max_chapters must be at least 2"));
        }

        if self.llm.base_url.trim().is_empty() {
            return Err(anyhow!("llm.base_url must not be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = Config::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.chapters.max_chapters = 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = Config::default();
        let encoded = toml::to_string_pretty(&config).unwrap();
        let decoded: Config = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded.retrieval.top_k, config.retrieval.top_k);
        assert_eq!(decoded.chunking.words_per_chunk, config.chunking.words_per_chunk);
    }
}

/// LLM client abstraction for grounded answering and chapter proposals.
pub mod providers;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// System prompt shared by every grounded-answer request.
pub const SYSTEM_PROMPT: &str = "You are a grounded transcript assistant. \
Respond in English only. \
Keep responses short, direct, and plain text. \
Avoid markdown formatting, bullet lists, and decorative symbols. \
Use only transcript evidence from provided chunks. \
If evidence is weak, clearly state uncertainty.";

/// LLM provider types
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Any OpenAI-compatible /chat/completions endpoint
    OpenAiCompat,
    /// Local Ollama daemon
    Ollama,
}

/// LLM configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    pub base_url: String,
    pub model: String,
    /// Session-only token; never persisted by the store
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,
    pub temperature: f32,
    pub timeout_seconds: u64,
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::OpenAiCompat,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_token: None,
            temperature: 0.2,
            timeout_seconds: 90,
            max_tokens: 1024,
        }
    }
}

/// Chat message for LLM communication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Trait for LLM providers
#[async_trait]
pub trait Llm: Send + Sync {
    /// Send a chat completion request and return the text content.
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String>;
    /// Cheap availability probe, used before batch work.
    async fn is_available(&self) -> bool;
    fn provider_type(&self) -> LlmProvider;
}

/// Create an LLM instance based on configuration.
pub fn create_llm(config: &LlmConfig) -> Result<Box<dyn Llm>> {
    match config.provider {
        LlmProvider::OpenAiCompat => Ok(Box::new(providers::OpenAiCompatProvider::new(
            config.clone(),
        )?)),
        LlmProvider::Ollama => Ok(Box::new(providers::OllamaProvider::new(config.clone())?)),
    }
}

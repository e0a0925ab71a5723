/// Provider implementations for the [`Llm`](super::Llm) trait.
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{ChatMessage, Llm, LlmConfig, LlmProvider};

/// Longest error body echoed back into an error message.
const MAX_ERROR_DETAIL_CHARS: usize = 600;

/// OpenAI-compatible provider (OpenAI, OpenRouter, LM Studio, vLLM, ...).
pub struct OpenAiCompatProvider {
    config: LlmConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionChoice {
    message: ChatCompletionMessage,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionMessage {
    content: Value,
}

impl OpenAiCompatProvider {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        let base = self.config.base_url.trim_end_matches('/');
        if base.ends_with("/chat/completions") {
            base.to_string()
        } else {
            format!("{}/chat/completions", base)
        }
    }

    fn token(&self) -> Result<&str> {
        self.config
            .api_token
            .as_deref()
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| anyhow!("Missing API token for this session"))
    }
}

#[async_trait]
impl Llm for OpenAiCompatProvider {
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let endpoint = self.endpoint();
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        debug!("Sending chat completion request to {}", endpoint);

        let response = self
            .client
            .post(&endpoint)
            .bearer_auth(self.token()?)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = truncate_detail(&response.text().await.unwrap_or_default());
            return Err(anyhow!(
                "LLM API request failed ({}). Response: {}",
                status,
                detail
            ));
        }

        let payload: ChatCompletionResponse = response.json().await?;
        let content = &payload
            .choices
            .first()
            .ok_or_else(|| anyhow!("LLM response contained no choices"))?
            .message
            .content;

        Ok(flatten_content(content))
    }

    async fn is_available(&self) -> bool {
        let base = self.config.base_url.trim_end_matches('/').to_string();
        let models_endpoint = format!("{}/models", base.trim_end_matches("/chat/completions"));
        match self.client.get(&models_endpoint).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn provider_type(&self) -> LlmProvider {
        LlmProvider::OpenAiCompat
    }
}

/// Ollama provider for local models. No auth, native /api/chat shape.
pub struct OllamaProvider {
    config: LlmConfig,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<ChatMessage>,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    content: String,
}

impl OllamaProvider {
    pub fn new(config: LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/chat", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl Llm for OllamaProvider {
    async fn chat(&self, messages: Vec<ChatMessage>) -> Result<String> {
        let request = OllamaRequest {
            model: self.config.model.clone(),
            messages,
            stream: false,
        };

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = truncate_detail(&response.text().await.unwrap_or_default());
            return Err(anyhow!("Ollama request failed ({}): {}", status, detail));
        }

        let payload: OllamaResponse = response.json().await?;
        Ok(payload.message.content.trim().to_string())
    }

    async fn is_available(&self) -> bool {
        let tags = format!("{}/api/tags", self.config.base_url.trim_end_matches('/'));
        match self.client.get(&tags).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn provider_type(&self) -> LlmProvider {
        LlmProvider::Ollama
    }
}

fn truncate_detail(detail: &str) -> String {
    let trimmed = detail.trim();
    if trimmed.chars().count() > MAX_ERROR_DETAIL_CHARS {
        let head: String = trimmed.chars().take(MAX_ERROR_DETAIL_CHARS).collect();
        format!("{}...", head)
    } else {
        trimmed.to_string()
    }
}

/// Providers occasionally return content as a list of typed parts instead of
/// a plain string; flatten either shape to text.
fn flatten_content(content: &Value) -> String {
    match content {
        Value::String(text) => text.trim().to_string(),
        Value::Array(items) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(|item| {
                    item.get("text")
                        .or_else(|| item.get("content"))
                        .and_then(Value::as_str)
                })
                .collect();
            parts.join("\n").trim().to_string()
        }
        other => other.to_string(),
    }
}

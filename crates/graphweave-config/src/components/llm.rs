//! Extraction model provider settings.

use serde::{Deserialize, Serialize};

/// Default model for extraction and mapping proposals
pub const DEFAULT_EXTRACTION_MODEL: &str = "gpt-4o-mini";

/// Supported provider APIs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderType {
    /// OpenAI or any OpenAI-compatible chat completions API
    #[default]
    OpenAI,
    /// Local Ollama server
    Ollama,
}

/// LLM provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider API flavor
    pub provider: LlmProviderType,
    /// Base URL; provider default when absent
    pub endpoint: Option<String>,
    /// Model name
    pub model: Option<String>,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Per-request timeout
    pub timeout_secs: u64,
    /// Attempts per extraction call
    pub max_attempts: u32,
    /// Base delay of the retry backoff, doubled per attempt
    pub base_delay_ms: u64,
    /// Sampling temperature for rule-following extraction
    pub temperature: f32,
    /// Upper bound on generated tokens
    pub max_tokens: Option<u32>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderType::OpenAI,
            endpoint: None,
            model: None,
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
            max_attempts: 3,
            base_delay_ms: 500,
            temperature: 0.0,
            max_tokens: Some(2048),
        }
    }
}

impl LlmConfig {
    /// Endpoint, using the provider-specific default if not specified
    pub fn llm_endpoint(&self) -> String {
        self.endpoint.clone().unwrap_or_else(|| match self.provider {
            LlmProviderType::OpenAI => "https://api.openai.com/v1".to_string(),
            LlmProviderType::Ollama => "http://localhost:11434".to_string(),
        })
    }

    /// Model, using the default if not specified
    pub fn model_name(&self) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| DEFAULT_EXTRACTION_MODEL.to_string())
    }
}

//! Ollama chat provider implementation

use async_trait::async_trait;
use graphweave_core::{
    ChatCompletionRequest, ChatCompletionResponse, LlmError, LlmResult, TextGenerationProvider,
    TokenUsage,
};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::{status_error, transport_error};

/// Ollama chat provider
pub struct OllamaChatProvider {
    client: reqwest::Client,
    base_url: String,
    default_model: String,
    timeout: Duration,
}

impl OllamaChatProvider {
    /// Create a new Ollama provider
    pub fn new(base_url: String, model: String, timeout_secs: u64) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            default_model: model,
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    fn build_request(&self, request: &ChatCompletionRequest) -> serde_json::Value {
        let mut api_request = serde_json::json!({
            "model": self.default_model,
            "messages": request.messages.iter().map(|m| {
                serde_json::json!({
                    "role": m.role.as_str(),
                    "content": m.content,
                })
            }).collect::<Vec<_>>(),
            "stream": false,
        });

        let mut options = serde_json::Map::new();
        if let Some(temp) = request.temperature {
            options.insert("temperature".into(), serde_json::json!(temp));
        }
        if let Some(max_tokens) = request.max_tokens {
            options.insert("num_predict".into(), serde_json::json!(max_tokens));
        }
        if !options.is_empty() {
            api_request["options"] = serde_json::Value::Object(options);
        }

        if request.json_mode {
            api_request["format"] = serde_json::json!("json");
        }

        api_request
    }
}

#[async_trait]
impl TextGenerationProvider for OllamaChatProvider {
    async fn generate_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> LlmResult<ChatCompletionResponse> {
        let api_request = self.build_request(&request);

        let url = format!("{}/api/chat", self.base_url);
        debug!(model = %self.default_model, "POST {}", url);

        let response = self
            .client
            .post(&url)
            .json(&api_request)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport_error)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(status_error("Ollama", status, error_text));
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        // Ollama reports token counts separately
        let prompt_tokens = ollama_response.prompt_eval_count.unwrap_or(0);
        let completion_tokens = ollama_response.eval_count.unwrap_or(0);

        Ok(ChatCompletionResponse {
            content: ollama_response.message.content,
            model: ollama_response.model,
            usage: Some(TokenUsage {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            }),
        })
    }

    fn model_name(&self) -> &str {
        &self.default_model
    }
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    model: String,
    message: OllamaMessage,
    #[serde(default)]
    prompt_eval_count: Option<u32>,
    #[serde(default)]
    eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaMessage {
    #[serde(default)]
    content: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphweave_core::LlmMessage;

    #[test]
    fn options_are_only_sent_when_set() {
        let provider = OllamaChatProvider::new("http://localhost:11434".into(), "llama3.2".into(), 5);
        let request = ChatCompletionRequest::new(vec![LlmMessage::user("hi")]);
        let body = provider.build_request(&request);
        assert!(body.get("options").is_none());
        assert!(body.get("format").is_none());
        assert_eq!(body["stream"], false);
    }

    #[test]
    fn json_mode_and_limits_are_mapped() {
        let provider = OllamaChatProvider::new("http://localhost:11434".into(), "llama3.2".into(), 5);
        let mut request = ChatCompletionRequest::new(vec![LlmMessage::system("rules")]);
        request.json_mode = true;
        request.max_tokens = Some(64);
        request.temperature = Some(0.0);

        let body = provider.build_request(&request);
        assert_eq!(body["format"], "json");
        assert_eq!(body["options"]["num_predict"], 64);
        assert_eq!(body["options"]["temperature"], 0.0);
    }
}

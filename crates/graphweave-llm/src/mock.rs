//! Mock text generation provider for testing
//!
//! Lets extraction and ingestion code be exercised without API keys or
//! network calls. Responses are served from a FIFO queue first, then from
//! substring rules matched against the last user message, then a default.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use graphweave_core::{
    ChatCompletionRequest, ChatCompletionResponse, LlmError, LlmResult, TextGenerationProvider,
};

/// Record of a mock provider call
#[derive(Debug, Clone)]
pub struct MockCall {
    /// Last user message of the request
    pub prompt: String,
    pub temperature: Option<f32>,
    pub json_mode: bool,
}

/// Mock chat provider
pub struct MockTextProvider {
    model_name: String,
    queue: Mutex<VecDeque<LlmResult<String>>>,
    rules: Mutex<Vec<(String, String)>>,
    default_response: String,
    call_history: Mutex<Vec<MockCall>>,
}

impl Default for MockTextProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockTextProvider {
    /// A provider that answers an empty extraction unless told otherwise.
    pub fn new() -> Self {
        Self {
            model_name: "mock-llm".to_string(),
            queue: Mutex::new(VecDeque::new()),
            rules: Mutex::new(Vec::new()),
            default_response: r#"{"entities": [], "relationships": []}"#.to_string(),
            call_history: Mutex::new(Vec::new()),
        }
    }

    pub fn with_default_response(mut self, response: impl Into<String>) -> Self {
        self.default_response = response.into();
        self
    }

    /// Queue a response for the next call.
    pub fn push_response(&self, response: impl Into<String>) {
        lock(&self.queue).push_back(Ok(response.into()));
    }

    /// Queue a failure for the next call.
    pub fn push_error(&self, error: LlmError) {
        lock(&self.queue).push_back(Err(error));
    }

    /// Answer `response` whenever the last user message contains `needle`.
    pub fn respond_when(&self, needle: impl Into<String>, response: impl Into<String>) {
        lock(&self.rules).push((needle.into(), response.into()));
    }

    pub fn call_history(&self) -> Vec<MockCall> {
        lock(&self.call_history).clone()
    }

    pub fn clear_history(&self) {
        lock(&self.call_history).clear();
    }
}

#[async_trait]
impl TextGenerationProvider for MockTextProvider {
    async fn generate_chat_completion(
        &self,
        request: ChatCompletionRequest,
    ) -> LlmResult<ChatCompletionResponse> {
        let prompt = request.last_user_message().unwrap_or_default().to_string();

        lock(&self.call_history).push(MockCall {
            prompt: prompt.clone(),
            temperature: request.temperature,
            json_mode: request.json_mode,
        });

        let queued = lock(&self.queue).pop_front();
        let content = match queued {
            Some(result) => result?,
            None => lock(&self.rules)
                .iter()
                .find(|(needle, _)| prompt.contains(needle.as_str()))
                .map(|(_, response)| response.clone())
                .unwrap_or_else(|| self.default_response.clone()),
        };

        Ok(ChatCompletionResponse {
            content,
            model: self.model_name.clone(),
            usage: None,
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

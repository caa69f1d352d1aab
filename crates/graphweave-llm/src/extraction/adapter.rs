use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use graphweave_config::LlmConfig;
use graphweave_core::{
    retry_with_backoff, ChatCompletionRequest, ExtractionResult, Extractor, LlmError,
    MappingRule, RetryPolicy, TextGenerationProvider,
};
use tracing::{debug, warn};

use super::parse::parse_extraction;
use super::prompt::extraction_messages;

/// [`Extractor`] backed by a chat-completion provider.
///
/// Transport failures are retried with exponential backoff. Output that
/// cannot be repaired into JSON yields an empty result instead of an error,
/// so a single garbled response only costs its own row. An `Err` is returned
/// only once the retries for a transient failure are exhausted, or for
/// failures no retry can fix (bad credentials, configuration).
pub struct LlmExtractor {
    provider: Arc<dyn TextGenerationProvider>,
    retry: RetryPolicy,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl LlmExtractor {
    pub fn new(provider: Arc<dyn TextGenerationProvider>) -> Self {
        Self::from_config(provider, &LlmConfig::default())
    }

    pub fn from_config(provider: Arc<dyn TextGenerationProvider>, config: &LlmConfig) -> Self {
        Self {
            provider,
            retry: RetryPolicy::new(
                config.max_attempts,
                Duration::from_millis(config.base_delay_ms),
            ),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn request(&self, row: &str, rules: &[MappingRule]) -> ChatCompletionRequest {
        let mut request = ChatCompletionRequest::new(extraction_messages(row, rules));
        request.temperature = Some(self.temperature);
        request.max_tokens = self.max_tokens;
        request.json_mode = true;
        request
    }
}

#[async_trait]
impl Extractor for LlmExtractor {
    async fn extract(
        &self,
        row: &str,
        rules: &[MappingRule],
    ) -> Result<ExtractionResult, LlmError> {
        let request = self.request(row, rules);

        let response = retry_with_backoff(
            &self.retry,
            || self.provider.generate_chat_completion(request.clone()),
            LlmError::is_retryable,
        )
        .await?;

        match parse_extraction(&response.content) {
            Ok(result) => {
                debug!(
                    entities = result.entities.len(),
                    relationships = result.relationships.len(),
                    "Extracted row"
                );
                Ok(result)
            }
            Err(e) => {
                warn!("Unparseable extraction output, treating row as empty: {}", e);
                Ok(ExtractionResult::empty())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTextProvider;

    fn extractor(provider: Arc<MockTextProvider>) -> LlmExtractor {
        LlmExtractor::new(provider).with_retry_policy(RetryPolicy::new(3, Duration::from_millis(10)))
    }

    #[tokio::test]
    async fn requests_are_deterministic_json() {
        let provider = Arc::new(MockTextProvider::new());
        provider.push_response(r#"{"entities": [{"label": "Acme", "type": "Company"}]}"#);

        let result = extractor(provider.clone()).extract("Acme", &[]).await.unwrap();
        assert_eq!(result.entities.len(), 1);

        let calls = provider.call_history();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].temperature, Some(0.0));
        assert!(calls[0].json_mode);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried() {
        let provider = Arc::new(MockTextProvider::new());
        provider.push_error(LlmError::HttpError("502".into()));
        provider.push_error(LlmError::RateLimited("429".into()));
        provider.push_response(r#"{"entities": [{"label": "Bob"}]}"#);

        let result = extractor(provider.clone()).extract("Bob", &[]).await.unwrap();
        assert_eq!(result.entities[0].label, "Bob");
        assert_eq!(provider.call_history().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_surface_the_error() {
        let provider = Arc::new(MockTextProvider::new());
        for _ in 0..3 {
            provider.push_error(LlmError::Timeout("slow".into()));
        }

        let err = extractor(provider.clone()).extract("row", &[]).await.unwrap_err();
        assert!(matches!(err, LlmError::Timeout(_)));
        assert_eq!(provider.call_history().len(), 3);
    }

    #[tokio::test]
    async fn permanent_failures_are_not_retried() {
        let provider = Arc::new(MockTextProvider::new());
        provider.push_error(LlmError::InvalidResponse("401".into()));

        assert!(extractor(provider.clone()).extract("row", &[]).await.is_err());
        assert_eq!(provider.call_history().len(), 1);
    }

    #[tokio::test]
    async fn garbled_output_degrades_to_empty() {
        let provider = Arc::new(MockTextProvider::new());
        provider.push_response("I could not find anything, sorry.");

        let result = extractor(provider.clone()).extract("row", &[]).await.unwrap();
        assert!(result.is_empty());
        assert_eq!(provider.call_history().len(), 1);
    }
}

//! Chat provider implementations

pub mod ollama;
pub mod openai;

pub use ollama::OllamaChatProvider;
pub use openai::OpenAIChatProvider;

use std::sync::Arc;

use graphweave_config::{LlmConfig, LlmProviderType};
use graphweave_core::{LlmError, LlmResult, TextGenerationProvider};

/// Create a chat provider from configuration
pub fn create_chat_provider(config: &LlmConfig) -> LlmResult<Arc<dyn TextGenerationProvider>> {
    match config.provider {
        LlmProviderType::Ollama => Ok(Arc::new(OllamaChatProvider::new(
            config.llm_endpoint(),
            config.model_name(),
            config.timeout_secs,
        ))),
        LlmProviderType::OpenAI => {
            let api_key = std::env::var(&config.api_key_env).map_err(|_| {
                LlmError::ConfigError(format!("{} not set", config.api_key_env))
            })?;

            Ok(Arc::new(OpenAIChatProvider::new(
                api_key,
                Some(config.llm_endpoint()),
                config.model_name(),
                config.timeout_secs,
            )))
        }
    }
}

/// Map a non-success HTTP status to the matching error kind.
pub(crate) fn status_error(provider: &str, status: reqwest::StatusCode, body: String) -> LlmError {
    let message = format!("{} API error ({}): {}", provider, status, body);
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        LlmError::RateLimited(message)
    } else if status.is_server_error() {
        LlmError::HttpError(message)
    } else {
        LlmError::InvalidResponse(message)
    }
}

/// Map a transport error, keeping timeouts distinct.
pub(crate) fn transport_error(error: reqwest::Error) -> LlmError {
    if error.is_timeout() {
        LlmError::Timeout(error.to_string())
    } else {
        LlmError::HttpError(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_error_kinds() {
        assert!(matches!(
            status_error("x", reqwest::StatusCode::TOO_MANY_REQUESTS, String::new()),
            LlmError::RateLimited(_)
        ));
        assert!(matches!(
            status_error("x", reqwest::StatusCode::BAD_GATEWAY, String::new()),
            LlmError::HttpError(_)
        ));
        assert!(matches!(
            status_error("x", reqwest::StatusCode::UNAUTHORIZED, String::new()),
            LlmError::InvalidResponse(_)
        ));
    }

    #[test]
    fn ollama_needs_no_api_key() {
        let config = LlmConfig {
            provider: LlmProviderType::Ollama,
            ..LlmConfig::default()
        };
        let provider = create_chat_provider(&config).unwrap();
        assert_eq!(provider.model_name(), config.model_name());
    }

    #[test]
    fn openai_without_key_is_a_config_error() {
        let config = LlmConfig {
            api_key_env: "GRAPHWEAVE_TEST_KEY_THAT_IS_NEVER_SET".to_string(),
            ..LlmConfig::default()
        };
        assert!(matches!(
            create_chat_provider(&config),
            Err(LlmError::ConfigError(_))
        ));
    }
}

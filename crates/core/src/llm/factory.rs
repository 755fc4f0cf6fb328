// crates/core/src/llm/factory.rs
//! Provider factory. Creates an LlmProvider from configuration.

use std::sync::Arc;
use super::claude_cli::ClaudeCliProvider;
use super::config::{LlmConfig, ProviderType};
use super::gemini::GeminiProvider;
use super::openai::OpenAiProvider;
use super::provider::LlmProvider;
use super::types::LlmError;

/// Create an LLM provider based on the given configuration.
///
/// HTTP providers need an API key, except an OpenAI-compatible provider with a
/// custom endpoint (local Ollama/vLLM servers usually run without auth).
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>, LlmError> {
    match config.provider {
        ProviderType::Gemini => {
            let api_key = config.api_key.clone().ok_or_else(|| {
                LlmError::NotAvailable("gemini provider requires an API key".into())
            })?;
            let mut provider = GeminiProvider::new(&config.model, api_key)
                .with_timeout(config.timeout_secs);
            if let Some(endpoint) = &config.endpoint {
                provider = provider.with_endpoint(endpoint);
            }
            Ok(Arc::new(provider))
        }
        ProviderType::OpenAi => {
            if config.api_key.is_none() && config.endpoint.is_none() {
                return Err(LlmError::NotAvailable(
                    "openai provider requires an API key or a custom endpoint".into(),
                ));
            }
            let mut provider = OpenAiProvider::new(&config.model, config.api_key.clone())
                .with_timeout(config.timeout_secs);
            if let Some(endpoint) = &config.endpoint {
                provider = provider.with_endpoint(endpoint);
            }
            Ok(Arc::new(provider))
        }
        ProviderType::ClaudeCli => Ok(Arc::new(
            ClaudeCliProvider::new(&config.model).with_timeout(config.timeout_secs),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gemini_without_key_is_not_available() {
        let config = LlmConfig::default();
        let err = create_provider(&config).err().unwrap();
        assert!(matches!(err, LlmError::NotAvailable(_)));
    }

    #[test]
    fn test_gemini_with_key() {
        let config = LlmConfig {
            api_key: Some("key".into()),
            ..Default::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "gemini");
        assert_eq!(provider.model(), "gemini-2.5-pro");
    }

    #[test]
    fn test_openai_local_endpoint_without_key() {
        let config = LlmConfig {
            provider: ProviderType::OpenAi,
            model: "llama3.1".into(),
            endpoint: Some("http://localhost:11434/v1".into()),
            ..Default::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.model(), "llama3.1");
    }

    #[test]
    fn test_claude_cli_needs_no_key() {
        let config = LlmConfig {
            provider: ProviderType::ClaudeCli,
            model: "sonnet".into(),
            ..Default::default()
        };
        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "claude-cli");
    }
}

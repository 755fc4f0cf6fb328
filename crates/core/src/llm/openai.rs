// crates/core/src/llm/openai.rs
//! OpenAI-compatible provider: `POST {endpoint}/chat/completions`.
//!
//! Also covers local servers that speak the same protocol (Ollama, vLLM,
//! LM Studio); those usually run without an API key.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};

use super::gemini::retry_after_secs;
use super::provider::LlmProvider;
use super::types::{truncate_for_log, CompletionRequest, CompletionResponse, LlmError};

const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

pub struct OpenAiProvider {
    client: reqwest::Client,
    model: String,
    api_key: Option<String>,
    endpoint: String,
    timeout_secs: u64,
}

impl OpenAiProvider {
    pub fn new(model: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            model: model.into(),
            api_key,
            endpoint: DEFAULT_ENDPOINT.into(),
            timeout_secs: 120,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    fn build_body(&self, request: &CompletionRequest) -> serde_json::Value {
        let mut messages = Vec::with_capacity(2);
        if let Some(sys) = &request.system_prompt {
            messages.push(serde_json::json!({ "role": "system", "content": sys }));
        }
        messages.push(serde_json::json!({ "role": "user", "content": request.user_prompt }));

        serde_json::json!({
            "model": self.model,
            "messages": messages,
            "temperature": request.temperature,
            "max_tokens": request.max_tokens,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: Option<u64>,
    completion_tokens: Option<u64>,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let start = Instant::now();
        tracing::debug!(model = %self.model, endpoint = %self.endpoint, "openai: sending chat completion");

        let mut req = self
            .client
            .post(format!("{}/chat/completions", self.endpoint))
            .json(&self.build_body(&request))
            .timeout(Duration::from_secs(self.timeout_secs));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| LlmError::from_reqwest(e, self.timeout_secs))?;

        let status = resp.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimited {
                retry_after_secs: retry_after_secs(resp.headers()),
            });
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), body = %truncate_for_log(&body, 500), "openai: request failed");
            return Err(LlmError::Api { status: status.as_u16(), body });
        }

        let parsed: ChatCompletionResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::ParseFailed(e.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(LlmError::EmptyResponse)?;

        Ok(CompletionResponse {
            content,
            model: parsed.model,
            input_tokens: parsed.usage.as_ref().and_then(|u| u.prompt_tokens),
            output_tokens: parsed.usage.as_ref().and_then(|u| u.completion_tokens),
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        let mut req = self
            .client
            .get(format!("{}/models", self.endpoint))
            .timeout(Duration::from_secs(10));
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }
        let resp = req.send().await.map_err(|e| LlmError::from_reqwest(e, 10))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(LlmError::NotAvailable(format!(
                "{}/models returned {}",
                self.endpoint,
                resp.status()
            )))
        }
    }

    fn name(&self) -> &str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

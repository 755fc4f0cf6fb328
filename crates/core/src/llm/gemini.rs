// crates/core/src/llm/gemini.rs
//! Gemini provider. Calls the `models/{model}:generateContent` REST endpoint.
//!
//! The default endpoint is the public Generative Language API. The key is sent
//! as `x-goog-api-key`, so a Vertex AI `endpoint` only works in express mode
//! with an API key. OAuth bearer tokens are not supported.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::{Duration, Instant};

use super::provider::LlmProvider;
use super::types::{truncate_for_log, CompletionRequest, CompletionResponse, LlmError};

const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Fallback wait when a 429 carries no `Retry-After` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

pub struct GeminiProvider {
    client: reqwest::Client,
    model: String,
    api_key: String,
    endpoint: String,
    timeout_secs: u64,
}

impl GeminiProvider {
    pub fn new(model: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            model: model.into(),
            api_key: api_key.into(),
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

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u64>,
    candidates_token_count: Option<u64>,
}

/// Build the `generateContent` request body.
pub(crate) fn build_request_body(request: &CompletionRequest) -> serde_json::Value {
    let mut body = serde_json::json!({
        "contents": [{
            "role": "user",
            "parts": [{ "text": request.user_prompt }],
        }],
        "generationConfig": {
            "temperature": request.temperature,
            "maxOutputTokens": request.max_tokens,
        },
    });
    if let Some(sys) = &request.system_prompt {
        body["systemInstruction"] = serde_json::json!({ "parts": [{ "text": sys }] });
    }
    body
}

pub(crate) fn retry_after_secs(headers: &reqwest::header::HeaderMap) -> u64 {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let start = Instant::now();
        tracing::debug!(model = %self.model, prompt_len = request.user_prompt.len(), "gemini: sending generateContent");

        let resp = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request_body(&request))
            .timeout(Duration::from_secs(self.timeout_secs))
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
            tracing::error!(status = status.as_u16(), body = %truncate_for_log(&body, 500), "gemini: request failed");
            return Err(LlmError::Api { status: status.as_u16(), body });
        }

        let parsed: GenerateContentResponse = resp
            .json()
            .await
            .map_err(|e| LlmError::ParseFailed(e.to_string()))?;

        let content: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(LlmError::EmptyResponse);
        }

        let latency_ms = start.elapsed().as_millis() as u64;
        tracing::info!(model = %self.model, latency_ms, "gemini: response received");

        Ok(CompletionResponse {
            content,
            model: parsed.model_version.or_else(|| Some(self.model.clone())),
            input_tokens: parsed.usage_metadata.as_ref().and_then(|u| u.prompt_token_count),
            output_tokens: parsed.usage_metadata.as_ref().and_then(|u| u.candidates_token_count),
            latency_ms,
        })
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::NotAvailable("gemini API key is empty".into()));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

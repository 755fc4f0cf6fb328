// crates/core/src/llm/provider.rs
//! LlmProvider trait defining the interface for LLM integrations.

use async_trait::async_trait;
use super::types::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for LLM providers that answer free-text prompts.
///
/// Implementations include:
/// - `GeminiProvider`: Gemini `generateContent` REST API
/// - `OpenAiProvider`: OpenAI-compatible `/chat/completions` (OpenAI, Ollama, vLLM)
/// - `ClaudeCliProvider`: spawns `claude` CLI process
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Run a completion with optional system prompt + user prompt.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Check if the provider is available (CLI installed, API key set, etc.)
    async fn health_check(&self) -> Result<(), LlmError>;

    /// Provider name for logging/display (e.g. "gemini", "claude-cli").
    fn name(&self) -> &str;

    /// Model identifier (e.g. "gemini-2.5-pro", "gpt-4o-mini").
    fn model(&self) -> &str;
}

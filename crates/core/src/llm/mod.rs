// crates/core/src/llm/mod.rs
//! LLM integration module for execution-plan analysis.
//!
//! Provides the `LlmProvider` trait and implementations that call HTTP APIs
//! (Gemini, OpenAI-compatible) or spawn the Claude CLI.

pub mod claude_cli;
pub mod config;
pub mod factory;
pub mod gemini;
pub mod openai;
pub mod provider;
pub mod types;

pub use claude_cli::ClaudeCliProvider;
pub use config::{LlmConfig, ProviderType};
pub use factory::create_provider;
pub use gemini::GeminiProvider;
pub use openai::OpenAiProvider;
pub use provider::LlmProvider;
pub use types::{CompletionRequest, CompletionResponse, LlmError};

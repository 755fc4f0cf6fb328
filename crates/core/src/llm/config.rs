// crates/core/src/llm/config.rs
//! LLM provider configuration types.

use serde::Deserialize;

/// Configuration for an LLM provider instance.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: ProviderType,
    pub model: String,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub temperature: f32,
    pub timeout_secs: u64,
}

/// Supported LLM provider types.
///
/// Config files, env and flags accept the same names and aliases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub enum ProviderType {
    Gemini,
    OpenAi,
    ClaudeCli,
}

impl ProviderType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenAi => "open-ai",
            Self::ClaudeCli => "claude-cli",
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" | "vertex" => Ok(Self::Gemini),
            "openai" | "open-ai" | "ollama" => Ok(Self::OpenAi),
            "claude-cli" | "claude" => Ok(Self::ClaudeCli),
            other => Err(format!(
                "unknown LLM provider '{other}' (expected gemini, openai or claude-cli)"
            )),
        }
    }
}

impl TryFrom<String> for ProviderType {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderType::Gemini,
            model: "gemini-2.5-pro".into(),
            api_key: None,
            endpoint: None,
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

// API keys stay out of logs.
impl std::fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("endpoint", &self.endpoint)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

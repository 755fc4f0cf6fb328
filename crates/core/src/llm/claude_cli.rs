// crates/core/src/llm/claude_cli.rs
//! Claude CLI provider. Spawns `claude` process and parses JSON output.

use async_trait::async_trait;
use tokio::process::Command as TokioCommand;

use super::provider::LlmProvider;
use super::types::{truncate_for_log, CompletionRequest, CompletionResponse, LlmError};

/// LLM provider that uses the Claude CLI binary.
///
/// Spawns `claude -p --output-format json --model {model} "{prompt}"`.
pub struct ClaudeCliProvider {
    model: String,
    binary: String,
    timeout_secs: u64,
}

impl ClaudeCliProvider {
    /// Create a new provider with the given model name.
    ///
    /// Model names: "haiku", "sonnet", "opus"
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            binary: "claude".into(),
            timeout_secs: 120,
        }
    }

    /// Set the timeout in seconds for CLI invocations.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Use a different executable (absolute path or wrapper script).
    pub fn with_binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Claude Code sets these in child shells; a nested `claude -p` refuses to
    /// start when it sees them.
    fn nested_session_vars() -> Vec<String> {
        let known_vars = ["CLAUDECODE", "CLAUDE_CODE_SSE_PORT", "CLAUDE_CODE_ENTRYPOINT"];
        let extra_vars = std::env::vars()
            .filter(|(k, _)| k.starts_with("CLAUDE") && !known_vars.contains(&k.as_str()))
            .map(|(k, _)| k);
        known_vars
            .iter()
            .map(|s| s.to_string())
            .chain(extra_vars)
            .collect()
    }
}

#[async_trait]
impl LlmProvider for ClaudeCliProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        use tokio::time::{timeout, Duration};

        let start = std::time::Instant::now();
        let timeout_duration = Duration::from_secs(self.timeout_secs);
        let prompt = request.combined_prompt();
        let stripped = Self::nested_session_vars();

        tracing::info!(
            model = %self.model,
            timeout_secs = self.timeout_secs,
            prompt_len = prompt.len(),
            "claude CLI complete(): spawning"
        );

        let mut cmd = TokioCommand::new(&self.binary);
        cmd.args([
                "-p",
                "--output-format",
                "json",
                "--model",
                &self.model,
                &prompt,
            ])
            // Null stdin so the child never blocks waiting for input
            .stdin(std::process::Stdio::null())
            .kill_on_drop(true);
        for var in &stripped {
            cmd.env_remove(var);
        }

        let output = timeout(timeout_duration, cmd.output())
            .await
            .map_err(|_| {
                tracing::error!(elapsed_ms = start.elapsed().as_millis() as u64, "claude CLI complete(): timed out");
                LlmError::Timeout(self.timeout_secs)
            })?
            .map_err(|e| {
                tracing::error!(error = %e, "claude CLI complete(): failed to spawn process");
                LlmError::SpawnFailed(e.to_string())
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(exit_code = ?output.status.code(), stderr = %truncate_for_log(&stderr, 500), "claude CLI: non-zero exit");
            return Err(LlmError::CliError(stderr.to_string()));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let content = parse_cli_output(&stdout)?;

        Ok(CompletionResponse {
            content,
            model: Some(self.model.clone()),
            input_tokens: None,
            output_tokens: None,
            latency_ms: start.elapsed().as_millis() as u64,
        })
    }

    async fn health_check(&self) -> Result<(), LlmError> {
        let output = TokioCommand::new(&self.binary)
            .arg("--version")
            .output()
            .await
            .map_err(|e| LlmError::SpawnFailed(format!("{} not found: {}", self.binary, e)))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(LlmError::NotAvailable(format!("{} --version failed", self.binary)))
        }
    }

    fn name(&self) -> &str {
        "claude-cli"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Pull the answer text out of `claude --output-format json` output.
///
/// The CLI wraps the answer as `{ "result": "..." }`; older builds used `content`.
pub fn parse_cli_output(stdout: &str) -> Result<String, LlmError> {
    let parsed: serde_json::Value = serde_json::from_str(stdout).map_err(|e| {
        tracing::warn!(stdout = %truncate_for_log(stdout, 500), "claude CLI: returned non-JSON");
        LlmError::ParseFailed(format!("Invalid JSON from CLI: {e}"))
    })?;

    if parsed.get("is_error").and_then(|v| v.as_bool()) == Some(true) {
        let message = parsed["result"].as_str().unwrap_or("unknown CLI error");
        return Err(LlmError::CliError(message.to_string()));
    }

    parsed["result"]
        .as_str()
        .or_else(|| parsed["content"].as_str())
        .map(str::to_string)
        .ok_or(LlmError::EmptyResponse)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cli_output_result_wrapper() {
        let stdout = r#"{"type":"result","result":"Yes, created_at > $1 is a range predicate."}"#;
        let content = parse_cli_output(stdout).unwrap();
        assert_eq!(content, "Yes, created_at > $1 is a range predicate.");
    }

    #[test]
    fn test_parse_cli_output_content_fallback() {
        let content = parse_cli_output(r#"{"content":"No"}"#).unwrap();
        assert_eq!(content, "No");
    }

    #[test]
    fn test_parse_cli_output_error_flag() {
        let err = parse_cli_output(r#"{"is_error":true,"result":"Credit balance is too low"}"#).unwrap_err();
        assert!(matches!(err, LlmError::CliError(msg) if msg.contains("Credit balance")));
    }

    #[test]
    fn test_parse_cli_output_not_json() {
        let err = parse_cli_output("Error: not logged in").unwrap_err();
        assert!(matches!(err, LlmError::ParseFailed(_)));
    }

    #[test]
    fn test_parse_cli_output_missing_result() {
        let err = parse_cli_output(r#"{"type":"result"}"#).unwrap_err();
        assert!(matches!(err, LlmError::EmptyResponse));
    }

    #[test]
    fn test_claude_cli_provider_creation() {
        let provider = ClaudeCliProvider::new("haiku").with_timeout(60);
        assert_eq!(provider.name(), "claude-cli");
        assert_eq!(provider.model(), "haiku");
        assert_eq!(provider.timeout_secs, 60);
    }

    #[tokio::test]
    async fn test_missing_binary_is_spawn_failure() {
        let provider = ClaudeCliProvider::new("haiku")
            .with_binary("/nonexistent/range-advisor-test-claude");
        let err = provider.complete(CompletionRequest::user("hi")).await.unwrap_err();
        assert!(matches!(err, LlmError::SpawnFailed(_)));

        let err = provider.health_check().await.unwrap_err();
        assert!(matches!(err, LlmError::SpawnFailed(_)));
    }
}

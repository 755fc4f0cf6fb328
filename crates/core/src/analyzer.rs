// crates/core/src/analyzer.rs
//! Plan analyzer: three prompt-driven steps over one query.
//!
//! Each step sends one user message and returns the trimmed answer with code
//! fences stripped. `analyze_query` chains them and never fails: every step
//! error is logged and becomes a missing value in the `AnalysisResult`.

use std::sync::Arc;

use crate::catalog::StatsCatalog;
use crate::error::AnalysisError;
use crate::heuristics::{has_bind_placeholders, mentions_yes, strip_code_fences};
use crate::llm::{CompletionRequest, LlmProvider};
use crate::prompts::{
    build_bind_resolution_prompt, build_plan_interpretation_prompt, build_range_detection_prompt,
};
use crate::types::{AnalysisResult, ExecutionPlan};

/// Detector answer plus the flag derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeDetection {
    pub text: String,
    pub contains_range: bool,
}

pub struct PlanAnalyzer {
    provider: Arc<dyn LlmProvider>,
    temperature: f32,
}

impl PlanAnalyzer {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            temperature: 0.0,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    async fn ask(&self, prompt: String) -> Result<String, AnalysisError> {
        let request = CompletionRequest::user(prompt).with_temperature(self.temperature);
        let response = self.provider.complete(request).await?;
        tracing::debug!(
            provider = self.provider.name(),
            latency_ms = response.latency_ms,
            output_tokens = ?response.output_tokens,
            "llm answer received"
        );
        Ok(strip_code_fences(&response.content))
    }

    /// Ask whether `query` has a range predicate.
    pub async fn detect_range_predicates(&self, query: &str) -> Result<RangeDetection, AnalysisError> {
        let text = self.ask(build_range_detection_prompt(query)).await?;
        let contains_range = mentions_yes(&text);
        Ok(RangeDetection { text, contains_range })
    }

    /// Replace `$n` placeholders with plausible literals.
    ///
    /// The literals are invented by the model, so a plan built from the result
    /// approximates the recorded execution. A query without placeholders is
    /// returned as-is and the model is not called.
    pub async fn resolve_bind_variables(&self, query: &str) -> Result<String, AnalysisError> {
        if !has_bind_placeholders(query) {
            return Ok(query.trim().to_string());
        }
        let resolved = self.ask(build_bind_resolution_prompt(query)).await?;
        if resolved.is_empty() {
            return Err(AnalysisError::EmptyResolvedQuery);
        }
        Ok(resolved)
    }

    /// Ask for sequential scans on range-predicate fields and an index recommendation.
    pub async fn interpret_plan(&self, query: &str, plan: &ExecutionPlan) -> Result<String, AnalysisError> {
        self.ask(build_plan_interpretation_prompt(query, plan)).await
    }

    /// Resolve binds, then explain the resolved statement.
    pub async fn fetch_explain_plan(
        &self,
        catalog: &mut dyn StatsCatalog,
        query: &str,
    ) -> Result<ExecutionPlan, AnalysisError> {
        let executable = self.resolve_bind_variables(query).await?;
        tracing::info!(query = %executable, "query used for explain plan");
        Ok(catalog.explain_plan(&executable).await?)
    }

    /// Run detection and, when a range predicate is reported, plan retrieval
    /// and interpretation.
    pub async fn analyze_query(&self, catalog: &mut dyn StatsCatalog, query: &str) -> AnalysisResult {
        let detection = match self.detect_range_predicates(query).await {
            Ok(d) => d,
            Err(e) => {
                tracing::error!(error = %e, "range predicate detection failed");
                return AnalysisResult {
                    analysis: format!("Range predicate analysis failed: {e}"),
                    ..Default::default()
                };
            }
        };

        let mut result = AnalysisResult {
            analysis: detection.text,
            contains_range: detection.contains_range,
            ..Default::default()
        };
        if !result.contains_range {
            return result;
        }

        result.explain_plan = match self.fetch_explain_plan(catalog, query).await {
            Ok(plan) if !plan.is_null() => Some(plan),
            Ok(_) => None,
            Err(e) => {
                tracing::error!(error = %e, "error getting explain plan");
                None
            }
        };

        if let Some(plan) = &result.explain_plan {
            result.explain_analysis = match self.interpret_plan(query, plan).await {
                Ok(text) => Some(text),
                Err(e) => {
                    tracing::error!(error = %e, "error analyzing explain plan");
                    None
                }
            };
        }

        result
    }
}
